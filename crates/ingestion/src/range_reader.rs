//! Blocking `Read + Seek` over ranged object reads.
//!
//! The TIFF decoder is synchronous, so it runs on a blocking thread and this
//! reader bridges back into the runtime for each fetch. Fetched bytes are
//! kept in fixed-size blocks shared between clones of the reader, so the
//! header and tiles are never requested twice for the same band.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use object_store::{path::Path, ObjectStore};
use tokio::runtime::Handle;
use tracing::trace;

#[derive(Clone)]
pub struct RangeReader {
    store: Arc<dyn ObjectStore>,
    path: Path,
    size: u64,
    position: u64,
    block_size: u64,
    blocks: Arc<Mutex<HashMap<u64, Bytes>>>,
    handle: Handle,
}

impl RangeReader {
    /// `handle` must belong to the runtime that drives `store`; reads block on it.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        path: Path,
        size: u64,
        block_size: u64,
        handle: Handle,
    ) -> Self {
        Self {
            store,
            path,
            size,
            position: 0,
            block_size: block_size.max(1),
            blocks: Arc::new(Mutex::new(HashMap::new())),
            handle,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of blocks fetched so far.
    pub fn cached_blocks(&self) -> usize {
        self.blocks.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn cached(&self, block: u64) -> io::Result<Option<Bytes>> {
        let blocks = self
            .blocks
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "block cache poisoned"))?;
        Ok(blocks.get(&block).cloned())
    }

    /// Fetch blocks `first..=last` in one request and cache them.
    fn fetch(&self, first: u64, last: u64) -> io::Result<()> {
        let start = first * self.block_size;
        let end = ((last + 1) * self.block_size).min(self.size);
        trace!(path = %self.path, start, end, "Fetching range");

        let bytes = self
            .handle
            .block_on(self.store.get_range(&self.path, start as usize..end as usize))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let mut blocks = self
            .blocks
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "block cache poisoned"))?;
        for block in first..=last {
            let offset = ((block - first) * self.block_size) as usize;
            if offset >= bytes.len() {
                break;
            }
            let block_end = (offset + self.block_size as usize).min(bytes.len());
            blocks.insert(block, bytes.slice(offset..block_end));
        }
        Ok(())
    }
}

impl Read for RangeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.size {
            return Ok(0);
        }

        let block = self.position / self.block_size;
        let data = match self.cached(block)? {
            Some(data) => data,
            None => {
                // Fetch everything this read could consume, up to the first cached block.
                let wanted_end = (self.position + buf.len() as u64).min(self.size);
                let mut last = block;
                while (last + 1) * self.block_size < wanted_end && self.cached(last + 1)?.is_none() {
                    last += 1;
                }
                self.fetch(block, last)?;
                self.cached(block)?.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::UnexpectedEof, "range fetch returned no data")
                })?
            }
        };

        let offset = (self.position - block * self.block_size) as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for RangeReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.size.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };

        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of object",
            )),
        }
    }
}
