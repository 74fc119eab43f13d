//! GeoTIFF header parsing and windowed decoding.
//!
//! Works over any `Read + Seek` source. Only the strips or tiles that
//! intersect the requested window are decoded.

use std::io::{Read, Seek};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use bloom_common::Epsg;

use crate::error::{IngestionError, Result};
use crate::window::{PixelWindow, RasterInfo};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Read georeferencing from the first image of `decoder`.
pub fn read_info<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<RasterInfo> {
    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(IngestionError::Unsupported(format!(
                "expected a single-band raster, got {:?}",
                other
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;

    let scale = decoder
        .find_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))?
        .ok_or_else(|| IngestionError::MissingMetadata("ModelPixelScale".into()))?
        .into_f64_vec()?;
    let tiepoint = decoder
        .find_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT))?
        .ok_or_else(|| IngestionError::MissingMetadata("ModelTiepoint".into()))?
        .into_f64_vec()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(IngestionError::MissingMetadata(format!(
            "malformed geotransform (scale {} values, tiepoint {} values)",
            scale.len(),
            tiepoint.len()
        )));
    }

    let geokeys = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))? {
        Some(value) => value.into_u16_vec()?,
        None => Vec::new(),
    };

    Ok(RasterInfo {
        width,
        height,
        origin_x: tiepoint[3] - tiepoint[0] * scale[0],
        origin_y: tiepoint[4] + tiepoint[1] * scale[1],
        res_x: scale[0].abs(),
        res_y: scale[1].abs(),
        epsg: epsg_from_geokeys(&geokeys),
    })
}

/// EPSG code from a GeoKeyDirectory: projected CRS first, then geographic,
/// defaulting to WGS84.
pub fn epsg_from_geokeys(keys: &[u16]) -> Epsg {
    let lookup = |wanted: u16| {
        keys.get(4..)?
            .chunks_exact(4)
            .find(|entry| entry[0] == wanted && entry[1] == 0)
            .map(|entry| entry[3])
    };

    lookup(PROJECTED_CS_TYPE_KEY)
        .or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
        .filter(|code| *code != 0 && *code != 32767)
        .map(Epsg)
        .unwrap_or(Epsg::WGS84)
}

/// Decode `window` as f32 samples, row-major.
pub fn read_window<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    info: &RasterInfo,
    window: PixelWindow,
) -> Result<Vec<f32>> {
    if window.x_end() > info.width || window.y_end() > info.height || window.is_empty() {
        return Err(IngestionError::Unsupported(format!(
            "window {:?} outside {}x{} raster",
            window, info.width, info.height
        )));
    }

    let (chunk_w, chunk_h) = decoder.chunk_dimensions();
    let chunks_across = info.width.div_ceil(chunk_w);

    let out_w = window.width as usize;
    let mut out = vec![f32::NAN; window.len()];

    for chunk_row in window.y / chunk_h..=(window.y_end() - 1) / chunk_h {
        for chunk_col in window.x / chunk_w..=(window.x_end() - 1) / chunk_w {
            let index = chunk_row * chunks_across + chunk_col;
            let (data_w, data_h) = decoder.chunk_data_dimensions(index);
            let samples = to_f32(decoder.read_chunk(index)?)?;

            let px = chunk_col * chunk_w;
            let py = chunk_row * chunk_h;

            let x0 = window.x.max(px);
            let x1 = window.x_end().min(px + data_w);
            let y0 = window.y.max(py);
            let y1 = window.y_end().min(py + data_h);

            for y in y0..y1 {
                let src_row = ((y - py) * data_w) as usize;
                let dst_row = (y - window.y) as usize * out_w;
                for x in x0..x1 {
                    out[dst_row + (x - window.x) as usize] = samples[src_row + (x - px) as usize];
                }
            }
        }
    }

    Ok(out)
}

fn to_f32(result: DecodingResult) -> Result<Vec<f32>> {
    Ok(match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(IngestionError::Unsupported(
                "unsupported sample format".to_string(),
            ))
        }
    })
}
