//! In-memory GeoTIFF encoding for band fixtures.
//!
//! Writes a single-band, strip-organised GeoTIFF carrying ModelPixelScale,
//! ModelTiepoint and a GeoKeyDirectory with the given EPSG code.

use std::io::Cursor;

use tiff::encoder::{colortype, colortype::ColorType, TiffEncoder, TiffValue};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;

/// Georeferencing of a fixture raster.
#[derive(Debug, Clone, Copy)]
pub struct GeoTiffSpec {
    pub width: u32,
    pub height: u32,
    /// Top-left corner in CRS units.
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    pub epsg: u16,
}

impl GeoTiffSpec {
    fn geokeys(&self) -> Vec<u16> {
        let geographic = (4000..5000).contains(&self.epsg);
        // Header: version, revision, minor, key count.
        let mut keys = vec![1, 1, 0, 3];
        // GTModelTypeGeoKey: 1 = projected, 2 = geographic.
        keys.extend_from_slice(&[1024, 0, 1, if geographic { 2 } else { 1 }]);
        // GTRasterTypeGeoKey: PixelIsArea.
        keys.extend_from_slice(&[1025, 0, 1, 1]);
        if geographic {
            keys.extend_from_slice(&[2048, 0, 1, self.epsg]);
        } else {
            keys.extend_from_slice(&[3072, 0, 1, self.epsg]);
        }
        keys
    }
}

fn encode<C>(spec: &GeoTiffSpec, data: &[C::Inner]) -> Vec<u8>
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    assert_eq!(
        data.len(),
        (spec.width * spec.height) as usize,
        "fixture data does not match raster size"
    );

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).expect("tiff encoder");
        let mut image = encoder
            .new_image::<C>(spec.width, spec.height)
            .expect("tiff image");

        let scale = [spec.pixel_size, spec.pixel_size, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, spec.origin_x, spec.origin_y, 0.0];
        let geokeys = spec.geokeys();

        image
            .encoder()
            .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
            .expect("pixel scale tag");
        image
            .encoder()
            .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
            .expect("tiepoint tag");
        image
            .encoder()
            .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
            .expect("geokey tag");

        image.write_data(data).expect("tiff data");
    }
    buf.into_inner()
}

/// Encode 16-bit reflectance values.
pub fn encode_u16(spec: &GeoTiffSpec, data: &[u16]) -> Vec<u8> {
    encode::<colortype::Gray16>(spec, data)
}

/// Encode 8-bit classification codes.
pub fn encode_u8(spec: &GeoTiffSpec, data: &[u8]) -> Vec<u8> {
    encode::<colortype::Gray8>(spec, data)
}

/// Encode 32-bit float samples.
pub fn encode_f32(spec: &GeoTiffSpec, data: &[f32]) -> Vec<u8> {
    encode::<colortype::Gray32Float>(spec, data)
}
