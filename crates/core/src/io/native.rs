//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Only the pieces suitability modelling needs are
//! handled: single-band rasters, the pixel-scale/tiepoint georeferencing tags
//! and the GDAL no-data tag.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn tiff_err(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let (rows, cols) = (height as usize, width as usize);

    let image = decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?;

    macro_rules! cast_all {
        ($buf:expr) => {
            $buf.into_iter()
                .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
                .collect::<Vec<T>>()
        };
    }

    let data = match image {
        DecodingResult::F32(buf) => cast_all!(buf),
        DecodingResult::F64(buf) => cast_all!(buf),
        DecodingResult::U8(buf) => cast_all!(buf),
        DecodingResult::U16(buf) => cast_all!(buf),
        DecodingResult::U32(buf) => cast_all!(buf),
        DecodingResult::I8(buf) => cast_all!(buf),
        DecodingResult::I16(buf) => cast_all!(buf),
        DecodingResult::I32(buf) => cast_all!(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    if let (Ok(scale), Ok(tiepoint)) = (scale, tiepoint) {
        if let Some(transform) = GeoTransform::from_tiff_tags(&scale, &tiepoint) {
            raster.set_transform(transform);
        }
    }

    if let Ok(text) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        raster.set_nodata(parse_nodata::<T>(&text));
    }

    Ok(raster)
}

/// Parse a GDAL no-data string; "nan" maps to the element's own sentinel
fn parse_nodata<T: RasterElement>(text: &str) -> Option<T> {
    let value: f64 = text.trim().trim_end_matches('\0').parse().ok()?;
    if value.is_nan() {
        Some(T::default_nodata())
    } else {
        T::from_f64(value)
    }
}

/// Write a Raster to a GeoTIFF file as 32-bit float.
///
/// No-data cells are written as NaN and flagged through the GDAL no-data tag.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f32::NAN
            } else {
                num_traits::cast(v).unwrap_or(f32::NAN)
            }
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let (scale, tiepoint) = raster.transform().to_tiff_tags();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;

    // Version 1.1.0 with two keys: GTModelTypeGeoKey = Projected,
    // GTRasterTypeGeoKey = PixelIsArea
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(tiff_err("Cannot write geokey tag"))?;

    image
        .encoder()
        .write_tag(Tag::GdalNodata, "nan")
        .map_err(tiff_err("Cannot write nodata tag"))?;

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}
