// Copyright @yucwang 2026

use std::path::Path;

use image::{ImageBuffer, Luma, Rgb, RgbImage};

use crate::core::error::Result;
use crate::io::exr_utils::write_exr_to_file;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;
use crate::math::spectrum::gamma_encode;
use crate::volumes::height_field::HeightField;

fn to_u8(value: Float, gamma: Float) -> u8 {
    (gamma_encode(value, gamma) * 255.0).round() as u8
}

/// Gamma encoded 8-bit image; values above one are clipped.
pub fn write_png<P: AsRef<Path>>(bitmap: &Bitmap, gamma: Float, path: P) -> Result<()> {
    let img: RgbImage = ImageBuffer::from_fn(bitmap.width() as u32, bitmap.height() as u32, |x, y| {
        let c = bitmap[(x as usize, y as usize)];
        Rgb([to_u8(c.x, gamma), to_u8(c.y, gamma), to_u8(c.z, gamma)])
    });
    img.save(path.as_ref())?;
    log::info!("PNG written to: {}.", path.as_ref().display());
    Ok(())
}

/// `.exr` keeps linear radiance, anything else goes through `write_png`.
pub fn save_bitmap<P: AsRef<Path>>(bitmap: &Bitmap, gamma: Float, path: P) -> Result<()> {
    let is_exr = path.as_ref().extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("exr"));
    if is_exr {
        write_exr_to_file(bitmap, path)
    } else {
        write_png(bitmap, gamma, path)
    }
}

/// 16-bit grayscale height map, normalized to the field's peak. The top
/// image row is the field's largest `y`.
pub fn write_height_map<P: AsRef<Path>>(field: &HeightField, path: P) -> Result<()> {
    let peak = field.max_height();
    let scale = if peak > 0.0 { u16::MAX as Float / peak } else { 0.0 };
    let rows = field.height();
    let img: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(field.width() as u32, rows as u32, |x, y| {
            let h = field.get(x as usize, rows - 1 - y as usize);
            Luma([(h * scale).round() as u16])
        });
    img.save(path.as_ref())?;
    log::info!("Height map written to: {}.", path.as_ref().display());
    Ok(())
}
