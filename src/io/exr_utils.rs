/* Copyright 2020 @TwoCookingMice */

use std::path::Path;

use exr::prelude::*;

use crate::core::error::Result;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector3f};

// Write a linear RGB bitmap as a 32-bit float OpenEXR image.
pub fn write_exr_to_file<P: AsRef<Path>>(bitmap: &Bitmap, file_path: P) -> Result<()> {
    let file_path = file_path.as_ref();
    log::info!("Starting writing openexr images: {}.", file_path.display());

    let pixels = bitmap.raw_copy();
    let width = bitmap.width();
    write_rgb_file(file_path, width, bitmap.height(), |x, y| pixels[y * width + x])?;

    log::info!("EXR written to: {}.", file_path.display());
    Ok(())
}

// Read the first RGB(A) layer of an OpenEXR image, dropping alpha.
pub fn read_exr_from_file<P: AsRef<Path>>(file_path: P) -> Result<Bitmap> {
    let file_path = file_path.as_ref();
    log::info!("Starting reading OpenEXR image from: {}.", file_path.display());

    let image = read_first_rgba_layer_from_file(
        file_path,
        |resolution, _channels: &RgbaChannels| Bitmap::new(resolution.width(), resolution.height()),
        |bitmap: &mut Bitmap, position, (r, g, b, _a): (f32, f32, f32, f32)| {
            bitmap[(position.x(), position.y())] = Vector3f::new(r as Float, g as Float, b as Float);
        },
    )?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exr_write_then_read() {
        let mut bitmap = Bitmap::new(3, 2);
        bitmap[(0, 0)] = Vector3f::new(0.25, 0.5, 2.0);
        bitmap[(2, 1)] = Vector3f::new(60.0, 0.0, 1.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.exr");
        write_exr_to_file(&bitmap, &path).unwrap();

        let loaded = read_exr_from_file(&path).unwrap();
        assert_eq!(loaded.width(), 3);
        assert_eq!(loaded.height(), 2);
        assert_eq!(loaded[(0, 0)], Vector3f::new(0.25, 0.5, 2.0));
        assert_eq!(loaded[(2, 1)], Vector3f::new(60.0, 0.0, 1.0));
        assert_eq!(loaded[(1, 1)], Vector3f::zeros());
    }
}
