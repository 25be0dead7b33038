// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing a finished render to disk as a 24-bit BMP.
//!
//! Row 0 of a `PixelBuffer` holds the bottom edge of the viewport (the
//! smallest imaginary part).  BMP stores its rows bottom-up, so row 0
//! becomes the first row of pixel data in the file and the image shows
//! the complex plane the right way up.  Palette buffers are expanded
//! to RGB through the palette as they are written.

use failure::Error;
use image::bmp::BMPEncoder;
use image::ColorType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use colors::Palette;
use params::OutputMode;
use render::PixelBuffer;

// The encoder emits its rows last-first, so the buffer is handed over
// top row first.
fn upright_rgb(image: &PixelBuffer, palette: &Palette) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.width * image.height * 3);
    for y in (0..image.height).rev() {
        match image.mode {
            OutputMode::Rgb => rgb.extend_from_slice(image.row(y)),
            OutputMode::Palette => rgb.extend(palette.expand(image.row(y))),
        }
    }
    rgb
}

// Header fields are 32 bits wide: the dimensions are signed, and the
// image and file sizes unsigned.
const HEADER_BYTES: u64 = 54;

fn check_encodable(width: usize, height: usize) -> Result<(), Error> {
    let limit = i32::max_value() as usize;
    ensure!(
        width <= limit && height <= limit,
        "{}x{} is too large for a BMP file",
        width,
        height
    );
    let file_size = (width as u64)
        .checked_mul(3)
        .map(|row| (row + 3) / 4 * 4)
        .and_then(|row| row.checked_mul(height as u64))
        .and_then(|data| data.checked_add(HEADER_BYTES));
    ensure!(
        file_size.map_or(false, |size| size <= u64::from(u32::max_value())),
        "{}x{} is too large for a BMP file",
        width,
        height
    );
    Ok(())
}

/// Write `image` to `path`.  `palette` is only consulted for palette
/// buffers.  Images whose file would not fit the 32-bit BMP size
/// fields are refused before anything is written.
pub fn write_image<P: AsRef<Path>>(path: P, image: &PixelBuffer, palette: &Palette) -> Result<(), Error> {
    check_encodable(image.width, image.height)?;
    let rgb = upright_rgb(image, palette);
    let mut output = BufWriter::new(File::create(path.as_ref())?);
    BMPEncoder::new(&mut output).encode(
        &rgb,
        image.width as u32,
        image.height as u32,
        ColorType::RGB(8),
    )?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image;
    use image::Pixel;
    use tempfile::tempdir;

    fn gradient(mode: OutputMode) -> PixelBuffer {
        let (width, height) = (5, 3);
        let unit = mode.bytes_per_pixel();
        let mut pixels = vec![0u8; width * height * unit];
        for (i, pixel) in pixels.chunks_mut(unit).enumerate() {
            for b in pixel.iter_mut() {
                *b = (i * 10) as u8;
            }
        }
        PixelBuffer {
            width,
            height,
            mode,
            pixels,
        }
    }

    #[test]
    fn rgb_images_are_written_upright() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgb.bmp");
        let buffer = gradient(OutputMode::Rgb);
        write_image(&path, &buffer, &Palette::default()).unwrap();

        let bytes = ::std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..2], b"BM");

        let decoded = image::open(&path).unwrap().to_rgb();
        assert_eq!(decoded.dimensions(), (5, 3));
        for y in 0..3 {
            for x in 0..5 {
                let expected = buffer.pixel(x, y);
                let found = decoded.get_pixel(x as u32, (2 - y) as u32);
                assert_eq!(found.channels(), expected, "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn palette_images_are_expanded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexed.bmp");
        let buffer = gradient(OutputMode::Palette);
        let palette = Palette::default();
        write_image(&path, &buffer, &palette).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb();
        for y in 0..3 {
            for x in 0..5 {
                let index = buffer.pixel(x, y)[0];
                let found = decoded.get_pixel(x as u32, (2 - y) as u32);
                assert_eq!(found.channels(), &palette.rgb(index)[..]);
            }
        }
    }

    #[test]
    fn size_limits() {
        assert!(check_encodable(1, 1).is_ok());
        // 4-byte rows: 1 pixel pads to 4 bytes, so 54 + 4 * h.
        let tallest = ((u32::max_value() as usize) - 54) / 4;
        assert!(check_encodable(1, tallest).is_ok());
        assert!(check_encodable(1, tallest + 1).is_err());
        assert!(check_encodable(38000, 38000).is_err());
        assert!(check_encodable(i32::max_value() as usize + 1, 1).is_err());
        assert!(check_encodable(usize::max_value(), usize::max_value()).is_err());
    }

    #[test]
    fn oversized_images_are_refused_before_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.bmp");
        let huge = PixelBuffer {
            width: 38000,
            height: 38000,
            mode: OutputMode::Rgb,
            pixels: vec![],
        };
        let err = write_image(&path, &huge, &Palette::default()).unwrap_err();
        assert!(format!("{}", err).contains("too large"));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_paths_are_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bmp");
        assert!(write_image(&path, &gradient(OutputMode::Rgb), &Palette::default()).is_err());
    }
}
