//! Image decoder. Dispatches a sniffed content-type string to the matching
//! `image::ImageFormat` and decodes to an 8-bit RGB buffer. Video content
//! types are never decoded here -- their descriptors carry only content
//! hashes.

use std::io::{Read, Seek};

use image::RgbImage;

use crate::error::DecodeError;

fn format_for(content_type: &str) -> Option<image::ImageFormat> {
    use image::ImageFormat::*;
    Some(match content_type {
        "image/gif" => Gif,
        "image/jpeg" => Jpeg,
        "image/png" => Png,
        "image/bmp" => Bmp,
        "image/webp" => WebP,
        "image/tiff" => Tiff,
        "image/x-icon" => Ico,
        _ => return None,
    })
}

/// Decode `reader`'s contents as `content_type` into an RGB pixel buffer.
pub fn decode<R: Read + Seek>(
    reader: &mut R,
    content_type: &str,
) -> Result<RgbImage, DecodeError> {
    let format = format_for(content_type)
        .ok_or_else(|| DecodeError::UnsupportedForDecoding(content_type.to_owned()))?;

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let img = image::load_from_memory_with_format(&bytes, format)?;
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_fn(4, 4, |x, y| {
            image::Rgb([(x * 50) as u8, (y * 50) as u8, 0])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png() {
        let bytes = tiny_png();
        let mut cur = Cursor::new(bytes);
        let img = decode(&mut cur, "image/png").unwrap();
        assert_eq!(img.dimensions(), (4, 4));
    }

    #[test]
    fn rejects_video_type() {
        let mut cur = Cursor::new(tiny_png());
        let err = decode(&mut cur, "video/mp4").unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedForDecoding(_)));
    }

    #[test]
    fn rejects_garbage() {
        let mut cur = Cursor::new(vec![1, 2, 3, 4, 5]);
        assert!(decode(&mut cur, "image/png").is_err());
    }
}
