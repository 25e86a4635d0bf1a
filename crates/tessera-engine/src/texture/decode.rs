use super::DecodeError;

/// Straight-alpha RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decodes any raster format enabled on the `image` dependency (PNG, BMP,
/// TGA, QOI) into RGBA8.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let rgba = image::load_from_memory(bytes).map_err(DecodeError)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let img = decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(img.pixels.len(), 3 * 2 * 4);
        // pixel (2, 1)
        assert_eq!(&img.pixels[(1 * 3 + 2) * 4..][..4], &[2, 1, 7, 255]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
