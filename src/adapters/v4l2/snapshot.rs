use anyhow::Result;
use image::{imageops::FilterType, RgbImage};

use crate::domain::data_uri::encode_base64_data_uri;
use crate::domain::frame::FrameSize;

pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
    enc.encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)?;
    Ok(jpeg)
}

/// Captura fija al tamaño pedido, JPEG a calidad 100, como data URI.
pub fn screenshot_data_uri(rgb: &RgbImage, size: FrameSize) -> Result<String> {
    let jpeg = if rgb.width() == size.width && rgb.height() == size.height {
        encode_jpeg(rgb, 100)?
    } else {
        let scaled = image::imageops::resize(rgb, size.width, size.height, FilterType::Triangle);
        encode_jpeg(&scaled, 100)?
    };
    Ok(encode_base64_data_uri("image/jpeg", &jpeg))
}
