use slint::Image;

pub fn decode_webp_to_slint_image(image_data: &[u8]) -> Result<Image, Box<dyn std::error::Error>> {
    // Auto-detect the image format and decode
    let img = image::load_from_memory(image_data)?;

    // Convert to RGBA8 format
    let rgba_img = img.to_rgba8();
    let width = rgba_img.width();
    let height = rgba_img.height();
    let raw_pixels: Vec<u8> = rgba_img.into_raw();

    // Create Slint image from the pixel buffer (RGBA format)
    let pixel_buffer =
        slint::SharedPixelBuffer::<slint::Rgba8Pixel>::clone_from_slice(&raw_pixels, width, height);
    Ok(Image::from_rgba8(pixel_buffer))
}
