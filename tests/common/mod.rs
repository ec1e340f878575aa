use image::{DynamicImage, ImageFormat, Rgb};

/// Encode a plain RGB test image as PNG bytes.
pub fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::new_rgb8(width, height);
    let mut output = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .unwrap();
    output
}

/// Encode a card-shaped test image with some dark-on-light structure so
/// preprocessing has real contrast to work with.
pub fn test_card_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        if y > height / 4 && y < height / 3 && x > width / 10 && x < width / 2 {
            Rgb([20, 20, 20])
        } else {
            Rgb([245, 245, 240])
        }
    });
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .unwrap();
    output
}

/// Build a multipart/form-data body. Parts with a file name become file
/// uploads; the rest are plain form fields.
pub fn multipart_body(
    boundary: &str,
    parts: &[(&str, Option<&str>, Option<&str>, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, content_type, data) in parts {
        body.extend(format!("--{boundary}\r\n").into_bytes());
        match file_name {
            Some(f) => body.extend(
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n")
                    .into_bytes(),
            ),
            None => body.extend(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n").into_bytes(),
            ),
        }
        if let Some(ct) = content_type {
            body.extend(format!("Content-Type: {ct}\r\n").into_bytes());
        }
        body.extend(b"\r\n");
        body.extend_from_slice(data);
        body.extend(b"\r\n");
    }
    body.extend(format!("--{boundary}--\r\n").into_bytes());
    body
}
