//! QR rendering for provisioning URIs.
//!
//! SVG is the default output (crisp at any size, no raster encoder needed on
//! the client). A PNG data URI is available for clients that cannot show
//! inline SVG.

use image::{GrayImage, Luma};
use qrcode::render::svg;
use qrcode::QrCode;

use crate::totp::types::*;

/// Default module size in pixels for PNG output.
pub const DEFAULT_MODULE_PX: u32 = 8;

fn encode(text: &str) -> Result<QrCode, TotpError> {
    QrCode::new(text.as_bytes()).map_err(|e| {
        TotpError::new(TotpErrorKind::QrEncodeFailed, format!("QR encode error: {}", e))
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SVG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render `text` as an SVG document without a quiet zone, ready for a
/// `data:image/svg+xml;utf8,` URI. The embedding page supplies the border.
pub fn render_svg(text: &str) -> Result<String, TotpError> {
    let code = encode(text)?;
    Ok(code.render::<svg::Color>().quiet_zone(false).build())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PNG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render `text` as PNG bytes, each module `module_px` pixels wide, without a
/// quiet zone.
pub fn render_png(text: &str, module_px: u32) -> Result<Vec<u8>, TotpError> {
    if module_px == 0 {
        return Err(TotpError::new(
            TotpErrorKind::QrEncodeFailed,
            "Module size must be at least 1 px",
        ));
    }

    let code = encode(text)?;
    let matrix = code.to_colors();
    let width = code.width() as u32;
    let img_size = width * module_px;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));

    for y in 0..width {
        for x in 0..width {
            if matrix[(y * width + x) as usize] == qrcode::Color::Dark {
                for dy in 0..module_px {
                    for dx in 0..module_px {
                        img.put_pixel(x * module_px + dx, y * module_px + dy, Luma([0u8]));
                    }
                }
            }
        }
    }

    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img_size,
        img_size,
        image::ExtendedColorType::L8,
    )
    .map_err(|e| TotpError::new(TotpErrorKind::QrEncodeFailed, format!("PNG encode error: {}", e)))?;

    Ok(buf)
}

/// [`render_png`] wrapped in a `data:image/png;base64,` URI.
pub fn render_png_data_uri(text: &str, module_px: u32) -> Result<String, TotpError> {
    use base64::Engine;
    let png = render_png(text, module_px)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}
