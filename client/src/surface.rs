use image::{Rgb, RgbImage, Rgba, RgbaImage, codecs::jpeg::JpegEncoder};

use crate::error::CaptureError;
use common::constants::{CANVAS_HEIGHT, CANVAS_WIDTH, JPEG_QUALITY};

/// Whatever the player draws on. Strokes come from outside the client;
/// the round view only clears it and captures it.
pub trait DrawingSurface {
    /// Starts a blank drawing for a new round.
    fn clear(&mut self);
    /// JPEG bytes of the current drawing.
    fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

/// In-memory RGBA canvas. Empty until the first round clears it.
#[derive(Debug, Default)]
pub struct RasterSurface {
    image: Option<RgbaImage>,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a drawing produced by an external editor.
    pub fn replace(&mut self, image: RgbaImage) {
        self.image = Some(image);
    }

    pub fn image_mut(&mut self) -> Option<&mut RgbaImage> {
        self.image.as_mut()
    }
}

impl DrawingSurface for RasterSurface {
    fn clear(&mut self) {
        self.image = Some(RgbaImage::from_pixel(
            CANVAS_WIDTH,
            CANVAS_HEIGHT,
            Rgba([255, 255, 255, 255]),
        ));
    }

    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        let image = self.image.as_ref().ok_or(CaptureError::NotReady)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::NotReady);
        }

        let flattened = flatten_onto_white(image);
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&flattened)?;
        Ok(bytes)
    }
}

// JPEG has no alpha channel.
fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let blend = |channel: u8| -> u8 {
            let alpha = u32::from(a);
            ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}
