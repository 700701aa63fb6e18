pub mod engine;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrLine, OcrWord, TesseractRecognizer};
pub use preprocess::{crop_area, crop_padded};

use anyhow::Result;
use image::GrayImage;

/// Turns a pixel region into text.
///
/// Implementations may be slow; the pipeline calls them once per header band,
/// time axis band and block. Lines are separated by `\n`.
pub trait TextRecognizer {
    fn recognize(&self, region: &GrayImage) -> Result<String>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&GrayImage) -> Result<String>,
{
    fn recognize(&self, region: &GrayImage) -> Result<String> {
        self(region)
    }
}
