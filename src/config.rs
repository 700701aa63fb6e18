//! Parser configuration loaded from config.json.
//!
//! Every heuristic constant used by the pipeline lives here so that it can be
//! tuned without rebuilding. Missing fields fall back to their defaults, and a
//! missing or unreadable file yields the default configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete parser configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Decode/resize/binarize settings
    pub normalize: NormalizeConfig,
    /// Schedule area location settings
    pub area: AreaConfig,
    /// Header band and time axis settings
    pub axes: AxesConfig,
    /// Event block segmentation settings
    pub blocks: BlockConfig,
    /// Text recognition engine settings
    pub ocr: OcrConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Fixed width every input is resized to
    pub target_width: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    /// Canny low hysteresis threshold
    pub canny_low: f32,
    /// Canny high hysteresis threshold
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a line
    pub hough_vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator
    pub hough_suppression_radius: u32,
    /// Minimum number of lines that indicates a grid structure
    pub min_grid_lines: usize,
    /// A candidate area must cover at least this fraction of the image width
    pub min_width_fraction: f64,
    /// A candidate area must cover at least this fraction of the image height
    pub min_height_fraction: f64,
    /// Static fallback: top fraction assumed to be the header
    pub header_margin: f64,
    /// Static fallback: left fraction assumed to be the time axis
    pub time_axis_margin: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// Fraction of the schedule area height read as the day header
    pub header_band: f64,
    /// Fraction of the schedule area width read as the time axis
    pub time_axis_band: f64,
    /// First hour of the linear window used when no time labels are found
    pub fallback_start_hour: u32,
    /// Length of that window in hours
    pub fallback_span_hours: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Pixels at or below this value count as non-background
    pub background_threshold: u8,
    /// Minimum contour area (pixel²)
    pub min_area: f64,
    /// Minimum width/height ratio
    pub min_aspect: f64,
    /// Maximum width/height ratio
    pub max_aspect: f64,
    /// Padding added around a block before recognizing its text
    pub ocr_padding: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit tesseract executable; discovered when unset
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory; discovered when unset
    pub tessdata_dir: Option<PathBuf>,
    /// Language passed with `-l`
    pub language: String,
    /// Page segmentation mode passed with `--psm`
    pub page_seg_mode: u32,
    /// Upper bound for a single recognition call (milliseconds)
    pub timeout_ms: u64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { target_width: 1600 }
    }
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 200,
            hough_suppression_radius: 8,
            min_grid_lines: 4,
            min_width_fraction: 0.5,
            min_height_fraction: 0.3,
            header_margin: 0.1,
            time_axis_margin: 0.12,
        }
    }
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            header_band: 0.1,
            time_axis_band: 0.12,
            fallback_start_hour: 6,
            fallback_span_hours: 16,
        }
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            background_threshold: 240,
            min_area: 2000.0,
            min_aspect: 0.2,
            max_aspect: 5.0,
            ocr_padding: 5,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            tessdata_dir: None,
            language: "eng".to_string(),
            // Assume a single uniform block of text
            page_seg_mode: 6,
            timeout_ms: 15_000,
        }
    }
}

impl ParserConfig {
    /// Load config from file, or return defaults if the file is missing or invalid.
    pub fn load(config_path: &Path) -> Self {
        log::debug!("Looking for config at: {}", config_path.display());

        if !config_path.exists() {
            log::info!("{} not found. Using default config.", config_path.display());
            return Self::default();
        }

        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Config loaded from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using defaults.", config_path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Save default config to file (for reference).
    pub fn save_default(config_path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(config_path, json)?;
        Ok(())
    }
}
