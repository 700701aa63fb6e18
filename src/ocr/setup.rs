use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract use its compiled-in data path
    pub tessdata: Option<PathBuf>,
}

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const COMMON_INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(windows)]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Returns the per-user directory for Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grid-schedule-parser")
        .join("tesseract")
}

/// Resolves the executable and language data for the configured language.
pub fn resolve(config: &OcrConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);
    match &tessdata {
        Some(dir) => log::debug!("Using tessdata at {}", dir.display()),
        None => log::debug!(
            "No {}.traineddata found, relying on Tesseract's default data path",
            config.language
        ),
    }
    Ok(TesseractPaths { executable, tessdata })
}

/// Finds the Tesseract executable.
///
/// Checks the configured path, then the per-user directory, then `PATH`, then
/// common install locations.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "Configured Tesseract path {} does not exist, searching elsewhere",
            path.display()
        );
    }

    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in COMMON_INSTALL_DIRS {
        let p = Path::new(dir).join(EXECUTABLE_NAME);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing `<language>.traineddata`.
pub fn find_tessdata_dir(configured: Option<&Path>, language: &str) -> Option<PathBuf> {
    let traineddata = format!("{}.traineddata", language);
    let has_data = |p: &Path| p.join(&traineddata).exists();

    if let Some(dir) = configured {
        if has_data(dir) {
            return Some(dir.to_path_buf());
        }
    }

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_data(&p) {
            return Some(p);
        }
        let p = p.join("tessdata");
        if has_data(&p) {
            return Some(p);
        }
    }

    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_data(&local_tessdata) {
        return Some(local_tessdata);
    }

    SYSTEM_TESSDATA_DIRS
        .iter()
        .map(PathBuf::from)
        .find(|p| has_data(p))
}
