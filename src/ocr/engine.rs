use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::fs;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

use super::setup::{self, TesseractPaths};
use super::TextRecognizer;
use crate::config::OcrConfig;

/// Represents a line of OCR text with confidence score
#[derive(Debug, Clone)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
    pub confidence: f32,
}

/// Represents a single word from OCR with confidence score
#[derive(Debug, Clone)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Text recognizer backed by the Tesseract command line tool.
pub struct TesseractRecognizer {
    paths: TesseractPaths,
    language: String,
    page_seg_mode: u32,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let paths = setup::resolve(config)?;
        log::info!("Tesseract found at: {}", paths.executable.display());
        Ok(Self {
            paths,
            language: config.language.clone(),
            page_seg_mode: config.page_seg_mode,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Runs `tesseract --version` to confirm the engine actually starts.
    pub fn check(&self) -> Result<String> {
        let output = Command::new(&self.paths.executable)
            .arg("--version")
            .output()
            .context("Failed to start Tesseract")?;
        if !output.status.success() {
            return Err(anyhow!("Tesseract --version exited with {}", output.status));
        }
        // Older builds print the version on stderr
        let text = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&text)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Runs Tesseract on a grayscale region.
    /// Returns structured output with lines and confidence scores.
    pub fn recognize_lines(&self, img: &GrayImage) -> Result<Vec<OcrLine>> {
        if img.width() == 0 || img.height() == 0 {
            return Ok(Vec::new());
        }

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();
        let stderr_file = NamedTempFile::new()?;

        let mut command = Command::new(&self.paths.executable);
        command.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata) = &self.paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        command
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file.reopen()?));

        let mut child = command.spawn().context("Failed to start Tesseract")?;
        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!(
                    "Tesseract timed out after {}ms",
                    self.timeout.as_millis()
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let stderr = fs::read_to_string(stderr_file.path()).unwrap_or_default();
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = fs::remove_file(&tsv_path);

        let lines = parse_tsv_output(&tsv_content);
        for line in &lines {
            log::debug!("OCR line ({:.0}%): {}", line.confidence, line.text);
        }
        Ok(lines)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &GrayImage) -> Result<String> {
        let lines = self.recognize_lines(region)?;
        Ok(lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Parses Tesseract TSV output into structured OcrLine data.
///
/// Words are grouped by their (block, paragraph, line) numbers so lines from
/// different blocks never merge. Words with negative confidence are dropped.
pub fn parse_tsv_output(tsv: &str) -> Vec<OcrLine> {
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<OcrWord> = Vec::new();

    // Skip header
    for row in tsv.lines().skip(1) {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let key: (i32, i32, i32) = (
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() {
            continue;
        }

        if current_key.is_some_and(|k| k != key) {
            flush_line(&mut lines, std::mem::take(&mut current_words));
        }
        current_key = Some(key);

        if conf >= 0.0 {
            current_words.push(OcrWord {
                text: text.to_string(),
                confidence: conf,
            });
        }
    }

    flush_line(&mut lines, current_words);
    lines
}

fn flush_line(lines: &mut Vec<OcrLine>, words: Vec<OcrWord>) {
    if words.is_empty() {
        return;
    }
    let confidence = words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32;
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(OcrLine {
        text,
        words,
        confidence,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word(block: i32, line: i32, conf: f32, text: &str) -> String {
        format!("5\t1\t{}\t1\t{}\t1\t0\t0\t10\t10\t{}\t{}", block, line, conf, text)
    }

    #[test]
    fn test_parse_tsv_groups_lines() {
        let tsv = [
            HEADER.to_string(),
            "1\t1\t0\t0\t0\t0\t0\t0\t100\t100\t-1\t".to_string(),
            word(1, 1, 90.0, "CS"),
            word(1, 1, 80.0, "101"),
            word(1, 2, 70.0, "Room"),
            word(1, 2, 60.0, "204"),
        ]
        .join("\n");

        let lines = parse_tsv_output(&tsv);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "CS 101");
        assert!((lines[0].confidence - 85.0).abs() < 0.01);
        assert_eq!(lines[1].text, "Room 204");
        assert_eq!(lines[1].words.len(), 2);
    }

    #[test]
    fn test_parse_tsv_separates_blocks_with_same_line_number() {
        let tsv = [HEADER.to_string(), word(1, 1, 90.0, "MON"), word(2, 1, 90.0, "TUE")].join("\n");

        let lines = parse_tsv_output(&tsv);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["MON", "TUE"]);
    }

    #[test]
    fn test_parse_tsv_skips_bad_rows() {
        let tsv = [
            HEADER.to_string(),
            "garbage".to_string(),
            word(1, 1, -1.0, "ghost"),
            word(1, 1, 50.0, "  "),
        ]
        .join("\n");

        assert!(parse_tsv_output(&tsv).is_empty());
        assert!(parse_tsv_output("").is_empty());
    }
}
