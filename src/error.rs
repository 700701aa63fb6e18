//! Fatal errors of the schedule parser.
//!
//! Everything else the pipeline runs into (missing grid lines, unreadable
//! headers, OCR failures, zero blocks) degrades into warnings instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    /// The caller handed over zero bytes.
    #[error("Empty image data received")]
    EmptyInput,

    /// Neither the primary nor the single-channel fallback decoder accepted the bytes.
    #[error(
        "Failed to decode image ({primary}; fallback: {fallback}). \
         Please ensure the file is a valid image format (PNG, JPG, etc.)"
    )]
    Undecodable {
        /// Error reported by the primary color decode
        primary: String,
        /// Summary of the fallback decode attempts
        fallback: String,
    },
}
