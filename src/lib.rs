//! Grid schedule parser.
//!
//! Extracts weekly class blocks from a screenshot of a calendar grid
//! (days across, hours down). The pipeline is geometric: it locates the grid,
//! splits it into 7 day columns, anchors the time axis, segments colored
//! event blocks, and reads each block through a pluggable [`ocr::TextRecognizer`].

pub mod config;
pub mod debug;
pub mod error;
pub mod imaging;
pub mod layout;
pub mod ocr;
pub mod paths;
pub mod pipeline;
pub mod response;
pub mod schedule;

pub use config::ParserConfig;
pub use error::ParseError;
pub use pipeline::{parse_grid_schedule, GridScheduleParser, ParseResult};
pub use response::finalize;
