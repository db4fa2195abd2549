//! Trim and decimate the frame rate of .bvh motion capture files.
//!
//! ```no_run
//! use bvh_frame_reducer::decimate::decimate_str;
//! use bvh_frame_reducer::types::ReduceParams;
//!
//! let text = std::fs::read_to_string("take.bvh")?;
//! let params = ReduceParams { skip_frames_start: 1080, skip_frames_end: 600, ..ReduceParams::default() };
//! let (reduced, summary) = decimate_str(&text, &params)?;
//! assert_eq!(summary.stride, 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod decimate;
pub mod error;
pub mod manifest;
pub mod parse;
pub mod types;
mod utils;

pub use error::{BvhError, BvhResult};
