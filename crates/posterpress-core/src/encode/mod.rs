//! Poster encoding pipeline.
//!
//! This module provides functionality for:
//! - Encoding bitmaps to JPEG format with configurable quality
//! - Adaptively re-encoding a poster bitmap under a byte-size ceiling
//!
//! # Architecture
//!
//! The JPEG primitive and the adaptive search are pure and synchronous;
//! cooperative yielding between attempts is the driver's concern (see the
//! wasm bindings). All operations are single-threaded.

mod adaptive;
mod jpeg;

pub use adaptive::{
    encode_under_limit, AdaptiveSearch, AttemptRecord, EncodeError, EncodeOptions, EncodedPoster,
    StepOutcome,
};
pub use jpeg::{encode_jpeg, JpegError};
