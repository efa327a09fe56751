//! PosterPress Core - Poster export pipeline
//!
//! This crate provides the core logic for the poster export pipeline:
//! adaptive JPEG encoding under a byte-size ceiling, bitmap resampling for
//! the quality/scale search, and single-page PDF assembly. It has no DOM,
//! scheduler, or logging dependency; the browser orchestration lives in the
//! companion wasm crate.

pub mod bitmap;
pub mod encode;
pub mod pdf;
pub mod resample;

pub use bitmap::{Bitmap, FilterType};
pub use encode::{
    encode_under_limit, AdaptiveSearch, AttemptRecord, EncodeError, EncodeOptions, EncodedPoster,
    StepOutcome,
};
pub use pdf::{poster_document, PdfError};
pub use resample::{downscale, scaled_dimensions, ResampleError};

#[cfg(test)]
mod tests {
    use super::*;

    // The full pipeline as the wasm layer drives it: encode under the
    // ceiling, then wrap the payload in the document.
    #[test]
    fn test_encode_then_embed() {
        let bitmap = Bitmap::new(64, 40, vec![180u8; 64 * 40 * 3]);
        let result = encode_under_limit(&bitmap, EncodeOptions::default()).unwrap();
        let pdf = poster_document(&result.payload, result.width, result.height).unwrap();

        assert!(result.bytes <= EncodeOptions::default().max_bytes);
        assert!(pdf.starts_with(b"%PDF-1.7\n"));
    }

    #[test]
    fn test_defaults_match_export_preset() {
        let options = EncodeOptions::default();

        assert_eq!(options.max_bytes, 9_961_472);
        assert_eq!(options.initial_quality, 0.72);
        assert_eq!(options.min_quality, 0.40);
        assert_eq!(options.quality_step, 0.04);
        assert_eq!(options.initial_scale_factor, 1.0);
        assert_eq!(options.min_scale_factor, 0.30);
        assert_eq!(options.scale_step, 0.10);
        assert_eq!(options.max_attempts, 40);
    }
}
