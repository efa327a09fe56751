//! Bitmap downscaling for the adaptive encode sweep.
//!
//! The adaptive encoder trades resolution for size by resampling the source
//! bitmap at a unit-interval scale factor. All functions return new
//! [`Bitmap`] instances without modifying the input.

use thiserror::Error;

use crate::bitmap::{Bitmap, FilterType};

/// Errors that can occur during resampling.
#[derive(Debug, Error)]
pub enum ResampleError {
    /// The scale factor is not usable.
    #[error("scale factor must be finite and in (0, 1], got {0}")]
    InvalidFactor(f64),

    /// The source bitmap has no pixels.
    #[error("cannot resample an empty bitmap")]
    EmptyBitmap,

    /// The source pixel buffer does not match its declared dimensions.
    #[error("pixel buffer does not match bitmap dimensions")]
    CorruptPixelBuffer,
}

/// Dimensions after scaling by `factor`, rounded with a 1-pixel floor.
///
/// Both dimensions are `round(dim * factor)` clamped to a minimum of 1 so a
/// tiny factor can never produce a zero-area bitmap.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let w = ((f64::from(width) * factor).round() as u32).max(1);
    let h = ((f64::from(height) * factor).round() as u32).max(1);
    (w, h)
}

/// Produce a scaled-down copy of `bitmap` at `factor` times its dimensions.
///
/// # Arguments
///
/// * `bitmap` - The source bitmap
/// * `factor` - Scale factor, finite and in (0, 1]
/// * `filter` - Interpolation filter to use
///
/// # Errors
///
/// Returns [`ResampleError::InvalidFactor`] for factors outside (0, 1],
/// [`ResampleError::EmptyBitmap`] for a zero-area source, and
/// [`ResampleError::CorruptPixelBuffer`] when the pixel buffer length does
/// not match the declared dimensions.
pub fn downscale(bitmap: &Bitmap, factor: f64, filter: FilterType) -> Result<Bitmap, ResampleError> {
    if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
        return Err(ResampleError::InvalidFactor(factor));
    }
    if bitmap.is_empty() {
        return Err(ResampleError::EmptyBitmap);
    }

    // Fast path: factor 1.0 is the identity
    if factor == 1.0 {
        return Ok(bitmap.clone());
    }

    let rgb_image = bitmap
        .to_rgb_image()
        .ok_or(ResampleError::CorruptPixelBuffer)?;

    let (width, height) = scaled_dimensions(bitmap.width, bitmap.height, factor);
    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

    Ok(Bitmap::from_rgb_image(resized))
}
