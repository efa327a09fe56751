//! Adaptive poster encoding under a byte-size ceiling.
//!
//! The search walks a 2D parameter space of (scale factor, quality): at each
//! scale level it sweeps quality downward, and only when quality bottoms out
//! does it give up resolution. Quality loss is visually less destructive
//! than downscaling for a printed poster, so it is spent first. A global
//! attempt cap bounds the search even with degenerate step options.
//!
//! [`AdaptiveSearch`] exposes the sweep one encode attempt at a time so a
//! single-threaded caller can yield to its scheduler between attempts;
//! [`encode_under_limit`] runs the same search to completion in one call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::jpeg::{encode_jpeg, JpegError};
use crate::bitmap::{Bitmap, FilterType};
use crate::resample::{self, ResampleError};

/// Tolerance for the quality floor comparison, so repeated 2-decimal
/// rounding cannot skip the final quality step.
const QUALITY_TOLERANCE: f64 = 1e-9;

/// Errors that can occur while setting up or running the adaptive search.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The source bitmap has no pixels.
    #[error("invalid bitmap: width ({width}) and height ({height}) must be non-zero")]
    EmptyBitmap { width: u32, height: u32 },

    /// The quality floor is above the starting quality.
    #[error("invalid options: min quality ({min}) exceeds initial quality ({initial})")]
    QualityRange { min: f64, initial: f64 },

    /// The scale floor is above the starting scale factor.
    #[error("invalid options: min scale factor ({min}) exceeds initial scale factor ({initial})")]
    ScaleRange { min: f64, initial: f64 },

    /// A quality or scale option is outside the unit interval.
    #[error("invalid options: {name} must be within (0, 1], got {value}")]
    OptionOutOfRange { name: &'static str, value: f64 },

    /// A step option would make the sweep ascend instead of descend.
    #[error("invalid options: {name} must be finite and non-negative, got {value}")]
    InvalidStep { name: &'static str, value: f64 },

    /// `step` was called after the search already produced its result.
    #[error("search has already produced its result")]
    SearchFinished,

    /// The encoding backend rejected the best-effort fallback attempt.
    ///
    /// Per-attempt rejections advance the sweep instead of aborting; this
    /// surfaces only when the backend also rejects the final encode.
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(#[source] JpegError),

    /// Resampling the working bitmap failed.
    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),
}

/// Tunables for the adaptive search.
///
/// All fields are independently overridable; the serde representation uses
/// camelCase names so a JS caller can pass a partial options object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodeOptions {
    /// Hard ceiling the result should not exceed, except on the fallback
    /// path.
    pub max_bytes: usize,
    /// Starting quality of the descending sweep, in (0, 1].
    pub initial_quality: f64,
    /// Quality floor, in (0, 1].
    pub min_quality: f64,
    /// Per-attempt quality decrement.
    pub quality_step: f64,
    /// Starting scale factor, in (0, 1].
    pub initial_scale_factor: f64,
    /// Scale floor, in (0, 1].
    pub min_scale_factor: f64,
    /// Per-level scale decrement.
    pub scale_step: f64,
    /// Global cap on encode attempts across both sweeps.
    pub max_attempts: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            // 9.5 MiB, leaving headroom under a 10 MB document budget
            max_bytes: 9_961_472,
            initial_quality: 0.72,
            min_quality: 0.40,
            quality_step: 0.04,
            initial_scale_factor: 1.0,
            min_scale_factor: 0.30,
            scale_step: 0.10,
            max_attempts: 40,
        }
    }
}

impl EncodeOptions {
    fn validate(&self) -> Result<(), EncodeError> {
        let unit_interval = [
            ("initialQuality", self.initial_quality),
            ("minQuality", self.min_quality),
            ("initialScaleFactor", self.initial_scale_factor),
            ("minScaleFactor", self.min_scale_factor),
        ];
        for (name, value) in unit_interval {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(EncodeError::OptionOutOfRange { name, value });
            }
        }
        if self.min_quality > self.initial_quality {
            return Err(EncodeError::QualityRange {
                min: self.min_quality,
                initial: self.initial_quality,
            });
        }
        if self.min_scale_factor > self.initial_scale_factor {
            return Err(EncodeError::ScaleRange {
                min: self.min_scale_factor,
                initial: self.initial_scale_factor,
            });
        }
        // Zero steps are tolerated; the attempt cap bounds the loop. A
        // negative step would ascend the sweep and break the provenance
        // invariants, so it is rejected outright.
        let steps = [
            ("qualityStep", self.quality_step),
            ("scaleStep", self.scale_step),
        ];
        for (name, value) in steps {
            if !value.is_finite() || value < 0.0 {
                return Err(EncodeError::InvalidStep { name, value });
            }
        }
        Ok(())
    }
}

/// A finished encode with its provenance.
///
/// `bytes` is authoritative: the fallback path carries no size guarantee,
/// so callers must check it against their ceiling before assuming the
/// budget was met.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPoster {
    /// JPEG-encoded payload.
    pub payload: Vec<u8>,
    /// Payload size in bytes.
    pub bytes: usize,
    /// Quality the returned payload was encoded at.
    pub quality_used: f64,
    /// Scale factor the returned payload was encoded at.
    pub scale_factor_used: f64,
    /// Pixel width of the encoded image.
    pub width: u32,
    /// Pixel height of the encoded image.
    pub height: u32,
}

/// One rejected encode attempt, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Scale factor of this attempt.
    pub scale_factor: f64,
    /// Quality of this attempt.
    pub quality: f64,
    /// Encoded size, or `None` when the backend rejected this attempt.
    pub bytes: Option<usize>,
}

/// Outcome of a single [`AdaptiveSearch::step`].
#[derive(Debug)]
pub enum StepOutcome {
    /// The attempt satisfied the byte ceiling; the search is finished.
    Accepted(EncodedPoster),
    /// The attempt exceeded the ceiling (or was rejected by the backend);
    /// the search continues.
    Rejected(AttemptRecord),
    /// The budget or scale floor is exhausted; best-effort result at the
    /// floor settings, with no size guarantee.
    Exhausted(EncodedPoster),
}

/// The adaptive search as a stepping state machine.
///
/// Each call to [`step`](Self::step) performs at most one encode attempt,
/// so a cooperative single-threaded driver can yield between calls. The
/// working bitmap for a scale level is materialized once and reused across
/// that level's quality sweep; peak memory is the original plus one working
/// copy.
pub struct AdaptiveSearch<'a> {
    source: &'a Bitmap,
    opts: EncodeOptions,
    scale_factor: f64,
    quality: f64,
    attempts: u32,
    working: Option<Bitmap>,
    at_level_boundary: bool,
    finished: bool,
}

impl<'a> AdaptiveSearch<'a> {
    /// Validate inputs and position the search at the first attempt.
    pub fn new(bitmap: &'a Bitmap, options: EncodeOptions) -> Result<Self, EncodeError> {
        if bitmap.is_empty() {
            return Err(EncodeError::EmptyBitmap {
                width: bitmap.width,
                height: bitmap.height,
            });
        }
        options.validate()?;
        Ok(Self {
            source: bitmap,
            scale_factor: options.initial_scale_factor,
            quality: options.initial_quality,
            attempts: 0,
            working: None,
            at_level_boundary: true,
            finished: false,
            opts: options,
        })
    }

    /// Encode attempts performed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The validated options this search runs with.
    pub fn options(&self) -> &EncodeOptions {
        &self.opts
    }

    /// Advance the search by one encode attempt.
    ///
    /// Returns [`StepOutcome::Rejected`] while the sweep continues, and
    /// [`StepOutcome::Accepted`] or [`StepOutcome::Exhausted`] exactly once.
    /// Calling `step` again after that returns
    /// [`EncodeError::SearchFinished`].
    pub fn step(&mut self) -> Result<StepOutcome, EncodeError> {
        if self.finished {
            return Err(EncodeError::SearchFinished);
        }
        loop {
            if self.at_level_boundary {
                if self.scale_factor < self.opts.min_scale_factor
                    || self.attempts >= self.opts.max_attempts
                {
                    return self.fallback().map(StepOutcome::Exhausted);
                }
                self.quality = self.opts.initial_quality;
                self.working = None;
                self.at_level_boundary = false;
            }
            if self.quality >= self.opts.min_quality - QUALITY_TOLERANCE
                && self.attempts < self.opts.max_attempts
            {
                return self.attempt();
            }
            // Quality sweep at this level is over; drop one scale step. The
            // decrement runs even when the sweep ended on the attempt cap,
            // so the fallback sees the post-decrement value.
            self.scale_factor = round_2dp(self.scale_factor - self.opts.scale_step);
            self.at_level_boundary = true;
        }
    }

    fn attempt(&mut self) -> Result<StepOutcome, EncodeError> {
        self.attempts += 1;
        if self.scale_factor < 1.0 && self.working.is_none() {
            self.working = Some(resample::downscale(
                self.source,
                self.scale_factor,
                FilterType::Bilinear,
            )?);
        }
        let bitmap = self.working.as_ref().unwrap_or(self.source);
        let (width, height) = (bitmap.width, bitmap.height);
        let encoded = encode_jpeg(&bitmap.pixels, width, height, jpeg_quality(self.quality));

        match encoded {
            Ok(payload) => {
                let bytes = payload.len();
                if bytes <= self.opts.max_bytes {
                    self.finished = true;
                    self.working = None;
                    return Ok(StepOutcome::Accepted(EncodedPoster {
                        payload,
                        bytes,
                        quality_used: self.quality,
                        scale_factor_used: self.scale_factor,
                        width,
                        height,
                    }));
                }
                let record = AttemptRecord {
                    attempt: self.attempts,
                    scale_factor: self.scale_factor,
                    quality: self.quality,
                    bytes: Some(bytes),
                };
                self.quality = round_2dp(self.quality - self.opts.quality_step);
                Ok(StepOutcome::Rejected(record))
            }
            // A rejection at one quality level does not imply rejection at
            // the next; advance the sweep instead of aborting.
            Err(_) => {
                let record = AttemptRecord {
                    attempt: self.attempts,
                    scale_factor: self.scale_factor,
                    quality: self.quality,
                    bytes: None,
                };
                self.quality = round_2dp(self.quality - self.opts.quality_step);
                Ok(StepOutcome::Rejected(record))
            }
        }
    }

    /// Best-effort encode at the floor settings, returned unconditionally.
    fn fallback(&mut self) -> Result<EncodedPoster, EncodeError> {
        self.finished = true;
        self.working = None;

        let final_scale = self.scale_factor.max(self.opts.min_scale_factor);
        let scaled;
        let bitmap = if final_scale < 1.0 {
            scaled = resample::downscale(self.source, final_scale, FilterType::Bilinear)?;
            &scaled
        } else {
            self.source
        };

        let payload = encode_jpeg(
            &bitmap.pixels,
            bitmap.width,
            bitmap.height,
            jpeg_quality(self.opts.min_quality),
        )
        .map_err(EncodeError::EncodingFailed)?;

        Ok(EncodedPoster {
            bytes: payload.len(),
            payload,
            quality_used: self.opts.min_quality,
            scale_factor_used: final_scale,
            width: bitmap.width,
            height: bitmap.height,
        })
    }
}

/// Run the adaptive search to completion.
///
/// Returns the first attempt that satisfies `options.max_bytes`, or the
/// best-effort fallback result when the attempt budget or scale floor is
/// exhausted. The search path is deterministic: identical inputs produce
/// identical provenance and payload.
///
/// # Errors
///
/// Returns [`EncodeError::EmptyBitmap`] or an option-validation variant
/// before any attempt, and [`EncodeError::EncodingFailed`] only when the
/// backend persistently rejects the image.
pub fn encode_under_limit(
    bitmap: &Bitmap,
    options: EncodeOptions,
) -> Result<EncodedPoster, EncodeError> {
    let mut search = AdaptiveSearch::new(bitmap, options)?;
    loop {
        match search.step()? {
            StepOutcome::Accepted(result) | StepOutcome::Exhausted(result) => return Ok(result),
            StepOutcome::Rejected(_) => {}
        }
    }
}

/// Round to 2 decimal places, keeping the descending sweeps free of
/// floating drift.
fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map a unit-interval quality to the codec's 1-100 integer scale.
fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}


// ============================================================================
// Property-Based Tests
// ============================================================================
