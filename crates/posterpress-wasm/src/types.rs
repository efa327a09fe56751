//! WASM-compatible wrapper types for poster data.
//!
//! This module provides JavaScript-friendly types that wrap the core
//! PosterPress types, handling the conversion between Rust and JavaScript
//! data representations.

use posterpress_core::{Bitmap, EncodedPoster};
use wasm_bindgen::prelude::*;

/// Drop the alpha channel of canvas `ImageData` pixels.
///
/// The poster is rendered on an opaque white background, so alpha carries
/// no information by the time the region is captured.
pub(crate) fn rgb_from_rgba(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

/// A captured poster bitmap for JavaScript.
///
/// Wraps the core `Bitmap` type: RGB pixel data (3 bytes per pixel,
/// row-major order) plus dimensions. Pixel data lives in WASM memory; the
/// `pixels()` getter copies it out to a `Uint8Array`.
#[wasm_bindgen]
pub struct JsBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsBitmap {
    /// Create a new JsBitmap from dimensions and RGB pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsBitmap {
        JsBitmap {
            width,
            height,
            pixels,
        }
    }

    /// Create a JsBitmap from RGBA pixel data in canvas `ImageData` order.
    ///
    /// The alpha channel is dropped. Returns an error when the buffer
    /// length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<JsBitmap, JsValue> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(JsValue::from_str(&format!(
                "invalid RGBA data: expected {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(JsBitmap {
            width,
            height,
            pixels: rgb_from_rgba(rgba),
        })
    }

    /// Get the bitmap width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the bitmap height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsBitmap {
    /// Convert to a core Bitmap for the encode pipeline.
    ///
    /// Note: This clones the pixel data.
    pub(crate) fn to_bitmap(&self) -> Bitmap {
        Bitmap::new(self.width, self.height, self.pixels.clone())
    }
}

/// Result of an adaptive poster encode for JavaScript.
///
/// Carries the JPEG payload plus its provenance: the quality and scale
/// factor the search settled on, the payload size, and the encoded pixel
/// dimensions. `bytes` is authoritative: a fallback result may exceed the
/// requested ceiling.
#[wasm_bindgen]
pub struct JsEncodedPoster {
    payload: Vec<u8>,
    bytes: usize,
    quality_used: f64,
    scale_factor_used: f64,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsEncodedPoster {
    /// JPEG-encoded payload as a Uint8Array (copied out of WASM memory).
    pub fn payload(&self) -> Vec<u8> {
        self.payload.clone()
    }

    /// Payload size in bytes
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Quality the payload was encoded at
    #[wasm_bindgen(getter)]
    pub fn quality_used(&self) -> f64 {
        self.quality_used
    }

    /// Scale factor the payload was encoded at
    #[wasm_bindgen(getter)]
    pub fn scale_factor_used(&self) -> f64 {
        self.scale_factor_used
    }

    /// Pixel width of the encoded image
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height of the encoded image
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl JsEncodedPoster {
    /// Wrap a core result for handing to JavaScript.
    pub(crate) fn from_result(result: EncodedPoster) -> Self {
        Self {
            payload: result.payload,
            bytes: result.bytes,
            quality_used: result.quality_used,
            scale_factor_used: result.scale_factor_used,
            width: result.width,
            height: result.height,
        }
    }
}


/// WASM-specific tests that require JsValue.
///
/// These run only on wasm32 targets via `wasm-pack test`.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_from_rgba_valid() {
        let rgba = vec![128u8; 10 * 10 * 4];
        let bitmap = JsBitmap::from_rgba(10, 10, &rgba).unwrap();
        assert_eq!(bitmap.byte_length(), 10 * 10 * 3);
    }

    #[wasm_bindgen_test]
    fn test_from_rgba_length_mismatch() {
        let rgba = vec![128u8; 10];
        assert!(JsBitmap::from_rgba(10, 10, &rgba).is_err());
    }
}
