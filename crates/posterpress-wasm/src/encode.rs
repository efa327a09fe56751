//! Adaptive encode WASM bindings.
//!
//! This module exposes the adaptive poster encoder to JavaScript. The
//! search itself is the pure state machine in `posterpress-core`; this
//! layer drives it one attempt per macrotask so a multi-second search
//! leaves the page interactive, and carries the per-attempt console
//! diagnostics so the core stays logging-free.

use posterpress_core::{AdaptiveSearch, Bitmap, EncodeOptions, EncodedPoster, StepOutcome};
use wasm_bindgen::prelude::*;

use crate::export::yield_to_event_loop;
use crate::types::{JsBitmap, JsEncodedPoster};

/// Parse a partial camelCase options object, treating `undefined`/`null`
/// as "all defaults".
pub(crate) fn parse_encode_options(options: JsValue) -> Result<EncodeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(EncodeOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Drive the adaptive search to completion, yielding to the event loop
/// before every encode attempt.
pub(crate) async fn run_search(
    bitmap: &Bitmap,
    options: EncodeOptions,
) -> Result<EncodedPoster, JsValue> {
    let mut search =
        AdaptiveSearch::new(bitmap, options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    loop {
        yield_to_event_loop().await;
        match search.step().map_err(|e| JsValue::from_str(&e.to_string()))? {
            StepOutcome::Accepted(result) => {
                web_sys::console::log_1(
                    &format!(
                        "poster export: using scale={:.2}, quality={:.2}, bytes={}",
                        result.scale_factor_used, result.quality_used, result.bytes
                    )
                    .into(),
                );
                return Ok(result);
            }
            StepOutcome::Exhausted(result) => {
                web_sys::console::warn_1(
                    &format!(
                        "poster export fallback: scale={:.2}, quality={:.2}, bytes={}",
                        result.scale_factor_used, result.quality_used, result.bytes
                    )
                    .into(),
                );
                return Ok(result);
            }
            StepOutcome::Rejected(record) => {
                let bytes = record
                    .bytes
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "rejected".to_string());
                web_sys::console::debug_1(
                    &format!(
                        "poster encode attempt {}: scale={:.2}, quality={:.2}, bytes={bytes}",
                        record.attempt, record.scale_factor, record.quality
                    )
                    .into(),
                );
            }
        }
    }
}

/// Adaptively encode a captured poster bitmap to JPEG under a byte ceiling.
///
/// `options` is a partial camelCase object mirroring the core
/// `EncodeOptions` (e.g. `{ maxBytes: 9961472, initialQuality: 0.72 }`);
/// pass `undefined` for the export defaults. The returned
/// [`JsEncodedPoster`] carries the payload and the provenance of the
/// attempt that satisfied the ceiling, or of the best-effort fallback, so
/// check `bytes` before assuming the budget was met.
#[wasm_bindgen]
pub async fn encode_poster_under_limit(
    bitmap: JsBitmap,
    options: JsValue,
) -> Result<JsEncodedPoster, JsValue> {
    let options = parse_encode_options(options)?;
    let source = bitmap.to_bitmap();
    let result = run_search(&source, options).await?;
    Ok(JsEncodedPoster::from_result(result))
}

/// Tests for encode bindings.
///
/// Most binding functions return `Result<T, JsValue>` or await browser
/// promises, which only work on wasm32 targets; the underlying search is
/// covered in `posterpress_core::encode`. These tests pin the conversion
/// seams that run on all targets.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_bitmap_feeds_core_search() {
        let bitmap = JsBitmap::new(32, 32, vec![128u8; 32 * 32 * 3]);

        let result =
            posterpress_core::encode_under_limit(&bitmap.to_bitmap(), EncodeOptions::default())
                .unwrap();

        assert_eq!(result.quality_used, 0.72);
        assert_eq!(result.scale_factor_used, 1.0);
        assert_eq!(&result.payload[0..2], &[0xFF, 0xD8]);
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
    fn test_parse_encode_options_undefined_is_default() {
        let options = parse_encode_options(JsValue::UNDEFINED).unwrap();
        assert_eq!(options, EncodeOptions::default());
    }

    #[wasm_bindgen_test]
    fn test_parse_encode_options_partial_override() {
        let object = js_sys::Object::new();
        js_sys::Reflect::set(
            &object,
            &JsValue::from_str("maxBytes"),
            &JsValue::from_f64(1234.0),
        )
        .unwrap();

        let options = parse_encode_options(object.into()).unwrap();
        assert_eq!(options.max_bytes, 1234);
        assert_eq!(options.initial_quality, 0.72);
    }

    #[wasm_bindgen_test]
    async fn test_encode_poster_under_limit_solid_bitmap() {
        let bitmap = JsBitmap::new(40, 40, vec![128u8; 40 * 40 * 3]);
        let result = encode_poster_under_limit(bitmap, JsValue::UNDEFINED)
            .await
            .unwrap();

        assert_eq!(result.quality_used(), 0.72);
        assert_eq!(result.scale_factor_used(), 1.0);
        assert!(result.bytes() > 0);
    }
}
