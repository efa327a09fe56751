//! Poster export orchestration for the browser.
//!
//! The full sequence behind the download button: wait for every image in
//! the capture region to settle, rasterize the region through the page's
//! capture hook, adaptively encode the bitmap under the byte ceiling, wrap
//! the payload in a one-page landscape-A4 PDF, and trigger a download.
//! Any failure after the busy state flips on degrades to the platform
//! print dialog, so the user is never left without output.

use js_sys::{Array, Function, Promise, Uint8Array};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, Element, HtmlAnchorElement,
    HtmlCanvasElement, HtmlImageElement, Url,
};

use posterpress_core::{pdf, Bitmap, EncodeOptions};

use crate::encode::run_search;
use crate::types::rgb_from_rgba;

/// Export tunables, parsed from a partial camelCase JS object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Capture resolution multiplier handed to the capture hook.
    pub scale: f64,
    /// File name of the downloaded document.
    pub file_name: String,
    /// Adaptive encoder tunables.
    pub encode: EncodeOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.5,
            file_name: "poster.pdf".to_string(),
            encode: EncodeOptions::default(),
        }
    }
}

pub(crate) fn parse_export_options(options: JsValue) -> Result<ExportOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(ExportOptions::default());
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Suspend until the next macrotask so the UI thread can breathe.
pub(crate) async fn yield_to_event_loop() {
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .map(|window| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
                    .is_ok()
            })
            .unwrap_or(false);
        if !scheduled {
            // No scheduler available (e.g. a worker without a window):
            // resolve immediately rather than hang
            resolve.call0(&JsValue::NULL).ok();
        }
    });
    JsFuture::from(promise).await.ok();
}

/// Wait until every image under `root` has finished loading or failed.
///
/// An error counts as loaded so a broken image cannot stall the export.
/// There is deliberately no timeout: an image that never settles holds the
/// export open. Keep permanently-pending resources out of the capture
/// region.
#[wasm_bindgen]
pub async fn wait_for_images(root: Element) -> Result<(), JsValue> {
    await_images(&root).await
}

async fn await_images(root: &Element) -> Result<(), JsValue> {
    let images = root.query_selector_all("img")?;
    let pending = Array::new();

    for index in 0..images.length() {
        let Some(node) = images.get(index) else {
            continue;
        };
        let Ok(img) = node.dyn_into::<HtmlImageElement>() else {
            continue;
        };

        let has_source = !img.current_src().is_empty()
            || img
                .get_attribute("src")
                .map(|src| !src.trim().is_empty())
                .unwrap_or(false);
        if !has_source {
            continue;
        }
        if img.complete() && img.natural_width() > 0 {
            continue;
        }

        // Load-or-error race; the promise resolves either way
        let promise = Promise::new(&mut |resolve, _reject| {
            img.add_event_listener_with_callback("load", &resolve).ok();
            img.add_event_listener_with_callback("error", &resolve).ok();
        });
        pending.push(&promise);
    }

    if pending.length() > 0 {
        JsFuture::from(Promise::all(&pending)).await?;
    }
    Ok(())
}

/// Run the whole export sequence for the poster region `root`.
///
/// `capture` is the page's rasterization hook,
/// `(element, scale) => Promise<HTMLCanvasElement>` (e.g. a thin wrapper
/// over html2canvas). `options` is a partial camelCase [`ExportOptions`]
/// object. `on_state`, when given, is called with `true` before work
/// starts and `false` once the export settles, so the caller can drive a
/// busy indicator and disable the trigger button; the encoder itself does
/// not guard against concurrent exports.
///
/// On any failure after the busy state flips on, the error is logged and
/// the platform print dialog is opened instead.
#[wasm_bindgen]
pub async fn export_poster(
    root: Element,
    capture: Function,
    options: JsValue,
    on_state: Option<Function>,
) -> Result<(), JsValue> {
    let options = parse_export_options(options)?;

    set_busy(&on_state, true);
    let outcome = run_export(&root, &capture, &options).await;
    set_busy(&on_state, false);

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => fall_back_to_print(err),
    }
}

async fn run_export(
    root: &Element,
    capture: &Function,
    options: &ExportOptions,
) -> Result<(), JsValue> {
    await_images(root).await?;

    let promise: Promise = capture
        .call2(&JsValue::NULL, root.as_ref(), &JsValue::from_f64(options.scale))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("capture hook must return a promise"))?;
    let canvas: HtmlCanvasElement = JsFuture::from(promise)
        .await?
        .dyn_into()
        .map_err(|_| JsValue::from_str("capture hook did not produce a canvas"))?;

    let bitmap = bitmap_from_canvas(&canvas)?;
    let result = run_search(&bitmap, options.encode.clone()).await?;

    let document = pdf::poster_document(&result.payload, result.width, result.height)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    trigger_download(&options.file_name, &document)
}

/// Read the captured canvas back as an RGB bitmap.
fn bitmap_from_canvas(canvas: &HtmlCanvasElement) -> Result<Bitmap, JsValue> {
    let width = canvas.width();
    let height = canvas.height();
    if width == 0 || height == 0 {
        return Err(JsValue::from_str("captured canvas is empty"));
    }

    let context: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into()
        .map_err(|_| JsValue::from_str("context cast failed"))?;
    let image_data = context.get_image_data(0.0, 0.0, f64::from(width), f64::from(height))?;
    let rgba = image_data.data();

    Ok(Bitmap::new(width, height, rgb_from_rgba(&rgba)))
}

/// Hand the document to the browser as a named download.
fn trigger_download(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
    let array = Uint8Array::from(bytes);
    let parts = Array::new();
    parts.push(&array.buffer());

    let mut blob_options = BlobPropertyBag::new();
    blob_options.type_("application/pdf");
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &blob_options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into()
        .map_err(|_| JsValue::from_str("anchor cast failed"))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.style().set_property("display", "none").ok();

    document
        .body()
        .ok_or_else(|| JsValue::from_str("missing body"))?
        .append_child(&anchor)
        .ok();
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url).ok();

    Ok(())
}

fn set_busy(on_state: &Option<Function>, busy: bool) {
    if let Some(callback) = on_state {
        callback
            .call1(&JsValue::NULL, &JsValue::from_bool(busy))
            .ok();
    }
}

/// Last-resort output path: log the failure and open the print dialog.
fn fall_back_to_print(err: JsValue) -> Result<(), JsValue> {
    web_sys::console::error_2(
        &JsValue::from_str("poster export failed, falling back to print:"),
        &err,
    );
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    window.print()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_options_defaults() {
        let options = ExportOptions::default();

        assert_eq!(options.scale, 1.5);
        assert_eq!(options.file_name, "poster.pdf");
        assert_eq!(options.encode, EncodeOptions::default());
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
    fn test_parse_export_options_undefined_is_default() {
        let options = parse_export_options(JsValue::UNDEFINED).unwrap();
        assert_eq!(options, ExportOptions::default());
    }

    #[wasm_bindgen_test]
    fn test_parse_export_options_partial_override() {
        let object = js_sys::Object::new();
        js_sys::Reflect::set(
            &object,
            &JsValue::from_str("fileName"),
            &JsValue::from_str("spring-poster.pdf"),
        )
        .unwrap();

        let options = parse_export_options(object.into()).unwrap();
        assert_eq!(options.file_name, "spring-poster.pdf");
        assert_eq!(options.scale, 1.5);
    }

    #[wasm_bindgen_test]
    async fn test_yield_to_event_loop_resolves() {
        // Must settle, not hang
        yield_to_event_loop().await;
    }

    #[wasm_bindgen_test]
    async fn test_wait_for_images_empty_region() {
        let document = web_sys::window().unwrap().document().unwrap();
        let root = document.create_element("div").unwrap();
        wait_for_images(root).await.unwrap();
    }

    #[wasm_bindgen_test]
    async fn test_wait_for_images_srcless_image_is_skipped() {
        let document = web_sys::window().unwrap().document().unwrap();
        let root = document.create_element("div").unwrap();
        let img = document.create_element("img").unwrap();
        root.append_child(&img).unwrap();

        // An <img> with no source never fires load; it must not stall
        wait_for_images(root).await.unwrap();
    }
}
