//! PosterPress WASM - WebAssembly bindings for PosterPress
//!
//! This crate exposes the posterpress-core export pipeline to
//! JavaScript/TypeScript applications and carries the browser-side
//! orchestration the core deliberately leaves out.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for bitmaps and encode results
//! - `encode` - Adaptive encode bindings (yield-per-attempt driver)
//! - `export` - The full export sequence (image waits, capture hook, PDF
//!   download, print fallback)
//!
//! # Usage
//!
//! ```typescript
//! import init, { export_poster } from '@posterpress/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const capture = (el, scale) => html2canvas(el, { scale, useCORS: true });
//! button.addEventListener('click', () => {
//!   export_poster(posterRegion, capture, undefined, (busy) => {
//!     button.disabled = busy;
//!   });
//! });
//! ```

use wasm_bindgen::prelude::*;

mod encode;
mod export;
mod types;

// Re-export public types
pub use encode::encode_poster_under_limit;
pub use export::{export_poster, wait_for_images, ExportOptions};
pub use types::{JsBitmap, JsEncodedPoster};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
