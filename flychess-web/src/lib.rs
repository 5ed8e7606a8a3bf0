#![forbid(unsafe_code)]
//! Browser bindings for Flying Chess.
//!
//! Supplies `localStorage`, `Date.now()` and bundled task content to the
//! platform-agnostic engine and exposes it to JavaScript as [`FlyingChess`].
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod content;
pub mod dom;
pub mod handle;
pub mod storage;

pub use content::WebTaskSource;
pub use handle::FlyingChess;
pub use storage::{BrowserClock, LocalStorageStore, WebStorageError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    log::debug!("flychess-web loaded");
}
