//! `localStorage` and `Date.now()` implementations of the engine seams.
use flychess_game::{Clock, KvStore};
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
    #[error("localStorage rejected the operation: {0}")]
    Rejected(String),
}

impl WebStorageError {
    fn rejected(value: &JsValue) -> Self {
        let message = dom::js_error_message(value);
        dom::console_warn(&format!("localStorage: {message}"));
        Self::Rejected(message)
    }
}

/// [`KvStore`] over `window.localStorage`. The handle is looked up on every
/// call so a store created before the page allows storage still works later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Result<Storage, WebStorageError> {
        dom::local_storage()
            .map_err(|err| WebStorageError::Unavailable(dom::js_error_message(&err)))
    }
}

impl KvStore for LocalStorageStore {
    type Error = WebStorageError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| WebStorageError::rejected(&err))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| WebStorageError::rejected(&err))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        Self::storage()?
            .remove_item(key)
            .map_err(|err| WebStorageError::rejected(&err))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        let storage = Self::storage()?;
        let len = storage
            .length()
            .map_err(|err| WebStorageError::rejected(&err))?;
        let mut keys = Vec::new();
        for index in 0..len {
            if let Some(key) = storage
                .key(index)
                .map_err(|err| WebStorageError::rejected(&err))?
                .filter(|key| key.starts_with(prefix))
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Wall clock backed by `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now_millis(&self) -> u64 {
        let now = js_sys::Date::now();
        if now.is_finite() && now > 0.0 {
            now as u64
        } else {
            0
        }
    }
}
