//! `window.localStorage` backend.
//! Persistent across page reloads. Values are stored as UTF-8 text, which
//! is what the JSON session history is.

use async_trait::async_trait;
use pec_core::ports::StoragePort;
use pec_types::{PecError, Result};

pub struct LocalStorage {
    storage: web_sys::Storage,
}

fn storage_err(context: &str, value: wasm_bindgen::JsValue) -> PecError {
    PecError::Storage(format!("{}: {:?}", context, value))
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| PecError::Storage("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| storage_err("localStorage denied", e))?
            .ok_or_else(|| PecError::Storage("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage
            .get_item(key)
            .map(|v| v.map(String::into_bytes))
            .map_err(|e| storage_err("read failed", e))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(value)
            .map_err(|e| PecError::Storage(format!("value for {} is not UTF-8: {}", key, e)))?;
        // Throws QuotaExceededError when the origin's store is full.
        self.storage
            .set_item(key, text)
            .map_err(|e| storage_err("write failed", e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| storage_err("delete failed", e))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let len = self
            .storage
            .length()
            .map_err(|e| storage_err("length failed", e))?;
        let mut keys = Vec::new();
        for i in 0..len {
            if let Ok(Some(key)) = self.storage.key(i) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "localStorage"
    }
}
