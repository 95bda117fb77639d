//! WASM-target tests for pec-platform (Node.js runtime).
//!
//! Tests MemoryStorage and the session store on top of it under
//! wasm32-unknown-unknown via `wasm-pack test --node`.
//!
//! localStorage, jsPDF loading and downloads need a browser window and are
//! not covered here.

use wasm_bindgen_test::*;

use pec_platform::storage::{open_storage, MemoryStorage};
use pec_core::ports::StoragePort;
use pec_core::session_store::SessionStore;
use pec_types::config::{StorageBackendType, HISTORY_STORAGE_KEY};
use pec_types::message::ChatMessage;
use pec_types::PecError;
use std::rc::Rc;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
}

#[wasm_bindgen_test]
async fn memory_storage_get_missing() {
    let storage = MemoryStorage::new();
    let result = storage.get("nonexistent").await.unwrap();
    assert!(result.is_none());
}

#[wasm_bindgen_test]
async fn memory_storage_set_and_get() {
    let storage = MemoryStorage::new();
    storage.set("key1", b"value1").await.unwrap();
    let result = storage.get("key1").await.unwrap();
    assert_eq!(result, Some(b"value1".to_vec()));
}

#[wasm_bindgen_test]
async fn memory_storage_overwrite() {
    let storage = MemoryStorage::new();
    storage.set("key", b"v1").await.unwrap();
    storage.set("key", b"v2").await.unwrap();
    let result = storage.get("key").await.unwrap();
    assert_eq!(result, Some(b"v2".to_vec()));
}

#[wasm_bindgen_test]
async fn memory_storage_delete() {
    let storage = MemoryStorage::new();
    storage.set("key", b"val").await.unwrap();
    storage.delete("key").await.unwrap();
    assert!(storage.get("key").await.unwrap().is_none());
    assert!(!storage.exists("key").await.unwrap());
}

#[wasm_bindgen_test]
async fn memory_storage_list_keys() {
    let storage = MemoryStorage::new();
    storage.set("pec-ai-chat-history", b"[]").await.unwrap();
    storage.set("pec-ai:config", b"{}").await.unwrap();
    storage.set("other", b"x").await.unwrap();

    let mut keys = storage.list_keys("pec-ai").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["pec-ai-chat-history", "pec-ai:config"]);
}

#[wasm_bindgen_test]
async fn memory_storage_quota_rejects_large_write() {
    let storage = MemoryStorage::with_quota(16);
    storage.set("k", b"small").await.unwrap();
    let err = storage.set("k2", &[0u8; 64]).await.unwrap_err();
    assert!(matches!(err, PecError::Storage(_)));
    // Overwriting an existing key only counts the new value.
    storage.set("k", b"0123456789").await.unwrap();
}

#[wasm_bindgen_test]
fn open_memory_backend() {
    let storage = open_storage(&StorageBackendType::Memory).unwrap();
    assert_eq!(storage.backend_name(), "memory");
}

// ─── Session persistence on MemoryStorage ────────────────

#[wasm_bindgen_test]
async fn sessions_roundtrip_through_memory_storage() {
    let storage: Rc<MemoryStorage> = Rc::new(MemoryStorage::new());

    let mut store = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
    store.append_message(ChatMessage::user("设计一个Buck电源")).await;

    let mut reloaded = SessionStore::new(storage, HISTORY_STORAGE_KEY);
    reloaded.load().await;
    assert_eq!(reloaded.sessions().len(), 1);
    assert_eq!(reloaded.messages()[0].content, "设计一个Buck电源");
}

#[wasm_bindgen_test]
async fn sessions_keep_working_when_quota_is_full() {
    let storage = Rc::new(MemoryStorage::with_quota(8));
    let mut store = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
    store.append_message(ChatMessage::user("这条消息写不进存储")).await;

    assert_eq!(store.messages().len(), 1);
    assert!(storage.get(HISTORY_STORAGE_KEY).await.unwrap().is_none());
}
