//! Pick the storage backend named in the config.
//!
//! `Auto` prefers localStorage and falls back to memory, so a blocked or
//! missing store never stops the app from starting.

use std::rc::Rc;
use pec_core::ports::StoragePort;
use pec_types::{Result, config::StorageBackendType};
use super::{LocalStorage, MemoryStorage};

/// Returns a trait object so callers are backend-agnostic.
pub fn open_storage(backend: &StorageBackendType) -> Result<Rc<dyn StoragePort>> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory");
            Ok(Rc::new(MemoryStorage::new()))
        }
        StorageBackendType::LocalStorage => {
            log::info!("Storage backend: localStorage");
            Ok(Rc::new(LocalStorage::open()?))
        }
        StorageBackendType::Auto => match LocalStorage::open() {
            Ok(local) => {
                log::info!("Storage backend: localStorage");
                Ok(Rc::new(local))
            }
            Err(e) => {
                log::warn!("localStorage unavailable ({}), falling back to memory", e);
                Ok(Rc::new(MemoryStorage::new()))
            }
        },
    }
}
