use gloo_storage::{LocalStorage, Storage};
use serde::{de::DeserializeOwned, Serialize};

pub fn save_to_storage<T: Serialize>(key: &str, value: &T) -> Result<(), String> {
    LocalStorage::set(key, value)
        .map_err(|e| format!("Error guardando '{}' en localStorage: {}", key, e))
}

pub fn load_from_storage<T: DeserializeOwned>(key: &str) -> Option<T> {
    match LocalStorage::get::<T>(key) {
        Ok(value) => Some(value),
        Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => None,
        Err(e) => {
            log::warn!("⚠️ [STORAGE] Valor ilegible en '{}': {}", key, e);
            None
        }
    }
}

/// Texto plano, sin pasar por JSON
pub fn load_raw_from_storage(key: &str) -> Option<String> {
    LocalStorage::raw().get_item(key).ok().flatten()
}

pub fn save_raw_to_storage(key: &str, value: &str) -> Result<(), String> {
    LocalStorage::raw()
        .set_item(key, value)
        .map_err(|e| format!("Error guardando '{}' en localStorage: {:?}", key, e))
}

pub fn remove_from_storage(key: &str) {
    LocalStorage::delete(key);
}
