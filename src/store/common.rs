//! Map operations shared by both engines.
//!
//! The engines differ only in how they get exclusive or shared access to the
//! map; what happens once they have it lives here.

use crate::store::StoreError;
use std::collections::HashMap;

pub type Entries = HashMap<String, String>;

/// A new key is admitted while the store holds fewer than `max_size` entries.
pub fn admits_new_key(len: usize, max_size: usize) -> bool {
    len < max_size
}

pub fn get(entries: &Entries, key: &str) -> Result<String, StoreError> {
    entries
        .get(key)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(key.to_string()))
}

pub fn set(
    entries: &mut Entries,
    max_size: usize,
    key: &str,
    value: String,
) -> Result<(), StoreError> {
    if let Some(slot) = entries.get_mut(key) {
        *slot = value;
        return Ok(());
    }
    if !admits_new_key(entries.len(), max_size) {
        return Err(StoreError::MaxCapacity { max_size });
    }
    entries.insert(key.to_string(), value);
    Ok(())
}

pub fn update(entries: &mut Entries, key: &str, value: String) -> Result<(), StoreError> {
    match entries.get_mut(key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(StoreError::NotFound(key.to_string())),
    }
}

pub fn delete(entries: &mut Entries, key: &str) -> Result<(), StoreError> {
    entries
        .remove(key)
        .map(|_| ())
        .ok_or_else(|| StoreError::NotFound(key.to_string()))
}
