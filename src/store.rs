//! Integer key-value persistence used by the brightness tile.

use heapless::{FnvIndexMap, String};

use crate::error::StoreError;

/// Longest key accepted by [`MemoryStore`].
pub const MAX_KEY_LEN: usize = 32;

/// Number of entries a [`MemoryStore`] can hold. Must be a power of two.
pub const MEMORY_STORE_SIZE: usize = 8;

/// Abstract integer preference store
///
/// Implement this trait on top of the platform preference API.
pub trait KeyValueStore {
    /// Read `key`, returning `default` when it was never written
    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError>;

    /// Write `key`
    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError>;
}

/// A missing store behaves as permanently unavailable.
impl<S: KeyValueStore> KeyValueStore for Option<S> {
    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        match self {
            Some(store) => store.get_int(key, default),
            None => Err(StoreError::Unavailable),
        }
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        match self {
            Some(store) => store.put_int(key, value),
            None => Err(StoreError::Unavailable),
        }
    }
}

/// Fixed-capacity in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FnvIndexMap<String<MAX_KEY_LEN>, i32, MEMORY_STORE_SIZE>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(key: &str) -> Result<String<MAX_KEY_LEN>, StoreError> {
        String::try_from(key).map_err(|()| StoreError::Full)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        let key = Self::key(key)?;
        Ok(self.entries.get(&key).copied().unwrap_or(default))
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), StoreError> {
        let key = Self::key(key)?;
        self.entries
            .insert(key, value)
            .map(|_| ())
            .map_err(|_| StoreError::Full)
    }
}
