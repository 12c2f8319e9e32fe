//! Single-flag validity tracking for the `invalidAddress` key.

use geofield_types::{Effect, INVALID_ADDRESS_KEY};
use indexmap::IndexMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ValidityTracker {
    valid: bool,
}

impl Default for ValidityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidityTracker {
    /// A fresh field starts out valid.
    pub fn new() -> Self {
        Self { valid: true }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Set the flag. Returns a [`Effect::ValidityChanged`] when the value flipped.
    pub fn set(&mut self, valid: bool) -> Option<Effect> {
        if self.valid == valid {
            return None;
        }
        debug!(key = INVALID_ADDRESS_KEY, valid, "validity changed");
        self.valid = valid;
        Some(Effect::ValidityChanged { valid })
    }

    /// Error map in the shape host validation surfaces expect: the key is present and `true` while invalid.
    pub fn errors(&self) -> IndexMap<String, bool> {
        let mut errors = IndexMap::new();
        if !self.valid {
            errors.insert(INVALID_ADDRESS_KEY.to_string(), true);
        }
        errors
    }
}
