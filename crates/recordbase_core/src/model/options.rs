//! Per-call options for model helpers.
//!
//! Unset flags stay `None` so helpers can merge their own defaults without
//! overriding anything the caller chose explicitly.

use crate::model::record::Attributes;
use serde::{Deserialize, Serialize};

/// How a save reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMethod {
    Insert,
    Update,
}

impl SaveMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }
}

/// Options accepted by every model helper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Fail when a lookup, update or delete touches no rows.
    pub require: Option<bool>,
    /// Only write the attributes passed to the save.
    pub patch: Option<bool>,
    /// Force insert or update instead of deriving it from `is_new`.
    pub method: Option<SaveMethod>,
    /// Attributes merged under the lookup data by `find_or_create`.
    pub defaults: Attributes,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, require: bool) -> Self {
        self.require = Some(require);
        self
    }

    pub fn patch(mut self, patch: bool) -> Self {
        self.patch = Some(patch);
        self
    }

    pub fn method(mut self, method: SaveMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn defaults(mut self, defaults: Attributes) -> Self {
        self.defaults = defaults;
        self
    }

    pub(crate) fn or_require(mut self, require: bool) -> Self {
        self.require.get_or_insert(require);
        self
    }

    pub(crate) fn or_patch(mut self, patch: bool) -> Self {
        self.patch.get_or_insert(patch);
        self
    }

    pub(crate) fn or_method(mut self, method: SaveMethod) -> Self {
        self.method.get_or_insert(method);
        self
    }

    /// Resolved `require` flag with the given fallback.
    pub(crate) fn requires(&self, fallback: bool) -> bool {
        self.require.unwrap_or(fallback)
    }

    pub(crate) fn is_patch(&self) -> bool {
        self.patch.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::{Options, SaveMethod};

    #[test]
    fn default_merges_never_override_caller_flags() {
        let merged = Options::new()
            .require(false)
            .or_require(true)
            .or_patch(true)
            .or_method(SaveMethod::Update);

        assert_eq!(merged.require, Some(false));
        assert_eq!(merged.patch, Some(true));
        assert_eq!(merged.method, Some(SaveMethod::Update));
    }

    #[test]
    fn requires_falls_back_when_unset() {
        assert!(Options::new().requires(true));
        assert!(!Options::new().requires(false));
        assert!(!Options::new().is_patch());
    }
}
