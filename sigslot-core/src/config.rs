//! Dispatch settings.
//!
//! Settings are plain data: they can be built in code, or deserialized from a
//! JSON document. Missing fields fall back to [`DispatchSettings::default`].
//!
//! ```rust
//! use sigslot_core::{DeclarationMode, DispatchSettings};
//!
//! let settings = DispatchSettings::from_json(r#"{ "declaration_mode": "lenient" }"#).unwrap();
//! assert_eq!(settings.declaration_mode, DeclarationMode::Lenient);
//! assert_eq!(settings.max_depth, None);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How mis-declared signals and slots are handled when a type's
/// declarations are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationMode {
    /// Reject the whole declaration set with `SignalError::Configuration`.
    #[default]
    Strict,

    /// Skip the offending entry and log a warning.
    Lenient,
}

/// Settings shared by [`Signals`](crate::Signals) and
/// [`PairRegistry`](crate::PairRegistry).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Treatment of duplicate or colliding declarations.
    pub declaration_mode: DeclarationMode,

    /// Maximum nesting of emissions on one thread.
    ///
    /// `None` leaves recursion unbounded: a slot that re-raises its own
    /// signal unconditionally will eventually overflow the stack.
    pub max_depth: Option<usize>,
}

impl DispatchSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Same settings with a different declaration mode.
    pub fn with_declaration_mode(mut self, mode: DeclarationMode) -> Self {
        self.declaration_mode = mode;
        self
    }

    /// Same settings with an emission depth limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict_and_unbounded() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.declaration_mode, DeclarationMode::Strict);
        assert_eq!(settings.max_depth, None);
    }

    #[test]
    fn parses_partial_documents() {
        let settings = DispatchSettings::from_json(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(settings.declaration_mode, DeclarationMode::Strict);
        assert_eq!(settings.max_depth, Some(8));

        let settings = DispatchSettings::from_json("{}").unwrap();
        assert_eq!(settings, DispatchSettings::default());
    }

    #[test]
    fn rejects_unknown_modes() {
        let err = DispatchSettings::from_json(r#"{ "declaration_mode": "loose" }"#).unwrap_err();
        assert_eq!(err.as_label(), "settings");
    }

    #[test]
    fn builders_override_fields() {
        let settings = DispatchSettings::default()
            .with_declaration_mode(DeclarationMode::Lenient)
            .with_max_depth(3);
        assert_eq!(settings.declaration_mode, DeclarationMode::Lenient);
        assert_eq!(settings.max_depth, Some(3));
    }
}
