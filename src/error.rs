//! Error types for rule registration.
//!
//! Two families exist. [`RegistryError`] is a defect in how rules are
//! wired together and aborts startup. [`ConfigError`] describes a bad
//! debuff ladder coming from configuration; the affected rule is dropped
//! and the error is recorded as a diagnostic instead.

use crate::ids::DamageSourceId;
use crate::topology::{BodyPart, EquipmentSlot};
use thiserror::Error;

/// Errors raised while sealing and registering distribution rules.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{DamageSourceId, RegistryError};
///
/// let err = RegistryError::DuplicateSource(DamageSourceId::new("fall"));
/// assert_eq!(err.to_string(), "Damage source fall is already claimed by another rule");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// A static source key was already claimed by an earlier rule, or was
    /// listed twice in the same registration.
    #[error("Damage source {0} is already claimed by another rule")]
    DuplicateSource(DamageSourceId),

    /// A layer was added without any body parts.
    #[error("Distribution layer for slot {0} covers no body parts")]
    EmptyLayer(EquipmentSlot),

    /// The same body part appears in more than one layer of a rule.
    #[error("Body part {0} appears in more than one distribution layer")]
    DuplicatePart(BodyPart),

    /// The reduction multiplier is outside `(0, 1]`.
    #[error("Reduction multiplier {0} is outside (0, 1]")]
    InvalidReduction(f32),

    /// `register_static` was called without any damage sources.
    #[error("Static registration requires at least one damage source")]
    NoSources,
}

/// Problems with a configured debuff ladder.
///
/// These never abort startup. The `Display` text is the reason part of
/// the diagnostic recorded by the registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold and magnitude arrays differ in length.
    #[error("The fields do not have the same amount of values! ({thresholds} thresholds, {magnitudes} magnitudes)")]
    LengthMismatch { thresholds: usize, magnitudes: usize },

    /// No bounds were supplied.
    #[error("The fields are empty!")]
    Empty,

    /// The threshold field violates the order required by the rule kind.
    #[error("The {field} field is not sorted right!")]
    Unsorted { field: &'static str },

    /// A threshold is NaN or infinite.
    #[error("The {field} field contains a non-finite value")]
    NonFinite { field: &'static str },
}
