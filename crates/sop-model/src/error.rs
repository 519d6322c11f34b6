//! Draft validation errors
//!
//! Raised when an entity draft violates its own invariants, before it is
//! ever attached to an owning aggregate. Cross-entity violations (dangling
//! references, duplicate ids within a step) are detected by the engine.

use crate::field::FieldKind;

/// A draft failed its local invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// Author-supplied identifier is empty
    #[error("{entity} identifier must not be empty")]
    EmptyIdentifier {
        /// Entity kind ("field", "qc point", ...)
        entity: &'static str,
    },

    /// Display name is empty
    #[error("{entity} name must not be empty")]
    EmptyName {
        /// Entity kind
        entity: &'static str,
    },

    /// Step duration must be a positive number of minutes
    #[error("estimated duration must be positive")]
    ZeroDuration,

    /// Choice fields need at least one option
    #[error("enumerated-choice field '{field}' has no options")]
    EmptyOptions {
        /// Offending field identifier
        field: String,
    },

    /// Options only make sense on enumerated-choice fields
    #[error("field '{field}' of kind {kind:?} must not carry options")]
    UnexpectedOptions {
        /// Offending field identifier
        field: String,
        /// Declared kind
        kind: FieldKind,
    },

    /// Default value does not match the field's declared kind
    #[error("default value for '{field}' is {got:?}, field is {expected:?}")]
    DefaultKindMismatch {
        /// Offending field identifier
        field: String,
        /// Declared field kind
        expected: FieldKind,
        /// Kind of the supplied default
        got: FieldKind,
    },

    /// Validation rule does not apply to the field's declared kind
    #[error("validation rule on '{field}' does not apply to kind {kind:?}")]
    RuleKindMismatch {
        /// Offending field identifier
        field: String,
        /// Declared field kind
        kind: FieldKind,
    },

    /// Thresholds are only meaningful for range and formula checks
    #[error("qc point '{qc_point}' carries thresholds but mechanism has none")]
    ThresholdNotApplicable {
        /// Offending QC point identifier
        qc_point: String,
    },

    /// An applicable-project entry is empty
    #[error("applicable project names must not be empty")]
    EmptyProjectName,
}
