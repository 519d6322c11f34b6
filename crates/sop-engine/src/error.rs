//! Error types for the SOP engine
//!
//! Four recoverable failure families, surfaced synchronously at each
//! operation boundary:
//! - [`ValidationError`]: malformed input
//! - [`IntegrityError`]: an operation would dangle or miss a reference
//! - [`ConflictError`]: blocked by state held by another entity
//! - [`TransitionError`]: lifecycle transition from a forbidding state
//!
//! Operations either fully apply or leave no trace; none retries.

use sop_model::{
    DraftError, FieldId, LabelError, QcPointId, StepId, TemplateId, TransitionError, VersionId,
    VersionLabel,
};

/// Main SOP engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SopError {
    /// Malformed input
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Dangling or missing reference
    #[error("referential integrity: {0}")]
    Integrity(#[from] IntegrityError),

    /// Blocked by state held by another entity
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// Illegal lifecycle transition
    #[error("invalid state: {0}")]
    Transition(#[from] TransitionError),
}

impl From<DraftError> for SopError {
    fn from(value: DraftError) -> Self {
        Self::Validation(ValidationError::Draft(value))
    }
}

impl From<LabelError> for SopError {
    fn from(value: LabelError) -> Self {
        Self::Validation(ValidationError::Label(value))
    }
}

/// Malformed input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// An entity draft failed its local invariants
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// A version label failed the grammar
    #[error(transparent)]
    Label(#[from] LabelError),

    /// A field with this id already exists on the step
    #[error("step {step} already has field '{field}'")]
    DuplicateField {
        /// Owning step
        step: StepId,
        /// Clashing field identifier
        field: FieldId,
    },

    /// A QC point with this id already exists on the step
    #[error("step {step} already has qc point '{qc_point}'")]
    DuplicateQcPoint {
        /// Owning step
        step: StepId,
        /// Clashing QC identifier
        qc_point: QcPointId,
    },

    /// A version with this label already exists for the template
    #[error("template {template} already has version {label}")]
    DuplicateLabel {
        /// Owning template
        template: TemplateId,
        /// Clashing label
        label: VersionLabel,
    },

    /// Versions of two different templates cannot be compared
    #[error("versions belong to different templates: {left} vs {right}")]
    CrossTemplateCompare {
        /// Template of the first version
        left: TemplateId,
        /// Template of the second version
        right: TemplateId,
    },
}

/// Dangling or missing reference
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    /// No template registered under this id
    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),

    /// No such step on the template
    #[error("template {template} has no step {step}")]
    UnknownStep {
        /// Owning template
        template: TemplateId,
        /// Missing step
        step: StepId,
    },

    /// No such field on the step
    #[error("step {step} has no field '{field}'")]
    UnknownField {
        /// Owning step
        step: StepId,
        /// Missing field identifier
        field: FieldId,
    },

    /// No such QC point on the step
    #[error("step {step} has no qc point '{qc_point}'")]
    UnknownQcPoint {
        /// Owning step
        step: StepId,
        /// Missing QC identifier
        qc_point: QcPointId,
    },

    /// No version registered under this id
    #[error("unknown version {0}")]
    UnknownVersion(VersionId),

    /// The version describes a different template
    #[error("version {version} does not belong to template {template}")]
    WrongTemplate {
        /// The version in question
        version: VersionId,
        /// The template the caller named
        template: TemplateId,
    },

    /// A QC point references fields that do not exist on the step
    #[error("qc point '{qc_point}' references unknown fields: {fields:?}")]
    DanglingRelatedFields {
        /// The QC point carrying the references
        qc_point: QcPointId,
        /// The unresolved field identifiers
        fields: Vec<FieldId>,
    },

    /// Deleting the field would orphan QC references
    #[error("field '{field}' is referenced by qc points: {referenced_by:?}")]
    FieldStillReferenced {
        /// The field being deleted
        field: FieldId,
        /// QC points whose related lists mention it
        referenced_by: Vec<QcPointId>,
    },
}

/// Blocked by state held by another entity
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConflictError {
    /// The version currently in force cannot be deleted
    #[error("version {version} ({label}) is current and cannot be deleted")]
    CurrentVersionDelete {
        /// The version in question
        version: VersionId,
        /// Its label, for operator messages
        label: VersionLabel,
    },

    /// A template with a current version cannot be deleted
    #[error("template {0} still has a current version")]
    TemplateHasCurrentVersion(TemplateId),

    /// Steps under an activated shape need an open draft before deletion
    #[error("template {template} has a current version and no open draft; cut a draft before deleting step {step}")]
    StepUnderCurrentVersion {
        /// Owning template
        template: TemplateId,
        /// The step the caller tried to delete
        step: StepId,
    },

    /// The caller's revision token is stale
    #[error("stale revision: expected {expected}, actual {actual}")]
    StaleRevision {
        /// Revision the caller last observed
        expected: u64,
        /// Revision currently stored
        actual: u64,
    },

    /// Structural edits are locked while a version is under review
    #[error("template {0} is locked for structural edits; cut a draft version first")]
    EditsLocked(TemplateId),
}
