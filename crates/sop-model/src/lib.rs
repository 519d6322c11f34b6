//! SOP Model - entity types for SOP configuration
//!
//! The data model for laboratory Standard Operating Procedures:
//! - [`Template`]: aggregate root exclusively owning ordered steps
//! - [`Step`]: one unit of procedure, owning fields and QC points
//! - [`Field`]: a kind-typed data-capture slot
//! - [`QualityControlPoint`]: a checkpoint over a step's execution
//! - [`Version`]: a lifecycle-tracked snapshot descriptor of a template
//!
//! Local (single-entity) invariants live here on the draft types; the
//! cross-entity invariants (dense ordering, referential integrity,
//! single current version) are enforced by `sop-engine`.

#![warn(unreachable_pub)]

mod error;
mod field;
mod ids;
mod quality;
mod step;
mod template;
mod version;

pub use error::DraftError;
pub use field::{Field, FieldDraft, FieldFlags, FieldKind, FieldValue, ValidationRule};
pub use ids::{FieldId, QcPointId, StepId, TemplateId, VersionId};
pub use quality::{CheckMechanism, CheckMode, QcPointDraft, QualityControlPoint, Severity};
pub use step::{Step, StepDraft, StepKind};
pub use template::{Template, TemplateDraft, TemplatePatch, TemplateStatus};
pub use version::{
    allowed_transitions, validate_transition, LabelError, StructureSnapshot, TransitionError,
    Version, VersionLabel, VersionStatus,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
