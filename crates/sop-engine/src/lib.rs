//! SOP Engine - operations over the SOP model
//!
//! The engine that keeps SOP templates structurally sound:
//! - structural editing of steps, fields and QC points with dense
//!   ordering and cascade rules
//! - the version lifecycle with its single-current-version guarantee
//! - snapshot-based version comparison
//! - a hash-chained audit trail of every committed mutation
//!
//! # Example
//!
//! ```rust,ignore
//! use sop_engine::{EditTicket, SopEngine};
//! use sop_model::{StepDraft, TemplateDraft};
//!
//! let engine = SopEngine::new();
//! let template = engine.create_template(TemplateDraft::new("DNA extraction"), "alice")?;
//! let ticket = EditTicket::by("alice");
//! engine.add_step(template.id, StepDraft::new("Extraction", 90), &ticket)?;
//! let v1 = engine.cut_version(template.id, "v1.0.0", "initial", "first cut", "alice")?;
//! ```

#![warn(unreachable_pub)]

mod audit;
mod compare;
mod editor;
mod engine;
mod error;
mod lifecycle;
mod projection;
mod store;

pub use audit::{AuditError, AuditEvent, AuditLog};
pub use compare::{compare, ChangeKind, FieldDiff};
pub use editor::MoveDirection;
pub use engine::{EditTicket, EngineConfig, MutabilityPolicy, SopEngine};
pub use error::{ConflictError, IntegrityError, SopError, ValidationError};
pub use projection::{TemplateSummary, VersionRow};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
