//! Testing utilities for the SOP workspace
//!
//! Shared fixtures and builders used by integration tests.

use sop_engine::{EditTicket, EngineConfig, MutabilityPolicy, SopEngine};
use sop_model::{
    FieldDraft, FieldId, FieldKind, QcPointDraft, StepDraft, Template, TemplateDraft,
};

/// Default fixture actor
pub const ACTOR: &str = "alice";

/// Engine with the default (always-editable) policy
#[must_use]
pub fn engine() -> SopEngine {
    SopEngine::new()
}

/// Engine that locks structural edits while a version is under review
#[must_use]
pub fn locking_engine() -> SopEngine {
    SopEngine::with_config(EngineConfig::new().with_mutability(MutabilityPolicy::LockWhileUnderReview))
}

/// Ticket for the default actor, no revision check
#[must_use]
pub fn ticket() -> EditTicket {
    EditTicket::by(ACTOR)
}

/// Empty template named "DNA extraction"
pub fn empty_template(engine: &SopEngine) -> Template {
    engine
        .create_template(TemplateDraft::new("DNA extraction"), ACTOR)
        .expect("fixture template")
}

/// Template with two steps: Extraction (90 min) and PCR (120 min)
pub fn two_step_template(engine: &SopEngine) -> Template {
    let template = empty_template(engine);
    engine
        .add_step(template.id, StepDraft::new("Extraction", 90), &ticket())
        .expect("fixture step");
    engine
        .add_step(template.id, StepDraft::new("PCR", 120), &ticket())
        .expect("fixture step");
    engine.get_template(template.id).expect("fixture reload")
}

/// Template whose first step has a number field `f1` and a QC point
/// `qc1` related to it
pub fn template_with_qc(engine: &SopEngine) -> Template {
    let template = two_step_template(engine);
    let step_id = *template.steps.get_index(0).expect("fixture step").0;
    engine
        .add_field(
            template.id,
            step_id,
            FieldDraft::new("f1", "Concentration", FieldKind::Number),
            &ticket(),
        )
        .expect("fixture field");
    let mut qc = QcPointDraft::new("qc1", "Concentration check");
    qc.related_fields = vec![FieldId::new("f1")];
    engine
        .add_qc_point(template.id, step_id, qc, &ticket())
        .expect("fixture qc point");
    engine.get_template(template.id).expect("fixture reload")
}
