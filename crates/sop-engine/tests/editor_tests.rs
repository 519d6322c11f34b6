//! Structural editing - ordering, cascades, referential integrity

use pretty_assertions::assert_eq;
use sop_engine::{
    ConflictError, EditTicket, IntegrityError, MoveDirection, SopError, ValidationError,
};
use sop_model::{
    DraftError, FieldDraft, FieldId, FieldKind, QcPointDraft, QcPointId, StepDraft, StepId,
    TemplatePatch, TemplateStatus,
};
use sop_test_utils::{
    empty_template, engine, locking_engine, template_with_qc, ticket, two_step_template, ACTOR,
};

fn step_ids(engine: &sop_engine::SopEngine, template_id: sop_model::TemplateId) -> Vec<StepId> {
    engine
        .get_template(template_id)
        .unwrap()
        .steps
        .keys()
        .copied()
        .collect()
}

fn step_orders(engine: &sop_engine::SopEngine, template_id: sop_model::TemplateId) -> Vec<u32> {
    engine
        .get_template(template_id)
        .unwrap()
        .steps
        .values()
        .map(|s| s.display_order)
        .collect()
}

#[test]
fn appended_steps_get_sequential_orders() {
    let engine = engine();
    let template = empty_template(&engine);

    let first = engine
        .add_step(template.id, StepDraft::new("Extraction", 90), &ticket())
        .unwrap();
    assert_eq!(first.display_order, 1);

    let second = engine
        .add_step(template.id, StepDraft::new("PCR", 120), &ticket())
        .unwrap();
    assert_eq!(second.display_order, 2);

    let reloaded = engine.get_template(template.id).unwrap();
    assert_eq!(reloaded.step_count(), 2);
}

#[test]
fn step_draft_validation_is_enforced() {
    let engine = engine();
    let template = empty_template(&engine);

    let err = engine
        .add_step(template.id, StepDraft::new("", 90), &ticket())
        .unwrap_err();
    assert!(matches!(
        err,
        SopError::Validation(ValidationError::Draft(DraftError::EmptyName { .. }))
    ));

    let err = engine
        .add_step(template.id, StepDraft::new("Extraction", 0), &ticket())
        .unwrap_err();
    assert_eq!(
        err,
        SopError::Validation(ValidationError::Draft(DraftError::ZeroDuration))
    );
}

#[test]
fn reorder_swaps_adjacent_and_stays_dense() {
    let engine = engine();
    let template = two_step_template(&engine);
    let ids = step_ids(&engine, template.id);

    engine
        .reorder_step(template.id, ids[1], MoveDirection::Up, &ticket())
        .unwrap();

    let after = step_ids(&engine, template.id);
    assert_eq!(after, vec![ids[1], ids[0]]);
    assert_eq!(step_orders(&engine, template.id), vec![1, 2]);
}

#[test]
fn boundary_reorder_is_an_idempotent_no_op() {
    let engine = engine();
    let template = two_step_template(&engine);
    let ids = step_ids(&engine, template.id);
    let before = engine.get_template(template.id).unwrap();

    // First step up, twice; last step down, twice.
    for _ in 0..2 {
        engine
            .reorder_step(template.id, ids[0], MoveDirection::Up, &ticket())
            .unwrap();
        engine
            .reorder_step(template.id, ids[1], MoveDirection::Down, &ticket())
            .unwrap();
    }

    let after = engine.get_template(template.id).unwrap();
    assert_eq!(after, before);
}

#[test]
fn unknown_step_reorder_fails() {
    let engine = engine();
    let template = two_step_template(&engine);
    let err = engine
        .reorder_step(template.id, StepId::new(), MoveDirection::Up, &ticket())
        .unwrap_err();
    assert!(matches!(
        err,
        SopError::Integrity(IntegrityError::UnknownStep { .. })
    ));
}

#[test]
fn delete_step_cascades_and_renumbers() {
    let engine = engine();
    let template = template_with_qc(&engine);
    let ids = step_ids(&engine, template.id);
    assert_eq!(template.field_count(), 1);
    assert_eq!(template.qc_point_count(), 1);

    engine.delete_step(template.id, ids[0], &ticket()).unwrap();

    let reloaded = engine.get_template(template.id).unwrap();
    assert_eq!(reloaded.step_count(), 1);
    assert_eq!(reloaded.field_count(), 0);
    assert_eq!(reloaded.qc_point_count(), 0);
    assert_eq!(step_orders(&engine, template.id), vec![1]);
}

#[test]
fn delete_step_requires_open_draft_once_a_version_is_current() {
    let engine = engine();
    let template = two_step_template(&engine);
    let ids = step_ids(&engine, template.id);

    let v1 = engine
        .cut_version(template.id, "v1.0.0", "initial", "first cut", ACTOR)
        .unwrap();
    engine.submit_for_review(v1.id, ACTOR).unwrap();
    engine.approve(v1.id, "quality-head").unwrap();
    engine.activate(template.id, v1.id, ACTOR).unwrap();

    let err = engine
        .delete_step(template.id, ids[0], &ticket())
        .unwrap_err();
    assert!(matches!(
        err,
        SopError::Conflict(ConflictError::StepUnderCurrentVersion { .. })
    ));

    // Opening a new draft makes the deletion legitimate again.
    engine
        .cut_version(template.id, "v1.1.0", "rework", "drop extraction", ACTOR)
        .unwrap();
    engine.delete_step(template.id, ids[0], &ticket()).unwrap();
}

#[test]
fn duplicate_field_id_is_rejected() {
    let engine = engine();
    let template = two_step_template(&engine);
    let step_id = step_ids(&engine, template.id)[0];

    engine
        .add_field(
            template.id,
            step_id,
            FieldDraft::new("f1", "Concentration", FieldKind::Number),
            &ticket(),
        )
        .unwrap();
    let err = engine
        .add_field(
            template.id,
            step_id,
            FieldDraft::new("f1", "Volume", FieldKind::Number),
            &ticket(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SopError::Validation(ValidationError::DuplicateField { .. })
    ));
}

#[test]
fn referenced_field_delete_requires_cascade() {
    let engine = engine();
    let template = template_with_qc(&engine);
    let step_id = step_ids(&engine, template.id)[0];
    let f1 = FieldId::new("f1");

    // Without cascade: rejected, QC point untouched.
    let err = engine
        .delete_field(template.id, step_id, &f1, false, &ticket())
        .unwrap_err();
    assert_eq!(
        err,
        SopError::Integrity(IntegrityError::FieldStillReferenced {
            field: f1.clone(),
            referenced_by: vec![QcPointId::new("qc1")],
        })
    );
    let step = engine.get_template(template.id).unwrap().steps[&step_id].clone();
    assert_eq!(step.field_count(), 1);
    assert_eq!(step.qc_points[&QcPointId::new("qc1")].related_fields, vec![f1.clone()]);

    // With cascade: field gone, reference pruned, QC point kept.
    engine
        .delete_field(template.id, step_id, &f1, true, &ticket())
        .unwrap();
    let step = engine.get_template(template.id).unwrap().steps[&step_id].clone();
    assert_eq!(step.field_count(), 0);
    assert!(step.qc_points[&QcPointId::new("qc1")].related_fields.is_empty());
}

#[test]
fn qc_point_must_reference_existing_fields() {
    let engine = engine();
    let template = two_step_template(&engine);
    let step_id = step_ids(&engine, template.id)[0];

    let mut draft = QcPointDraft::new("qc1", "Purity check");
    draft.related_fields = vec![FieldId::new("missing")];
    let err = engine
        .add_qc_point(template.id, step_id, draft, &ticket())
        .unwrap_err();
    assert_eq!(
        err,
        SopError::Integrity(IntegrityError::DanglingRelatedFields {
            qc_point: QcPointId::new("qc1"),
            fields: vec![FieldId::new("missing")],
        })
    );
}

#[test]
fn update_field_keeps_display_position() {
    let engine = engine();
    let template = two_step_template(&engine);
    let step_id = step_ids(&engine, template.id)[0];

    for (id, name) in [("f1", "Concentration"), ("f2", "Volume")] {
        engine
            .add_field(
                template.id,
                step_id,
                FieldDraft::new(id, name, FieldKind::Number),
                &ticket(),
            )
            .unwrap();
    }

    let mut renamed = FieldDraft::new("f1", "Final concentration", FieldKind::Number);
    renamed.unit = Some("ng/µL".into());
    let updated = engine
        .update_field(template.id, step_id, renamed, &ticket())
        .unwrap();
    assert_eq!(updated.display_order, 1);
    assert_eq!(updated.name, "Final concentration");
}

#[test]
fn stale_revision_ticket_is_rejected() {
    let engine = engine();
    let template = two_step_template(&engine);
    let observed = engine.get_template(template.id).unwrap().revision;

    engine
        .add_step(
            template.id,
            StepDraft::new("Electrophoresis", 45),
            &EditTicket::by("bob").expecting(observed),
        )
        .unwrap();

    // Second writer still holds the old revision.
    let err = engine
        .add_step(
            template.id,
            StepDraft::new("Reporting", 15),
            &EditTicket::by("carol").expecting(observed),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SopError::Conflict(ConflictError::StaleRevision { .. })
    ));
}

#[test]
fn template_meta_update_bumps_revision() {
    let engine = engine();
    let template = empty_template(&engine);

    let patch = TemplatePatch {
        status: Some(TemplateStatus::Inactive),
        description: Some("Superseded by kit protocol".into()),
        ..TemplatePatch::default()
    };
    let updated = engine
        .update_template_meta(template.id, patch, &EditTicket::by("bob"))
        .unwrap();
    assert_eq!(updated.status, TemplateStatus::Inactive);
    assert_eq!(updated.revision, template.revision + 1);
    assert_eq!(updated.updated_by, "bob");
}

#[test]
fn template_with_current_version_cannot_be_deleted() {
    let engine = engine();
    let template = two_step_template(&engine);
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "initial", "first cut", ACTOR)
        .unwrap();
    engine.submit_for_review(v1.id, ACTOR).unwrap();
    engine.approve(v1.id, "quality-head").unwrap();
    engine.activate(template.id, v1.id, ACTOR).unwrap();

    let err = engine.delete_template(template.id, ACTOR).unwrap_err();
    assert_eq!(
        err,
        SopError::Conflict(ConflictError::TemplateHasCurrentVersion(template.id))
    );
    assert!(engine.get_template(template.id).is_ok());
}

#[test]
fn locking_policy_gates_structural_edits() {
    let engine = locking_engine();
    let template = two_step_template(&engine);

    // An open draft keeps the template editable.
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "initial", "first cut", ACTOR)
        .unwrap();
    engine
        .add_step(template.id, StepDraft::new("Electrophoresis", 45), &ticket())
        .unwrap();

    // Under review with no draft open: locked.
    engine.submit_for_review(v1.id, ACTOR).unwrap();
    let err = engine
        .add_step(template.id, StepDraft::new("Reporting", 15), &ticket())
        .unwrap_err();
    assert_eq!(err, SopError::Conflict(ConflictError::EditsLocked(template.id)));

    // Cutting a fresh draft reopens editing.
    engine
        .cut_version(template.id, "v1.1.0", "rework", "new step", ACTOR)
        .unwrap();
    engine
        .add_step(template.id, StepDraft::new("Reporting", 15), &ticket())
        .unwrap();
}
