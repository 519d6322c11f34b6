//! Version comparison - snapshot diffs for pre-activation review

use pretty_assertions::assert_eq;
use sop_engine::{ChangeKind, FieldDiff, SopError, ValidationError};
use sop_model::{FieldDraft, FieldKind, StepDraft};
use sop_test_utils::{empty_template, engine, template_with_qc, ticket, two_step_template, ACTOR};

fn diff_for<'a>(diffs: &'a [FieldDiff], field: &str) -> &'a FieldDiff {
    diffs
        .iter()
        .find(|d| d.field == field)
        .unwrap_or_else(|| panic!("expected a diff for {field}"))
}

#[test]
fn identical_snapshots_produce_no_diffs() {
    let engine = engine();
    let template = two_step_template(&engine);
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "", "", ACTOR)
        .unwrap();
    let v2 = engine
        .cut_version(template.id, "v1.0.1", "", "", ACTOR)
        .unwrap();

    assert_eq!(engine.compare_versions(v1.id, v2.id).unwrap(), vec![]);
}

#[test]
fn structural_growth_shows_as_modified_counters() {
    let engine = engine();
    let template = two_step_template(&engine);
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "", "", ACTOR)
        .unwrap();

    let step_id = *engine
        .get_template(template.id)
        .unwrap()
        .steps
        .get_index(0)
        .unwrap()
        .0;
    engine
        .add_step(template.id, StepDraft::new("Electrophoresis", 45), &ticket())
        .unwrap();
    engine
        .add_field(
            template.id,
            step_id,
            FieldDraft::new("f1", "Concentration", FieldKind::Number),
            &ticket(),
        )
        .unwrap();
    let v2 = engine
        .cut_version(template.id, "v2.0.0", "", "", ACTOR)
        .unwrap();

    let diffs = engine.compare_versions(v1.id, v2.id).unwrap();

    let steps = diff_for(&diffs, "step_count");
    assert_eq!(steps.change, ChangeKind::Modified);
    assert_eq!(steps.old_value.as_deref(), Some("2"));
    assert_eq!(steps.new_value.as_deref(), Some("3"));

    let fields = diff_for(&diffs, "field_count");
    assert_eq!(fields.old_value.as_deref(), Some("0"));
    assert_eq!(fields.new_value.as_deref(), Some("1"));
}

#[test]
fn quality_control_flag_flips_between_snapshots() {
    let engine = engine();
    let template = template_with_qc(&engine);
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "", "", ACTOR)
        .unwrap();

    // Drop the only QC point, then snapshot again.
    let step_id = *engine
        .get_template(template.id)
        .unwrap()
        .steps
        .get_index(0)
        .unwrap()
        .0;
    engine
        .delete_qc_point(template.id, step_id, &"qc1".into(), &ticket())
        .unwrap();
    let v2 = engine
        .cut_version(template.id, "v2.0.0", "", "", ACTOR)
        .unwrap();

    let diffs = engine.compare_versions(v1.id, v2.id).unwrap();
    let flag = diff_for(&diffs, "flag.quality_control");
    assert_eq!(flag.change, ChangeKind::Modified);
    assert_eq!(flag.old_value.as_deref(), Some("enabled"));
    assert_eq!(flag.new_value.as_deref(), Some("disabled"));
}

#[test]
fn description_appearing_is_added_and_disappearing_is_deleted() {
    let engine = engine();
    let template = two_step_template(&engine);
    let bare = engine
        .cut_version(template.id, "v1.0.0", "", "", ACTOR)
        .unwrap();
    let described = engine
        .cut_version(template.id, "v1.1.0", "validated protocol", "", ACTOR)
        .unwrap();

    let diffs = engine.compare_versions(bare.id, described.id).unwrap();
    let description = diff_for(&diffs, "description");
    assert_eq!(description.change, ChangeKind::Added);
    assert_eq!(description.old_value, None);
    assert_eq!(description.new_value.as_deref(), Some("validated protocol"));

    let diffs = engine.compare_versions(described.id, bare.id).unwrap();
    assert_eq!(diff_for(&diffs, "description").change, ChangeKind::Deleted);
}

#[test]
fn cross_template_comparison_is_rejected() {
    let engine = engine();
    let template = two_step_template(&engine);
    let other = empty_template(&engine);
    let v1 = engine
        .cut_version(template.id, "v1.0.0", "", "", ACTOR)
        .unwrap();
    let foreign = engine
        .cut_version(other.id, "v1.0.0", "", "", ACTOR)
        .unwrap();

    let err = engine.compare_versions(v1.id, foreign.id).unwrap_err();
    assert_eq!(
        err,
        SopError::Validation(ValidationError::CrossTemplateCompare {
            left: template.id,
            right: other.id,
        })
    );
}
