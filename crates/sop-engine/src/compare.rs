//! Version comparator
//!
//! Produces a structural diff between two versions of the same template
//! for human review before activation. Works entirely on the snapshots
//! captured at cut time; it never re-walks live template structure.

use crate::engine::SopEngine;
use crate::error::{SopError, ValidationError};
use serde::{Deserialize, Serialize};
use sop_model::{Version, VersionId};

/// How a tracked dimension changed between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Absent before, present after
    Added,
    /// Present on both sides, unequal
    Modified,
    /// Present before, absent after
    Deleted,
}

/// One changed dimension between two versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Dimension name, e.g. `step_count` or `flag.quality_control`
    pub field: String,
    /// Value on the older side, if present
    pub old_value: Option<String>,
    /// Value on the newer side, if present
    pub new_value: Option<String>,
    /// Classification of the change
    pub change: ChangeKind,
}

impl SopEngine {
    /// Diff two versions of the same template
    ///
    /// Tracked dimensions: step/field/QC counters, snapshot feature
    /// flags, description and change log. Unchanged dimensions are
    /// omitted.
    ///
    /// # Errors
    /// Fails validation when the versions describe different templates.
    pub fn compare_versions(
        &self,
        old_id: VersionId,
        new_id: VersionId,
    ) -> Result<Vec<FieldDiff>, SopError> {
        let old = self.store.version(old_id)?;
        let new = self.store.version(new_id)?;
        compare(&old, &new)
    }
}

/// Diff two already-loaded versions
///
/// # Errors
/// Fails validation when the versions describe different templates.
pub fn compare(old: &Version, new: &Version) -> Result<Vec<FieldDiff>, SopError> {
    if old.template_id != new.template_id {
        return Err(ValidationError::CrossTemplateCompare {
            left: old.template_id,
            right: new.template_id,
        }
        .into());
    }

    let mut diffs = Vec::new();
    push_diff(
        &mut diffs,
        "step_count",
        Some(old.snapshot.step_count.to_string()),
        Some(new.snapshot.step_count.to_string()),
    );
    push_diff(
        &mut diffs,
        "field_count",
        Some(old.snapshot.field_count.to_string()),
        Some(new.snapshot.field_count.to_string()),
    );
    push_diff(
        &mut diffs,
        "qc_point_count",
        Some(old.snapshot.qc_point_count.to_string()),
        Some(new.snapshot.qc_point_count.to_string()),
    );

    let flag_names = old.snapshot.flags.keys().chain(new.snapshot.flags.keys());
    let mut seen = std::collections::BTreeSet::new();
    for name in flag_names {
        if !seen.insert(name.clone()) {
            continue;
        }
        push_diff(
            &mut diffs,
            &format!("flag.{name}"),
            old.snapshot.flags.get(name).cloned(),
            new.snapshot.flags.get(name).cloned(),
        );
    }

    push_diff(
        &mut diffs,
        "description",
        non_empty(&old.description),
        non_empty(&new.description),
    );
    push_diff(
        &mut diffs,
        "change_log",
        non_empty(&old.change_log),
        non_empty(&new.change_log),
    );

    Ok(diffs)
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn push_diff(
    diffs: &mut Vec<FieldDiff>,
    field: &str,
    old_value: Option<String>,
    new_value: Option<String>,
) {
    let change = match (&old_value, &new_value) {
        (None, None) => return,
        (None, Some(_)) => ChangeKind::Added,
        (Some(_), None) => ChangeKind::Deleted,
        (Some(old), Some(new)) => {
            if old == new {
                return;
            }
            ChangeKind::Modified
        }
    };
    diffs.push(FieldDiff {
        field: field.to_string(),
        old_value,
        new_value,
        change,
    });
}
