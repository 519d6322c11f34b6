//! Quality-control checkpoints
//!
//! A [`QualityControlPoint`] is evaluated during or after a step's
//! execution. It may reference fields of the same step; that referential
//! integrity is enforced by the engine, which sees the whole step.

use crate::error::DraftError;
use crate::ids::{FieldId, QcPointId};
use serde::{Deserialize, Serialize};

/// How the check is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Performed by an operator
    Manual,
    /// Evaluated by the system
    Automatic,
    /// System-evaluated with operator confirmation
    SemiAutomatic,
}

/// What the check inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMechanism {
    /// Numeric value within bounds
    Range,
    /// Value matches an enumerated set
    EnumeratedMatch,
    /// Computed formula over captured fields
    Formula,
    /// Required file attachment exists
    FilePresence,
    /// Operator visually confirms
    VisualConfirmation,
}

impl CheckMechanism {
    /// Whether warning/error thresholds are meaningful for this mechanism
    #[must_use]
    pub fn supports_thresholds(self) -> bool {
        matches!(self, Self::Range | Self::Formula)
    }
}

/// Notification severity when the check fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only
    Info,
    /// Needs attention, execution continues
    Warning,
    /// Blocks the batch until resolved
    Error,
}

/// A checkpoint validating data or process quality for a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityControlPoint {
    /// Identifier, unique within the owning step
    pub id: QcPointId,
    /// Display name
    pub name: String,
    /// How the check is carried out
    pub mode: CheckMode,
    /// What the check inspects
    pub mechanism: CheckMechanism,
    /// Free-text description
    pub description: String,
    /// Whether the check must pass before the step completes
    pub required: bool,
    /// When the check is evaluated (free text)
    pub trigger: String,
    /// Check rule (free text or expression source)
    pub rule: String,
    /// Threshold that raises a warning
    pub warning_threshold: Option<f64>,
    /// Threshold that raises an error
    pub error_threshold: Option<f64>,
    /// Whether the system may auto-correct on failure
    pub auto_correct: bool,
    /// Notification severity on failure
    pub severity: Severity,
    /// Fields of the same step this check reads
    pub related_fields: Vec<FieldId>,
    /// Position among sibling QC points, 1-based and dense
    pub display_order: u32,
    /// Whether the check is currently evaluated
    pub active: bool,
}

/// Author input for creating or updating a [`QualityControlPoint`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcPointDraft {
    /// Identifier, unique within the owning step
    pub id: QcPointId,
    /// Display name
    pub name: String,
    /// How the check is carried out
    pub mode: CheckMode,
    /// What the check inspects
    pub mechanism: CheckMechanism,
    /// Free-text description
    pub description: String,
    /// Whether the check must pass
    pub required: bool,
    /// When the check is evaluated
    pub trigger: String,
    /// Check rule
    pub rule: String,
    /// Threshold that raises a warning
    pub warning_threshold: Option<f64>,
    /// Threshold that raises an error
    pub error_threshold: Option<f64>,
    /// Whether the system may auto-correct
    pub auto_correct: bool,
    /// Notification severity
    pub severity: Severity,
    /// Fields of the same step this check reads
    pub related_fields: Vec<FieldId>,
    /// Whether the check starts active
    pub active: bool,
}

impl QcPointDraft {
    /// Minimal draft: required manual visual confirmation
    #[must_use]
    pub fn new(id: impl Into<QcPointId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mode: CheckMode::Manual,
            mechanism: CheckMechanism::VisualConfirmation,
            description: String::new(),
            required: true,
            trigger: String::new(),
            rule: String::new(),
            warning_threshold: None,
            error_threshold: None,
            auto_correct: false,
            severity: Severity::Warning,
            related_fields: Vec::new(),
            active: true,
        }
    }

    /// Check the draft's local invariants
    ///
    /// # Errors
    /// Returns [`DraftError`] on an empty id or name, or thresholds on a
    /// mechanism that has none.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.id.is_empty() {
            return Err(DraftError::EmptyIdentifier { entity: "qc point" });
        }
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName { entity: "qc point" });
        }
        let has_thresholds = self.warning_threshold.is_some() || self.error_threshold.is_some();
        if has_thresholds && !self.mechanism.supports_thresholds() {
            return Err(DraftError::ThresholdNotApplicable {
                qc_point: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Validate and build the QC point at the given display position
    ///
    /// # Errors
    /// Propagates [`DraftError`] from [`QcPointDraft::validate`].
    pub fn build(self, display_order: u32) -> Result<QualityControlPoint, DraftError> {
        self.validate()?;
        Ok(QualityControlPoint {
            id: self.id,
            name: self.name,
            mode: self.mode,
            mechanism: self.mechanism,
            description: self.description,
            required: self.required,
            trigger: self.trigger,
            rule: self.rule,
            warning_threshold: self.warning_threshold,
            error_threshold: self.error_threshold,
            auto_correct: self.auto_correct,
            severity: self.severity,
            related_fields: self.related_fields,
            display_order,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_draft_builds() {
        let qc = QcPointDraft::new("qc1", "Concentration check").build(1).unwrap();
        assert_eq!(qc.display_order, 1);
        assert!(qc.active);
    }

    #[test]
    fn thresholds_require_numeric_mechanism() {
        let mut draft = QcPointDraft::new("qc1", "Visual check");
        draft.warning_threshold = Some(0.8);
        assert!(matches!(
            draft.validate(),
            Err(DraftError::ThresholdNotApplicable { .. })
        ));

        draft.mechanism = CheckMechanism::Range;
        draft.error_threshold = Some(1.2);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let draft = QcPointDraft::new("qc1", "");
        assert_eq!(
            draft.validate(),
            Err(DraftError::EmptyName { entity: "qc point" })
        );
    }
}
