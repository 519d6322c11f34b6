//! Template steps
//!
//! A [`Step`] is one ordered unit of procedure inside a template. It
//! exclusively owns its fields and QC points, both keyed by id and kept in
//! display order.

use crate::error::DraftError;
use crate::field::Field;
use crate::ids::{FieldId, QcPointId, StepId};
use crate::quality::QualityControlPoint;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What kind of work the step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Capture sample or batch information
    InformationCapture,
    /// Wet-lab experiment operation
    ExperimentOperation,
    /// Instrument setup or run
    InstrumentOperation,
    /// Computation over captured data
    DataAnalysis,
    /// Produce a report artifact
    ReportGeneration,
}

/// One ordered unit of procedure inside a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier
    pub id: StepId,
    /// Display name
    pub name: String,
    /// What kind of work the step performs
    pub kind: StepKind,
    /// Free-text description
    pub description: String,
    /// Whether the step may be skipped during execution
    pub required: bool,
    /// Estimated duration in minutes, always positive
    pub estimated_minutes: u32,
    /// Position among sibling steps, 1-based and dense
    pub display_order: u32,
    /// Pointer to a reference document, if any
    pub reference_doc: Option<String>,
    /// Owned fields in display order
    pub fields: IndexMap<FieldId, Field>,
    /// Owned QC points in display order
    pub qc_points: IndexMap<QcPointId, QualityControlPoint>,
}

impl Step {
    /// Number of data-entry fields
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of QC points
    #[inline]
    #[must_use]
    pub fn qc_point_count(&self) -> usize {
        self.qc_points.len()
    }

    /// Whether any QC point is attached
    #[inline]
    #[must_use]
    pub fn has_quality_control(&self) -> bool {
        !self.qc_points.is_empty()
    }

    /// QC points whose related-field list mentions the given field
    #[must_use]
    pub fn qc_points_referencing(&self, field: &FieldId) -> Vec<QcPointId> {
        self.qc_points
            .values()
            .filter(|qc| qc.related_fields.contains(field))
            .map(|qc| qc.id.clone())
            .collect()
    }

    /// Related-field ids that do not resolve on this step
    #[must_use]
    pub fn dangling_references(&self, related: &[FieldId]) -> Vec<FieldId> {
        related
            .iter()
            .filter(|id| !self.fields.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Reassign field display orders to 1..=n by list position
    pub fn renumber_fields(&mut self) {
        for (index, field) in self.fields.values_mut().enumerate() {
            field.display_order = index as u32 + 1;
        }
    }

    /// Reassign QC display orders to 1..=n by list position
    pub fn renumber_qc_points(&mut self) {
        for (index, qc) in self.qc_points.values_mut().enumerate() {
            qc.display_order = index as u32 + 1;
        }
    }
}

/// Author input for creating or updating a [`Step`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDraft {
    /// Display name
    pub name: String,
    /// What kind of work the step performs
    pub kind: StepKind,
    /// Free-text description
    pub description: String,
    /// Whether the step may be skipped
    pub required: bool,
    /// Estimated duration in minutes
    pub estimated_minutes: u32,
    /// Pointer to a reference document
    pub reference_doc: Option<String>,
}

impl StepDraft {
    /// Minimal draft: required experiment operation
    #[must_use]
    pub fn new(name: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::ExperimentOperation,
            description: String::new(),
            required: true,
            estimated_minutes,
            reference_doc: None,
        }
    }

    /// Check the draft's local invariants
    ///
    /// # Errors
    /// Returns [`DraftError`] on an empty name or non-positive duration.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName { entity: "step" });
        }
        if self.estimated_minutes == 0 {
            return Err(DraftError::ZeroDuration);
        }
        Ok(())
    }

    /// Validate and build the step at the given display position
    ///
    /// # Errors
    /// Propagates [`DraftError`] from [`StepDraft::validate`].
    pub fn build(self, display_order: u32) -> Result<Step, DraftError> {
        self.validate()?;
        Ok(Step {
            id: StepId::new(),
            name: self.name,
            kind: self.kind,
            description: self.description,
            required: self.required,
            estimated_minutes: self.estimated_minutes,
            display_order,
            reference_doc: self.reference_doc,
            fields: IndexMap::new(),
            qc_points: IndexMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDraft, FieldKind};
    use crate::quality::QcPointDraft;

    #[test]
    fn rejects_zero_duration() {
        assert_eq!(StepDraft::new("Extraction", 0).validate(), Err(DraftError::ZeroDuration));
        assert!(StepDraft::new("Extraction", 90).validate().is_ok());
    }

    #[test]
    fn tracks_qc_references() {
        let mut step = StepDraft::new("Extraction", 90).build(1).unwrap();
        let field = FieldDraft::new("f1", "Concentration", FieldKind::Number)
            .build(1)
            .unwrap();
        step.fields.insert(field.id.clone(), field);

        let mut draft = QcPointDraft::new("qc1", "Concentration check");
        draft.related_fields = vec![FieldId::new("f1")];
        let qc = draft.build(1).unwrap();
        step.qc_points.insert(qc.id.clone(), qc);

        assert!(step.has_quality_control());
        assert_eq!(
            step.qc_points_referencing(&FieldId::new("f1")),
            vec![QcPointId::new("qc1")]
        );
        assert_eq!(
            step.dangling_references(&[FieldId::new("f9")]),
            vec![FieldId::new("f9")]
        );
    }
}
