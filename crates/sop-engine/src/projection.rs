//! Read-only projections for list rendering
//!
//! Flat, serializable rows the UI layer can render without touching the
//! aggregates themselves.

use crate::engine::SopEngine;
use crate::error::SopError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sop_model::{Template, TemplateId, TemplateStatus, Version, VersionId, VersionStatus};

/// Template list row with aggregate counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    /// Template identifier
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Assignability status
    pub status: TemplateStatus,
    /// Number of steps
    pub step_count: usize,
    /// Fields across all steps
    pub field_count: usize,
    /// QC points across all steps
    pub qc_point_count: usize,
    /// Who last changed the template
    pub updated_by: String,
    /// When the template last changed
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency revision for subsequent writes
    pub revision: u64,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            status: template.status,
            step_count: template.step_count(),
            field_count: template.field_count(),
            qc_point_count: template.qc_point_count(),
            updated_by: template.updated_by.clone(),
            updated_at: template.updated_at,
            revision: template.revision,
        }
    }
}

/// Version list row with lifecycle status and lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRow {
    /// Version identifier
    pub id: VersionId,
    /// Semantic version label
    pub label: String,
    /// Owning template
    pub template_id: TemplateId,
    /// Template name at cut time
    pub template_name: String,
    /// Lifecycle state
    pub status: VersionStatus,
    /// Whether this version is currently in force
    pub is_current: bool,
    /// Steps at cut time
    pub step_count: usize,
    /// Fields at cut time
    pub field_count: usize,
    /// QC points at cut time
    pub qc_point_count: usize,
    /// Who cut the version
    pub created_by: String,
    /// When the version was cut
    pub created_at: DateTime<Utc>,
    /// Who approved, if approved
    pub approved_by: Option<String>,
    /// When activated, if ever
    pub activated_at: Option<DateTime<Utc>>,
}

impl From<&Version> for VersionRow {
    fn from(version: &Version) -> Self {
        Self {
            id: version.id,
            label: version.label.to_string(),
            template_id: version.template_id,
            template_name: version.template_name.clone(),
            status: version.status,
            is_current: version.is_current,
            step_count: version.snapshot.step_count,
            field_count: version.snapshot.field_count,
            qc_point_count: version.snapshot.qc_point_count,
            created_by: version.created_by.clone(),
            created_at: version.created_at,
            approved_by: version.approved_by.clone(),
            activated_at: version.activated_at,
        }
    }
}

impl SopEngine {
    /// Load a full template aggregate
    ///
    /// # Errors
    /// Fails on an unknown template.
    pub fn get_template(&self, template_id: TemplateId) -> Result<Template, SopError> {
        self.store.template(template_id)
    }

    /// Load a full version descriptor
    ///
    /// # Errors
    /// Fails on an unknown version.
    pub fn get_version(&self, version_id: VersionId) -> Result<Version, SopError> {
        self.store.version(version_id)
    }

    /// Summary row for one template
    ///
    /// # Errors
    /// Fails on an unknown template.
    pub fn template_summary(&self, template_id: TemplateId) -> Result<TemplateSummary, SopError> {
        Ok(TemplateSummary::from(&self.store.template(template_id)?))
    }

    /// Summary rows for all templates, sorted by name
    #[must_use]
    pub fn list_templates(&self) -> Vec<TemplateSummary> {
        let mut rows: Vec<TemplateSummary> = self
            .store
            .templates
            .read()
            .values()
            .map(TemplateSummary::from)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Version rows for one template, newest label first
    ///
    /// # Errors
    /// Fails on an unknown template.
    pub fn list_versions(&self, template_id: TemplateId) -> Result<Vec<VersionRow>, SopError> {
        self.store.template(template_id)?;
        Ok(self
            .store
            .versions_of(template_id)
            .iter()
            .map(VersionRow::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sop_model::TemplateDraft;

    #[test]
    fn summary_rows_serialize_for_the_ui() {
        let template = TemplateDraft::new("Residue analysis")
            .build("alice", chrono::Utc::now())
            .unwrap();
        let summary = TemplateSummary::from(&template);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "Residue analysis");
        assert_eq!(json["status"], "active");
        assert_eq!(json["step_count"], 0);
    }
}
