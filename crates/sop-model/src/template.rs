//! SOP templates
//!
//! The [`Template`] is the aggregate root: it exclusively owns its steps,
//! which own their fields and QC points. Ordering and cascade invariants
//! are enforced here and in the engine, never in UI handlers.

use crate::error::DraftError;
use crate::ids::{StepId, TemplateId};
use crate::step::Step;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whether the template is currently assignable to projects
///
/// Distinct from the version lifecycle: an inactive template keeps its
/// version history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    /// Assignable to new projects
    Active,
    /// Hidden from assignment
    Inactive,
}

/// A named, reusable SOP definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Assignability status
    pub status: TemplateStatus,
    /// Project names this template applies to (opaque strings)
    pub applicable_projects: Vec<String>,
    /// Free-text description
    pub description: String,
    /// Who created the template
    pub created_by: String,
    /// When the template was created
    pub created_at: DateTime<Utc>,
    /// Who last changed the template
    pub updated_by: String,
    /// When the template last changed
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped on every mutation
    pub revision: u64,
    /// Owned steps in display order
    pub steps: IndexMap<StepId, Step>,
}

impl Template {
    /// Number of steps
    #[inline]
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Total number of fields across all steps
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.steps.values().map(Step::field_count).sum()
    }

    /// Total number of QC points across all steps
    #[must_use]
    pub fn qc_point_count(&self) -> usize {
        self.steps.values().map(Step::qc_point_count).sum()
    }

    /// Whether any step carries quality control
    #[must_use]
    pub fn has_quality_control(&self) -> bool {
        self.steps.values().any(Step::has_quality_control)
    }

    /// Display order the next appended step receives
    #[inline]
    #[must_use]
    pub fn next_step_order(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Reassign step display orders to 1..=n by list position
    pub fn renumber_steps(&mut self) {
        for (index, step) in self.steps.values_mut().enumerate() {
            step.display_order = index as u32 + 1;
        }
    }

    /// Stamp the last-updater lineage and bump the revision
    pub fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.updated_by = actor.to_string();
        self.updated_at = now;
        self.revision += 1;
    }
}

/// Author input for creating a [`Template`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    /// Display name
    pub name: String,
    /// Project names this template applies to
    pub applicable_projects: Vec<String>,
    /// Free-text description
    pub description: String,
}

impl TemplateDraft {
    /// Draft with a name and no project bindings
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applicable_projects: Vec::new(),
            description: String::new(),
        }
    }

    /// Check the draft's local invariants
    ///
    /// # Errors
    /// Returns [`DraftError`] on an empty name or an empty project entry.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName { entity: "template" });
        }
        if self.applicable_projects.iter().any(|p| p.trim().is_empty()) {
            return Err(DraftError::EmptyProjectName);
        }
        Ok(())
    }

    /// Validate and build an empty active template
    ///
    /// # Errors
    /// Propagates [`DraftError`] from [`TemplateDraft::validate`].
    pub fn build(self, actor: &str, now: DateTime<Utc>) -> Result<Template, DraftError> {
        self.validate()?;
        Ok(Template {
            id: TemplateId::new(),
            name: self.name,
            status: TemplateStatus::Active,
            applicable_projects: self.applicable_projects,
            description: self.description,
            created_by: actor.to_string(),
            created_at: now,
            updated_by: actor.to_string(),
            updated_at: now,
            revision: 0,
            steps: IndexMap::new(),
        })
    }
}

/// Partial update of template metadata
///
/// `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatePatch {
    /// New display name
    pub name: Option<String>,
    /// New assignability status
    pub status: Option<TemplateStatus>,
    /// New project bindings
    pub applicable_projects: Option<Vec<String>>,
    /// New description
    pub description: Option<String>,
}

impl TemplatePatch {
    /// Check the patch's local invariants
    ///
    /// # Errors
    /// Returns [`DraftError`] when a supplied name or project entry is empty.
    pub fn validate(&self) -> Result<(), DraftError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DraftError::EmptyName { entity: "template" });
            }
        }
        if let Some(projects) = &self.applicable_projects {
            if projects.iter().any(|p| p.trim().is_empty()) {
                return Err(DraftError::EmptyProjectName);
            }
        }
        Ok(())
    }

    /// Apply the patch to a template (metadata only)
    pub fn apply(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(status) = self.status {
            template.status = status;
        }
        if let Some(projects) = self.applicable_projects {
            template.applicable_projects = projects;
        }
        if let Some(description) = self.description {
            template.description = description;
        }
    }
}
