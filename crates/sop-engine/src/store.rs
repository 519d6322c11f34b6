//! In-memory registry of templates and versions
//!
//! Templates and versions live in id-keyed maps behind `parking_lot`
//! locks. Mutations run against a copy and commit only on success, so a
//! failed operation never leaves a half-updated entity behind.

use crate::error::{ConflictError, IntegrityError, SopError};
use parking_lot::RwLock;
use sop_model::{Template, TemplateId, Version, VersionId, VersionStatus};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) templates: RwLock<HashMap<TemplateId, Template>>,
    pub(crate) versions: RwLock<HashMap<VersionId, Version>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_template(&self, template: Template) {
        self.templates.write().insert(template.id, template);
    }

    pub(crate) fn template(&self, id: TemplateId) -> Result<Template, SopError> {
        self.templates
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| IntegrityError::UnknownTemplate(id).into())
    }

    /// Apply a mutation to a template copy and commit on success
    ///
    /// Checks the caller's revision token first when one is supplied.
    pub(crate) fn mutate_template<R>(
        &self,
        id: TemplateId,
        expected_revision: Option<u64>,
        f: impl FnOnce(&mut Template) -> Result<R, SopError>,
    ) -> Result<R, SopError> {
        let mut guard = self.templates.write();
        let slot = guard
            .get_mut(&id)
            .ok_or(IntegrityError::UnknownTemplate(id))?;
        if let Some(expected) = expected_revision {
            if expected != slot.revision {
                return Err(ConflictError::StaleRevision {
                    expected,
                    actual: slot.revision,
                }
                .into());
            }
        }
        let mut draft = slot.clone();
        let out = f(&mut draft)?;
        *slot = draft;
        Ok(out)
    }

    pub(crate) fn insert_version(&self, version: Version) {
        self.versions.write().insert(version.id, version);
    }

    pub(crate) fn version(&self, id: VersionId) -> Result<Version, SopError> {
        self.versions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| IntegrityError::UnknownVersion(id).into())
    }

    /// Apply a mutation to a version copy and commit on success
    pub(crate) fn mutate_version<R>(
        &self,
        id: VersionId,
        f: impl FnOnce(&mut Version) -> Result<R, SopError>,
    ) -> Result<R, SopError> {
        let mut guard = self.versions.write();
        let slot = guard
            .get_mut(&id)
            .ok_or(IntegrityError::UnknownVersion(id))?;
        let mut draft = slot.clone();
        let out = f(&mut draft)?;
        *slot = draft;
        Ok(out)
    }

    /// All versions of a template, newest label first
    pub(crate) fn versions_of(&self, template: TemplateId) -> Vec<Version> {
        let mut rows: Vec<Version> = self
            .versions
            .read()
            .values()
            .filter(|v| v.template_id == template)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.label.cmp(&a.label));
        rows
    }

    pub(crate) fn current_version_of(&self, template: TemplateId) -> Option<Version> {
        self.versions
            .read()
            .values()
            .find(|v| v.template_id == template && v.is_current)
            .cloned()
    }

    pub(crate) fn has_open_draft(&self, template: TemplateId) -> bool {
        self.versions
            .read()
            .values()
            .any(|v| v.template_id == template && v.status == VersionStatus::Draft)
    }
}
