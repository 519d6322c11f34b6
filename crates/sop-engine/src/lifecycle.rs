//! Version lifecycle manager
//!
//! Drives a version through draft -> review -> approved -> active ->
//! archived, with deprecation as a side exit before activation, and
//! enforces the single-current-version invariant: activating a version
//! archives the previously current one in the same atomic operation.

use crate::engine::SopEngine;
use crate::error::{ConflictError, IntegrityError, SopError, ValidationError};
use sop_model::{
    validate_transition, TemplateId, Version, VersionId, VersionLabel, VersionStatus,
};

impl SopEngine {
    /// Cut a new draft version from the template's current shape
    ///
    /// Snapshots the step/field/QC counters; the new version starts in
    /// draft and is never current until activated.
    ///
    /// # Errors
    /// Fails validation on a malformed label or a label already used by
    /// this template.
    pub fn cut_version(
        &self,
        template_id: TemplateId,
        label: &str,
        description: impl Into<String>,
        change_log: impl Into<String>,
        actor: &str,
    ) -> Result<Version, SopError> {
        let label: VersionLabel = label.parse()?;
        let template = self.store.template(template_id)?;
        if self
            .store
            .versions_of(template_id)
            .iter()
            .any(|v| v.label == label)
        {
            return Err(ValidationError::DuplicateLabel {
                template: template_id,
                label,
            }
            .into());
        }
        let version = Version::cut(
            &template,
            label,
            description.into(),
            change_log.into(),
            actor,
            chrono::Utc::now(),
        );
        tracing::info!(
            %template_id,
            version_id = %version.id,
            label = %version.label,
            steps = version.snapshot.step_count,
            "version cut"
        );
        self.store.insert_version(version.clone());
        self.record(actor, template_id, "version.cut", version.label.to_string());
        Ok(version)
    }

    /// Submit a draft version for review
    ///
    /// # Errors
    /// Fails unless the version is in draft.
    pub fn submit_for_review(&self, version_id: VersionId, actor: &str) -> Result<Version, SopError> {
        let version = self.store.mutate_version(version_id, |version| {
            validate_transition(version.status, VersionStatus::Review)?;
            version.status = VersionStatus::Review;
            Ok(version.clone())
        })?;
        self.record(actor, version.template_id, "version.submit", version.label.to_string());
        Ok(version)
    }

    /// Approve a version under review, recording the approver
    ///
    /// # Errors
    /// Fails unless the version is in review.
    pub fn approve(&self, version_id: VersionId, approver: &str) -> Result<Version, SopError> {
        let version = self.store.mutate_version(version_id, |version| {
            validate_transition(version.status, VersionStatus::Approved)?;
            let now = chrono::Utc::now();
            version.status = VersionStatus::Approved;
            version.reviewed_by = Some(approver.to_string());
            version.reviewed_at = Some(now);
            version.approved_by = Some(approver.to_string());
            version.approved_at = Some(now);
            Ok(version.clone())
        })?;
        self.record(approver, version.template_id, "version.approve", version.label.to_string());
        Ok(version)
    }

    /// Reject a version under review back to draft
    ///
    /// # Errors
    /// Fails unless the version is in review.
    pub fn reject(&self, version_id: VersionId, reviewer: &str) -> Result<Version, SopError> {
        let version = self.store.mutate_version(version_id, |version| {
            validate_transition(version.status, VersionStatus::Draft)?;
            version.status = VersionStatus::Draft;
            version.reviewed_by = Some(reviewer.to_string());
            version.reviewed_at = Some(chrono::Utc::now());
            Ok(version.clone())
        })?;
        self.record(reviewer, version.template_id, "version.reject", version.label.to_string());
        Ok(version)
    }

    /// Activate an approved version, archiving the previously current one
    ///
    /// Runs under a single write lock: either both the demotion and the
    /// promotion apply, or neither does. A concurrent second activation
    /// observes the already-promoted version and fails its own
    /// precondition.
    ///
    /// # Errors
    /// Fails unless the version belongs to the template and is approved.
    pub fn activate(
        &self,
        template_id: TemplateId,
        version_id: VersionId,
        actor: &str,
    ) -> Result<Version, SopError> {
        let activated = {
            let mut versions = self.store.versions.write();
            let target = versions
                .get(&version_id)
                .ok_or(IntegrityError::UnknownVersion(version_id))?;
            if target.template_id != template_id {
                return Err(IntegrityError::WrongTemplate {
                    version: version_id,
                    template: template_id,
                }
                .into());
            }
            validate_transition(target.status, VersionStatus::Active)?;

            let previous = versions
                .values()
                .find(|v| v.template_id == template_id && v.is_current)
                .map(|v| v.id);
            if let Some(previous) = previous.and_then(|id| versions.get_mut(&id)) {
                previous.status = VersionStatus::Archived;
                previous.is_current = false;
            }

            let target = versions
                .get_mut(&version_id)
                .ok_or(IntegrityError::UnknownVersion(version_id))?;
            target.status = VersionStatus::Active;
            target.is_current = true;
            target.activated_at = Some(chrono::Utc::now());
            target.clone()
        };
        tracing::info!(
            %template_id,
            version_id = %version_id,
            label = %activated.label,
            "version activated"
        );
        self.record(actor, template_id, "version.activate", activated.label.to_string());
        Ok(activated)
    }

    /// Retire a never-activated version
    ///
    /// # Errors
    /// Fails for versions that are active, archived or already
    /// deprecated.
    pub fn deprecate(&self, version_id: VersionId, actor: &str) -> Result<Version, SopError> {
        let version = self.store.mutate_version(version_id, |version| {
            validate_transition(version.status, VersionStatus::Deprecated)?;
            version.status = VersionStatus::Deprecated;
            Ok(version.clone())
        })?;
        self.record(actor, version.template_id, "version.deprecate", version.label.to_string());
        Ok(version)
    }

    /// Delete a non-current version
    ///
    /// # Errors
    /// Fails with a conflict when the version is currently in force.
    pub fn delete_version(&self, version_id: VersionId, actor: &str) -> Result<(), SopError> {
        let removed = {
            let mut versions = self.store.versions.write();
            let version = versions
                .get(&version_id)
                .ok_or(IntegrityError::UnknownVersion(version_id))?;
            if version.is_current {
                return Err(ConflictError::CurrentVersionDelete {
                    version: version_id,
                    label: version.label.clone(),
                }
                .into());
            }
            versions
                .remove(&version_id)
                .ok_or(IntegrityError::UnknownVersion(version_id))?
        };
        self.record(actor, removed.template_id, "version.delete", removed.label.to_string());
        Ok(())
    }
}
