//! Structural editor
//!
//! Mutates a template's structural tree while enforcing ordering and
//! cascade invariants. Display orders of siblings always form a dense
//! 1..=n sequence after any mutation; deleting a parent cascades to its
//! children; deleting a referenced field requires an explicit cascade.

use crate::engine::{EditTicket, MutabilityPolicy, SopEngine};
use crate::error::{ConflictError, IntegrityError, SopError, ValidationError};
use sop_model::{
    Field, FieldDraft, FieldId, QcPointDraft, QcPointId, QualityControlPoint, Step, StepDraft,
    StepId, Template, TemplateDraft, TemplateId, TemplatePatch, VersionStatus,
};

/// Direction of a single-position reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Swap with the previous sibling
    Up,
    /// Swap with the next sibling
    Down,
}

impl SopEngine {
    /// Register a new, empty template
    ///
    /// # Errors
    /// Fails validation on an empty name or empty project entries.
    pub fn create_template(&self, draft: TemplateDraft, actor: &str) -> Result<Template, SopError> {
        let template = draft.build(actor, chrono::Utc::now())?;
        tracing::info!(template_id = %template.id, name = %template.name, "template created");
        self.store.insert_template(template.clone());
        self.record(actor, template.id, "template.create", template.name.clone());
        Ok(template)
    }

    /// Update template metadata (name, status, projects, description)
    ///
    /// # Errors
    /// Fails on an unknown template, a stale revision ticket, or an
    /// invalid patch.
    pub fn update_template_meta(
        &self,
        template_id: TemplateId,
        patch: TemplatePatch,
        ticket: &EditTicket,
    ) -> Result<Template, SopError> {
        patch.validate()?;
        let template =
            self.store
                .mutate_template(template_id, ticket.expected_revision, |template| {
                    patch.apply(template);
                    template.touch(&ticket.actor, chrono::Utc::now());
                    Ok(template.clone())
                })?;
        self.record(&ticket.actor, template_id, "template.update", template.name.clone());
        Ok(template)
    }

    /// Delete a template and its version history
    ///
    /// # Errors
    /// Fails with a conflict while a current version exists.
    pub fn delete_template(&self, template_id: TemplateId, actor: &str) -> Result<(), SopError> {
        let template = self.store.template(template_id)?;
        if self.store.current_version_of(template_id).is_some() {
            return Err(ConflictError::TemplateHasCurrentVersion(template_id).into());
        }
        self.store
            .versions
            .write()
            .retain(|_, v| v.template_id != template_id);
        self.store.templates.write().remove(&template_id);
        tracing::info!(%template_id, name = %template.name, "template deleted");
        self.record(actor, template_id, "template.delete", template.name);
        Ok(())
    }

    /// Append a step to the end of the template
    ///
    /// # Errors
    /// Fails validation on an empty name or zero duration; fails with a
    /// conflict when the mutability policy locks the template.
    pub fn add_step(
        &self,
        template_id: TemplateId,
        draft: StepDraft,
        ticket: &EditTicket,
    ) -> Result<Step, SopError> {
        self.ensure_editable(template_id)?;
        let step = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = draft.build(template.next_step_order())?;
                template.steps.insert(step.id, step.clone());
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(step)
            })?;
        tracing::info!(%template_id, step_id = %step.id, name = %step.name, "step added");
        self.record(&ticket.actor, template_id, "step.add", step.name.clone());
        Ok(step)
    }

    /// Swap a step with its adjacent sibling
    ///
    /// A no-op at either boundary: the first step cannot move up, the
    /// last cannot move down. Sibling orders stay dense afterwards.
    ///
    /// # Errors
    /// Fails on an unknown template or step.
    pub fn reorder_step(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        direction: MoveDirection,
        ticket: &EditTicket,
    ) -> Result<(), SopError> {
        self.ensure_editable(template_id)?;
        let moved = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let index = template.steps.get_index_of(&step_id).ok_or(
                    IntegrityError::UnknownStep {
                        template: template_id,
                        step: step_id,
                    },
                )?;
                let target = match direction {
                    MoveDirection::Up => {
                        if index == 0 {
                            return Ok(false);
                        }
                        index - 1
                    }
                    MoveDirection::Down => {
                        if index + 1 == template.steps.len() {
                            return Ok(false);
                        }
                        index + 1
                    }
                };
                template.steps.swap_indices(index, target);
                template.renumber_steps();
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(true)
            })?;
        if moved {
            self.record(&ticket.actor, template_id, "step.reorder", step_id.to_string());
        }
        Ok(())
    }

    /// Delete a step, cascading to all its fields and QC points
    ///
    /// # Errors
    /// Fails with a conflict when the template has a current version and
    /// no open draft: the activated shape would silently drift. Cut a new
    /// draft version first.
    pub fn delete_step(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        ticket: &EditTicket,
    ) -> Result<(), SopError> {
        self.ensure_editable(template_id)?;
        if self.store.current_version_of(template_id).is_some()
            && !self.store.has_open_draft(template_id)
        {
            return Err(ConflictError::StepUnderCurrentVersion {
                template: template_id,
                step: step_id,
            }
            .into());
        }
        self.store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step =
                    template
                        .steps
                        .shift_remove(&step_id)
                        .ok_or(IntegrityError::UnknownStep {
                            template: template_id,
                            step: step_id,
                        })?;
                tracing::info!(
                    %template_id,
                    %step_id,
                    fields = step.field_count(),
                    qc_points = step.qc_point_count(),
                    "step deleted with children"
                );
                template.renumber_steps();
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(())
            })?;
        self.record(&ticket.actor, template_id, "step.delete", step_id.to_string());
        Ok(())
    }

    /// Add a data-entry field to a step
    ///
    /// # Errors
    /// Fails validation on a draft violating its invariants or a
    /// duplicate field id within the step.
    pub fn add_field(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        draft: FieldDraft,
        ticket: &EditTicket,
    ) -> Result<Field, SopError> {
        self.ensure_editable(template_id)?;
        let field = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                if step.fields.contains_key(&draft.id) {
                    return Err(ValidationError::DuplicateField {
                        step: step_id,
                        field: draft.id.clone(),
                    }
                    .into());
                }
                let field = draft.build(step.fields.len() as u32 + 1)?;
                step.fields.insert(field.id.clone(), field.clone());
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(field)
            })?;
        self.record(&ticket.actor, template_id, "field.add", field.id.to_string());
        Ok(field)
    }

    /// Replace an existing field, keyed by the draft's id
    ///
    /// Keeps the field's display position.
    ///
    /// # Errors
    /// Fails on an unknown field or a draft violating its invariants.
    pub fn update_field(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        draft: FieldDraft,
        ticket: &EditTicket,
    ) -> Result<Field, SopError> {
        self.ensure_editable(template_id)?;
        let field = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                let order = step
                    .fields
                    .get(&draft.id)
                    .ok_or_else(|| IntegrityError::UnknownField {
                        step: step_id,
                        field: draft.id.clone(),
                    })?
                    .display_order;
                let field = draft.build(order)?;
                step.fields.insert(field.id.clone(), field.clone());
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(field)
            })?;
        self.record(&ticket.actor, template_id, "field.update", field.id.to_string());
        Ok(field)
    }

    /// Delete a field from a step
    ///
    /// Without `cascade`, deletion is rejected while any QC point still
    /// references the field. With `cascade`, the field id is also pruned
    /// from every QC point's related list.
    ///
    /// # Errors
    /// Fails with a referential-integrity error when referenced and not
    /// cascading.
    pub fn delete_field(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        field_id: &FieldId,
        cascade: bool,
        ticket: &EditTicket,
    ) -> Result<(), SopError> {
        self.ensure_editable(template_id)?;
        self.store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                if !step.fields.contains_key(field_id) {
                    return Err(IntegrityError::UnknownField {
                        step: step_id,
                        field: field_id.clone(),
                    }
                    .into());
                }
                let referenced_by = step.qc_points_referencing(field_id);
                if !referenced_by.is_empty() {
                    if !cascade {
                        return Err(IntegrityError::FieldStillReferenced {
                            field: field_id.clone(),
                            referenced_by,
                        }
                        .into());
                    }
                    for qc in step.qc_points.values_mut() {
                        qc.related_fields.retain(|id| id != field_id);
                    }
                }
                step.fields.shift_remove(field_id);
                step.renumber_fields();
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(())
            })?;
        self.record(&ticket.actor, template_id, "field.delete", field_id.to_string());
        Ok(())
    }

    /// Add a QC point to a step
    ///
    /// # Errors
    /// Fails with a referential-integrity error when the draft's related
    /// fields do not all resolve on the step.
    pub fn add_qc_point(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        draft: QcPointDraft,
        ticket: &EditTicket,
    ) -> Result<QualityControlPoint, SopError> {
        self.ensure_editable(template_id)?;
        let qc = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                if step.qc_points.contains_key(&draft.id) {
                    return Err(ValidationError::DuplicateQcPoint {
                        step: step_id,
                        qc_point: draft.id.clone(),
                    }
                    .into());
                }
                check_related(step, &draft)?;
                let qc = draft.build(step.qc_points.len() as u32 + 1)?;
                step.qc_points.insert(qc.id.clone(), qc.clone());
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(qc)
            })?;
        self.record(&ticket.actor, template_id, "qc.add", qc.id.to_string());
        Ok(qc)
    }

    /// Replace an existing QC point, keyed by the draft's id
    ///
    /// # Errors
    /// Same checks as [`SopEngine::add_qc_point`], plus the point must
    /// already exist.
    pub fn update_qc_point(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        draft: QcPointDraft,
        ticket: &EditTicket,
    ) -> Result<QualityControlPoint, SopError> {
        self.ensure_editable(template_id)?;
        let qc = self
            .store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                let order = step
                    .qc_points
                    .get(&draft.id)
                    .ok_or_else(|| IntegrityError::UnknownQcPoint {
                        step: step_id,
                        qc_point: draft.id.clone(),
                    })?
                    .display_order;
                check_related(step, &draft)?;
                let qc = draft.build(order)?;
                step.qc_points.insert(qc.id.clone(), qc.clone());
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(qc)
            })?;
        self.record(&ticket.actor, template_id, "qc.update", qc.id.to_string());
        Ok(qc)
    }

    /// Delete a QC point from a step
    ///
    /// # Errors
    /// Fails on an unknown template, step or QC point.
    pub fn delete_qc_point(
        &self,
        template_id: TemplateId,
        step_id: StepId,
        qc_id: &QcPointId,
        ticket: &EditTicket,
    ) -> Result<(), SopError> {
        self.ensure_editable(template_id)?;
        self.store
            .mutate_template(template_id, ticket.expected_revision, |template| {
                let step = step_mut(template, template_id, step_id)?;
                if step.qc_points.shift_remove(qc_id).is_none() {
                    return Err(IntegrityError::UnknownQcPoint {
                        step: step_id,
                        qc_point: qc_id.clone(),
                    }
                    .into());
                }
                step.renumber_qc_points();
                template.touch(&ticket.actor, chrono::Utc::now());
                Ok(())
            })?;
        self.record(&ticket.actor, template_id, "qc.delete", qc_id.to_string());
        Ok(())
    }

    /// Central mutability gate for structural edits
    fn ensure_editable(&self, template_id: TemplateId) -> Result<(), SopError> {
        if self.config.mutability == MutabilityPolicy::AlwaysEditable {
            return Ok(());
        }
        let gating = self.store.versions.read().values().any(|v| {
            v.template_id == template_id
                && matches!(
                    v.status,
                    VersionStatus::Review | VersionStatus::Approved | VersionStatus::Active
                )
        });
        if gating && !self.store.has_open_draft(template_id) {
            return Err(ConflictError::EditsLocked(template_id).into());
        }
        Ok(())
    }
}

fn step_mut(
    template: &mut Template,
    template_id: TemplateId,
    step_id: StepId,
) -> Result<&mut Step, SopError> {
    template
        .steps
        .get_mut(&step_id)
        .ok_or_else(|| {
            IntegrityError::UnknownStep {
                template: template_id,
                step: step_id,
            }
            .into()
        })
}

fn check_related(step: &Step, draft: &QcPointDraft) -> Result<(), SopError> {
    let dangling = step.dangling_references(&draft.related_fields);
    if dangling.is_empty() {
        Ok(())
    } else {
        Err(IntegrityError::DanglingRelatedFields {
            qc_point: draft.id.clone(),
            fields: dangling,
        }
        .into())
    }
}
