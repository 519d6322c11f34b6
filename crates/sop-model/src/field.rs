//! Data-entry fields
//!
//! A [`Field`] is a single data-capture slot on a step. Its default value
//! and validation rule are tagged unions keyed by the declared
//! [`FieldKind`], so a number field can never carry a date default or a
//! pattern rule.

use crate::error::DraftError;
use crate::ids::FieldId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared data kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Numeric value
    Number,
    /// Calendar date
    Date,
    /// File attachment reference
    File,
    /// Enumerated choice from a fixed option list
    Choice,
    /// Multi-line text
    Multiline,
    /// Yes/no flag
    Boolean,
}

impl FieldKind {
    /// Stable lowercase name, used in projections and audit details
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::File => "file",
            Self::Choice => "choice",
            Self::Multiline => "multiline",
            Self::Boolean => "boolean",
        }
    }
}

/// A kind-typed field value (defaults, captured data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Single-line text
    Text(String),
    /// Numeric value
    Number(f64),
    /// Calendar date
    Date(NaiveDate),
    /// File attachment reference
    File(String),
    /// One of the field's enumerated options
    Choice(String),
    /// Multi-line text
    Multiline(String),
    /// Yes/no flag
    Boolean(bool),
}

impl FieldValue {
    /// The kind this value belongs to
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::Date(_) => FieldKind::Date,
            Self::File(_) => FieldKind::File,
            Self::Choice(_) => FieldKind::Choice,
            Self::Multiline(_) => FieldKind::Multiline,
            Self::Boolean(_) => FieldKind::Boolean,
        }
    }
}

/// Kind-specific validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Inclusive numeric bounds; either side may be open
    NumericRange {
        /// Lower bound, if any
        min: Option<f64>,
        /// Upper bound, if any
        max: Option<f64>,
    },
    /// Regular-expression pattern for textual kinds
    Pattern {
        /// The pattern source
        pattern: String,
    },
    /// Free-form expression evaluated by the execution layer
    Expression {
        /// The expression source
        expression: String,
    },
}

impl ValidationRule {
    /// Whether this rule is meaningful for a field of the given kind
    #[must_use]
    pub fn applies_to(&self, kind: FieldKind) -> bool {
        match self {
            Self::NumericRange { .. } => kind == FieldKind::Number,
            Self::Pattern { .. } => matches!(
                kind,
                FieldKind::Text | FieldKind::Multiline | FieldKind::File | FieldKind::Choice
            ),
            Self::Expression { .. } => true,
        }
    }
}

/// Independent capability flags on a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    /// Shown in the quick data-entry panel
    pub quick_panel: bool,
    /// Editable across a whole batch at once
    pub batch_edit: bool,
    /// Participates in validation runs
    pub validated: bool,
    /// Included in generated reports
    pub in_report: bool,
}

/// A data-capture slot on a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Identifier, unique within the owning step
    pub id: FieldId,
    /// Display name
    pub name: String,
    /// Declared data kind
    pub kind: FieldKind,
    /// Whether a value must be captured
    pub required: bool,
    /// Kind-typed default value
    pub default: Option<FieldValue>,
    /// Measurement unit, if any
    pub unit: Option<String>,
    /// Option list; non-empty iff `kind` is [`FieldKind::Choice`]
    pub options: Vec<String>,
    /// Kind-specific validation rule
    pub rule: Option<ValidationRule>,
    /// Position among sibling fields, 1-based and dense
    pub display_order: u32,
    /// Capability flags
    pub flags: FieldFlags,
}

/// Author input for creating or updating a [`Field`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    /// Identifier, unique within the owning step
    pub id: FieldId,
    /// Display name
    pub name: String,
    /// Declared data kind
    pub kind: FieldKind,
    /// Whether a value must be captured
    pub required: bool,
    /// Kind-typed default value
    pub default: Option<FieldValue>,
    /// Measurement unit, if any
    pub unit: Option<String>,
    /// Option list for choice fields
    pub options: Vec<String>,
    /// Kind-specific validation rule
    pub rule: Option<ValidationRule>,
    /// Capability flags
    pub flags: FieldFlags,
}

impl FieldDraft {
    /// Minimal draft: required text field with no default or rule
    #[must_use]
    pub fn new(id: impl Into<FieldId>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            required: true,
            default: None,
            unit: None,
            options: Vec::new(),
            rule: None,
            flags: FieldFlags::default(),
        }
    }

    /// Check the draft's local invariants
    ///
    /// # Errors
    /// Returns [`DraftError`] on an empty id or name, an option list that
    /// contradicts the kind, or a default/rule that does not match the kind.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.id.is_empty() {
            return Err(DraftError::EmptyIdentifier { entity: "field" });
        }
        if self.name.trim().is_empty() {
            return Err(DraftError::EmptyName { entity: "field" });
        }
        if self.kind == FieldKind::Choice {
            if self.options.is_empty() {
                return Err(DraftError::EmptyOptions {
                    field: self.id.to_string(),
                });
            }
        } else if !self.options.is_empty() {
            return Err(DraftError::UnexpectedOptions {
                field: self.id.to_string(),
                kind: self.kind,
            });
        }
        if let Some(default) = &self.default {
            if default.kind() != self.kind {
                return Err(DraftError::DefaultKindMismatch {
                    field: self.id.to_string(),
                    expected: self.kind,
                    got: default.kind(),
                });
            }
        }
        if let Some(rule) = &self.rule {
            if !rule.applies_to(self.kind) {
                return Err(DraftError::RuleKindMismatch {
                    field: self.id.to_string(),
                    kind: self.kind,
                });
            }
        }
        Ok(())
    }

    /// Validate and build the field at the given display position
    ///
    /// # Errors
    /// Propagates [`DraftError`] from [`FieldDraft::validate`].
    pub fn build(self, display_order: u32) -> Result<Field, DraftError> {
        self.validate()?;
        Ok(Field {
            id: self.id,
            name: self.name,
            kind: self.kind,
            required: self.required,
            default: self.default,
            unit: self.unit,
            options: self.options,
            rule: self.rule,
            display_order,
            flags: self.flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_draft_builds() {
        let field = FieldDraft::new("f1", "Concentration", FieldKind::Number)
            .build(1)
            .unwrap();
        assert_eq!(field.display_order, 1);
        assert_eq!(field.kind, FieldKind::Number);
    }

    #[test]
    fn rejects_empty_identifier_and_name() {
        let draft = FieldDraft::new("", "Concentration", FieldKind::Number);
        assert_eq!(
            draft.validate(),
            Err(DraftError::EmptyIdentifier { entity: "field" })
        );

        let draft = FieldDraft::new("f1", "  ", FieldKind::Number);
        assert_eq!(draft.validate(), Err(DraftError::EmptyName { entity: "field" }));
    }

    #[test]
    fn choice_requires_options_and_others_reject_them() {
        let mut draft = FieldDraft::new("f1", "Solvent", FieldKind::Choice);
        assert!(matches!(draft.validate(), Err(DraftError::EmptyOptions { .. })));

        draft.options = vec!["methanol".into(), "acetonitrile".into()];
        assert!(draft.validate().is_ok());

        let mut text = FieldDraft::new("f2", "Notes", FieldKind::Text);
        text.options = vec!["stray".into()];
        assert!(matches!(text.validate(), Err(DraftError::UnexpectedOptions { .. })));
    }

    #[test]
    fn default_must_match_kind() {
        let mut draft = FieldDraft::new("f1", "Concentration", FieldKind::Number);
        draft.default = Some(FieldValue::Text("oops".into()));
        assert!(matches!(
            draft.validate(),
            Err(DraftError::DefaultKindMismatch { .. })
        ));

        draft.default = Some(FieldValue::Number(1.5));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn rule_must_apply_to_kind() {
        let mut draft = FieldDraft::new("f1", "Batch code", FieldKind::Text);
        draft.rule = Some(ValidationRule::NumericRange {
            min: Some(0.0),
            max: None,
        });
        assert!(matches!(draft.validate(), Err(DraftError::RuleKindMismatch { .. })));

        draft.rule = Some(ValidationRule::Pattern {
            pattern: "^[A-Z]{2}-\\d{4}$".into(),
        });
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn value_serde_is_kind_tagged() {
        let value = FieldValue::Number(2.5);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"kind":"number","value":2.5}"#);
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
