//! Template versions
//!
//! A [`Version`] is a timestamped descriptor of a template's shape at cut
//! time, carrying a lifecycle state and approval lineage. It references its
//! template but is not a structural child: many versions point at one
//! template, and the snapshot counters never change after the cut.

use crate::ids::{TemplateId, VersionId};
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Semantic version label: `v<major>.<minor>.<patch>[-<suffix>]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionLabel {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
    /// Optional pre-release suffix
    pub suffix: Option<String>,
}

impl VersionLabel {
    /// Build a plain label without a suffix
    #[inline]
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: None,
        }
    }
}

/// Label grammar violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// Labels start with a literal `v`
    #[error("version label must start with 'v': {0}")]
    MissingPrefix(String),

    /// The core needs exactly major.minor.patch
    #[error("version label needs major.minor.patch: {0}")]
    MissingParts(String),

    /// A numeric component failed to parse
    #[error("invalid number '{part}' in version label")]
    InvalidNumber {
        /// Offending component text
        part: String,
    },

    /// A `-` must be followed by a non-empty suffix
    #[error("version label suffix is empty")]
    EmptySuffix,

    /// Suffix characters are limited to ASCII alphanumerics, `.` and `-`
    #[error("invalid character '{0}' in version label suffix")]
    InvalidSuffix(char),
}

impl FromStr for VersionLabel {
    type Err = LabelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let rest = raw
            .strip_prefix('v')
            .ok_or_else(|| LabelError::MissingPrefix(raw.to_string()))?;
        let (core, suffix) = match rest.split_once('-') {
            Some((core, suffix)) => (core, Some(suffix)),
            None => (rest, None),
        };

        let mut parts = core.split('.');
        let mut number = || -> Result<u32, LabelError> {
            let part = parts
                .next()
                .ok_or_else(|| LabelError::MissingParts(raw.to_string()))?;
            part.parse::<u32>().map_err(|_| LabelError::InvalidNumber {
                part: part.to_string(),
            })
        };
        let major = number()?;
        let minor = number()?;
        let patch = number()?;
        if parts.next().is_some() {
            return Err(LabelError::MissingParts(raw.to_string()));
        }

        let suffix = match suffix {
            Some("") => return Err(LabelError::EmptySuffix),
            Some(text) => {
                if let Some(bad) = text
                    .chars()
                    .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-')
                {
                    return Err(LabelError::InvalidSuffix(bad));
                }
                Some(text.to_string())
            }
            None => None,
        };

        Ok(Self {
            major,
            minor,
            patch,
            suffix,
        })
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

impl Serialize for VersionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Lifecycle state of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Freshly cut, editable descriptor
    Draft,
    /// Submitted for review
    Review,
    /// Review passed, eligible for activation
    Approved,
    /// The one version currently in force for its template
    Active,
    /// Superseded by a later activation
    Archived,
    /// Retired before ever being activated
    Deprecated,
}

impl VersionStatus {
    /// Stable lowercase name, used in projections and audit details
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Deprecated => "deprecated",
        }
    }
}

/// States reachable from `from` in one transition
#[must_use]
pub fn allowed_transitions(from: VersionStatus) -> Vec<VersionStatus> {
    use VersionStatus::*;
    match from {
        Draft => vec![Review, Deprecated],
        Review => vec![Approved, Draft, Deprecated],
        Approved => vec![Active, Deprecated],
        Active => vec![Archived],
        Archived => vec![],
        Deprecated => vec![],
    }
}

/// Validates a lifecycle transition
///
/// # Errors
/// Returns [`TransitionError`] when the transition is not in the lifecycle
/// graph.
pub fn validate_transition(
    from: VersionStatus,
    to: VersionStatus,
) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::Illegal { from, to })
    }
}

/// A lifecycle transition was attempted from a state that forbids it
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The transition is not in the lifecycle graph
    #[error("illegal version transition: {} -> {}", from.as_str(), to.as_str())]
    Illegal {
        /// Current state
        from: VersionStatus,
        /// Requested state
        to: VersionStatus,
    },
}

/// Structural counters captured when a version is cut
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    /// Steps at cut time
    pub step_count: usize,
    /// Fields across all steps at cut time
    pub field_count: usize,
    /// QC points across all steps at cut time
    pub qc_point_count: usize,
    /// Named feature flags at cut time
    pub flags: BTreeMap<String, String>,
}

impl StructureSnapshot {
    /// Capture the template's current shape
    #[must_use]
    pub fn of(template: &Template) -> Self {
        let mut flags = BTreeMap::new();
        flags.insert(
            "quality_control".to_string(),
            if template.has_quality_control() {
                "enabled".to_string()
            } else {
                "disabled".to_string()
            },
        );
        Self {
            step_count: template.step_count(),
            field_count: template.field_count(),
            qc_point_count: template.qc_point_count(),
            flags,
        }
    }
}

/// A lifecycle-tracked descriptor of a template's shape at cut time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Unique identifier
    pub id: VersionId,
    /// Semantic version label, unique per template
    pub label: VersionLabel,
    /// The template this version describes
    pub template_id: TemplateId,
    /// Template name at cut time (denormalized for list rendering)
    pub template_name: String,
    /// Lifecycle state
    pub status: VersionStatus,
    /// Free-text description
    pub description: String,
    /// Free-text change log
    pub change_log: String,
    /// Who cut the version
    pub created_by: String,
    /// When the version was cut
    pub created_at: DateTime<Utc>,
    /// Who completed review (approval or rejection)
    pub reviewed_by: Option<String>,
    /// When review completed
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Who approved
    pub approved_by: Option<String>,
    /// When approved
    pub approved_at: Option<DateTime<Utc>>,
    /// When activated
    pub activated_at: Option<DateTime<Utc>>,
    /// Whether this is the template's version currently in force
    pub is_current: bool,
    /// Structural counters captured at cut time
    pub snapshot: StructureSnapshot,
}

impl Version {
    /// Cut a new draft version from the template's current shape
    #[must_use]
    pub fn cut(
        template: &Template,
        label: VersionLabel,
        description: String,
        change_log: String,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VersionId::new(),
            label,
            template_id: template.id,
            template_name: template.name.clone(),
            status: VersionStatus::Draft,
            description,
            change_log,
            created_by: actor.to_string(),
            created_at: now,
            reviewed_by: None,
            reviewed_at: None,
            approved_by: None,
            approved_at: None,
            activated_at: None,
            is_current: false,
            snapshot: StructureSnapshot::of(template),
        }
    }
}
