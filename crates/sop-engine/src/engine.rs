//! The engine facade
//!
//! [`SopEngine`] owns the in-memory registries and the audit trail, and
//! exposes every operation as a synchronous call returning the mutated
//! entity or a typed failure. Structural editing lives in `editor`,
//! lifecycle handling in `lifecycle`, comparison in `compare`, read models
//! in `projection`.

use crate::audit::AuditLog;
use crate::store::MemoryStore;
use sop_model::TemplateId;

/// Whether structural edits are allowed alongside version snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutabilityPolicy {
    /// Edits always apply to the live template; a cut version is a
    /// counters snapshot, not a lock. Matches the legacy console.
    #[default]
    AlwaysEditable,
    /// Structural edits are rejected while any version sits in
    /// review/approved/active and no draft is open.
    LockWhileUnderReview,
}

/// Engine configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Structural-edit gating policy
    pub mutability: MutabilityPolicy,
}

impl EngineConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a mutability policy
    #[inline]
    #[must_use]
    pub fn with_mutability(mut self, policy: MutabilityPolicy) -> Self {
        self.mutability = policy;
        self
    }
}

/// Who is writing, and which revision they last observed
///
/// A ticket without a revision skips the optimistic-concurrency check;
/// a stale revision fails the write with a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTicket {
    /// Acting user
    pub actor: String,
    /// Template revision the caller last observed
    pub expected_revision: Option<u64>,
}

impl EditTicket {
    /// Ticket for an actor, without a revision check
    #[inline]
    #[must_use]
    pub fn by(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            expected_revision: None,
        }
    }

    /// Require the template to still be at the given revision
    #[inline]
    #[must_use]
    pub fn expecting(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Engine over the SOP model: structural editor, version lifecycle,
/// comparator, audit trail and read-only projections
#[derive(Debug)]
pub struct SopEngine {
    pub(crate) config: EngineConfig,
    pub(crate) store: MemoryStore,
    pub(crate) audit: AuditLog,
}

impl Default for SopEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SopEngine {
    /// Engine with the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with a custom configuration
    #[inline]
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            store: MemoryStore::new(),
            audit: AuditLog::default(),
        }
    }

    /// The tamper-evident mutation trail
    #[inline]
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub(crate) fn record(
        &self,
        actor: &str,
        template_id: TemplateId,
        action: &str,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        tracing::debug!(%template_id, action, %detail, "recorded mutation");
        self.audit.append(actor, template_id, action, detail);
    }
}
