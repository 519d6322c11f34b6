//! Tamper-evident audit trail
//!
//! Laboratory compliance requires a record of who changed which template
//! and when. Events form a hash chain; `verify_integrity` re-walks it and
//! fails on any mutation of recorded history.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sop_model::TemplateId;
use ulid::Ulid;

/// One recorded mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier
    pub event_id: Ulid,
    /// When the mutation committed
    pub timestamp: DateTime<Utc>,
    /// Who performed it
    pub actor: String,
    /// The template it touched
    pub template_id: TemplateId,
    /// Machine-readable action name, e.g. `step.add`
    pub action: String,
    /// Human-readable detail
    pub detail: String,
    /// Hash of the previous event in the chain
    pub prev_hash: [u8; 32],
    /// Hash of this event
    pub hash: [u8; 32],
}

/// The audit chain failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// Recorded history was mutated or reordered
    #[error("audit chain integrity violation")]
    IntegrityViolation,
}

/// Append-only hash-chained log of template mutations
#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<Vec<AuditEvent>>,
}

impl AuditLog {
    /// Record a committed mutation, linking it into the chain
    pub fn append(
        &self,
        actor: &str,
        template_id: TemplateId,
        action: &str,
        detail: impl Into<String>,
    ) -> Ulid {
        let mut guard = self.inner.lock();
        let prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        let mut event = AuditEvent {
            event_id: Ulid::new(),
            timestamp: Utc::now(),
            actor: actor.to_string(),
            template_id,
            action: action.to_string(),
            detail: detail.into(),
            prev_hash,
            hash: [0u8; 32],
        };
        event.hash = compute_hash(&event);
        let id = event.event_id;
        guard.push(event);
        id
    }

    /// Snapshot of all recorded events
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().clone()
    }

    /// Recorded events touching one template
    #[must_use]
    pub fn events_for(&self, template_id: TemplateId) -> Vec<AuditEvent> {
        self.inner
            .lock()
            .iter()
            .filter(|e| e.template_id == template_id)
            .cloned()
            .collect()
    }

    /// Re-walk the chain and verify every link and event hash
    ///
    /// # Errors
    /// Returns [`AuditError::IntegrityViolation`] on any mismatch.
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for event in guard.iter() {
            if event.prev_hash != prev {
                return Err(AuditError::IntegrityViolation);
            }
            if compute_hash(event) != event.hash {
                return Err(AuditError::IntegrityViolation);
            }
            prev = event.hash;
        }
        Ok(())
    }
}

fn compute_hash(event: &AuditEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(event.event_id.to_bytes());
    hasher.update(event.timestamp.timestamp_millis().to_le_bytes());
    hasher.update(event.actor.as_bytes());
    hasher.update([0]);
    hasher.update(event.template_id.0.to_bytes());
    hasher.update(event.action.as_bytes());
    hasher.update([0]);
    hasher.update(event.detail.as_bytes());
    hasher.update(event.prev_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_links_and_verifies() {
        let log = AuditLog::default();
        let template = TemplateId::new();
        log.append("alice", template, "template.create", "DNA extraction");
        log.append("alice", template, "step.add", "Extraction");
        log.append("bob", TemplateId::new(), "step.add", "PCR");

        assert!(log.verify_integrity().is_ok());
        assert_eq!(log.events().len(), 3);
        assert_eq!(log.events_for(template).len(), 2);

        let events = log.events();
        assert_eq!(events[1].prev_hash, events[0].hash);
        assert_eq!(events[2].prev_hash, events[1].hash);
    }
}
