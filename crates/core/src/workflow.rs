//! Document review workflow.
//!
//! A document moves between `UNMARKED`, `MARKED`, `CHECKED` and `GENERATED`. Which capability a
//! caller needs depends on the requested status, and for moves back to `UNMARKED` also on the
//! status being left:
//!
//! | Current   | Requested | Required capability   |
//! |-----------|-----------|-----------------------|
//! | MARKED    | UNMARKED  | `can_mark_as_marked`  |
//! | GENERATED | UNMARKED  | `can_mark_as_marked`  |
//! | CHECKED   | UNMARKED  | `can_mark_as_checked` |
//! | any       | MARKED    | `can_mark_as_marked`  |
//! | any       | CHECKED   | `can_mark_as_checked` |
//! | any       | GENERATED | `can_mark_as_marked`  |
//!
//! `UNMARKED -> UNMARKED` has no entry and is rejected.
//!
//! [`StatusWorkflow`] holds the pure rules; [`StatusService`] applies them to a stored document
//! inside a write-locking transaction and persists through the mutation guard.

use crate::config::CoreConfig;
use crate::document::DocumentId;
use crate::guard::{MutationGuard, PendingDocument};
use crate::labels::{Capability, DocumentStatus};
use crate::store::{connect, load_document};
use crate::{CoreError, CoreResult};
use rusqlite::TransactionBehavior;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// CAPABILITIES
// ============================================================================

/// The capabilities granted to one caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    granted: HashSet<Capability>,
}

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from capability names, ignoring names that are not capabilities.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| name.as_ref().trim().parse::<Capability>().ok())
            .collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// TRANSITION RULES
// ============================================================================

/// The transition table and its checks. Stateless.
pub struct StatusWorkflow;

impl StatusWorkflow {
    /// Parses a requested status label. Matching is exact and case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidStatus` if `raw` is not one of the four labels.
    pub fn parse_status(raw: &str) -> CoreResult<DocumentStatus> {
        raw.parse::<DocumentStatus>()
            .map_err(|_| CoreError::InvalidStatus(raw.to_string()))
    }

    /// The capability needed to move from `current` to `requested`, or `None` when the table
    /// has no entry for the move.
    pub fn required_capability(
        current: DocumentStatus,
        requested: DocumentStatus,
    ) -> Option<Capability> {
        use DocumentStatus::*;

        match (current, requested) {
            (Marked | Generated, Unmarked) => Some(Capability::CanMarkAsMarked),
            (Checked, Unmarked) => Some(Capability::CanMarkAsChecked),
            (Unmarked, Unmarked) => None,
            (_, Marked | Generated) => Some(Capability::CanMarkAsMarked),
            (_, Checked) => Some(Capability::CanMarkAsChecked),
        }
    }

    /// Checks that `capabilities` allow the move from `current` to `requested`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UndefinedTransition` when the table has no entry for the move, and
    /// `CoreError::Forbidden` when the required capability is missing.
    pub fn authorise(
        current: DocumentStatus,
        requested: DocumentStatus,
        capabilities: &CapabilitySet,
    ) -> CoreResult<()> {
        let required = Self::required_capability(current, requested).ok_or(
            CoreError::UndefinedTransition {
                from: current,
                to: requested,
            },
        )?;

        if capabilities.contains(required) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                required,
                requested,
            })
        }
    }
}

// ============================================================================
// STATUS SERVICE
// ============================================================================

/// Applies status transitions to stored documents.
#[derive(Clone, Debug)]
pub struct StatusService {
    cfg: Arc<CoreConfig>,
}

impl StatusService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Requests a status change for a document on behalf of a caller.
    ///
    /// The label is validated before the document is looked up, so an unknown label is
    /// reported as such even for a missing document. The capability check uses the status read
    /// inside the same immediate transaction that writes the new one.
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidStatus` for an unknown label
    /// - `CoreError::DocumentNotFound` if no document has `document_id`
    /// - `CoreError::UndefinedTransition` for `UNMARKED -> UNMARKED`
    /// - `CoreError::Forbidden` if the caller lacks the required capability
    /// - `CoreError::Storage` on database failure
    pub fn request_transition(
        &self,
        document_id: DocumentId,
        requested: &str,
        capabilities: &CapabilitySet,
    ) -> CoreResult<DocumentStatus> {
        let requested = StatusWorkflow::parse_status(requested)?;

        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let document = load_document(&tx, document_id)?;
        let current = document.status;

        if let Err(err) = StatusWorkflow::authorise(current, requested, capabilities) {
            tracing::warn!(
                document_id,
                %current,
                %requested,
                "status transition rejected: {}",
                err
            );
            return Err(err);
        }

        let mut pending = PendingDocument::from(document);
        pending.status = requested;
        MutationGuard::save(&tx, pending)?;
        tx.commit()?;

        tracing::info!(document_id, from = %current, to = %requested, "document status updated");
        Ok(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::test_cfg;
    use rusqlite::params;
    use tempfile::TempDir;

    fn caps(names: &[&str]) -> CapabilitySet {
        CapabilitySet::from_names(names)
    }

    fn all_caps() -> CapabilitySet {
        Capability::ALL.iter().copied().collect()
    }

    /// Inserts a document in `status` through the guard and returns its id.
    fn seed_document(cfg: &CoreConfig, status: DocumentStatus) -> DocumentId {
        let mut conn = connect(cfg).expect("connect should succeed");
        let tx = conn.transaction().expect("transaction should open");
        let outcome = MutationGuard::save(
            &tx,
            PendingDocument {
                id: None,
                owner: "editor".into(),
                title: "Закон".into(),
                text: "Статья 1. Запрещается".into(),
                created_at: chrono::Utc::now(),
                points: Default::default(),
                law_type: Default::default(),
                npa: "NOTSELECTED".into(),
                status,
            },
        )
        .expect("seed save should succeed");
        tx.commit().expect("commit should succeed");
        outcome.document.id
    }

    fn stored_status(cfg: &CoreConfig, id: DocumentId) -> DocumentStatus {
        let conn = connect(cfg).expect("connect should succeed");
        load_document(&conn, id).expect("document should load").status
    }

    #[test]
    fn test_capability_set_ignores_unknown_names() {
        let set = caps(&["can_mark_as_marked", " can_mark_as_checked ", "is_admin", ""]);
        assert!(set.contains(Capability::CanMarkAsMarked));
        assert!(set.contains(Capability::CanMarkAsChecked));
        assert!(CapabilitySet::from_names(["CAN_MARK_AS_MARKED"]).is_empty());
    }

    #[test]
    fn test_required_capability_table() {
        use DocumentStatus::*;

        let cases = [
            (Marked, Unmarked, Some(Capability::CanMarkAsMarked)),
            (Generated, Unmarked, Some(Capability::CanMarkAsMarked)),
            (Checked, Unmarked, Some(Capability::CanMarkAsChecked)),
            (Unmarked, Unmarked, None),
        ];
        for (current, requested, expected) in cases {
            assert_eq!(
                StatusWorkflow::required_capability(current, requested),
                expected,
                "{current} -> {requested}"
            );
        }

        for current in DocumentStatus::ALL.iter().copied() {
            assert_eq!(
                StatusWorkflow::required_capability(current, Marked),
                Some(Capability::CanMarkAsMarked)
            );
            assert_eq!(
                StatusWorkflow::required_capability(current, Generated),
                Some(Capability::CanMarkAsMarked)
            );
            assert_eq!(
                StatusWorkflow::required_capability(current, Checked),
                Some(Capability::CanMarkAsChecked)
            );
        }
    }

    #[test]
    fn test_parse_status_is_exact() {
        assert_eq!(
            StatusWorkflow::parse_status("CHECKED").unwrap(),
            DocumentStatus::Checked
        );
        for raw in ["BOGUS", "checked", " CHECKED", ""] {
            assert!(matches!(
                StatusWorkflow::parse_status(raw),
                Err(CoreError::InvalidStatus(_))
            ));
        }
    }

    #[test]
    fn test_marker_cannot_reopen_checked_document() {
        let marker = caps(&["can_mark_as_marked"]);

        assert!(matches!(
            StatusWorkflow::authorise(DocumentStatus::Checked, DocumentStatus::Unmarked, &marker),
            Err(CoreError::Forbidden {
                required: Capability::CanMarkAsChecked,
                ..
            })
        ));
        assert!(
            StatusWorkflow::authorise(DocumentStatus::Marked, DocumentStatus::Unmarked, &marker)
                .is_ok()
        );
    }

    #[test]
    fn test_unmarked_to_unmarked_is_undefined_even_with_all_capabilities() {
        assert!(matches!(
            StatusWorkflow::authorise(
                DocumentStatus::Unmarked,
                DocumentStatus::Unmarked,
                &all_caps()
            ),
            Err(CoreError::UndefinedTransition { .. })
        ));
    }

    #[test]
    fn test_request_transition_persists_new_status() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let id = seed_document(&cfg, DocumentStatus::Unmarked);
        let service = StatusService::new(cfg.clone());

        let status = service
            .request_transition(id, "MARKED", &caps(&["can_mark_as_marked"]))
            .expect("transition should succeed");
        assert_eq!(status, DocumentStatus::Marked);
        assert_eq!(stored_status(&cfg, id), DocumentStatus::Marked);

        service
            .request_transition(id, "UNMARKED", &caps(&["can_mark_as_marked"]))
            .expect("reopening a marked document should succeed");
        assert_eq!(stored_status(&cfg, id), DocumentStatus::Unmarked);
    }

    #[test]
    fn test_forbidden_transition_leaves_document_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let id = seed_document(&cfg, DocumentStatus::Checked);
        let service = StatusService::new(cfg.clone());

        let err = service
            .request_transition(id, "UNMARKED", &caps(&["can_mark_as_marked"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));
        assert_eq!(stored_status(&cfg, id), DocumentStatus::Checked);
    }

    #[test]
    fn test_bogus_status_rejected_regardless_of_capabilities() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let id = seed_document(&cfg, DocumentStatus::Marked);
        let service = StatusService::new(cfg.clone());

        for set in [CapabilitySet::empty(), all_caps()] {
            assert!(matches!(
                service.request_transition(id, "BOGUS", &set),
                Err(CoreError::InvalidStatus(_))
            ));
        }
        // Label errors win over a missing document.
        assert!(matches!(
            service.request_transition(9_999, "BOGUS", &all_caps()),
            Err(CoreError::InvalidStatus(_))
        ));
        assert_eq!(stored_status(&cfg, id), DocumentStatus::Marked);
    }

    #[test]
    fn test_transition_on_missing_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let service = StatusService::new(cfg);

        assert!(matches!(
            service.request_transition(404, "MARKED", &all_caps()),
            Err(CoreError::DocumentNotFound(404))
        ));
    }

    #[test]
    fn test_status_change_keeps_annotations() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let id = seed_document(&cfg, DocumentStatus::Unmarked);
        {
            let conn = connect(&cfg).unwrap();
            conn.execute(
                "INSERT INTO annotations (id, document_id, start_offset, end_offset, orig_text, \
                 law_type, law_justification, json_data, created_at_us) \
                 VALUES (?1, ?2, 0, 6, 'Статья', 'BAN', 'CARE', '{}', 0)",
                params![lawmark_uuid::AnnotationId::new().to_string(), id],
            )
            .unwrap();
        }

        StatusService::new(cfg.clone())
            .request_transition(id, "CHECKED", &caps(&["can_mark_as_checked"]))
            .expect("transition should succeed");

        let conn = connect(&cfg).unwrap();
        assert_eq!(crate::store::count_annotations_for(&conn, id).unwrap(), 1);
    }
}
