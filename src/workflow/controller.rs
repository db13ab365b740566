//! The session state machine.
//!
//! `WorkflowController` is synchronous and owns no runtime: it decides what
//! the next state is and which network call (if any) should be made, and the
//! caller reports back with [`WorkflowController::complete`]. That keeps the
//! one correctness-critical race (a late response for a superseded document)
//! testable without timers or sockets.
//!
//! | Event | From | To |
//! |---|---|---|
//! | `select_document` | any | `Ready` |
//! | `submit` | `Ready` / `Succeeded` / `Failed` | `Processing` |
//! | `submit` | `Processing` | unchanged, no call |
//! | `submit` | `Idle` | unchanged, `NoDocumentSelected` |
//! | `complete(Ok)` | `Processing` (same id) | `Succeeded(translated)` |
//! | `complete(Err)` | `Processing` (same id) | `Failed` |
//! | `switch_variant` | `Succeeded` | `Succeeded` |
//! | `attach_preview` | any holding the same document | unchanged |

use super::state::{
    Completion, ExportSnapshot, ProcessingResult, SessionState, SubmissionId, SubmissionTicket,
    TextVariant,
};
use crate::document::{Document, DocumentId, RasterPreview};
use crate::error::{ProcessingError, SessionError};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct WorkflowController {
    state: SessionState,
    notice: Option<SessionError>,
    last_submission: u64,
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            notice: None,
            last_submission: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Inline message shown beside the state (validation, sample or export
    /// failure). Never affects the state itself.
    pub fn notice(&self) -> Option<&SessionError> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: SessionError) {
        debug!("Notice: {}", notice);
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Make `document` the active document, discarding any result or error.
    ///
    /// An in-flight submission for the previous document is not cancelled; its
    /// completion will be reported [`Completion::Stale`].
    pub fn select_document(&mut self, document: Arc<Document>) {
        if let Some(id) = self.state.submission() {
            info!("{} superseded by new selection {}", id, document.id());
        }
        info!(
            "Selected {} '{}' ({})",
            document.id(),
            document.display_name(),
            document.size_label()
        );
        self.state = SessionState::Ready { document };
        self.notice = None;
    }

    /// Attach a decoded preview to the active document if it is still `id`.
    ///
    /// The state variant, the submission in flight and the result are kept.
    /// Returns `false` when `id` is no longer the active document.
    pub fn attach_preview(&mut self, id: DocumentId, preview: RasterPreview) -> bool {
        match &mut self.state {
            SessionState::Ready { document }
            | SessionState::Processing { document, .. }
            | SessionState::Succeeded { document, .. }
            | SessionState::Failed { document, .. }
                if document.id() == id =>
            {
                debug!("Preview {}x{} attached to {}", preview.width, preview.height, id);
                *document = Arc::new(document.with_preview(preview));
                true
            }
            other => {
                debug!("Preview for {} discarded (state is {})", id, other);
                false
            }
        }
    }

    /// Request a submission of the active document.
    ///
    /// Returns `Ok(Some(ticket))` when exactly one call to the processing
    /// service must now be made, and `Ok(None)` when a submission is already in
    /// flight.
    pub fn submit(&mut self) -> Result<Option<SubmissionTicket>, SessionError> {
        let document = match &self.state {
            SessionState::Idle => {
                warn!("Submit requested with no document selected");
                self.notice = Some(SessionError::NoDocumentSelected);
                return Err(SessionError::NoDocumentSelected);
            }
            SessionState::Processing { submission, .. } => {
                debug!("Submit ignored: {} already in flight", submission);
                return Ok(None);
            }
            SessionState::Ready { document }
            | SessionState::Succeeded { document, .. }
            | SessionState::Failed { document, .. } => Arc::clone(document),
        };

        self.last_submission += 1;
        let id = SubmissionId(self.last_submission);
        info!("Submitting {} as {}", document.id(), id);

        self.state = SessionState::Processing {
            document: Arc::clone(&document),
            submission: id,
        };
        self.notice = None;
        Ok(Some(SubmissionTicket { id, document }))
    }

    /// Deliver the outcome of submission `id`.
    pub fn complete(
        &mut self,
        id: SubmissionId,
        outcome: Result<ProcessingResult, ProcessingError>,
    ) -> Completion {
        let document = match &self.state {
            SessionState::Processing {
                document,
                submission,
            } if *submission == id => Arc::clone(document),
            other => {
                warn!(
                    "Discarding stale response for {} (state is {})",
                    id, other
                );
                return Completion::Stale;
            }
        };

        self.state = match outcome {
            Ok(result) => {
                info!(
                    "{} succeeded: {} chars extracted, {} chars translated",
                    id,
                    result.extracted_text.chars().count(),
                    result.translated_text.chars().count()
                );
                SessionState::Succeeded {
                    document,
                    result,
                    variant: TextVariant::Translated,
                }
            }
            Err(e) => {
                warn!("{} failed: {}", id, e);
                SessionState::Failed {
                    document,
                    message: e.user_message(),
                }
            }
        };
        Completion::Applied
    }

    /// Change the displayed variant. Only meaningful in `Succeeded`.
    pub fn switch_variant(&mut self, to: TextVariant) -> bool {
        match &mut self.state {
            SessionState::Succeeded { variant, .. } => {
                if *variant != to {
                    debug!("Variant {} → {}", variant, to);
                    *variant = to;
                }
                true
            }
            other => {
                debug!("switch_variant ignored in state {}", other.name());
                false
            }
        }
    }

    /// Like [`switch_variant`](Self::switch_variant), from a string tag.
    /// An unrecognised tag changes nothing.
    pub fn switch_variant_tag(&mut self, tag: &str) -> bool {
        match TextVariant::from_tag(tag) {
            Some(v) => self.switch_variant(v),
            None => {
                warn!("Ignoring unknown text variant '{}'", tag);
                false
            }
        }
    }

    /// The text an export should render right now.
    pub fn export_snapshot(&self) -> Option<ExportSnapshot> {
        match &self.state {
            SessionState::Succeeded {
                document,
                result,
                variant,
            } => Some(ExportSnapshot {
                document_id: document.id(),
                variant: *variant,
                text: result.text(*variant).to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Arc<Document> {
        Arc::new(Document::new(b"%PDF".to_vec(), "application/pdf", name, None))
    }

    fn preview() -> RasterPreview {
        RasterPreview {
            width: 4,
            height: 3,
            data_uri: "data:image/png;base64,AAAA".into(),
        }
    }

    fn ok(extracted: &str, translated: &str) -> Result<ProcessingResult, ProcessingError> {
        Ok(ProcessingResult::new(extracted, translated))
    }

    fn succeeded(c: &mut WorkflowController) {
        c.select_document(doc("a.pdf"));
        let t = c.submit().unwrap().unwrap();
        assert_eq!(c.complete(t.id, ok("src", "dst")), Completion::Applied);
    }

    #[test]
    fn selection_always_lands_in_ready() {
        let mut c = WorkflowController::new();

        // from Idle
        c.select_document(doc("1.pdf"));
        assert!(matches!(c.state(), SessionState::Ready { .. }));

        // from Processing
        c.submit().unwrap();
        c.select_document(doc("2.pdf"));
        assert!(matches!(c.state(), SessionState::Ready { .. }));

        // from Succeeded
        succeeded(&mut c);
        c.select_document(doc("3.pdf"));
        assert!(c.state().result().is_none());
        assert!(matches!(c.state(), SessionState::Ready { .. }));

        // from Failed
        let t = c.submit().unwrap().unwrap();
        c.complete(t.id, Err(ProcessingError::Network("down".into())));
        c.select_document(doc("4.pdf"));
        assert!(c.state().error_message().is_none());
        assert_eq!(c.state().document().unwrap().display_name(), "4.pdf");
    }

    #[test]
    fn submit_while_processing_is_a_noop() {
        let mut c = WorkflowController::new();
        c.select_document(doc("a.pdf"));
        let first = c.submit().unwrap();
        assert!(first.is_some());
        assert!(c.submit().unwrap().is_none());
        assert!(c.submit().unwrap().is_none());
        assert_eq!(c.state().submission(), first.map(|t| t.id));
    }

    #[test]
    fn submit_from_idle_is_rejected_and_noticed() {
        let mut c = WorkflowController::new();
        let err = c.submit().unwrap_err();
        assert!(matches!(err, SessionError::NoDocumentSelected));
        assert!(matches!(c.state(), SessionState::Idle));
        assert_eq!(
            c.notice().map(|n| n.to_string()).as_deref(),
            Some("Please upload a document or use the sample document first.")
        );

        // Selecting clears the notice.
        c.select_document(doc("a.pdf"));
        assert!(c.notice().is_none());
    }

    #[test]
    fn success_defaults_to_translated() {
        let mut c = WorkflowController::new();
        succeeded(&mut c);
        assert_eq!(c.state().variant(), Some(TextVariant::Translated));
        assert_eq!(c.state().active_text(), Some("dst"));
    }

    #[test]
    fn failure_carries_user_message() {
        let mut c = WorkflowController::new();
        c.select_document(doc("a.gif"));
        let t = c.submit().unwrap().unwrap();
        c.complete(
            t.id,
            Err(ProcessingError::Rejected {
                status: Some(400),
                detail: Some("Unsupported file type. Allowed: png, jpg, pdf".into()),
            }),
        );
        assert_eq!(
            c.state().error_message(),
            Some("Unsupported file type. Allowed: png, jpg, pdf")
        );

        let t = c.submit().unwrap().unwrap();
        c.complete(t.id, Err(ProcessingError::Timeout { secs: 300 }));
        assert_eq!(
            c.state().error_message(),
            Some(crate::error::GENERIC_PROCESSING_FAILURE)
        );
    }

    #[test]
    fn superseded_response_is_stale() {
        let mut c = WorkflowController::new();
        c.select_document(doc("d1.pdf"));
        let t1 = c.submit().unwrap().unwrap();

        let d2 = doc("d2.pdf");
        c.select_document(Arc::clone(&d2));
        assert_eq!(c.complete(t1.id, ok("old", "old")), Completion::Stale);
        assert!(matches!(c.state(), SessionState::Ready { document } if document.id() == d2.id()));

        // Even after D2 starts its own submission, D1's late answer is ignored.
        let t2 = c.submit().unwrap().unwrap();
        assert_eq!(c.complete(t1.id, ok("old", "old")), Completion::Stale);
        assert!(c.state().is_processing());
        assert_eq!(c.complete(t2.id, ok("new", "new")), Completion::Applied);
        assert_eq!(c.state().active_text(), Some("new"));
    }

    #[test]
    fn resubmitting_same_document_supersedes_earlier_ticket() {
        let mut c = WorkflowController::new();
        c.select_document(doc("a.pdf"));
        let t1 = c.submit().unwrap().unwrap();
        c.complete(t1.id, Err(ProcessingError::Network("reset".into())));

        let t2 = c.submit().unwrap().unwrap();
        assert_ne!(t1.id, t2.id);
        assert_eq!(t1.document.id(), t2.document.id());
        assert_eq!(c.complete(t1.id, ok("x", "y")), Completion::Stale);
        assert_eq!(c.complete(t2.id, ok("x", "y")), Completion::Applied);
        assert_eq!(c.complete(t2.id, ok("x", "z")), Completion::Stale);
        assert_eq!(c.state().active_text(), Some("y"));
    }

    #[test]
    fn switch_variant_only_in_succeeded() {
        let mut c = WorkflowController::new();
        assert!(!c.switch_variant(TextVariant::Extracted));

        c.select_document(doc("a.pdf"));
        assert!(!c.switch_variant(TextVariant::Extracted));
        let t = c.submit().unwrap().unwrap();
        assert!(!c.switch_variant(TextVariant::Extracted));
        c.complete(t.id, ok("src", "dst"));

        assert!(c.switch_variant(TextVariant::Extracted));
        assert_eq!(c.state().active_text(), Some("src"));
        // Switching never starts a submission.
        assert!(!c.state().is_processing());
        assert_eq!(c.state().result(), Some(&ProcessingResult::new("src", "dst")));
    }

    #[test]
    fn unknown_variant_tag_is_a_noop() {
        let mut c = WorkflowController::new();
        succeeded(&mut c);
        c.switch_variant(TextVariant::Extracted);
        assert!(!c.switch_variant_tag("romanized"));
        assert_eq!(c.state().variant(), Some(TextVariant::Extracted));
        assert!(c.switch_variant_tag("TRANSLATED"));
        assert_eq!(c.state().variant(), Some(TextVariant::Translated));
    }

    #[test]
    fn notice_never_changes_state() {
        let mut c = WorkflowController::new();
        succeeded(&mut c);
        c.set_notice(SessionError::ExportFailed {
            reason: "font missing".into(),
        });
        assert_eq!(c.state().active_text(), Some("dst"));
        assert!(c.notice().is_some());
        c.clear_notice();
        assert!(c.notice().is_none());
    }

    #[test]
    fn export_snapshot_follows_active_variant() {
        let mut c = WorkflowController::new();
        assert!(c.export_snapshot().is_none());
        succeeded(&mut c);

        let snap = c.export_snapshot().unwrap();
        assert_eq!(snap.variant, TextVariant::Translated);
        assert_eq!(snap.text, "dst");

        c.switch_variant(TextVariant::Extracted);
        assert_eq!(c.export_snapshot().unwrap().text, "src");
    }

    #[test]
    fn preview_lands_mid_submission_without_disturbing_it() {
        let mut c = WorkflowController::new();
        let d = doc("page.png");
        c.select_document(Arc::clone(&d));
        let t = c.submit().unwrap().unwrap();

        assert!(c.attach_preview(d.id(), preview()));
        assert_eq!(c.state().submission(), Some(t.id));
        let shown = c.state().document().unwrap();
        assert_eq!(shown.id(), d.id());
        assert_eq!(shown.preview().map(|p| p.height), Some(3));

        assert_eq!(c.complete(t.id, ok("src", "dst")), Completion::Applied);
        assert!(c.state().document().unwrap().preview().is_some());
    }

    #[test]
    fn preview_for_replaced_document_is_dropped() {
        let mut c = WorkflowController::new();
        assert!(!c.attach_preview(doc("x.png").id(), preview()));
        assert!(matches!(c.state(), SessionState::Idle));

        let old = doc("old.png");
        c.select_document(Arc::clone(&old));
        c.select_document(doc("new.pdf"));
        assert!(!c.attach_preview(old.id(), preview()));
        let active = c.state().document().unwrap();
        assert_eq!(active.display_name(), "new.pdf");
        assert!(active.preview().is_none());
    }
}
