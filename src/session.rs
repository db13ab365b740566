//! Session: drives the workflow on a tokio runtime.
//!
//! ```text
//! select_input ─────────────────────────────────────────────────────▶ WorkflowController
//!    └─(image) spawn ──▶ DocumentSource::preview ──────────┐
//! use_sample ──spawn──▶ DocumentSource::from_sample_asset ──┼─▶ event channel ──▶ next_event ──▶ WorkflowController
//! submit ──────spawn──▶ ProcessingClient::submit ───────────┘
//! ```
//!
//! The [`WorkflowController`] decides every transition; this module only runs
//! the asynchronous work it asks for and feeds the outcomes back in. Every
//! spawned task reports exactly one event, tagged so that outcomes for
//! superseded work are recognised on arrival:
//!
//! * selections carry a sequence number; only the newest one is applied
//! * previews carry their [`DocumentId`]; they attach only while that document
//!   is still the active one
//! * completions carry their [`SubmissionId`]; the controller drops stale ones
//!
//! After each applied transition the status announcer is reconciled with the
//! state: started when a submission enters `Processing`, stopped on every way
//! out of it, and dropped together with the session.

use crate::client::{HttpProcessingClient, ProcessingClient};
use crate::config::SessionConfig;
use crate::document::{Document, DocumentId, RasterPreview, RawInput};
use crate::error::{ProcessingError, SessionError};
use crate::export::{ExportRenderer, ExportedPdf};
use crate::observer::{NoopObserver, SharedObserver};
use crate::source::DocumentSource;
use crate::status::{AnnouncerGuard, StatusAnnouncer};
use crate::workflow::{
    Completion, ProcessingResult, SessionState, SubmissionId, SubmissionTicket, TextVariant,
    WorkflowController,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

enum SessionEvent {
    Selected {
        seq: u64,
        outcome: Result<Document, SessionError>,
    },
    PreviewDecoded {
        document_id: DocumentId,
        preview: Option<RasterPreview>,
    },
    Completed {
        id: SubmissionId,
        outcome: Result<ProcessingResult, ProcessingError>,
    },
}

/// What [`Session::next_event`] did with the event it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A document became the active one.
    Selected,
    /// The newest selection failed; an inline notice was raised.
    SelectionFailed,
    /// A selection resolved after a newer one was requested and was dropped.
    SelectionSuperseded,
    /// An image preview was attached to the active document.
    PreviewAttached,
    /// A preview arrived for a document that is no longer active, or none
    /// could be decoded.
    PreviewDiscarded,
    /// A submission finished.
    Completed(Completion),
}

pub struct Session {
    config: SessionConfig,
    controller: WorkflowController,
    source: DocumentSource,
    client: Arc<dyn ProcessingClient>,
    renderer: ExportRenderer,
    observer: SharedObserver,
    announcer: Option<(SubmissionId, AnnouncerGuard)>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    latest_selection: u64,
    selection_pending: bool,
    outstanding: usize,
}

impl Session {
    /// A session talking to the HTTP service named in `config`.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SessionError::Internal(format!("HTTP client: {e}")))?;
        let client = HttpProcessingClient::with_client(http.clone(), &config);
        let source = DocumentSource::with_client(http, &config);
        Ok(Self::assemble(config, source, Arc::new(client)))
    }

    /// A session using a caller-provided processing client.
    pub fn with_client(
        config: SessionConfig,
        client: Arc<dyn ProcessingClient>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let source = DocumentSource::new(&config)?;
        Ok(Self::assemble(config, source, client))
    }

    fn assemble(
        config: SessionConfig,
        source: DocumentSource,
        client: Arc<dyn ProcessingClient>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            renderer: ExportRenderer::new(config.export.clone()),
            config,
            controller: WorkflowController::new(),
            source,
            client,
            observer: Arc::new(NoopObserver),
            announcer: None,
            events_tx,
            events_rx,
            latest_selection: 0,
            selection_pending: false,
            outstanding: 0,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        self.controller.state()
    }

    pub fn notice(&self) -> Option<&SessionError> {
        self.controller.notice()
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        self.controller.state().document()
    }

    /// The progress phrase showing while a submission is in flight.
    pub fn status_text(&self) -> Option<&str> {
        self.announcer.as_ref().and_then(|(_, guard)| guard.current())
    }

    /// True while the sample is being fetched or a submission is in flight.
    /// A preview still decoding does not count.
    pub fn is_busy(&self) -> bool {
        self.selection_pending || self.controller.state().is_processing()
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Make a user-picked file the active document right away.
    ///
    /// Supersedes a sample fetch still in progress. An image's preview is
    /// decoded in the background and attached later; submitting does not wait
    /// for it. Returns `None` and raises an inline notice when the file is
    /// rejected.
    pub fn select_input(&mut self, raw: RawInput) -> Option<DocumentId> {
        self.latest_selection += 1;
        self.selection_pending = false;

        let document = match self.source.from_user_selection(raw) {
            Ok(document) => Arc::new(document),
            Err(e) => {
                warn!("Selection failed: {}", e);
                self.raise_notice(e);
                return None;
            }
        };

        let document_id = document.id();
        if document.is_image() {
            self.spawn_preview(Arc::clone(&document));
        }
        self.controller.select_document(document);
        self.after_transition();
        Some(document_id)
    }

    fn spawn_preview(&mut self, document: Arc<Document>) {
        self.outstanding += 1;
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        let document_id = document.id();
        let task = tokio::spawn(async move { source.preview(&document).await });
        tokio::spawn(async move {
            let preview = task.await.unwrap_or_else(|e| {
                warn!("Preview task for {} failed: {}", document_id, e);
                None
            });
            let _ = tx.send(SessionEvent::PreviewDecoded {
                document_id,
                preview,
            });
        });
    }

    /// Start fetching the sample document.
    pub fn use_sample(&mut self) -> u64 {
        let source = self.source.clone();
        let url = self.config.sample_asset_url.clone();
        self.spawn_selection(async move { source.from_sample_asset(&url).await })
    }

    fn spawn_selection<F>(&mut self, resolve: F) -> u64
    where
        F: Future<Output = Result<Document, SessionError>> + Send + 'static,
    {
        self.latest_selection += 1;
        self.selection_pending = true;
        self.outstanding += 1;

        let seq = self.latest_selection;
        let tx = self.events_tx.clone();
        let task = tokio::spawn(resolve);
        tokio::spawn(async move {
            let outcome = task.await.unwrap_or_else(|e| {
                Err(SessionError::Internal(format!("selection task failed: {e}")))
            });
            let _ = tx.send(SessionEvent::Selected { seq, outcome });
        });
        seq
    }

    // ── Submission ────────────────────────────────────────────────────────

    /// Submit the active document.
    ///
    /// `Ok(None)` means a submission is already in flight and nothing was
    /// sent. With no document selected, the error is also raised as the
    /// inline notice.
    pub fn submit(&mut self) -> Result<Option<SubmissionId>, SessionError> {
        let ticket = match self.controller.submit() {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.observer.on_notice(&e);
                return Err(e);
            }
        };

        let SubmissionTicket { id, document } = ticket;
        self.outstanding += 1;
        let client = Arc::clone(&self.client);
        let tx = self.events_tx.clone();
        let task = tokio::spawn(async move { client.submit(&document).await });
        tokio::spawn(async move {
            let outcome = task.await.unwrap_or_else(|e| {
                Err(ProcessingError::Network(format!("submission task failed: {e}")))
            });
            let _ = tx.send(SessionEvent::Completed { id, outcome });
        });

        self.after_transition();
        Ok(Some(id))
    }

    // ── Event loop ────────────────────────────────────────────────────────

    /// Wait for the next background outcome and apply it.
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub async fn next_event(&mut self) -> Option<SessionUpdate> {
        if self.outstanding == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.outstanding -= 1;
        Some(self.apply(event))
    }

    /// Apply events until no sample fetch is resolving and no submission is in
    /// flight. Stale submissions and previews may still be outstanding
    /// afterwards.
    pub async fn run_until_settled(&mut self) -> &SessionState {
        while self.is_busy() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        self.controller.state()
    }

    fn apply(&mut self, event: SessionEvent) -> SessionUpdate {
        match event {
            SessionEvent::Selected { seq, outcome } => {
                if seq != self.latest_selection {
                    debug!(
                        "Dropping selection #{} (superseded by #{})",
                        seq, self.latest_selection
                    );
                    return SessionUpdate::SelectionSuperseded;
                }
                self.selection_pending = false;
                match outcome {
                    Ok(document) => {
                        self.controller.select_document(Arc::new(document));
                        self.after_transition();
                        SessionUpdate::Selected
                    }
                    Err(e) => {
                        warn!("Selection failed: {}", e);
                        self.raise_notice(e);
                        SessionUpdate::SelectionFailed
                    }
                }
            }
            SessionEvent::PreviewDecoded {
                document_id,
                preview: Some(preview),
            } => {
                if self.controller.attach_preview(document_id, preview) {
                    self.observer.on_state_change(self.controller.state());
                    SessionUpdate::PreviewAttached
                } else {
                    SessionUpdate::PreviewDiscarded
                }
            }
            SessionEvent::PreviewDecoded { preview: None, .. } => SessionUpdate::PreviewDiscarded,
            SessionEvent::Completed { id, outcome } => {
                let completion = self.controller.complete(id, outcome);
                if completion == Completion::Applied {
                    self.after_transition();
                }
                SessionUpdate::Completed(completion)
            }
        }
    }

    // ── Review ────────────────────────────────────────────────────────────

    pub fn switch_variant(&mut self, variant: TextVariant) -> bool {
        let switched = self.controller.switch_variant(variant);
        if switched {
            self.observer.on_state_change(self.controller.state());
        }
        switched
    }

    /// Switch by tag; an unknown tag changes nothing.
    pub fn switch_variant_tag(&mut self, tag: &str) -> bool {
        let switched = self.controller.switch_variant_tag(tag);
        if switched {
            self.observer.on_state_change(self.controller.state());
        }
        switched
    }

    // ── Export ────────────────────────────────────────────────────────────

    /// Render the displayed variant to PDF.
    ///
    /// Failure raises an inline notice and leaves the state untouched.
    pub async fn export(&mut self) -> Result<ExportedPdf, SessionError> {
        let Some(snapshot) = self.controller.export_snapshot() else {
            let reason = format!(
                "nothing to export in state '{}'",
                self.controller.state().name()
            );
            self.raise_notice(SessionError::ExportFailed {
                reason: reason.clone(),
            });
            return Err(SessionError::ExportFailed { reason });
        };

        info!(
            "Exporting {} text of {}",
            snapshot.variant, snapshot.document_id
        );
        match self.renderer.render(snapshot.text).await {
            Ok(pdf) => Ok(pdf),
            Err(e) => {
                let reason = e.to_string();
                warn!("Export failed: {}", reason);
                self.raise_notice(SessionError::ExportFailed {
                    reason: reason.clone(),
                });
                Err(SessionError::ExportFailed { reason })
            }
        }
    }

    /// Export into `dir` under the configured file name.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn export_to_file(&mut self, dir: impl AsRef<Path>) -> Result<PathBuf, SessionError> {
        let pdf = self.export().await?;
        let path = dir.as_ref().join(&pdf.file_name);

        if let Err(e) = write_atomic(&path, &pdf.bytes).await {
            self.raise_notice(SessionError::ExportFailed {
                reason: e.to_string(),
            });
            return Err(e);
        }

        info!(
            "Wrote {} ({} page(s), {} bytes)",
            path.display(),
            pdf.page_count,
            pdf.bytes.len()
        );
        Ok(path)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn raise_notice(&mut self, notice: SessionError) {
        self.observer.on_notice(&notice);
        self.controller.set_notice(notice);
    }

    fn after_transition(&mut self) {
        self.reconcile_announcer();
        self.observer.on_state_change(self.controller.state());
    }

    fn reconcile_announcer(&mut self) {
        let wanted = self.controller.state().submission();
        let current = self.announcer.as_ref().map(|(id, _)| *id);
        if wanted == current {
            return;
        }

        if let Some((id, guard)) = self.announcer.take() {
            debug!("Stopping status for {}", id);
            guard.stop();
        }

        if let Some(id) = wanted {
            let guard = StatusAnnouncer::start(
                self.config.status_phrases.clone(),
                self.config.status_interval(),
            );
            let observer = Arc::clone(&self.observer);
            let updates = guard.updates();
            tokio::spawn(async move {
                tokio::pin!(updates);
                while let Some(phrase) = updates.next().await {
                    observer.on_status(&phrase);
                }
            });
            debug!("Status running for {}", id);
            self.announcer = Some((id, guard));
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", self.controller.state())
            .field("notice", &self.controller.notice())
            .field("announcer", &self.announcer)
            .field("outstanding", &self.outstanding)
            .finish()
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SessionError> {
    let write_err = |e| SessionError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
