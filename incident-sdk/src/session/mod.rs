//! Operation lifecycle management for a single analysis session
//!
//! This module owns the single-flight slot for each operation kind, the
//! cancellation tokens behind them, and the published document state.
//! Starting an operation supersedes any in-flight operation of the same
//! kind, and only the most recently started invocation can ever publish —
//! result publication is last-writer-wins by start order, never by
//! completion order.

use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::error::{CancelKind, Result, ServiceError};
use crate::resilience::CancelToken;
use crate::services::incident::{
    AnalysisResponse, FeedbackRequest, IncidentClient, SectionType, TranscriptRequest,
};

/// The two logical operations a session can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Analyze,
    Refine,
}

/// Error surfaced to the operator when an operation terminally fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFacingError {
    /// One-line summary suitable for display
    pub message: String,

    /// Structured field errors, when the upstream provided them
    pub details: Option<Vec<String>>,
}

impl UserFacingError {
    fn from_error(err: &ServiceError) -> Self {
        Self {
            message: err.to_string(),
            details: err.details().map(|d| d.to_vec()),
        }
    }
}

/// Outcome of one operation invocation.
///
/// The caller sees exactly one of: a fresh document, an error message, or a
/// silent no-op for cancellation.
#[derive(Debug, Clone)]
pub enum OperationOutcome {
    /// A fresh validated document was published
    Completed(Arc<AnalysisResponse>),

    /// The operation failed terminally; the previous document is untouched
    Failed(UserFacingError),

    /// The operation was cancelled or superseded; nothing was published
    Cancelled,
}

/// Immutable view of the session's observable state
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// The most recently published document, if any
    pub current_document: Option<Arc<AnalysisResponse>>,

    /// Whether an analyze operation is in flight
    pub analyzing: bool,

    /// Whether a refine operation is in flight
    pub refining: bool,

    /// The most recent terminal failure, if any
    pub last_error: Option<UserFacingError>,
}

/// A live operation's cancellation handle and its start-order generation.
struct Slot {
    token: CancelToken,
    generation: u64,
}

#[derive(Default)]
struct SessionState {
    analyze: Option<Slot>,
    refine: Option<Slot>,
    next_generation: u64,
    current_document: Option<Arc<AnalysisResponse>>,
    analyzing: bool,
    refining: bool,
    last_error: Option<UserFacingError>,
}

impl SessionState {
    fn slot_mut(&mut self, kind: OperationKind) -> &mut Option<Slot> {
        match kind {
            OperationKind::Analyze => &mut self.analyze,
            OperationKind::Refine => &mut self.refine,
        }
    }

    fn set_in_progress(&mut self, kind: OperationKind, value: bool) {
        match kind {
            OperationKind::Analyze => self.analyzing = value,
            OperationKind::Refine => self.refining = value,
        }
    }

    /// Supersede any live slot for this kind and install a fresh one.
    fn begin(&mut self, kind: OperationKind) -> (CancelToken, u64) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancelToken::new();

        if let Some(previous) = self.slot_mut(kind).replace(Slot {
            token: token.clone(),
            generation,
        }) {
            info!("Superseding in-flight {:?} operation", kind);
            previous.token.cancel(CancelKind::Superseded);
        }

        self.set_in_progress(kind, true);
        (token, generation)
    }
}

/// Single-operator session over the incident client.
///
/// The current document is mutated only by the completion handler below;
/// everything else reads immutable snapshots. At most one operation per
/// kind is live at any time.
pub struct AnalysisSession {
    client: IncidentClient,
    state: Mutex<SessionState>,
}

impl AnalysisSession {
    /// Create a session over the given client
    pub fn new(client: IncidentClient) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Analyze a transcript, superseding any in-flight analyze.
    pub async fn analyze(&self, request: TranscriptRequest) -> OperationOutcome {
        let (token, generation) = self.state.lock().unwrap().begin(OperationKind::Analyze);

        let result = self.client.analyze(&request, &token).await;
        self.finish(OperationKind::Analyze, generation, result)
    }

    /// Refine the current document with feedback, superseding any in-flight
    /// refine.
    ///
    /// Fails locally, without any network traffic, when no document has been
    /// published yet. The causal check and the slot installation happen
    /// under one lock, so the mutation base is always the currently
    /// published document at start time.
    pub async fn refine(
        &self,
        feedback: impl Into<String>,
        section: SectionType,
    ) -> OperationOutcome {
        let (base, token, generation) = {
            let mut state = self.state.lock().unwrap();

            let Some(base) = state.current_document.clone() else {
                let error = UserFacingError::from_error(&ServiceError::validation(
                    "Nothing to refine: no analysis result is available yet",
                ));
                state.last_error = Some(error.clone());
                return OperationOutcome::Failed(error);
            };

            let (token, generation) = state.begin(OperationKind::Refine);
            (base, token, generation)
        };

        let request = FeedbackRequest::new((*base).clone(), feedback, section);
        let result = self.client.refine(&request, &token).await;
        self.finish(OperationKind::Refine, generation, result)
    }

    /// Cancel the in-flight operation of the given kind, if any.
    pub fn cancel(&self, kind: OperationKind) {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.slot_mut(kind).take() {
            slot.token.cancel(CancelKind::Caller);
            state.set_in_progress(kind, false);
        }
    }

    /// Cancel both in-flight operations unconditionally.
    pub fn shutdown(&self) {
        self.cancel(OperationKind::Analyze);
        self.cancel(OperationKind::Refine);
    }

    /// Immutable view of the current session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().unwrap();
        SessionSnapshot {
            current_document: state.current_document.clone(),
            analyzing: state.analyzing,
            refining: state.refining,
            last_error: state.last_error.clone(),
        }
    }

    /// Completion handler: the only writer of the published state.
    fn finish(
        &self,
        kind: OperationKind,
        generation: u64,
        result: Result<AnalysisResponse>,
    ) -> OperationOutcome {
        let mut state = self.state.lock().unwrap();

        // A newer invocation owns the slot now; this one must not publish,
        // whatever its network call came back with.
        let current_generation = state.slot_mut(kind).as_ref().map(|slot| slot.generation);
        if current_generation != Some(generation) {
            return OperationOutcome::Cancelled;
        }

        *state.slot_mut(kind) = None;
        state.set_in_progress(kind, false);

        match result {
            Ok(document) => {
                let document = Arc::new(document);
                state.current_document = Some(Arc::clone(&document));
                state.last_error = None;
                OperationOutcome::Completed(document)
            }
            Err(err) if err.is_cancelled() => OperationOutcome::Cancelled,
            Err(err) => {
                warn!("{:?} operation failed: {}", kind, err);
                let error = UserFacingError::from_error(&err);
                state.last_error = Some(error.clone());
                OperationOutcome::Failed(error)
            }
        }
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
