use super::config::{InterviewConfig, Respondent};
use super::duration::DurationEnforcer;
use super::focus::TabFocusMonitor;
use super::state::{ActiveTurn, CallSession, SessionState};
use super::unload::UnloadHandler;
use crate::eligibility::{Eligibility, EligibilityGuard};
use crate::error::StartError;
use crate::finalize::Finalizer;
use crate::notice::Notice;
use crate::provider::{CallRegistrar, RegisterCallRequest, ResponseStore, ResponseUpdate};
use crate::transport::{PermissionProbe, TransportClient, TransportEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Why a call is terminating. Every source converges on the same
/// `Ending -> Ended` path.
#[derive(Debug, Clone)]
enum EndReason {
    /// Participant pressed "end interview".
    User,
    /// The conversational engine ended the call itself.
    Engine,
    /// The duration backstop fired.
    Timeout,
    /// The transport reported a mid-call failure.
    Fault(String),
    /// Page unload already ran its own cleanup; just wind down.
    Unload,
}

/// Central state machine driving one interview call from consent to a
/// finalized durable result.
///
/// One controller owns one call: the transport client is injected per call
/// and the ephemeral [`CallSession`] never outlives the controller.
pub struct SessionController {
    interview: InterviewConfig,
    transport: Arc<dyn TransportClient>,
    registrar: Arc<dyn CallRegistrar>,
    store: Arc<dyn ResponseStore>,
    permissions: Arc<dyn PermissionProbe>,

    session: Arc<Mutex<CallSession>>,
    respondent: Mutex<Option<Respondent>>,
    focus: TabFocusMonitor,

    /// "already starting/started" guard; a second start attempt is rejected,
    /// never queued.
    active: Arc<AtomicBool>,
    /// Whichever of the finalizer and the unload path wins this flag runs;
    /// the other becomes a no-op.
    finalized: Arc<AtomicBool>,

    notices: mpsc::UnboundedSender<Notice>,
    state_tx: Arc<watch::Sender<SessionState>>,
    state_rx: watch::Receiver<SessionState>,

    end_tx: Mutex<Option<mpsc::UnboundedSender<EndReason>>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    unload_handles: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

impl SessionController {
    /// Create a controller for one call attempt. The returned receiver
    /// carries the user-facing notices for this call.
    pub fn new(
        interview: InterviewConfig,
        transport: Arc<dyn TransportClient>,
        registrar: Arc<dyn CallRegistrar>,
        store: Arc<dyn ResponseStore>,
        permissions: Arc<dyn PermissionProbe>,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let controller = Self {
            interview,
            transport,
            registrar,
            store,
            permissions,
            session: Arc::new(Mutex::new(CallSession::default())),
            respondent: Mutex::new(None),
            focus: TabFocusMonitor::new(),
            active: Arc::new(AtomicBool::new(false)),
            finalized: Arc::new(AtomicBool::new(false)),
            notices,
            state_tx: Arc::new(state_tx),
            state_rx,
            end_tx: Mutex::new(None),
            loop_handle: Mutex::new(None),
            unload_handles: Mutex::new(None),
        };

        (controller, notice_rx)
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Consent screen shown; the participant has not yet agreed to start.
    pub async fn request_consent(&self) {
        if self.state() == SessionState::Idle {
            set_state(&self.session, &self.state_tx, SessionState::AwaitingConsent).await;
        }
    }

    /// Participant consented: run the gated start sequence. In order:
    /// microphone permission, eligibility, registration, transport start.
    /// Any failure leaves no partial state behind.
    pub async fn start(&self, respondent: Option<Respondent>) -> Result<String, StartError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(StartError::CallInProgress);
        }

        match self.try_start(respondent).await {
            Ok(call_id) => {
                info!("Call {} is live", call_id);
                Ok(call_id)
            }
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                match &e {
                    StartError::Ineligible(reason) => {
                        set_state(&self.session, &self.state_tx, SessionState::Ineligible).await;
                        let _ = self.notices.send(Notice::info(reason.to_string()));
                    }
                    StartError::CallInProgress => {}
                    other => {
                        set_state(&self.session, &self.state_tx, SessionState::Idle).await;
                        let _ = self.notices.send(Notice::error(other.to_string()));
                    }
                }
                Err(e)
            }
        }
    }

    async fn try_start(&self, respondent: Option<Respondent>) -> Result<String, StartError> {
        match self.state() {
            SessionState::Idle | SessionState::AwaitingConsent => {}
            _ => return Err(StartError::CallInProgress),
        }

        if !self.permissions.microphone_granted().await {
            return Err(StartError::PermissionDenied);
        }

        let email = respondent.as_ref().and_then(|r| r.email.as_deref());
        let guard = EligibilityGuard::new(self.store.as_ref());
        match guard.check(&self.interview, email).await {
            Ok(Eligibility::Eligible) => {}
            Ok(Eligibility::Rejected(reason)) => return Err(StartError::Ineligible(reason)),
            Err(e) => return Err(StartError::EligibilityCheck(e)),
        }

        // Anonymous interviews never pass identity to the provider or the
        // durable record, even when the participant supplied one. Eligibility
        // above still sees the email so the allow-list holds.
        let respondent = if self.interview.is_anonymous {
            None
        } else {
            respondent
        };

        set_state(&self.session, &self.state_tx, SessionState::Registering).await;

        let request = RegisterCallRequest {
            agent_id: self.interview.agent_id.clone(),
            dynamic_variables: self.dynamic_variables(respondent.as_ref()),
        };
        let registered = self.registrar.register_call(&request).await?;

        let events = self.transport.start_call(&registered.access_token).await?;

        {
            let mut session = self.session.lock().await;
            session.call_id = Some(registered.call_id.clone());
        }
        {
            let mut slot = self.respondent.lock().await;
            *slot = respondent.clone();
        }

        set_state(&self.session, &self.state_tx, SessionState::Calling).await;

        let (end_tx, end_rx) = mpsc::unbounded_channel();
        {
            let mut slot = self.end_tx.lock().await;
            *slot = Some(end_tx);
        }

        let event_loop = EventLoop {
            call_id: registered.call_id.clone(),
            minutes: self.interview.time_duration_minutes,
            session: Arc::clone(&self.session),
            transport: Arc::clone(&self.transport),
            finalizer: Finalizer::new(
                Arc::clone(&self.registrar),
                Arc::clone(&self.store),
                self.notices.clone(),
            ),
            state_tx: Arc::clone(&self.state_tx),
            notices: self.notices.clone(),
            finalized: Arc::clone(&self.finalized),
            active: Arc::clone(&self.active),
            respondent,
        };

        let handle = tokio::spawn(event_loop.run(events, end_rx));
        {
            let mut slot = self.loop_handle.lock().await;
            *slot = Some(handle);
        }

        Ok(registered.call_id)
    }

    fn dynamic_variables(&self, respondent: Option<&Respondent>) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert(
            "interview_id".to_string(),
            self.interview.interview_id.clone(),
        );
        vars.insert(
            "duration_minutes".to_string(),
            self.interview.time_duration_minutes.to_string(),
        );
        vars.insert(
            "respondent_name".to_string(),
            respondent
                .and_then(|r| r.name.clone())
                .unwrap_or_else(|| "there".to_string()),
        );
        if let Some(email) = respondent.and_then(|r| r.email.clone()) {
            vars.insert("respondent_email".to_string(), email);
        }
        vars
    }

    /// Participant-initiated end. Returns once the controller has reached
    /// `Ended`; the slow analytics phase keeps running in the background.
    pub async fn end(&self) {
        match self.state() {
            SessionState::Calling | SessionState::Ending | SessionState::Ended => {}
            _ => {
                warn!("No active call to end");
                return;
            }
        }

        if let Some(tx) = self.end_tx.lock().await.as_ref() {
            let _ = tx.send(EndReason::User);
        }
        self.wait_until_ended().await;
    }

    /// Report one tab focus loss. Ignored outside an active call.
    pub async fn focus_lost(&self) -> u32 {
        if self.state() != SessionState::Calling {
            return self.focus.count();
        }

        let count = self.focus.record_focus_loss();
        self.session.lock().await.tab_switch_count = count;
        count
    }

    /// Page is going away mid-call: stop the transport locally, then fire
    /// one mark-ended and one fetch-transcript request without awaiting
    /// them. Mutually exclusive with the normal finalizer.
    pub async fn unload(&self) {
        match self.state() {
            SessionState::Calling | SessionState::Ending => {}
            _ => return,
        }
        if self.finalized.swap(true, Ordering::SeqCst) {
            return;
        }

        self.transport.stop_call().await;

        let (call_id, tab_switch_count) = {
            let session = self.session.lock().await;
            (
                session.call_id.clone().unwrap_or_default(),
                session.tab_switch_count,
            )
        };

        let mut update = ResponseUpdate::ended(&call_id, tab_switch_count);
        if let Some(respondent) = self.respondent.lock().await.as_ref() {
            update.email = respondent.email.clone();
            update.name = respondent.name.clone();
        }

        let handler = UnloadHandler::new(Arc::clone(&self.store), Arc::clone(&self.registrar));
        let handles = handler.fire(update);
        {
            let mut slot = self.unload_handles.lock().await;
            *slot = Some(handles);
        }

        if let Some(tx) = self.end_tx.lock().await.as_ref() {
            let _ = tx.send(EndReason::Unload);
        }
    }

    /// Store post-call feedback against the call record.
    pub async fn submit_feedback(
        &self,
        rating: u8,
        comment: Option<String>,
    ) -> Result<(), crate::error::ProviderError> {
        let call_id = {
            let session = self.session.lock().await;
            session.call_id.clone().unwrap_or_default()
        };

        let update = ResponseUpdate {
            call_id,
            feedback: Some(crate::provider::Feedback { rating, comment }),
            ..Default::default()
        };
        self.store.upsert_response(&update).await
    }

    /// Current view of the call for status displays.
    pub async fn snapshot(&self) -> CallSession {
        self.session.lock().await.clone()
    }

    /// Resolves when the controller reaches `Ended`.
    pub async fn wait_until_ended(&self) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|s| *s == SessionState::Ended).await;
    }

    /// Wait for every background task spawned by this controller, including
    /// the slow finalization phase and any unload requests.
    pub async fn join(&self) {
        let handle = self.loop_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Session event loop panicked: {}", e);
            }
        }

        let handles = self.unload_handles.lock().await.take();
        if let Some((mark_ended, fetch)) = handles {
            let _ = mark_ended.await;
            let _ = fetch.await;
        }
    }
}

async fn set_state(
    session: &Mutex<CallSession>,
    state_tx: &watch::Sender<SessionState>,
    state: SessionState,
) {
    session.lock().await.state = state;
    let _ = state_tx.send(state);
}

/// The per-call event loop: transport events and duration ticks interleaved
/// on one task, processed strictly in arrival order.
struct EventLoop {
    call_id: String,
    minutes: u64,
    session: Arc<Mutex<CallSession>>,
    transport: Arc<dyn TransportClient>,
    finalizer: Finalizer,
    state_tx: Arc<watch::Sender<SessionState>>,
    notices: mpsc::UnboundedSender<Notice>,
    finalized: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    respondent: Option<Respondent>,
}

impl EventLoop {
    async fn run(
        self,
        mut events: mpsc::Receiver<TransportEvent>,
        mut end_rx: mpsc::UnboundedReceiver<EndReason>,
    ) {
        let mut enforcer = DurationEnforcer::start(self.minutes);

        let reason = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Some(reason) = self.handle_event(event).await {
                            break reason;
                        }
                    }
                    None => break EndReason::Fault("transport event stream closed".to_string()),
                },
                command = end_rx.recv() => match command {
                    Some(reason) => break reason,
                    // Controller dropped; treat as a user end.
                    None => break EndReason::User,
                },
                elapsed = enforcer.tick() => {
                    {
                        let mut session = self.session.lock().await;
                        session.elapsed_seconds = elapsed;
                    }
                    if enforcer.expired() {
                        let _ = self.notices.send(Notice::info(
                            "The interview time limit was reached.",
                        ));
                        break EndReason::Timeout;
                    }
                }
            }
        };

        // Dropping `events` and the enforcer on exit detaches the transport
        // listener and stops the timer.
        self.shutdown(reason).await;
    }

    async fn handle_event(&self, event: TransportEvent) -> Option<EndReason> {
        match event {
            TransportEvent::CallStarted => {
                info!("Call {} started", self.call_id);
                None
            }
            TransportEvent::AgentStartTalking => {
                self.session.lock().await.active_turn = ActiveTurn::Agent;
                None
            }
            TransportEvent::AgentStopTalking => {
                self.session.lock().await.active_turn = ActiveTurn::User;
                None
            }
            TransportEvent::Update { transcript } => {
                self.session.lock().await.apply_transcript(&transcript);
                None
            }
            TransportEvent::CallEnded => {
                info!("Call {} ended by the engine", self.call_id);
                Some(EndReason::Engine)
            }
            TransportEvent::Error(message) => {
                error!("Transport error on call {}: {}", self.call_id, message);
                let _ = self.notices.send(Notice::error(format!(
                    "The call connection failed: {message}"
                )));
                Some(EndReason::Fault(message))
            }
        }
    }

    async fn shutdown(self, reason: EndReason) {
        info!("Ending call {} ({:?})", self.call_id, reason);
        set_state(&self.session, &self.state_tx, SessionState::Ending).await;

        match reason {
            // Engine already closed the call; unload stopped it itself.
            EndReason::Engine | EndReason::Unload => {}
            _ => self.transport.stop_call().await,
        }

        set_state(&self.session, &self.state_tx, SessionState::Ended).await;
        self.active.store(false, Ordering::SeqCst);

        if matches!(reason, EndReason::Unload) {
            return;
        }
        if self.finalized.swap(true, Ordering::SeqCst) {
            return;
        }

        let tab_switch_count = self.session.lock().await.tab_switch_count;
        if let Err(e) = self
            .finalizer
            .run(&self.call_id, tab_switch_count, self.respondent.clone())
            .await
        {
            warn!("Finalization incomplete for call {}: {}", self.call_id, e);
        }
    }
}
