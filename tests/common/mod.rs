// Shared fakes for driving the session runtime without a real provider.
#![allow(dead_code)]

use async_trait::async_trait;
use canvass::error::{ProviderError, RegistrationError, TransportError};
use canvass::notice::Notice;
use canvass::provider::{
    CallRecord, CallRegistrar, RegisterCallRequest, RegisteredCall, ResponseStore, ResponseUpdate,
};
use canvass::session::{InterviewConfig, SessionController};
use canvass::transport::{
    PermissionProbe, Role, TranscriptTurn, TransportClient, TransportEvent, TransportFactory,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub struct FakeTransport {
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    pub fail_start: AtomicBool,
    events_tx: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
            events_tx: Mutex::new(None),
        })
    }

    pub async fn emit(&self, event: TransportEvent) {
        let tx = {
            let slot = self.events_tx.lock().await;
            slot.clone().expect("transport not started")
        };
        tx.send(event).await.expect("event listener detached");
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportClient for FakeTransport {
    async fn start_call(
        &self,
        _access_token: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(TransportError("connection refused".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut slot = self.events_tx.lock().await;
        *slot = Some(tx);
        Ok(rx)
    }

    async fn stop_call(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out the same fake client for every call.
pub struct FakeTransportFactory(pub Arc<FakeTransport>);

impl TransportFactory for FakeTransportFactory {
    fn new_client(&self) -> Arc<dyn TransportClient> {
        Arc::clone(&self.0) as Arc<dyn TransportClient>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Ok,
    Quota,
    Fail,
}

pub struct FakeRegistrar {
    register_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
    pub outcome: Mutex<RegisterOutcome>,
    pub fail_retrieve: AtomicBool,
    pub last_request: Mutex<Option<RegisterCallRequest>>,
}

impl FakeRegistrar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            register_calls: AtomicUsize::new(0),
            retrieve_calls: AtomicUsize::new(0),
            outcome: Mutex::new(RegisterOutcome::Ok),
            fail_retrieve: AtomicBool::new(false),
            last_request: Mutex::new(None),
        })
    }

    pub fn register_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_count(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallRegistrar for FakeRegistrar {
    async fn register_call(
        &self,
        req: &RegisterCallRequest,
    ) -> Result<RegisteredCall, RegistrationError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut slot = self.last_request.lock().await;
            *slot = Some(req.clone());
        }
        match *self.outcome.lock().await {
            RegisterOutcome::Ok => Ok(RegisteredCall {
                access_token: "token".to_string(),
                call_id: "call-1".to_string(),
            }),
            RegisterOutcome::Quota => Err(RegistrationError::QuotaExhausted),
            RegisterOutcome::Fail => Err(RegistrationError::Other("boom".to_string())),
        }
    }

    async fn retrieve_call(&self, call_id: &str) -> Result<CallRecord, ProviderError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_retrieve.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 503,
                message: "still processing".to_string(),
            });
        }

        Ok(CallRecord {
            call_id: call_id.to_string(),
            transcript: vec![TranscriptTurn {
                role: Role::Agent,
                content: "thanks for your time".to_string(),
            }],
            analytics: Some(serde_json::json!({"sentiment": "positive"})),
            duration_ms: Some(90_000),
        })
    }
}

pub struct FakeStore {
    pub updates: Mutex<Vec<ResponseUpdate>>,
    pub prior: Mutex<HashSet<String>>,
    /// Fail the next upsert, then recover.
    pub fail_next_upsert: AtomicBool,
    pub fail_responded: AtomicBool,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            updates: Mutex::new(Vec::new()),
            prior: Mutex::new(HashSet::new()),
            fail_next_upsert: AtomicBool::new(false),
            fail_responded: AtomicBool::new(false),
        })
    }

    pub async fn with_prior(emails: &[&str]) -> Arc<Self> {
        let store = Self::new();
        {
            let mut prior = store.prior.lock().await;
            for email in emails {
                prior.insert(email.to_string());
            }
        }
        store
    }

    /// Updates that carried the end flag.
    pub async fn ended_updates(&self) -> Vec<ResponseUpdate> {
        self.updates
            .lock()
            .await
            .iter()
            .filter(|u| u.is_ended == Some(true))
            .cloned()
            .collect()
    }

    /// Updates that carried transcript or analytics content.
    pub async fn analysis_updates(&self) -> Vec<ResponseUpdate> {
        self.updates
            .lock()
            .await
            .iter()
            .filter(|u| u.transcript.is_some() || u.analytics.is_some())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ResponseStore for FakeStore {
    async fn upsert_response(&self, update: &ResponseUpdate) -> Result<(), ProviderError> {
        if self.fail_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 500,
                message: "backend down".to_string(),
            });
        }
        self.updates.lock().await.push(update.clone());
        Ok(())
    }

    async fn responded_emails(
        &self,
        _interview_id: &str,
    ) -> Result<HashSet<String>, ProviderError> {
        if self.fail_responded.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 503,
                message: "responses backend unavailable".to_string(),
            });
        }
        Ok(self.prior.lock().await.clone())
    }
}

pub struct GrantedMic;

#[async_trait]
impl PermissionProbe for GrantedMic {
    async fn microphone_granted(&self) -> bool {
        true
    }
}

pub struct DeniedMic;

#[async_trait]
impl PermissionProbe for DeniedMic {
    async fn microphone_granted(&self) -> bool {
        false
    }
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub registrar: Arc<FakeRegistrar>,
    pub store: Arc<FakeStore>,
    pub controller: Arc<SessionController>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

pub fn interview(minutes: u64) -> InterviewConfig {
    InterviewConfig {
        interview_id: "iv-test".to_string(),
        agent_id: "agent-test".to_string(),
        time_duration_minutes: minutes,
        sessions: vec!["Background".to_string(), "Deep dive".to_string()],
        respondents: None,
        is_anonymous: false,
    }
}

pub fn harness(interview: InterviewConfig) -> Harness {
    harness_with(interview, FakeStore::new(), true)
}

pub fn harness_with(
    interview: InterviewConfig,
    store: Arc<FakeStore>,
    mic_granted: bool,
) -> Harness {
    let transport = FakeTransport::new();
    let registrar = FakeRegistrar::new();

    let permissions: Arc<dyn PermissionProbe> = if mic_granted {
        Arc::new(GrantedMic)
    } else {
        Arc::new(DeniedMic)
    };

    let (controller, notices) = SessionController::new(
        interview,
        Arc::clone(&transport) as Arc<dyn TransportClient>,
        Arc::clone(&registrar) as Arc<dyn CallRegistrar>,
        Arc::clone(&store) as Arc<dyn ResponseStore>,
        permissions,
    );

    Harness {
        transport,
        registrar,
        store,
        controller: Arc::new(controller),
        notices,
    }
}
