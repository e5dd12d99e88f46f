pub mod agent;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod finalize;
pub mod http;
pub mod notice;
pub mod provider;
pub mod session;
pub mod transport;

pub use agent::{build_agent_description, AgentDescription, AgentState, EMPTY_SLOT_PROMPT, SLOT_COUNT};
pub use config::Config;
pub use eligibility::{evaluate, Eligibility, EligibilityGuard};
pub use error::{
    FinalizeError, ProviderError, RegistrationError, RejectionReason, StartError, TransportError,
};
pub use finalize::Finalizer;
pub use http::{create_router, AppState, RuntimeDeps};
pub use notice::{Notice, NoticeLevel};
pub use provider::{
    BackendStore, CallRecord, CallRegistrar, Feedback, ProviderClient, RegisterCallRequest,
    RegisteredCall, ResponseStore, ResponseUpdate,
};
pub use session::{
    ActiveTurn, CallSession, InterviewConfig, Respondent, SessionController, SessionState,
};
pub use transport::{
    AssumeGranted, PermissionProbe, Role, TranscriptTurn, TransportClient, TransportEvent,
    TransportFactory, WsTransport, WsTransportFactory,
};
