//! Live interview session runtime
//!
//! This module provides the `SessionController` state machine that drives one
//! real-time voice-interview call:
//! - gated start sequence (permission, eligibility, registration, transport)
//! - transport event handling and turn display
//! - duration backstop and tab-focus accounting
//! - once-only finalization, with a best-effort page-unload short circuit

mod config;
mod controller;
mod duration;
mod focus;
mod state;
mod unload;

pub use config::{InterviewConfig, Respondent};
pub use controller::SessionController;
pub use duration::DurationEnforcer;
pub use focus::TabFocusMonitor;
pub use state::{ActiveTurn, CallSession, SessionState};
