//! Post-call finalization: durably record that the call ended, then retrieve
//! transcript and analytics from the provider.
//!
//! The two phases are deliberately independent. The end flag is written
//! first and is never rolled back; if the slow transcript/analytics fetch
//! fails, the participant is told analysis is delayed, not that the
//! interview failed.

use crate::error::FinalizeError;
use crate::notice::Notice;
use crate::provider::{CallRegistrar, ResponseStore, ResponseUpdate};
use crate::session::Respondent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct Finalizer {
    registrar: Arc<dyn CallRegistrar>,
    store: Arc<dyn ResponseStore>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Finalizer {
    pub fn new(
        registrar: Arc<dyn CallRegistrar>,
        store: Arc<dyn ResponseStore>,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        Self {
            registrar,
            store,
            notices,
        }
    }

    fn notify(&self, notice: Notice) {
        // Receiver may already be gone (page navigated away); that is fine.
        let _ = self.notices.send(notice);
    }

    /// Run both phases for one call. Retrieval can take minutes for long
    /// interviews, so callers run this off the hot path.
    pub async fn run(
        &self,
        call_id: &str,
        tab_switch_count: u32,
        respondent: Option<Respondent>,
    ) -> Result<(), FinalizeError> {
        info!("Finalizing call {}", call_id);

        let mut ended = ResponseUpdate::ended(call_id, tab_switch_count);
        if let Some(respondent) = &respondent {
            ended.email = respondent.email.clone();
            ended.name = respondent.name.clone();
        }

        // Phase 1: the durable end marker. Failure here does not stop the
        // transcript fetch; the record can still be completed later.
        let persist_err = match self.store.upsert_response(&ended).await {
            Ok(()) => {
                self.notify(Notice::info(
                    "Interview ended. Preparing your transcript and analysis...",
                ));
                None
            }
            Err(e) => {
                error!("Failed to persist end-of-call record for {}: {}", call_id, e);
                Some(FinalizeError::Persist(e))
            }
        };

        // Phase 2: slow transcript + analytics retrieval.
        let record = match self.registrar.retrieve_call(call_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Transcript retrieval failed for {}: {}", call_id, e);
                self.notify(Notice::error(
                    "Your interview was saved, but the analysis is delayed. \
                     It will appear once processing completes.",
                ));
                return Err(persist_err.unwrap_or(FinalizeError::Retrieval(e)));
            }
        };

        let analysis = ResponseUpdate {
            call_id: call_id.to_string(),
            transcript: Some(record.transcript),
            analytics: record.analytics,
            ..Default::default()
        };

        match self.store.upsert_response(&analysis).await {
            Ok(()) => {
                info!("Call {} finalized", call_id);
                self.notify(Notice::success("Interview recorded. Thank you!"));
                match persist_err {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
            Err(e) => {
                warn!("Failed to store analysis for {}: {}", call_id, e);
                self.notify(Notice::error(
                    "Your interview was saved, but the analysis is delayed. \
                     It will appear once processing completes.",
                ));
                Err(persist_err.unwrap_or(FinalizeError::Retrieval(e)))
            }
        }
    }
}
