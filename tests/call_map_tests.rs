// The server's call map must not grow with uptime: ended calls stay
// queryable for a retention window, then their entries are evicted.

mod common;

use canvass::http::{AppState, RuntimeDeps, ENDED_RETENTION};
use canvass::provider::{CallRegistrar, ResponseStore};
use canvass::session::Respondent;
use canvass::transport::{PermissionProbe, TransportFactory};
use common::{harness, interview, FakeTransportFactory, GrantedMic};
use std::sync::Arc;

fn respondent() -> Option<Respondent> {
    Some(Respondent {
        email: Some("ada@example.com".to_string()),
        name: Some("Ada".to_string()),
    })
}

#[tokio::test(start_paused = true)]
async fn ended_calls_are_evicted_from_the_call_map() {
    let h = harness(interview(10));
    let state = AppState::new(RuntimeDeps {
        transport_factory: Arc::new(FakeTransportFactory(Arc::clone(&h.transport)))
            as Arc<dyn TransportFactory>,
        registrar: Arc::clone(&h.registrar) as Arc<dyn CallRegistrar>,
        store: Arc::clone(&h.store) as Arc<dyn ResponseStore>,
        permissions: Arc::new(GrantedMic) as Arc<dyn PermissionProbe>,
    });

    let call_id = h.controller.start(respondent()).await.unwrap();
    state
        .insert_call(call_id.clone(), Arc::clone(&h.controller))
        .await;

    h.controller.end().await;

    // Recently ended: status must still resolve.
    assert!(state.calls.read().await.contains_key(&call_id));

    // Well past the retention window the entry is gone.
    tokio::time::sleep(ENDED_RETENTION * 2).await;
    assert!(!state.calls.read().await.contains_key(&call_id));

    // The durable record was not touched by eviction.
    assert_eq!(h.store.ended_updates().await.len(), 1);
}
