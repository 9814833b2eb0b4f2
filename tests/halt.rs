//! Database-backed emergency halt tests.
//!
//! These need a disposable Postgres pointed at by TEST_DATABASE_URL and are
//! ignored by default; run them with `cargo test -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use hivemind::domain::SessionStatus;
use hivemind::engine::SessionController;
use hivemind::error::HivemindError;
use hivemind::oracles::OracleHub;
use hivemind::queue::NullOrderQueue;
use hivemind::store::PostgresStore;

async fn controller() -> SessionController {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a disposable database");
    let store = Arc::new(PostgresStore::new(&url, 4).await.expect("connect"));
    store.migrate().await.expect("migrate");
    let oracles = OracleHub::simulated(Some(7), Duration::from_millis(200));
    SessionController::new(store, oracles, Arc::new(NullOrderQueue))
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn emergency_halt_pauses_running_sessions_and_is_idempotent() {
    let controller = controller().await;
    let started = controller
        .start("halt-test", dec!(1000))
        .await
        .expect("start session");
    let session_id = started.session.id;

    let paused = controller.authority().emergency_halt().await.expect("halt");
    assert!(paused >= 1, "at least the fresh session pauses");
    let session = controller
        .store()
        .get_session(session_id)
        .await
        .expect("load session")
        .expect("session exists");
    assert_eq!(session.status, SessionStatus::Paused);

    // a second halt finds nothing running and pauses nothing
    let again = controller
        .authority()
        .emergency_halt()
        .await
        .expect("halt again");
    assert_eq!(again, 0);

    // stepping under halt is rejected without touching the session
    let err = controller.step(session_id).await.unwrap_err();
    assert!(matches!(err, HivemindError::State(_)));

    let resumed = controller
        .authority()
        .emergency_resume()
        .await
        .expect("resume");
    assert!(resumed >= 1);
    let session = controller
        .store()
        .get_session(session_id)
        .await
        .expect("load session")
        .expect("session exists");
    assert_eq!(session.status, SessionStatus::Running);

    // resume is idempotent too
    let again = controller
        .authority()
        .emergency_resume()
        .await
        .expect("resume again");
    assert_eq!(again, 0);

    controller.stop(session_id).await.expect("stop");
}
