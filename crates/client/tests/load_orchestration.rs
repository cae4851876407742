//! Staggered loading, retry ceiling and partial failures, on tokio's paused
//! clock.

use std::sync::Arc;
use std::time::Duration;

use lodge_client::{
    ApiError, ClientConfig, EngineError, Endpoint, InMemoryReservationApi, LoadState,
    ReservationEngine,
};
use lodge_core::{RecordKey, ReservationId};
use lodge_reservations::ReservationStatus;

fn setup(config: ClientConfig) -> (Arc<InMemoryReservationApi>, ReservationEngine) {
    let api = Arc::new(InMemoryReservationApi::demo());
    let engine = ReservationEngine::new(api.clone(), config);
    (api, engine)
}

fn down() -> ApiError {
    ApiError::http(503, Some("Service unavailable".into()))
}

#[tokio::test(start_paused = true)]
async fn full_load_populates_everything() {
    let (api, engine) = setup(ClientConfig::default());

    engine.load_all().await.unwrap();

    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert!(!engine.is_loading());
    assert_eq!(engine.reservations().len(), 4);
    assert_eq!(engine.guests().len(), 3);
    assert_eq!(engine.rooms().len(), 3);
    assert_eq!(api.calls(Endpoint::ListGuests), 1);
    assert_eq!(api.calls(Endpoint::ListRooms), 1);
}

#[tokio::test(start_paused = true)]
async fn secondary_wave_waits_for_reservations_and_delay() {
    let config = ClientConfig::default().with_secondary_delay(Duration::from_millis(300));
    let (api, engine) = setup(config);

    let load = tokio::spawn({
        let engine = engine.clone();
        async move { engine.load_all().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(engine.reservations().len(), 4);
    assert_eq!(api.calls(Endpoint::ListGuests), 0);
    assert_eq!(api.calls(Endpoint::ListRooms), 0);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(api.calls(Endpoint::ListGuests), 1);
    assert_eq!(api.calls(Endpoint::ListRooms), 1);
    load.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn secondary_failure_is_partial_and_non_fatal() {
    let (api, engine) = setup(ClientConfig::default());
    api.fail_next(Endpoint::ListRooms, down());

    engine.load_all().await.unwrap();

    assert!(matches!(engine.load_state(), LoadState::PartiallyLoaded { .. }));
    assert_eq!(
        engine.error().as_deref(),
        Some("Reservations loaded, but rooms could not be loaded")
    );
    assert_eq!(engine.reservations().len(), 4);
    assert_eq!(engine.guests().len(), 3);
    assert!(engine.rooms().is_empty());
    assert!(!engine.retry_pending());
}

#[tokio::test(start_paused = true)]
async fn primary_failures_stop_at_the_ceiling() {
    let (api, engine) = setup(ClientConfig::default());
    api.fail_always(Endpoint::ListReservations, down());

    let err = engine.load_all().await.unwrap_err();
    assert_eq!(err, EngineError::Api(down()));
    assert_eq!(engine.load_state(), LoadState::Retrying { attempt: 1 });
    assert!(engine.is_loading());
    assert!(engine.retry_pending());

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 3);
    assert_eq!(engine.consecutive_failures(), 3);
    assert_eq!(
        engine.load_state(),
        LoadState::Failed { message: "Service unavailable".into() }
    );
    assert_eq!(engine.error().as_deref(), Some("Service unavailable"));
    assert!(!engine.retry_pending());
    assert_eq!(api.calls(Endpoint::ListGuests), 0);

    // Manual retry: exactly one more fetch, counter keeps climbing.
    engine.retry().await.unwrap_err();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 4);
    assert_eq!(engine.consecutive_failures(), 4);

    api.clear_failures(Endpoint::ListReservations);
    engine.retry().await.unwrap();
    assert_eq!(engine.consecutive_failures(), 0);
    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert_eq!(engine.error(), None);
    assert_eq!(engine.reservations().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn automatic_retry_recovers() {
    let (api, engine) =
        setup(ClientConfig::default().with_retry_delay(Duration::from_millis(500)));
    api.fail_next(Endpoint::ListReservations, ApiError::Network("timeout".into()));

    engine.load_all().await.unwrap_err();
    assert_eq!(engine.error().as_deref(), Some("Failed to load reservations"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 2);
    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert_eq!(engine.consecutive_failures(), 0);
    assert_eq!(engine.reservations().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn new_load_supersedes_pending_retry() {
    let (api, engine) = setup(ClientConfig::default());
    api.fail_next(Endpoint::ListReservations, down());

    engine.load_all().await.unwrap_err();
    assert!(engine.retry_pending());

    engine.load_all().await.unwrap();
    assert!(!engine.retry_pending());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_retry() {
    let (api, engine) = setup(ClientConfig::default());
    api.fail_always(Endpoint::ListReservations, down());

    engine.load_all().await.unwrap_err();
    engine.shutdown();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 1);
    assert!(!engine.retry_pending());
}

#[tokio::test(start_paused = true)]
async fn results_of_a_superseded_load_are_discarded() {
    let (api, engine) = setup(ClientConfig::default());
    api.set_latency(Endpoint::ListReservations, Duration::from_secs(2));

    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.load_all().await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    api.set_latency(Endpoint::ListReservations, Duration::ZERO);
    engine.load_all().await.unwrap();

    // The server changes before the slow request reads its data.
    api.set_status(ReservationId::new(2), ReservationStatus::Confirmed);
    slow.await.unwrap().unwrap();

    let record = engine.reservation(&RecordKey::Server(ReservationId::new(2))).unwrap();
    assert_eq!(record.status, ReservationStatus::Pending);
    assert_eq!(engine.load_state(), LoadState::Loaded);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_load_discards_the_response() {
    let (api, engine) = setup(ClientConfig::default());
    api.set_latency(Endpoint::ListReservations, Duration::from_secs(1));

    let load = tokio::spawn({
        let engine = engine.clone();
        async move { engine.load_all().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.shutdown();
    let revision = engine.revision();

    assert_eq!(load.await.unwrap(), Err(EngineError::Shutdown));
    assert!(engine.reservations().is_empty());
    assert_eq!(engine.revision(), revision);
    assert_eq!(engine.error(), None);
    assert_eq!(api.calls(Endpoint::ListReservations), 1);
    assert_eq!(api.calls(Endpoint::ListGuests), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_failed_load_schedules_no_retry() {
    let (api, engine) = setup(ClientConfig::default());
    api.set_latency(Endpoint::ListReservations, Duration::from_secs(1));
    api.fail_always(Endpoint::ListReservations, down());

    let load = tokio::spawn({
        let engine = engine.clone();
        async move { engine.load_all().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.shutdown();

    assert_eq!(load.await.unwrap(), Err(EngineError::Shutdown));
    assert!(!engine.retry_pending());
    assert_eq!(engine.error(), None);
    assert_eq!(engine.consecutive_failures(), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.calls(Endpoint::ListReservations), 1);
}
