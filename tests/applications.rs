mod common;

use agromarket_client::{
    models::application::{ApplicationStatus, SubmitApplication},
    StoreError,
};
use common::{announcement, application, marketplace, wait_for_calls, ScriptedGateway};

fn submit_for(announcement_id: &str) -> SubmitApplication {
    SubmitApplication {
        announcement_id: announcement_id.to_string(),
        count: 2.0,
        unit: "kg".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_approved_application_cannot_be_rejected() {
    let gateway = ScriptedGateway::new();
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-1", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    let market = marketplace(gateway.clone(), "owner");
    market.applications.fetch_for_announcement("ann-1").await;

    market.applications.approve("app-1", "ann-1").await.unwrap();
    assert_eq!(
        market.applications.applications_for("ann-1")[0].status,
        ApplicationStatus::Approved
    );

    let before = market.applications.snapshot();
    let err = market.applications.reject("app-1", "ann-1").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: ApplicationStatus::Approved,
            to: ApplicationStatus::Rejected,
        }
    );
    assert_eq!(gateway.count("status"), 1);
    let after = market.applications.snapshot();
    assert_eq!(after.by_announcement_id, before.by_announcement_id);
    assert_eq!(after.action_loading_id, None);
}

#[tokio::test]
async fn test_submit_then_close_keeps_count_in_step() {
    let gateway = ScriptedGateway::new();
    *gateway.catalog.lock() = vec![announcement("ann-1", 4), announcement("ann-2", 0)];
    let market = marketplace(gateway.clone(), "u1");
    market.browse.refresh().await;

    let created = market
        .applications
        .submit_application(submit_for("ann-1"))
        .await
        .unwrap();
    assert_eq!(created.user_id, "u1");
    assert_eq!(market.cache.get("ann-1").unwrap().applications_count, 5);
    let listed = market.browse.snapshot().items;
    assert_eq!(listed[0].applications_count, 5);
    assert_eq!(listed[1].applications_count, 0);
    assert!(market.applications.is_applied("ann-1"));
    assert!(market.applications.snapshot().pending_ids.contains("ann-1"));

    market.applications.close_my_application("ann-1").await.unwrap();
    assert_eq!(market.cache.get("ann-1").unwrap().applications_count, 4);
    assert_eq!(market.browse.snapshot().items[0].applications_count, 4);
    let state = market.applications.snapshot();
    assert!(!state.applied_ids.contains("ann-1"));
    assert!(!state.pending_ids.contains("ann-1"));
    assert!(!state.my_applications.contains_key("ann-1"));
}

#[tokio::test]
async fn test_count_never_drops_below_zero() {
    let gateway = ScriptedGateway::new();
    *gateway.catalog.lock() = vec![announcement("ann-1", 0)];
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-7", "ann-1", "u2", ApplicationStatus::Approved)],
    );
    let market = marketplace(gateway.clone(), "owner");
    market.browse.refresh().await;
    market.applications.fetch_for_announcement("ann-1").await;

    market.applications.close("app-7", "ann-1").await.unwrap();
    assert_eq!(market.cache.get("ann-1").unwrap().applications_count, 0);
    assert_eq!(market.browse.snapshot().items[0].applications_count, 0);
}

#[tokio::test]
async fn test_closing_someone_elses_application_keeps_own_badges() {
    let gateway = ScriptedGateway::new();
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-9", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    let market = marketplace(gateway.clone(), "u1");
    market
        .applications
        .submit_application(submit_for("ann-1"))
        .await
        .unwrap();
    market.applications.fetch_for_announcement("ann-1").await;

    market.applications.close("app-9", "ann-1").await.unwrap();
    let state = market.applications.snapshot();
    assert!(state.applied_ids.contains("ann-1"));
    assert!(state.pending_ids.contains("ann-1"));
    assert_eq!(
        state.by_announcement_id["ann-1"][0].status,
        ApplicationStatus::Closed
    );
}

#[tokio::test]
async fn test_failed_transition_leaves_state_untouched() {
    let gateway = ScriptedGateway::new();
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-1", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    *gateway.catalog.lock() = vec![announcement("ann-1", 3)];
    let market = marketplace(gateway.clone(), "owner");
    market.browse.refresh().await;
    market.applications.fetch_for_announcement("ann-1").await;
    gateway.fail(
        "status",
        StoreError::Api {
            status: 500,
            message: "boom".into(),
        },
    );

    let before = market.applications.snapshot();
    let err = market.applications.close("app-1", "ann-1").await.unwrap_err();
    assert!(matches!(err, StoreError::Api { status: 500, .. }));
    let after = market.applications.snapshot();
    assert_eq!(after.by_announcement_id, before.by_announcement_id);
    assert_eq!(after.action_loading_id, None);
    assert_eq!(market.cache.get("ann-1").unwrap().applications_count, 3);
}

#[tokio::test]
async fn test_invalid_submission_never_reaches_backend() {
    let gateway = ScriptedGateway::new();
    let market = marketplace(gateway.clone(), "u1");

    let mut req = submit_for("ann-1");
    req.count = 0.0;
    let err = market.applications.submit_application(req).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(gateway.count("submit"), 0);
    assert!(!market.applications.is_applied("ann-1"));
}

#[tokio::test]
async fn test_close_my_application_without_one_is_refused() {
    let gateway = ScriptedGateway::new();
    let market = marketplace(gateway.clone(), "u1");

    let err = market
        .applications
        .close_my_application("ann-1")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(gateway.count("status"), 0);
}

#[tokio::test]
async fn test_pending_badge_prefers_embedded_applications() {
    let gateway = ScriptedGateway::new();
    let market = marketplace(gateway.clone(), "u1");
    market
        .applications
        .submit_application(submit_for("ann-1"))
        .await
        .unwrap();

    // No embedded list: the tracked set answers.
    let plain = announcement("ann-1", 1);
    assert!(market.applications.is_pending(&plain));
    assert!(!market.applications.can_apply(&plain));

    // An embedded list decides on its own, even against the tracked set.
    let mut embedded = announcement("ann-1", 1);
    embedded.applications = Some(vec![application(
        "app-1",
        "ann-1",
        "u1",
        ApplicationStatus::Approved,
    )]);
    assert!(!market.applications.is_pending(&embedded));

    let mut other = announcement("ann-2", 1);
    other.applications = Some(vec![application(
        "app-2",
        "ann-2",
        "u1",
        ApplicationStatus::Pending,
    )]);
    assert!(market.applications.is_pending(&other));
}

#[tokio::test]
async fn test_owner_cannot_apply_to_own_listing() {
    let gateway = ScriptedGateway::new();
    let market = marketplace(gateway.clone(), "u1");

    let mut own = announcement("ann-1", 0);
    own.user_id = "u1".into();
    assert!(!market.applications.can_apply(&own));
    assert!(market.applications.can_apply(&announcement("ann-2", 0)));
}

#[tokio::test]
async fn test_fetch_applied_rebuilds_badges() {
    let gateway = ScriptedGateway::new();
    let mut with_pending = announcement("ann-1", 1);
    with_pending.applications = Some(vec![application(
        "app-1",
        "ann-1",
        "u1",
        ApplicationStatus::Pending,
    )]);
    let mut with_approved = announcement("ann-2", 1);
    with_approved.applications = Some(vec![application(
        "app-2",
        "ann-2",
        "u1",
        ApplicationStatus::Approved,
    )]);
    *gateway.applied.lock() = vec![with_pending, with_approved];

    let market = marketplace(gateway.clone(), "u1");
    market.applications.fetch_applied().await;

    let state = market.applications.snapshot();
    assert!(state.applied_ids.contains("ann-1"));
    assert!(state.applied_ids.contains("ann-2"));
    assert!(state.pending_ids.contains("ann-1"));
    assert!(!state.pending_ids.contains("ann-2"));
    assert_eq!(state.my_applications["ann-2"].id, "app-2");
    assert!(market.cache.contains("ann-2"));

    // The applicant can still withdraw the approved one.
    market.applications.close_my_application("ann-2").await.unwrap();
    assert!(!market.applications.is_applied("ann-2"));
    assert_eq!(market.cache.get("ann-2").unwrap().applications_count, 0);
}

#[tokio::test]
async fn test_second_change_on_same_application_is_refused_while_first_runs() {
    let gateway = ScriptedGateway::new();
    *gateway.catalog.lock() = vec![announcement("ann-1", 3)];
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-1", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    let market = marketplace(gateway.clone(), "owner");
    market.browse.refresh().await;
    market.applications.fetch_for_announcement("ann-1").await;

    let gate = gateway.hold("status");
    let competing = async {
        wait_for_calls(&gateway, "status", 1).await;
        assert_eq!(
            market.applications.snapshot().action_loading_id.as_deref(),
            Some("app-1")
        );
        let err = market.applications.approve("app-1", "ann-1").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(gateway.count("status"), 1);
        gate.send(()).ok();
    };
    let (closed, _) = tokio::join!(market.applications.close("app-1", "ann-1"), competing);
    closed.unwrap();

    let state = market.applications.snapshot();
    assert_eq!(state.by_announcement_id["ann-1"][0].status, ApplicationStatus::Closed);
    assert_eq!(state.action_loading_id, None);
    assert_eq!(market.cache.get("ann-1").unwrap().applications_count, 2);

    let err = market.applications.approve("app-1", "ann-1").await.unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: ApplicationStatus::Closed,
            to: ApplicationStatus::Approved,
        }
    );
    assert_eq!(gateway.count("status"), 1);
}

#[tokio::test]
async fn test_terminal_status_loaded_mid_flight_is_not_overwritten() {
    let gateway = ScriptedGateway::new();
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-1", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    let market = marketplace(gateway.clone(), "owner");
    market.applications.fetch_for_announcement("ann-1").await;

    let gate = gateway.hold("status");
    let reload = async {
        wait_for_calls(&gateway, "status", 1).await;
        gateway.applications.lock().insert(
            "ann-1".into(),
            vec![application("app-1", "ann-1", "u2", ApplicationStatus::Closed)],
        );
        market.applications.fetch_for_announcement("ann-1").await;
        gate.send(()).ok();
    };
    let (approved, _) = tokio::join!(market.applications.approve("app-1", "ann-1"), reload);

    assert_eq!(
        approved.unwrap_err(),
        StoreError::InvalidTransition {
            from: ApplicationStatus::Closed,
            to: ApplicationStatus::Approved,
        }
    );
    let state = market.applications.snapshot();
    assert_eq!(state.by_announcement_id["ann-1"][0].status, ApplicationStatus::Closed);
    assert_eq!(state.action_loading_id, None);
}

#[tokio::test]
async fn test_loading_announcement_id_tracks_fetch() {
    let gateway = ScriptedGateway::new();
    gateway.applications.lock().insert(
        "ann-1".into(),
        vec![application("app-1", "ann-1", "u2", ApplicationStatus::Pending)],
    );
    let market = marketplace(gateway.clone(), "owner");
    assert_eq!(market.applications.snapshot().loading_announcement_id, None);

    let gate = gateway.hold("applications");
    let observe = async {
        wait_for_calls(&gateway, "applications", 1).await;
        assert_eq!(
            market.applications.snapshot().loading_announcement_id.as_deref(),
            Some("ann-1")
        );
        assert!(market.applications.applications_for("ann-1").is_empty());
        gate.send(()).ok();
    };
    tokio::join!(market.applications.fetch_for_announcement("ann-1"), observe);

    let state = market.applications.snapshot();
    assert_eq!(state.loading_announcement_id, None);
    assert_eq!(state.by_announcement_id["ann-1"].len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_clears_loading_announcement_id() {
    let gateway = ScriptedGateway::new();
    gateway.fail("applications", StoreError::Network("offline".into()));
    let market = marketplace(gateway.clone(), "owner");

    market.applications.fetch_for_announcement("ann-1").await;
    let state = market.applications.snapshot();
    assert_eq!(state.loading_announcement_id, None);
    assert!(!state.by_announcement_id.contains_key("ann-1"));
}
