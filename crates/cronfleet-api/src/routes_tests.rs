
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use cronfleet_protocols::{ChangeKind, ChangeNotification, Job, MessageBus, OperationCall};
    use cronfleet_scheduler::{
        LocalMessageBus, MemoryJobCatalog, PartitionDescriptor, PartitionedScheduler,
        RecordingOperationInstaller,
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const YEARLY: &str = "0 0 0 1 1 *";

    fn create_test_state(catalog: &MemoryJobCatalog) -> Arc<ApiState> {
        let scheduler = PartitionedScheduler::builder(PartitionDescriptor::standalone())
            .catalog(Arc::new(catalog.clone()))
            .index(Arc::new(catalog.clone()))
            .installer(Arc::new(RecordingOperationInstaller::new()))
            .build()
            .unwrap();
        Arc::new(ApiState::new(
            Arc::new(LocalMessageBus::default()),
            Arc::new(scheduler),
        ))
    }

    fn post_notification(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/notifications")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state(&MemoryJobCatalog::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let catalog = MemoryJobCatalog::new();
        catalog.save(Job::new("nightly", YEARLY, OperationCall::new("backup")));
        let state = create_test_state(&catalog);
        state.scheduler.start(state.bus.as_ref()).await.unwrap();

        let response = create_router(state.clone())
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["instance_number"], 1);
        assert_eq!(body["total_instances"], 1);
        assert_eq!(body["group"], "cronfleet-instance-1");
        assert_eq!(body["scheduled"], json!(["nightly"]));
        assert_eq!(body["stats"]["fired"], 0);
        assert_eq!(body["notifications_received"], 0);

        state.scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_notification_reaches_scheduler() {
        let catalog = MemoryJobCatalog::new();
        let state = create_test_state(&catalog);
        state.scheduler.start(state.bus.as_ref()).await.unwrap();

        catalog.save(Job::new("hourly", YEARLY, OperationCall::new("report")));
        let notification = ChangeNotification::job(ChangeKind::Created, "hourly");

        let response = create_router(state.clone())
            .oneshot(post_notification(
                serde_json::to_string(&notification).unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = read_json(response).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["delivered"], 1);
        assert_eq!(state.notifications_received(), 1);

        let mut scheduled = false;
        for _ in 0..100 {
            if state.scheduler.store().schedules_job("hourly").await {
                scheduled = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(scheduled);

        state.scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_notification_wire_format() {
        let state = create_test_state(&MemoryJobCatalog::new());
        state.bus.connect().await.unwrap();
        let app = create_router(state);
        let body = json!({"resourceType": "job", "kind": "deleted", "code": "nightly"});

        let response = app
            .oneshot(post_notification(body.to_string()))
            .await
            .unwrap();

        // no subscriber yet, still accepted
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(read_json(response).await["delivered"], 0);
    }

    #[tokio::test]
    async fn test_notification_with_empty_code() {
        let app = create_router(create_test_state(&MemoryJobCatalog::new()));
        let body = json!({"resourceType": "job", "kind": "created", "code": " "});

        let response = app
            .oneshot(post_notification(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_notification_malformed_body() {
        let app = create_router(create_test_state(&MemoryJobCatalog::new()));
        let response = app
            .oneshot(post_notification("not json".to_string()))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_notification_after_bus_closed() {
        let state = create_test_state(&MemoryJobCatalog::new());
        state.scheduler.start(state.bus.as_ref()).await.unwrap();
        state.bus.close().await.unwrap();

        let notification = ChangeNotification::job(ChangeKind::Created, "nightly");
        let response = create_router(state.clone())
            .oneshot(post_notification(
                serde_json::to_string(&notification).unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_notification_before_bus_connected() {
        let app = create_router(create_test_state(&MemoryJobCatalog::new()));
        let body = json!({"resourceType": "job", "kind": "created", "code": "nightly"});

        let response = app
            .oneshot(post_notification(body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(create_test_state(&MemoryJobCatalog::new()));
        let response = app
            .oneshot(Request::builder().uri("/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
