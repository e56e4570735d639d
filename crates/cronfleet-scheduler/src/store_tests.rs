
    use super::*;
    use crate::engine::CronTriggerEngine;
    use crate::memory::{MemoryJobCatalog, RecordingOperationInstaller};
    use cronfleet_protocols::{Job, OperationCall};
    use std::time::Duration;

    const YEARLY: &str = "0 0 0 1 1 *";

    struct Fixture {
        catalog: MemoryJobCatalog,
        installer: Arc<RecordingOperationInstaller>,
        engine: Arc<CronTriggerEngine>,
        store: LocalScheduleStore,
    }

    fn fixture_on(engine: Arc<CronTriggerEngine>, instance: u32, total: u32) -> Fixture {
        let catalog = MemoryJobCatalog::new();
        let installer = Arc::new(RecordingOperationInstaller::new());
        let shared: Arc<dyn JobCatalog> = Arc::new(catalog.clone());
        let dispatcher = Arc::new(ExecutionDispatcher::new(shared.clone(), installer.clone()));
        let store = LocalScheduleStore::new(
            PartitionDescriptor::new(instance, total).unwrap(),
            engine.clone(),
            shared,
            dispatcher,
        );
        Fixture {
            catalog,
            installer,
            engine,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_on(Arc::new(CronTriggerEngine::new()), 1, 1)
    }

    fn job(code: &str, expression: &str) -> Job {
        Job::new(code, expression, OperationCall::new("noop"))
    }

    #[test]
    fn test_trigger_group_name() {
        let partition = PartitionDescriptor::new(2, 3).unwrap();
        assert_eq!(trigger_group(partition), "cronfleet-instance-2");
    }

    #[tokio::test]
    async fn test_start_scheduling() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));

        let outcome = f.store.start_scheduling_of_job("nightly").await;

        assert_eq!(outcome, ScheduleOutcome::Scheduled);
        assert!(f.store.schedules_job("nightly").await);
        assert_eq!(f.store.scheduled_codes().await, vec!["nightly".to_string()]);
        assert_eq!(f.engine.job_names("cronfleet-instance-1"), vec!["nightly".to_string()]);
    }

    #[tokio::test]
    async fn test_start_missing_job_does_nothing() {
        let f = fixture();

        let outcome = f.store.start_scheduling_of_job("ghost").await;

        assert_eq!(outcome, ScheduleOutcome::JobNotFound);
        assert!(!f.store.schedules_job("ghost").await);
        assert!(f.engine.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_expression_leaves_job_unscheduled() {
        let f = fixture();
        f.catalog.save(job("broken", "every tuesday-ish"));

        let outcome = f.store.start_scheduling_of_job("broken").await;

        assert_eq!(outcome, ScheduleOutcome::Rejected);
        assert!(!f.store.schedules_job("broken").await);
    }

    #[tokio::test]
    async fn test_expression_that_never_fires() {
        let f = fixture();
        f.catalog.save(job("past", "0 0 0 1 1 * 2000"));

        let outcome = f.store.start_scheduling_of_job("past").await;

        assert_eq!(outcome, ScheduleOutcome::NeverFires);
        assert!(!f.store.schedules_job("past").await);
    }

    #[tokio::test]
    async fn test_catalog_outage_on_start() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));
        f.catalog.set_unavailable(true);

        let outcome = f.store.start_scheduling_of_job("nightly").await;

        assert_eq!(outcome, ScheduleOutcome::CatalogUnavailable);
        assert!(!f.store.schedules_job("nightly").await);
    }

    #[tokio::test]
    async fn test_stop_scheduling() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));
        f.store.start_scheduling_of_job("nightly").await;

        assert!(f.store.stop_scheduling_of_job("nightly").await);
        assert!(!f.store.schedules_job("nightly").await);
        assert!(!f.store.stop_scheduling_of_job("nightly").await);
    }

    #[tokio::test]
    async fn test_stop_unknown_job() {
        let f = fixture();
        assert!(!f.store.stop_scheduling_of_job("never-seen").await);
    }

    #[tokio::test]
    async fn test_restart_is_idempotent() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));

        for _ in 0..3 {
            let outcome = f.store.restart_scheduling_of_job("nightly").await;
            assert_eq!(outcome, ScheduleOutcome::Scheduled);
        }

        assert_eq!(f.store.scheduled_codes().await, vec!["nightly".to_string()]);
        assert_eq!(f.engine.len(), 1);
    }

    #[tokio::test]
    async fn test_restart_with_broken_expression_unschedules() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));
        f.store.start_scheduling_of_job("nightly").await;

        f.catalog.save(job("nightly", "61 * * * * *"));
        let outcome = f.store.restart_scheduling_of_job("nightly").await;

        assert_eq!(outcome, ScheduleOutcome::Rejected);
        assert!(!f.store.schedules_job("nightly").await);
    }

    #[tokio::test]
    async fn test_duplicate_start_is_rejected() {
        let f = fixture();
        f.catalog.save(job("nightly", YEARLY));

        assert_eq!(
            f.store.start_scheduling_of_job("nightly").await,
            ScheduleOutcome::Scheduled
        );
        assert_eq!(
            f.store.start_scheduling_of_job("nightly").await,
            ScheduleOutcome::Rejected
        );
        assert!(f.store.schedules_job("nightly").await);
    }

    #[tokio::test]
    async fn test_stop_all_refuses_later_starts() {
        let f = fixture();
        f.catalog.save(job("a", YEARLY));
        f.catalog.save(job("b", YEARLY));
        f.store.start_scheduling_of_job("a").await;

        f.store.stop_scheduling_of_all_jobs().await;

        assert!(f.store.scheduled_codes().await.is_empty());
        assert_eq!(
            f.store.start_scheduling_of_job("b").await,
            ScheduleOutcome::Rejected
        );
    }

    #[tokio::test]
    async fn test_groups_are_isolated_on_shared_engine() {
        let engine = Arc::new(CronTriggerEngine::new());
        let first = fixture_on(engine.clone(), 1, 2);
        let second = fixture_on(engine.clone(), 2, 2);
        first.catalog.save(job("shared-code", YEARLY));
        second.catalog.save(job("shared-code", YEARLY));

        first.store.start_scheduling_of_job("shared-code").await;
        second.store.start_scheduling_of_job("shared-code").await;
        assert_eq!(engine.len(), 2);

        second.store.stop_scheduling_of_job("shared-code").await;
        assert!(first.store.schedules_job("shared-code").await);
        assert!(!second.store.schedules_job("shared-code").await);
    }

    #[tokio::test]
    async fn test_stop_all_keeps_other_instances_on_shared_engine() {
        let engine = Arc::new(CronTriggerEngine::new());
        let first = fixture_on(engine.clone(), 1, 2);
        let second = fixture_on(engine.clone(), 2, 2);
        first.catalog.save(job("a", YEARLY));
        first.catalog.save(job("c", YEARLY));
        second.catalog.save(job("b", YEARLY));
        first.store.start_scheduling_of_job("a").await;
        second.store.start_scheduling_of_job("b").await;

        second.store.stop_scheduling_of_all_jobs().await;

        assert!(!engine.is_shutdown());
        assert_eq!(first.store.scheduled_codes().await, vec!["a".to_string()]);
        assert!(second.store.scheduled_codes().await.is_empty());
        assert_eq!(
            first.store.start_scheduling_of_job("c").await,
            ScheduleOutcome::Scheduled
        );
        assert_eq!(
            second.store.start_scheduling_of_job("b").await,
            ScheduleOutcome::Rejected
        );
    }

    #[tokio::test]
    async fn test_trigger_dispatches_current_definition() {
        let f = fixture();
        f.catalog.save(Job::new(
            "tick",
            "* * * * * *",
            OperationCall::new("first"),
        ));
        f.store.start_scheduling_of_job("tick").await;

        f.catalog.save(Job::new(
            "tick",
            "* * * * * *",
            OperationCall::new("second"),
        ));

        assert!(f.installer.wait_for_calls(1, Duration::from_secs(3)).await);
        assert_eq!(f.installer.calls()[0].operation, "second");
    }
