//! Fleet-level tests.
//!
//! Three scheduler instances share one catalog and one message bus, the way
//! a real fleet shares the catalog service and the notification transport.

use std::sync::Arc;
use std::time::Duration;

use cronfleet_protocols::{ChangeKind, ChangeNotification, Job, OperationCall};
use cronfleet_scheduler::{
    LocalMessageBus, MemoryJobCatalog, PartitionDescriptor, PartitionedScheduler,
    RecordingOperationInstaller,
};

const FLEET_SIZE: u32 = 3;
const YEARLY: &str = "0 0 0 1 1 *";

// ============================================================================
// Test Helpers
// ============================================================================

struct Member {
    scheduler: PartitionedScheduler,
    installer: Arc<RecordingOperationInstaller>,
}

async fn start_fleet(catalog: &MemoryJobCatalog, bus: &LocalMessageBus) -> Vec<Member> {
    let mut fleet = Vec::new();
    for n in 1..=FLEET_SIZE {
        let installer = Arc::new(RecordingOperationInstaller::new());
        let scheduler = PartitionedScheduler::builder(PartitionDescriptor::new(n, FLEET_SIZE).unwrap())
            .catalog(Arc::new(catalog.clone()))
            .index(Arc::new(catalog.clone()))
            .installer(installer.clone())
            .build()
            .unwrap();
        scheduler.start(bus).await.unwrap();
        fleet.push(Member {
            scheduler,
            installer,
        });
    }
    fleet
}

async fn owners_of(fleet: &[Member], code: &str) -> Vec<u32> {
    let mut owners = Vec::new();
    for member in fleet {
        if member.scheduler.store().schedules_job(code).await {
            owners.push(member.scheduler.partition().instance_number());
        }
    }
    owners
}

async fn wait_for_owners(fleet: &[Member], code: &str, expected: &[u32]) {
    for _ in 0..100 {
        if owners_of(fleet, code).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "job '{}' owned by {:?}, expected {:?}",
        code,
        owners_of(fleet, code).await,
        expected
    );
}

fn job(code: &str, expression: &str) -> Job {
    Job::new(code, expression, OperationCall::new(format!("run-{}", code)))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_bootstrap_partitions_the_catalog() {
    let catalog = MemoryJobCatalog::new();
    for i in 1..=30 {
        catalog.save(job(&format!("job-{:02}", i), YEARLY));
    }
    let bus = LocalMessageBus::default();

    let fleet = start_fleet(&catalog, &bus).await;

    let mut total = 0;
    for i in 1..=30u64 {
        let code = format!("job-{:02}", i);
        let owners = owners_of(&fleet, &code).await;
        assert_eq!(owners, vec![(i % 3) as u32 + 1], "{}", code);
        total += owners.len();
    }
    assert_eq!(total, 30);

    for member in &fleet {
        assert_eq!(member.scheduler.status().await.scheduled.len(), 10);
    }
}

#[tokio::test]
async fn test_created_job_lands_on_exactly_one_instance() {
    let catalog = MemoryJobCatalog::new();
    let bus = LocalMessageBus::default();
    let fleet = start_fleet(&catalog, &bus).await;

    let saved = catalog.save(job("fresh", YEARLY));
    bus.publish(ChangeNotification::job(ChangeKind::Created, "fresh"))
        .unwrap();

    let owner = (saved.id % 3) as u32 + 1;
    wait_for_owners(&fleet, "fresh", &[owner]).await;
}

#[tokio::test]
async fn test_duplicate_notifications_are_harmless() {
    let catalog = MemoryJobCatalog::new();
    let bus = LocalMessageBus::default();
    let fleet = start_fleet(&catalog, &bus).await;

    let saved = catalog.save(job("dup", YEARLY));
    for _ in 0..3 {
        bus.publish(ChangeNotification::job(ChangeKind::Created, "dup"))
            .unwrap();
        bus.publish(ChangeNotification::job(ChangeKind::Updated, "dup"))
            .unwrap();
    }

    let owner = (saved.id % 3) as u32 + 1;
    wait_for_owners(&fleet, "dup", &[owner]).await;
}

#[tokio::test]
async fn test_deleted_job_disappears_from_fleet() {
    let catalog = MemoryJobCatalog::new();
    catalog.save(job("doomed", YEARLY));
    let bus = LocalMessageBus::default();
    let fleet = start_fleet(&catalog, &bus).await;
    wait_for_owners(&fleet, "doomed", &[2]).await;

    catalog.remove("doomed");
    bus.publish(ChangeNotification::job(ChangeKind::Deleted, "doomed"))
        .unwrap();

    wait_for_owners(&fleet, "doomed", &[]).await;
}

#[tokio::test]
async fn test_only_the_owner_fires() {
    let catalog = MemoryJobCatalog::new();
    // id 1 belongs to instance 2
    catalog.save(job("tick", "* * * * * *"));
    let bus = LocalMessageBus::default();
    let fleet = start_fleet(&catalog, &bus).await;

    assert!(
        fleet[1]
            .installer
            .wait_for_calls(1, Duration::from_secs(3))
            .await
    );
    assert_eq!(fleet[1].installer.calls()[0].operation, "run-tick");
    assert!(fleet[0].installer.calls().is_empty());
    assert!(fleet[2].installer.calls().is_empty());

    for member in &fleet {
        member.scheduler.shutdown().await;
    }
}
