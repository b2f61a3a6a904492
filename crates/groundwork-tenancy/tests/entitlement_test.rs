//! Integration tests for the entitlement store, service gates and usage
//! tracking against in-memory SurrealDB.

use std::sync::Arc;

use chrono::Utc;
use groundwork_core::repository::ServiceRepository;
use groundwork_db::repository::{SurrealServiceRepository, SurrealUsageRepository};
use groundwork_tenancy::{EntitlementChange, EntitlementService, TenancyError, UsageTracker};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = EntitlementService<SurrealServiceRepository<Db>, SurrealUsageRepository<Db>>;

async fn setup() -> (Service, UsageTracker, SurrealServiceRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    groundwork_db::run_migrations(&db).await.unwrap();

    let services = SurrealServiceRepository::new(db.clone());
    let usage = SurrealUsageRepository::new(db);
    let tracker = UsageTracker::spawn(usage.clone());
    (
        EntitlementService::new(services.clone(), usage, tracker.clone()),
        tracker,
        services,
    )
}

#[tokio::test]
async fn enabling_twice_leaves_one_enabled_row() {
    let (service, _, repo) = setup().await;
    let tenant = Uuid::new_v4();

    let first = service.enable(tenant, "crm_sync", None).await.unwrap();
    let second = service.enable(tenant, "crm_sync", None).await.unwrap();

    assert!(first.is_changed());
    assert!(matches!(second, EntitlementChange::Unchanged(ref e) if e.enabled));

    let enabled = repo.list_enabled(tenant).await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].service_name, "crm_sync");
}

#[tokio::test]
async fn enable_with_settings_updates_the_same_row() {
    let (service, _, repo) = setup().await;
    let tenant = Uuid::new_v4();

    service.enable(tenant, "crm_sync", None).await.unwrap();
    let change = service
        .enable(tenant, "crm_sync", Some(serde_json::json!({ "provider": "hubspot" })))
        .await
        .unwrap();

    assert!(change.is_changed());
    let row = repo.find_entitlement(tenant, "crm_sync").await.unwrap().unwrap();
    assert_eq!(row.settings["provider"], "hubspot");
    assert_eq!(repo.list_enabled(tenant).await.unwrap().len(), 1);
}

#[tokio::test]
async fn disable_distinguishes_absent_unchanged_and_changed() {
    let (service, _, _) = setup().await;
    let tenant = Uuid::new_v4();

    assert!(matches!(
        service.disable(tenant, "invoicing").await.unwrap(),
        EntitlementChange::Absent
    ));

    service.enable(tenant, "invoicing", None).await.unwrap();
    let change = service.disable(tenant, "invoicing").await.unwrap();
    assert!(matches!(change, EntitlementChange::Changed(ref e) if !e.enabled));

    let again = service.disable(tenant, "invoicing").await.unwrap();
    assert!(matches!(again, EntitlementChange::Unchanged(ref e) if !e.enabled));
}

#[tokio::test]
async fn toggle_flips_and_creates() {
    let (service, _, _) = setup().await;
    let tenant = Uuid::new_v4();

    assert!(service.toggle(tenant, "e_signatures").await.unwrap().enabled);
    assert!(!service.toggle(tenant, "e_signatures").await.unwrap().enabled);
    assert!(service.toggle(tenant, "e_signatures").await.unwrap().enabled);
}

#[tokio::test]
async fn unknown_service_is_not_found() {
    let (service, _, _) = setup().await;
    let err = service.enable(Uuid::new_v4(), "teleportation", None).await.unwrap_err();
    assert!(matches!(err, TenancyError::ServiceNotFound { ref service } if service == "teleportation"));
}

#[tokio::test]
async fn require_service_names_the_display_name() {
    let (service, _, _) = setup().await;
    let tenant = Uuid::new_v4();

    let err = service.require_service(tenant, "crm_sync").await.unwrap_err();
    match err {
        TenancyError::ServiceNotEnabled {
            service,
            display_name,
        } => {
            assert_eq!(service, "crm_sync");
            assert_eq!(display_name, "CRM Sync");
        }
        other => panic!("expected ServiceNotEnabled, got {other:?}"),
    }

    service.enable(tenant, "crm_sync", None).await.unwrap();
    service.disable(tenant, "crm_sync").await.unwrap();
    assert!(service.require_service(tenant, "crm_sync").await.is_err());
}

#[tokio::test]
async fn require_service_is_tenant_scoped() {
    let (service, _, _) = setup().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    service.enable(a, "crm_sync", None).await.unwrap();

    assert!(service.require_service(a, "crm_sync").await.is_ok());
    assert!(service.require_service(b, "crm_sync").await.is_err());
}

#[tokio::test]
async fn require_any_service_is_a_logical_or() {
    let (service, _, _) = setup().await;
    let tenant = Uuid::new_v4();
    let channels = ["sms_notifications", "email_notifications"];

    let err = service.require_any_service(tenant, &channels).await.unwrap_err();
    assert!(matches!(err, TenancyError::NoServiceEnabled { ref services } if services.len() == 2));

    service.enable(tenant, "sms_notifications", None).await.unwrap();
    service.disable(tenant, "sms_notifications").await.unwrap();
    service.enable(tenant, "email_notifications", None).await.unwrap();

    let granted = service.require_any_service(tenant, &channels).await.unwrap();
    assert_eq!(granted.service_name, "email_notifications");
}

#[tokio::test]
async fn granted_calls_are_counted_per_day() {
    let (service, tracker, _) = setup().await;
    let tenant = Uuid::new_v4();
    service.enable(tenant, "invoicing", None).await.unwrap();

    for _ in 0..3 {
        service.require_service(tenant, "invoicing").await.unwrap();
    }
    // Denied calls are not counted.
    let _ = service.require_service(tenant, "crm_sync").await;
    tracker.flush().await;

    let today = Utc::now().date_naive();
    assert_eq!(service.usage_for(tenant, "invoicing", today).await.unwrap(), 3);
    assert_eq!(service.usage_for(tenant, "crm_sync", today).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_guarded_calls_lose_no_usage() {
    const CALLS: u64 = 50;

    let (service, tracker, _) = setup().await;
    let service = Arc::new(service);
    let tenant = Uuid::new_v4();
    service.enable(tenant, "calendar_scheduling", None).await.unwrap();

    let handles: Vec<_> = (0..CALLS)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .require_service(tenant, "calendar_scheduling")
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    tracker.flush().await;

    let today = Utc::now().date_naive();
    assert_eq!(
        service
            .usage_for(tenant, "calendar_scheduling", today)
            .await
            .unwrap(),
        CALLS
    );
}
