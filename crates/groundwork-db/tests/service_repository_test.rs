//! Integration tests for the service catalog, entitlements, usage
//! counters and job sites using in-memory SurrealDB.

use chrono::NaiveDate;
use groundwork_core::error::GroundworkError;
use groundwork_core::models::job_site::CreateJobSite;
use groundwork_core::models::service::{CreateServiceDefinition, UpsertEntitlement};
use groundwork_core::repository::{
    JobSiteRepository, Pagination, ServiceRepository, UsageRepository,
};
use groundwork_db::repository::{
    SurrealJobSiteRepository, SurrealServiceRepository, SurrealUsageRepository,
};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    groundwork_db::run_migrations(&db).await.unwrap();
    db
}

fn upsert(tenant_id: Uuid, service_id: Uuid, enabled: bool) -> UpsertEntitlement {
    UpsertEntitlement {
        tenant_id,
        service_id,
        service_name: "crm_sync".into(),
        enabled,
        settings: None,
    }
}

#[tokio::test]
async fn catalog_is_seeded_in_order() {
    let repo = SurrealServiceRepository::new(setup().await);

    let names: Vec<String> = repo
        .list_definitions()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "crm_sync",
            "sms_notifications",
            "email_notifications",
            "calendar_scheduling",
            "e_signatures",
            "document_expiry_alerts",
            "invoicing",
        ]
    );

    let crm = repo.get_definition("crm_sync").await.unwrap().unwrap();
    assert_eq!(crm.display_name, "CRM Sync");
    assert!(repo.get_definition("teleporter").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_definition_is_rejected() {
    let repo = SurrealServiceRepository::new(setup().await);

    let err = repo
        .create_definition(CreateServiceDefinition {
            name: "crm_sync".into(),
            display_name: "CRM Sync again".into(),
            description: String::new(),
            sort_order: 99,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GroundworkError::AlreadyExists { .. }));
}

#[tokio::test]
async fn upsert_keeps_one_row_per_tenant_and_service() {
    let db = setup().await;
    let repo = SurrealServiceRepository::new(db.clone());
    let service = repo.get_definition("crm_sync").await.unwrap().unwrap();
    let tenant = Uuid::new_v4();

    let first = repo.upsert_entitlement(upsert(tenant, service.id, true)).await.unwrap();
    assert!(first.enabled);
    assert!(first.enabled_at.is_some());
    assert!(first.disabled_at.is_none());
    assert_eq!(first.settings, json!({}));

    let disabled = repo.upsert_entitlement(upsert(tenant, service.id, false)).await.unwrap();
    assert!(!disabled.enabled);
    assert!(disabled.disabled_at.is_some());
    // The enable timestamp survives a disable.
    assert_eq!(disabled.enabled_at, first.enabled_at);
    assert_eq!(disabled.created_at, first.created_at);

    repo.upsert_entitlement(upsert(tenant, service.id, true)).await.unwrap();

    let mut result = db
        .query("SELECT * FROM service_entitlement WHERE tenant_id = $tenant_id")
        .bind(("tenant_id", tenant.to_string()))
        .await
        .unwrap();
    let rows: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn settings_are_kept_unless_replaced() {
    let repo = SurrealServiceRepository::new(setup().await);
    let service = repo.get_definition("crm_sync").await.unwrap().unwrap();
    let tenant = Uuid::new_v4();

    repo.upsert_entitlement(UpsertEntitlement {
        settings: Some(json!({ "provider": "hubspot" })),
        ..upsert(tenant, service.id, true)
    })
    .await
    .unwrap();

    let toggled = repo.upsert_entitlement(upsert(tenant, service.id, false)).await.unwrap();
    assert_eq!(toggled.settings["provider"], "hubspot");
}

#[tokio::test]
async fn enabled_listing_is_tenant_scoped() {
    let repo = SurrealServiceRepository::new(setup().await);
    let crm = repo.get_definition("crm_sync").await.unwrap().unwrap();
    let sms = repo.get_definition("sms_notifications").await.unwrap().unwrap();
    let (acme, rival) = (Uuid::new_v4(), Uuid::new_v4());

    repo.upsert_entitlement(upsert(acme, crm.id, true)).await.unwrap();
    repo.upsert_entitlement(UpsertEntitlement {
        service_name: "sms_notifications".into(),
        ..upsert(acme, sms.id, false)
    })
    .await
    .unwrap();
    repo.upsert_entitlement(UpsertEntitlement {
        service_name: "sms_notifications".into(),
        ..upsert(rival, sms.id, true)
    })
    .await
    .unwrap();

    let enabled = repo.list_enabled(acme).await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].service_name, "crm_sync");

    assert!(repo.find_entitlement(rival, "crm_sync").await.unwrap().is_none());
}

#[tokio::test]
async fn usage_counts_per_day() {
    let repo = SurrealUsageRepository::new(setup().await);
    let (tenant, service) = (Uuid::new_v4(), Uuid::new_v4());
    let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let tuesday = monday.succ_opt().unwrap();

    assert_eq!(repo.get_usage(tenant, service, monday).await.unwrap(), 0);

    assert_eq!(repo.increment_usage(tenant, service, monday).await.unwrap(), 1);
    assert_eq!(repo.increment_usage(tenant, service, monday).await.unwrap(), 2);
    assert_eq!(repo.increment_usage(tenant, service, tuesday).await.unwrap(), 1);

    assert_eq!(repo.get_usage(tenant, service, monday).await.unwrap(), 2);
    assert_eq!(repo.get_usage(tenant, service, tuesday).await.unwrap(), 1);
    assert_eq!(repo.get_usage(Uuid::new_v4(), service, monday).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_all_applied() {
    const CALLS: u64 = 100;

    let repo = SurrealUsageRepository::new(setup().await);
    let (tenant, service) = (Uuid::new_v4(), Uuid::new_v4());
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let handles: Vec<_> = (0..CALLS)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_usage(tenant, service, day).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(repo.get_usage(tenant, service, day).await.unwrap(), CALLS);
}

#[tokio::test]
async fn job_sites_count_regardless_of_status() {
    let repo = SurrealJobSiteRepository::new(setup().await);
    let (acme, rival) = (Uuid::new_v4(), Uuid::new_v4());

    let site = repo
        .create(CreateJobSite {
            tenant_id: acme,
            name: "Harbor Lofts".into(),
            address: None,
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(site.status, "planned");

    repo.create(CreateJobSite {
        tenant_id: acme,
        name: "Old Mill".into(),
        address: Some("1 Mill Lane".into()),
        status: Some("completed".into()),
    })
    .await
    .unwrap();
    repo.create(CreateJobSite {
        tenant_id: rival,
        name: "Elsewhere".into(),
        address: None,
        status: None,
    })
    .await
    .unwrap();

    assert_eq!(repo.count_by_tenant(acme).await.unwrap(), 2);

    let page = repo.list(acme, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|s| s.tenant_id == acme));
}
