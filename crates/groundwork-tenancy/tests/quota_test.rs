//! Integration tests for quota enforcement against in-memory SurrealDB.

use groundwork_core::models::job_site::CreateJobSite;
use groundwork_core::models::tenant::{CreateTenant, PlanTier, ResourceKind, Tenant, TenantLimits};
use groundwork_core::models::user::{CreateUser, UserStatus};
use groundwork_core::repository::{JobSiteRepository, TenantRepository, UserRepository};
use groundwork_db::repository::{
    SurrealJobSiteRepository, SurrealTenantRepository, SurrealUserRepository,
};
use groundwork_tenancy::{QuotaDefaults, QuotaEnforcer, TenancyError};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

struct Fixture {
    tenants: SurrealTenantRepository<Db>,
    users: SurrealUserRepository<Db>,
    job_sites: SurrealJobSiteRepository<Db>,
    quotas: QuotaEnforcer<SurrealUserRepository<Db>, SurrealJobSiteRepository<Db>>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    groundwork_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::new(db.clone());
    let job_sites = SurrealJobSiteRepository::new(db.clone());
    Fixture {
        tenants: SurrealTenantRepository::new(db),
        quotas: QuotaEnforcer::new(users.clone(), job_sites.clone(), QuotaDefaults::default()),
        users,
        job_sites,
    }
}

impl Fixture {
    async fn tenant(&self, subdomain: &str, limits: TenantLimits) -> Tenant {
        self.tenants
            .create(CreateTenant {
                name: "Acme Builders".into(),
                subdomain: subdomain.into(),
                owner_email: "owner@acme.example".into(),
                owner_name: "Owner".into(),
                plan: PlanTier::Starter,
                limits,
            })
            .await
            .unwrap()
    }

    async fn user(&self, tenant: &Tenant, name: &str, role: &str, status: Option<UserStatus>) {
        self.users
            .create(CreateUser {
                tenant_id: Some(tenant.id),
                username: name.into(),
                email: format!("{name}@acme.example"),
                password: "correct-horse-battery".into(),
                role: role.into(),
                status,
            })
            .await
            .unwrap();
    }
}

fn max_users(n: u64) -> TenantLimits {
    TenantLimits {
        max_users: Some(n),
        ..Default::default()
    }
}

#[tokio::test]
async fn fourth_user_is_rejected_at_three_of_three() {
    let f = setup().await;
    let tenant = f.tenant("acme", max_users(3)).await;
    for name in ["ana", "ben", "cas"] {
        f.user(&tenant, name, "subcontractor", Some(UserStatus::Active)).await;
    }

    let err = f.quotas.check(&tenant, ResourceKind::Users).await.unwrap_err();
    match err {
        TenancyError::QuotaExceeded {
            resource,
            current,
            max,
        } => {
            assert_eq!(resource, ResourceKind::Users);
            assert_eq!(current, 3);
            assert_eq!(max, 3);
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn third_user_is_allowed_at_two_of_three() {
    let f = setup().await;
    let tenant = f.tenant("acme", max_users(3)).await;
    f.user(&tenant, "ana", "subcontractor", Some(UserStatus::Active)).await;
    f.user(&tenant, "ben", "subcontractor", Some(UserStatus::Active)).await;

    let status = f.quotas.check(&tenant, ResourceKind::Users).await.unwrap();
    assert_eq!(status.current, 2);
    assert_eq!(status.remaining(), 1);
}

#[tokio::test]
async fn unset_status_counts_and_inactive_does_not() {
    let f = setup().await;
    let tenant = f.tenant("acme", max_users(3)).await;
    f.user(&tenant, "legacy", "admin", None).await;
    f.user(&tenant, "gone", "subcontractor", Some(UserStatus::Inactive)).await;
    f.user(&tenant, "locked", "subcontractor", Some(UserStatus::Locked)).await;

    let status = f.quotas.status(&tenant, ResourceKind::Users).await.unwrap();
    assert_eq!(status.current, 1);
}

#[tokio::test]
async fn clients_count_only_active_client_users() {
    let f = setup().await;
    let tenant = f
        .tenant(
            "acme",
            TenantLimits {
                max_clients: Some(2),
                ..Default::default()
            },
        )
        .await;
    f.user(&tenant, "owner", "tenant_admin", None).await;
    f.user(&tenant, "c1", "client", None).await;
    f.user(&tenant, "c2", "client", Some(UserStatus::Active)).await;
    f.user(&tenant, "c3", "client", Some(UserStatus::Inactive)).await;

    let err = f.quotas.check(&tenant, ResourceKind::Clients).await.unwrap_err();
    assert!(matches!(
        err,
        TenancyError::QuotaExceeded { current: 2, max: 2, .. }
    ));
}

#[tokio::test]
async fn job_sites_count_regardless_of_status_and_tenant_scoped() {
    let f = setup().await;
    let tenant = f
        .tenant(
            "acme",
            TenantLimits {
                max_job_sites: Some(2),
                ..Default::default()
            },
        )
        .await;
    let other = f.tenant("other", TenantLimits::default()).await;

    for (tenant_id, status) in [
        (tenant.id, "completed"),
        (tenant.id, "in_progress"),
        (other.id, "planned"),
    ] {
        f.job_sites
            .create(CreateJobSite {
                tenant_id,
                name: "Site".into(),
                address: None,
                status: Some(status.into()),
            })
            .await
            .unwrap();
    }

    let err = f.quotas.check(&tenant, ResourceKind::JobSites).await.unwrap_err();
    assert!(matches!(
        err,
        TenancyError::QuotaExceeded { current: 2, max: 2, .. }
    ));
    assert!(f.quotas.check(&other, ResourceKind::JobSites).await.is_ok());
}

#[tokio::test]
async fn storage_uses_the_tenant_counter() {
    let f = setup().await;
    let tenant = f
        .tenant(
            "acme",
            TenantLimits {
                max_storage_mb: Some(100),
                ..Default::default()
            },
        )
        .await;

    let tenant = f.tenants.adjust_storage_usage(tenant.id, 100).await.unwrap();
    let err = f.quotas.check(&tenant, ResourceKind::Storage).await.unwrap_err();
    assert!(matches!(
        err,
        TenancyError::QuotaExceeded { current: 100, max: 100, .. }
    ));

    let tenant = f.tenants.adjust_storage_usage(tenant.id, -1).await.unwrap();
    assert!(f.quotas.check(&tenant, ResourceKind::Storage).await.is_ok());
}

#[tokio::test]
async fn missing_ceiling_falls_back_to_the_default() {
    let f = setup().await;
    let tenant = f.tenant("acme", TenantLimits::default()).await;
    let defaults = QuotaDefaults::default();

    let summary = f.quotas.summary(&tenant).await.unwrap();
    assert_eq!(summary.len(), 4);
    for status in summary {
        assert_eq!(status.max, defaults.for_kind(status.resource));
        assert_eq!(status.current, 0);
    }
}
