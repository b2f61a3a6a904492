//! SurrealDB repository implementations.

mod job_site;
mod service;
mod tenant;
mod usage;
mod user;

pub use job_site::SurrealJobSiteRepository;
pub use service::SurrealServiceRepository;
pub use tenant::SurrealTenantRepository;
pub use usage::SurrealUsageRepository;
pub use user::SurrealUserRepository;
