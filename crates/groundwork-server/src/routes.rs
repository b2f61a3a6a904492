//! HTTP route handlers, one module per resource.

pub mod health;
pub mod integrations;
pub mod job_sites;
pub mod notifications;
pub mod services;
pub mod tenant;
pub mod users;

use groundwork_core::repository::Pagination;

const MAX_PAGE_SIZE: u64 = 200;

fn clamp_page(mut pagination: Pagination) -> Pagination {
    pagination.limit = pagination.limit.clamp(1, MAX_PAGE_SIZE);
    pagination
}
