//! Job site domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSite {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    /// Free-form progress label (`planned`, `in_progress`, ...). Not
    /// consulted by quota counting.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobSite {
    pub tenant_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub status: Option<String>,
}
