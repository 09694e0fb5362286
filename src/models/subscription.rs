use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub member_id: String,
    pub branch_id: String,
    /// ISO dates (YYYY-MM-DD).
    pub start_date: String,
    pub end_date: String,
    pub months: Option<u32>,
    pub custom_days: Option<u32>,
    pub created_at: i64,
}
