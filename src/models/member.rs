use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub phone: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

/// A walk-in customer with a single-day pass. No subscription is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPassUser {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub phone: String,
    /// ISO date the pass is valid for.
    pub pass_date: String,
    pub created_at: i64,
}
