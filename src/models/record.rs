use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Record {
    pub id: i32,
    pub date: NaiveDate,
    pub task: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A record joined with the display name of its owner
#[derive(Debug, Clone, FromRow)]
pub struct RecordWithUser {
    pub id: i32,
    pub date: NaiveDate,
    pub task: String,
    pub user_id: i32,
    pub name: String,
}

/// Number of records one user filed within a report window
#[derive(Debug, Clone, FromRow)]
pub struct UserRecordCount {
    pub user_id: i32,
    pub name: String,
    pub count: i64,
}
