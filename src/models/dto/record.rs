use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use utoipa::ToSchema;

use crate::models::{Record, RecordWithUser, UserRecordCount};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    #[schema(value_type = String, example = "2024-05-14")]
    pub date: NaiveDate,
    pub task: String,
    /// Owner of the record. Defaults to the caller; only admins may name someone else.
    pub user_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: i32,
    #[schema(value_type = String, example = "2024-05-14")]
    pub date: NaiveDate,
    pub task: String,
    pub user_id: i32,
    pub name: String,
}

impl From<RecordWithUser> for RecordResponse {
    fn from(record: RecordWithUser) -> Self {
        Self {
            id: record.id,
            date: record.date,
            task: record.task,
            user_id: record.user_id,
            name: record.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecord {
    pub id: i32,
    #[schema(value_type = String, example = "2024-05-14")]
    pub date: NaiveDate,
    pub task: String,
    pub user_id: i32,
    pub created_at: String,
}

impl From<Record> for CreatedRecord {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            date: record.date,
            task: record.task,
            user_id: record.user_id,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

// Form-driven clients send empty parameters for unset fields, so `?userId=` reads as absent.

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateQuery {
    pub date: NaiveDate,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<i32>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<i32>,
    pub search: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub month: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthQuery {
    pub month: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: i32,
    pub name: String,
    pub count: i64,
}

impl From<UserRecordCount> for UserSummary {
    fn from(row: UserRecordCount) -> Self {
        Self {
            user_id: row.user_id,
            name: row.name,
            count: row.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(value_type = String, example = "2024-05-01")]
    pub from: NaiveDate,
    /// Exclusive upper bound
    #[schema(value_type = String, example = "2024-06-01")]
    pub to: NaiveDate,
    pub total: usize,
    pub users: Vec<UserSummary>,
    pub records: Vec<RecordResponse>,
}
