use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: String,
    pub original_filename: String,
    pub parsed_text: String,
    pub skills: Vec<String>,
    /// Object-store key of the uploaded file; `None` when the upload to storage failed.
    pub storage_key: Option<String>,
    /// Serialized `ResumeAnalysis`, set by the analyze endpoint.
    pub analysis: Option<Value>,
    pub uploaded_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// List view: everything except the (potentially large) parsed text.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub original_filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub role_match_score: Option<i32>,
}
