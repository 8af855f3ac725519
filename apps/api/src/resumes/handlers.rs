use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeSummaryRow};
use crate::resumes::analysis::{analyze_resume, persist_analysis, ResumeAnalysis};
use crate::state::AppState;

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub original_filename: String,
    pub storage_key: Option<String>,
    pub parsed_characters: usize,
}

struct UploadForm {
    user_id: String,
    filename: String,
    content_type: Option<String>,
    data: Bytes,
    skills: Vec<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut user_id = None;
    let mut file = None;
    let mut skills = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("user_id") => {
                user_id = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid user_id field: {e}"))
                })?)
            }
            Some("skills") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid skills field: {e}"))
                })?;
                skills = parse_skills(&raw);
            }
            Some("resume_file") => {
                let filename = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read uploaded file: {e}"))
                })?;
                file = Some((filename, content_type, data));
            }
            _ => {}
        }
    }

    let user_id = user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::Validation("resume_file is required".to_string()))?;

    Ok(UploadForm {
        user_id,
        filename,
        content_type,
        data,
        skills,
    })
}

fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_pdf(filename: &str, content_type: Option<&str>) -> bool {
    content_type == Some(PDF_CONTENT_TYPE) || filename.to_lowercase().ends_with(".pdf")
}

fn object_key(user_id: &str, resume_id: Uuid, filename: &str) -> String {
    let safe_name: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!(
        "resumes/{}/{}/{}_{}",
        user_id,
        resume_id,
        Utc::now().timestamp_millis(),
        safe_name
    )
}

async fn extract_pdf_text(data: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| anyhow::anyhow!("PDF extraction task failed: {e}"))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "No extractable text found in the PDF".to_string(),
        ));
    }
    Ok(text)
}

/// Uploads the original file. Storage failures are logged and the upload continues without a key.
async fn store_original(state: &AppState, key: String, data: Bytes) -> Option<String> {
    match state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(data))
        .content_type(PDF_CONTENT_TYPE)
        .send()
        .await
    {
        Ok(_) => {
            info!("Uploaded resume to s3://{}/{}", state.config.s3_bucket, key);
            Some(key)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "S3 upload failed, continuing without stored file");
            None
        }
    }
}

/// Loads a résumé and checks it belongs to `user_id`.
async fn fetch_owned(pool: &PgPool, id: Uuid, user_id: &str) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    if row.user_id != user_id {
        warn!(%id, "Resume access denied for non-owner");
        return Err(AppError::Forbidden);
    }
    Ok(row)
}

/// POST /api/v1/resumes/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let form = read_upload_form(multipart).await?;
    if !is_pdf(&form.filename, form.content_type.as_deref()) {
        return Err(AppError::Validation(
            "Only PDF resumes are supported".to_string(),
        ));
    }

    let parsed_text = extract_pdf_text(form.data.clone()).await?;

    let id = Uuid::new_v4();
    let key = object_key(&form.user_id, id, &form.filename);
    let storage_key = store_original(&state, key, form.data).await;

    sqlx::query(
        r#"
        INSERT INTO resumes (id, user_id, original_filename, parsed_text, skills, storage_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&form.user_id)
    .bind(&form.filename)
    .bind(&parsed_text)
    .bind(&form.skills)
    .bind(&storage_key)
    .execute(&state.db)
    .await?;

    info!(%id, user_id = %form.user_id, chars = parsed_text.len(), "Stored uploaded resume");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id,
            original_filename: form.filename,
            storage_key,
            parsed_characters: parsed_text.chars().count(),
        }),
    ))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    let rows: Vec<ResumeSummaryRow> = sqlx::query_as(
        r#"
        SELECT id, original_filename, uploaded_at, analyzed_at,
               (analysis->>'roleMatchScore')::int AS role_match_score
        FROM resumes
        WHERE user_id = $1
        ORDER BY uploaded_at DESC
        "#,
    )
    .bind(&params.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    let row = fetch_owned(&state.db, id, &params.user_id).await?;
    Ok(Json(row))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default, alias = "role_title")]
    pub role_title: String,
    #[serde(default, alias = "job_description", alias = "roleDescription")]
    pub job_description: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub id: Uuid,
    pub analysis: ResumeAnalysis,
    pub analyzed_at: chrono::DateTime<Utc>,
}

/// POST /api/v1/resumes/:id/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let resume = fetch_owned(&state.db, id, &req.user_id).await?;
    if resume.parsed_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume has no parsed text to analyze".to_string(),
        ));
    }

    let analysis = analyze_resume(&state, &resume, &req.role_title, &req.job_description).await?;
    let analyzed_at = persist_analysis(&state.db, id, &analysis).await?;

    Ok(Json(AnalyzeResponse {
        id,
        analysis,
        analyzed_at,
    }))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let resume = fetch_owned(&state.db, id, &params.user_id).await?;

    if let Some(key) = &resume.storage_key {
        if let Err(e) = state
            .s3
            .delete_object()
            .bucket(&state.config.s3_bucket)
            .key(key)
            .send()
            .await
        {
            warn!(key = %key, error = %e, "S3 delete failed, removing record anyway");
        }
    }

    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    info!(%id, "Deleted resume");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf("cv.PDF", None));
        assert!(is_pdf("upload", Some("application/pdf")));
        assert!(!is_pdf("cv.docx", Some("application/msword")));
    }

    #[test]
    fn test_object_key_layout_and_sanitizing() {
        let id = Uuid::nil();
        let key = object_key("user-1", id, "My CV (final).pdf");
        assert!(key.starts_with("resumes/user-1/00000000-0000-0000-0000-000000000000/"));
        assert!(key.ends_with("_My_CV__final_.pdf"));
    }

    #[test]
    fn test_parse_skills() {
        assert_eq!(parse_skills(" Rust, ,SQL ,"), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_analyze_request_accepts_both_casings() {
        let camel: AnalyzeRequest =
            serde_json::from_str(r#"{"userId":"u1","roleTitle":"Dev","jobDescription":"Go"}"#)
                .unwrap();
        assert_eq!(camel.role_title, "Dev");
        let snake: AnalyzeRequest =
            serde_json::from_str(r#"{"user_id":"u1","role_title":"Dev"}"#).unwrap();
        assert_eq!(snake.user_id, "u1");
        assert!(snake.job_description.is_empty());
    }
}
