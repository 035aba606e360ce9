use crate::pipeline::{JobError, JobReport, Stage};
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub website_url: String,

    /// A number, or a numeric string as sent by HTML form inputs
    #[serde(default, deserialize_with = "page_count")]
    pub max_pages: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageCount {
    Number(usize),
    Text(String),
}

fn page_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PageCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PageCount::Number(n)) => Ok(Some(n)),
        Some(PageCount::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            de::Error::custom(format!(
                "max_pages must be a non-negative integer, got '{}'",
                text
            ))
        }),
    }
}

#[derive(Debug, Deserialize)]
pub struct RepoRequest {
    #[serde(default)]
    pub repo_url: String,
}

/// Body of a successful job
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub message: String,
    pub files: Vec<String>,
    pub stage: Stage,
}

impl From<JobReport> for JobResponse {
    fn from(report: JobReport) -> Self {
        Self {
            message: report.message,
            files: report.files,
            stage: Stage::Complete,
        }
    }
}

/// Body of a failed job
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub stage: Stage,
}

impl ErrorResponse {
    fn validation(error: impl ToString) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                error: error.to_string(),
                stage: Stage::Validation,
            }),
        )
            .into_response()
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = match self.stage {
            Stage::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.source.to_string(),
            stage: self.stage,
        };
        (status, Json(body)).into_response()
    }
}

fn job_response(result: Result<JobReport, JobError>) -> Response {
    match result {
        Ok(report) => (StatusCode::OK, Json(JobResponse::from(report))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    bucket: String,
}

pub async fn index() -> &'static str {
    concat!(
        "bucket-ferry ",
        env!("CARGO_PKG_VERSION"),
        "\n\n",
        "POST /scrape {\"website_url\": ..., \"max_pages\": ...}  crawl a site and upload it as Markdown\n",
        "POST /repo   {\"repo_url\": ...}                        upload a GitHub repository's files\n",
        "GET  /health\n",
    )
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        bucket: state.pipeline.bucket().to_string(),
    })
}

pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ErrorResponse::validation(rejection.body_text()),
    };

    tracing::info!("Scrape requested for {}", request.website_url.trim());

    let result = state
        .pipeline
        .run_site_job(
            &request.website_url,
            request.max_pages,
            state.shutdown.child_token(),
        )
        .await;

    job_response(result)
}

pub async fn repo(
    State(state): State<AppState>,
    payload: Result<Json<RepoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ErrorResponse::validation(rejection.body_text()),
    };

    tracing::info!("Repository upload requested for {}", request.repo_url.trim());

    job_response(state.pipeline.run_repo_job(&request.repo_url).await)
}
