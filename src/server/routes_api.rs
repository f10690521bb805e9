use crate::server::AppContext;
use crate::state::{RenderJob, RenderRequest};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use jobreel_common::{Error, JobId, JobStatus};
use serde::Deserialize;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/:id", get(get_job))
}

#[derive(Deserialize)]
struct ListJobsQuery {
    status: Option<JobStatus>,
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> impl IntoResponse {
    let mut jobs = ctx.service.list();

    if let Some(status) = params.status {
        jobs.retain(|j| j.status == status);
    }

    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(100);
    let jobs: Vec<RenderJob> = jobs.into_iter().skip(offset).take(limit).collect();

    Json(jobs)
}

async fn submit_job(
    State(ctx): State<AppContext>,
    Json(request): Json<RenderRequest>,
) -> Result<(StatusCode, Json<RenderJob>), (StatusCode, String)> {
    match ctx.service.submit(request) {
        Ok(job) => Ok((StatusCode::ACCEPTED, Json(job))),
        Err(e @ Error::Validation(_)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            tracing::error!("Failed to submit job: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn get_job(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<RenderJob>, (StatusCode, String)> {
    let id: JobId = id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid job id: {}", id)))?;
    ctx.service
        .get(id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Job not found: {}", id)))
}
