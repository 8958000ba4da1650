use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use crate::error::ApiError;
use crate::models::{
    AddFileRequest, AnalyticsResponse, FilesResponse, LogFilesResponse, LogLinesResponse,
    MergedAnalyticsResponse, MessageResponse,
};
use crate::registry::Registry;
use crate::render;
use logwatch_parser::{merge_files, LogRecord, ParseOptions, RecordStream, SeverityReport};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, instrument, warn};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub parse_options: ParseOptions,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/files", get(list_files).post(add_file))
        .route("/api/files/delete/*path", get(remove_file))
        .route("/api/logs", get(list_logs))
        .route("/api/logs/*path", get(get_log_content))
        .route("/api/analytics", get(get_merged_analytics))
        .route("/api/analytics/*path", get(get_analytics))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Paths arrive from URL segments without their leading slash.
fn absolute_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{}", raw)
    }
}

async fn is_file(path: &str) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

async fn require_file(path: &str) -> Result<(), ApiError> {
    if is_file(path).await {
        Ok(())
    } else {
        warn!("File not found: {}", path);
        Err(ApiError::NotFound("File not found".to_string()))
    }
}

async fn list_files(State(state): State<AppState>) -> Json<FilesResponse> {
    Json(FilesResponse {
        files: state.registry.list().await,
    })
}

async fn list_logs(State(state): State<AppState>) -> Json<LogFilesResponse> {
    Json(LogFilesResponse {
        log_files: state.registry.list().await,
    })
}

#[instrument(skip(state, payload))]
async fn add_file(
    State(state): State<AppState>,
    payload: Result<Json<AddFileRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        error!("Invalid add-file body: {}", e);
        ApiError::BadRequest(format!("Invalid request body: {}", e))
    })?;

    let file = request
        .file
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("File path is required".to_string()))?;
    let file_path = absolute_path(&file);

    if !is_file(&file_path).await {
        warn!("Refusing to watch missing file: {}", file_path);
        return Err(ApiError::BadRequest("File does not exist".to_string()));
    }

    state.registry.add(&file_path).await.map_err(|e| {
        error!("Failed to persist registry: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(MessageResponse::new("File added successfully")))
}

#[instrument(skip(state))]
async fn remove_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let file_path = absolute_path(&path);
    info!("Removing file: {}", file_path);

    let removed = state.registry.remove(&file_path).await.map_err(|e| {
        error!("Failed to persist registry: {}", e);
        ApiError::from(e)
    })?;

    let message = if removed {
        "File removed successfully"
    } else {
        "File was not being watched"
    };
    Ok(Json(MessageResponse::new(message)))
}

#[instrument(skip(state))]
async fn get_log_content(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<LogLinesResponse>, ApiError> {
    let log_path = absolute_path(&path);
    debug!("Getting log content for: {}", log_path);
    require_file(&log_path).await?;

    let options = state.parse_options;
    let lines = spawn_blocking(move || -> Result<Vec<[String; 3]>, ApiError> {
        RecordStream::open(&log_path, &options)?
            .map(|record| record.map(into_line).map_err(ApiError::from))
            .collect()
    })
    .await?
    .map_err(|e| {
        error!("Error reading log file: {}", e);
        e
    })?;

    info!("Returning {} parsed lines", lines.len());
    Ok(Json(LogLinesResponse { lines }))
}

fn into_line(record: LogRecord) -> [String; 3] {
    [record.display_timestamp(), record.level, record.message]
}

#[instrument(skip(state))]
async fn get_analytics(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let log_path = absolute_path(&path);
    debug!("Generating analytics for: {}", log_path);
    require_file(&log_path).await?;

    let options = state.parse_options;
    let response = spawn_blocking(move || -> Result<AnalyticsResponse, ApiError> {
        let mut rng = rand::rng();
        let mut report = SeverityReport::default();
        for record in RecordStream::open(&log_path, &options)? {
            report.push(&record?, &mut rng);
        }
        debug!("{} records, {} plotted", report.total(), report.points.len());

        let plot = render::severity_scatter(&report.points)?;
        Ok(AnalyticsResponse {
            levels: report.levels,
            plot,
        })
    })
    .await?
    .map_err(|e| {
        error!("Error generating analytics: {}", e);
        e
    })?;

    Ok(Json(response))
}

#[instrument(skip(state))]
async fn get_merged_analytics(
    State(state): State<AppState>,
) -> Result<Json<MergedAnalyticsResponse>, ApiError> {
    let files = state.registry.list().await;
    if files.is_empty() {
        warn!("Analytics requested with no watched files");
        return Err(ApiError::NotFound("No files are being watched".to_string()));
    }

    let options = state.parse_options;
    let plot = spawn_blocking(move || -> Result<String, ApiError> {
        let sources: Vec<(String, PathBuf)> = files
            .into_iter()
            .map(|f| (f.short_name, PathBuf::from(f.full_path)))
            .collect();
        let merged = merge_files(
            sources.iter().map(|(name, path)| (name.as_str(), path.as_path())),
            &options,
        )?;
        info!(
            "Merged {} files over {} hourly buckets",
            merged.files.len(),
            merged.axis.len()
        );
        Ok(render::hourly_bars(&merged)?)
    })
    .await?
    .map_err(|e| {
        warn!("Merged analytics failed: {}", e);
        e
    })?;

    Ok(Json(MergedAnalyticsResponse { plot }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwatch_parser::Severity;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path().join("registry.json")).await;
        let state = AppState {
            registry: Arc::new(registry),
            parse_options: ParseOptions::default(),
        };
        (dir, state)
    }

    fn write_log(dir: &TempDir, name: &str, lines: &[&str]) -> String {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        path.to_string_lossy().into_owned()
    }

    /// Path as axum's wildcard hands it over: no leading slash.
    fn segment(path: &str) -> Path<String> {
        Path(path.trim_start_matches('/').to_string())
    }

    fn add_request(file: Option<&str>) -> Result<Json<AddFileRequest>, JsonRejection> {
        Ok(Json(AddFileRequest {
            file: file.map(str::to_string),
        }))
    }

    const SAMPLE: [&str; 2] = [
        "2025-05-19 10:00:00 | ERROR | disk full",
        "2025-05-19 10:30:00 | INFO | ok",
    ];

    #[test]
    fn test_absolute_path() {
        assert_eq!(absolute_path("var/log/a.log"), "/var/log/a.log");
        assert_eq!(absolute_path("/var/log/a.log"), "/var/log/a.log");
    }

    #[tokio::test]
    async fn test_add_list_and_remove() {
        let (dir, state) = setup().await;
        let log = write_log(&dir, "app.log", &SAMPLE);

        add_file(State(state.clone()), add_request(Some(&log))).await.unwrap();
        add_file(State(state.clone()), add_request(Some(&log))).await.unwrap();

        let Json(listed) = list_files(State(state.clone())).await;
        assert_eq!(listed.files.len(), 1);
        assert_eq!(listed.files[0].short_name, "app.log");
        assert_eq!(listed.files[0].full_path, log);

        let Json(removed) = remove_file(State(state.clone()), segment(&log)).await.unwrap();
        assert_eq!(removed.message, "File removed successfully");
        let Json(again) = remove_file(State(state.clone()), segment(&log)).await.unwrap();
        assert_eq!(again.message, "File was not being watched");

        let Json(listed) = list_logs(State(state)).await;
        assert!(listed.log_files.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_missing_field_and_missing_file() {
        let (dir, state) = setup().await;

        let err = add_file(State(state.clone()), add_request(None)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let missing = dir.path().join("nope.log");
        let err = add_file(State(state.clone()), add_request(missing.to_str()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "File does not exist");
    }

    #[tokio::test]
    async fn test_log_content() {
        let (dir, state) = setup().await;
        let log = write_log(
            &dir,
            "app.log",
            &[SAMPLE[0], "garbage without structure", "whenever | WARNING | slow"],
        );

        let Json(body) = get_log_content(State(state), segment(&log)).await.unwrap();
        assert_eq!(
            body.lines,
            vec![
                [
                    "2025-05-19T10:00:00Z".to_string(),
                    "ERROR".to_string(),
                    "disk full".to_string()
                ],
                [
                    "whenever".to_string(),
                    "WARNING".to_string(),
                    "slow".to_string()
                ],
            ]
        );
    }

    #[tokio::test]
    async fn test_log_content_errors() {
        let (dir, state) = setup().await;

        let missing = dir.path().join("gone.log");
        let err = get_log_content(State(state.clone()), segment(missing.to_str().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let prose = write_log(&dir, "prose.log", &["once upon a time"]);
        let err = get_log_content(State(state), segment(&prose)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("Unable to detect log format"));
    }

    #[tokio::test]
    async fn test_single_file_analytics() {
        let (dir, state) = setup().await;
        let log = write_log(&dir, "app.log", &SAMPLE);

        let Json(body) = get_analytics(State(state), segment(&log)).await.unwrap();
        assert_eq!(
            body.levels,
            BTreeMap::from([(Severity::Error, 1), (Severity::Info, 1)])
        );
        assert!(!body.plot.is_empty());
    }

    #[tokio::test]
    async fn test_merged_analytics() {
        let (dir, state) = setup().await;

        let err = get_merged_analytics(State(state.clone())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let a = write_log(&dir, "a.log", &SAMPLE);
        let b = write_log(&dir, "b.log", &["2025-05-19 23:59:00 - DEBUG - late"]);
        state.registry.add(&a).await.unwrap();
        state.registry.add(&b).await.unwrap();
        state.registry.add("/definitely/not/here.log").await.unwrap();

        let Json(body) = get_merged_analytics(State(state)).await.unwrap();
        assert!(!body.plot.is_empty());
    }

    #[tokio::test]
    async fn test_merged_analytics_without_buckets_is_no_data() {
        let (dir, state) = setup().await;
        let log = write_log(&dir, "a.log", &["someday | INFO | undated"]);
        state.registry.add(&log).await.unwrap();

        let err = get_merged_analytics(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "No log data found in the watched files");
    }
}
