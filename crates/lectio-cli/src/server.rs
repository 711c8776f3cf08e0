use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lectio_core::{
    AnalysisContext, CoreError, DensitySeries, FrequencyReport, Meaning, Navigation,
    WordAnalysis, bucket_at, build_density, navigate, occurrences_from_positions,
    preprocess_text, text_hash, word_frequency,
};
use lectio_navigium::{MemoryCache, NavigiumClient};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::LectioConfig;

pub type SharedState = Arc<AppState>;

/// Everything the handlers share: the dictionary client and the analyses
/// of texts already submitted, keyed by the hash of the preprocessed text.
pub struct AppState {
    pub client: NavigiumClient,
    pub analyses: MemoryCache<Vec<WordAnalysis>>,
    pub default_buckets: usize,
    pub max_buckets: usize,
}

impl AppState {
    pub fn new(client: NavigiumClient, default_buckets: usize, max_buckets: usize) -> Self {
        Self {
            client,
            analyses: MemoryCache::new(),
            default_buckets,
            max_buckets,
        }
    }

    /// Analysis context for `text` (already preprocessed), reusing a cached
    /// full analysis and looking up whatever it does not cover.
    async fn context_for(&self, text: &str, search_words: &[String]) -> AnalysisContext {
        let cached = self
            .analyses
            .get(&text_hash(text))
            .await
            .unwrap_or_default();
        let mut ctx = AnalysisContext::new(text, &cached);
        self.client.fill_lemmas(&mut ctx, search_words).await;
        ctx
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LookupParams {
    nr: Option<u32>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub original_text: String,
    pub word_count: usize,
    pub results: Vec<WordAnalysis>,
}

#[derive(Deserialize)]
pub struct FrequencyRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    search_words: Option<Vec<String>>,
}

/// Click position on the rendered chart, in whatever unit the chart uses.
#[derive(Deserialize)]
pub struct Click {
    offset: f64,
    extent: f64,
}

#[derive(Deserialize)]
pub struct NavigateRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    search_word: Option<String>,
    #[serde(default)]
    bucket_count: Option<usize>,
    #[serde(default)]
    bucket: Option<usize>,
    #[serde(default)]
    click: Option<Click>,
    #[serde(default)]
    tolerance: usize,
}

#[derive(Serialize, Deserialize)]
pub struct NavigateResponse {
    pub series: DensitySeries,
    #[serde(flatten)]
    pub navigation: Navigation,
    /// 1-based number of the selected word in the text.
    pub word_number: Option<usize>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health))
        .route("/api/lookup/{word}", get(api_lookup))
        .route("/api/analyze", post(api_analyze))
        .route("/api/word-frequency", post(api_word_frequency))
        .route("/api/navigate", post(api_navigate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(config: &LectioConfig, client: NavigiumClient) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(
        client,
        config.default_buckets,
        config.max_buckets,
    ));
    let router = build_router(state);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "lectio listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> &'static str {
    "lectio: Latin text analysis\n\
     GET  /api/lookup/{word}?nr=1\n\
     POST /api/analyze         {text}\n\
     POST /api/word-frequency  {text, search_words}\n\
     POST /api/navigate        {text, search_word, bucket_count, bucket | click}\n"
}

async fn health() -> &'static str {
    "ok"
}

async fn api_lookup(
    State(state): State<SharedState>,
    Path(word): Path<String>,
    Query(params): Query<LookupParams>,
) -> Json<Meaning> {
    let nr = params.nr.unwrap_or(1).max(1);
    Json(state.client.lookup(&word, nr).await)
}

async fn api_analyze(
    State(state): State<SharedState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let raw = req.text.ok_or_else(|| ApiError::bad_request("no text given"))?;
    let text = preprocess_text(&raw);
    if text.is_empty() {
        return Err(ApiError::bad_request("text is empty"));
    }

    let key = text_hash(&text);
    let results = match state.analyses.get(&key).await {
        Some(hit) => {
            tracing::debug!("analysis cache hit");
            hit
        }
        None => {
            let results = state.client.analyze_text(&text, true).await;
            state.analyses.insert(key, results.clone()).await;
            results
        }
    };

    Ok(Json(AnalyzeResponse {
        original_text: text,
        word_count: results.len(),
        results,
    }))
}

async fn api_word_frequency(
    State(state): State<SharedState>,
    Json(req): Json<FrequencyRequest>,
) -> Result<Json<FrequencyReport>, ApiError> {
    let (Some(raw), Some(search_words)) = (req.text, req.search_words) else {
        return Err(ApiError::bad_request("text and search words required"));
    };
    let text = preprocess_text(&raw);
    let ctx = state.context_for(&text, &search_words).await;
    Ok(Json(word_frequency(&ctx, &search_words)))
}

async fn api_navigate(
    State(state): State<SharedState>,
    Json(req): Json<NavigateRequest>,
) -> Result<Json<NavigateResponse>, ApiError> {
    let (Some(raw), Some(search_word)) = (req.text, req.search_word) else {
        return Err(ApiError::bad_request("text and search word required"));
    };
    let bucket_count = req.bucket_count.unwrap_or(state.default_buckets);
    if bucket_count > state.max_buckets {
        return Err(ApiError::bad_request(format!(
            "bucket count {bucket_count} exceeds the maximum of {}",
            state.max_buckets
        )));
    }
    let text = preprocess_text(&raw);

    let search_words = vec![search_word];
    let ctx = state.context_for(&text, &search_words).await;
    let report = word_frequency(&ctx, &search_words);
    let occurrences = occurrences_from_positions(&report.word_data[0].positions, &search_words[0]);

    let series = build_density(&occurrences, report.total_words, bucket_count)?;
    let bucket = match (req.bucket, &req.click) {
        (Some(bucket), _) => bucket,
        (None, Some(click)) => bucket_at(click.offset, click.extent, bucket_count)?,
        (None, None) => return Err(ApiError::bad_request("bucket or click required")),
    };
    let navigation = navigate(&series, &occurrences, bucket, req.tolerance)?;
    let word_number = navigation.occurrence.as_ref().map(|o| o.position + 1);

    Ok(Json(NavigateResponse {
        series,
        navigation,
        word_number,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::Request;
    use lectio_core::{lookup_words, tokenize};
    use lectio_navigium::ClientConfig;
    use tower::ServiceExt;

    const TEXT: &str = "arma virumque cano troiae qui primus ab oris arma";

    // Nothing listens here; every test seeds enough analysis that no
    // lookup is attempted, and a stray one fails fast.
    fn offline_client() -> NavigiumClient {
        NavigiumClient::new(ClientConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    async fn seeded_state() -> SharedState {
        let state = Arc::new(AppState::new(offline_client(), 5, 100));
        let analyses: Vec<WordAnalysis> = lookup_words(&tokenize(TEXT))
            .into_iter()
            .map(|w| WordAnalysis::new(w, vec![]))
            .collect();
        state.analyses.insert(text_hash(TEXT), analyses).await;
        state
    }

    async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> Response {
        router
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok() {
        let router = build_router(seeded_state().await);
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_requires_text() {
        let router = build_router(seeded_state().await);
        let response = post_json(router, "/api/analyze", json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "no text given");
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_text() {
        let router = build_router(seeded_state().await);
        let response = post_json(router, "/api/analyze", json!({ "text": " \u{00a0}\n" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "text is empty");
    }

    #[tokio::test]
    async fn test_analyze_serves_cached_result() {
        let router = build_router(seeded_state().await);
        let response = post_json(router, "/api/analyze", json!({ "text": TEXT })).await;
        assert_eq!(response.status(), StatusCode::OK);
        let payload: AnalyzeResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(payload.original_text, TEXT);
        assert_eq!(payload.word_count, 8);
    }

    #[tokio::test]
    async fn test_word_frequency_requires_fields() {
        let router = build_router(seeded_state().await);
        let response = post_json(router, "/api/word-frequency", json!({ "text": TEXT })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_word_frequency_positions() {
        let router = build_router(seeded_state().await);
        let response = post_json(
            router,
            "/api/word-frequency",
            json!({ "text": TEXT, "search_words": ["arma"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let report: FrequencyReport = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(report.total_words, 9);
        assert_eq!(report.word_data[0].positions, vec![1, 9]);
    }

    #[tokio::test]
    async fn test_navigate_by_bucket_and_click() {
        let state = seeded_state().await;

        let response = post_json(
            build_router(state.clone()),
            "/api/navigate",
            json!({ "text": TEXT, "search_word": "arma", "bucket": 2 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let by_bucket: NavigateResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(by_bucket.series.counts(), vec![1, 0, 0, 0, 1]);
        assert_eq!(by_bucket.navigation.plateau.lo, 1);
        assert_eq!(by_bucket.navigation.plateau.hi, 3);

        let response = post_json(
            build_router(state),
            "/api/navigate",
            json!({
                "text": TEXT,
                "search_word": "arma",
                "click": { "offset": 130.0, "extent": 500.0 },
            }),
        )
        .await;
        let by_click: NavigateResponse = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(by_click.navigation, by_bucket.navigation);
        assert_eq!(by_click.word_number, by_bucket.word_number);
    }

    #[tokio::test]
    async fn test_navigate_rejects_zero_buckets() {
        let router = build_router(seeded_state().await);
        let response = post_json(
            router,
            "/api/navigate",
            json!({ "text": TEXT, "search_word": "arma", "bucket_count": 0, "bucket": 0 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("bucket count"));
    }

    #[tokio::test]
    async fn test_navigate_rejects_bucket_count_above_max() {
        for bucket_count in [101, usize::MAX] {
            let router = build_router(seeded_state().await);
            let response = post_json(
                router,
                "/api/navigate",
                json!({
                    "text": TEXT,
                    "search_word": "arma",
                    "bucket_count": bucket_count,
                    "bucket": 0,
                }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert!(body["error"].as_str().unwrap().contains("exceeds the maximum of 100"));
        }
    }

    #[tokio::test]
    async fn test_navigate_requires_search_word() {
        let router = build_router(seeded_state().await);
        let response = post_json(router, "/api/navigate", json!({ "text": TEXT, "bucket": 0 })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_navigate_requires_bucket_or_click() {
        let router = build_router(seeded_state().await);
        let response = post_json(
            router,
            "/api/navigate",
            json!({ "text": TEXT, "search_word": "arma" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
