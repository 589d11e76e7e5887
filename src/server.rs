//! JSON REST API over decks, flashcards, quizzes and reviews.
//!
//! Every route except `/health` acts on behalf of the user named in the
//! `X-User-Id` header. Authentication happens upstream; this service only
//! checks that the header carries a well-formed id.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{FromRequest, FromRequestParts, State},
    http::{header, request::Parts, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::error::{ApiError, ApiResult};
use crate::flashcards::{
    algorithm::{format_interval, preview_intervals},
    CardState, CardWithState, CreateCardRequest, CreateDeckRequest, Deck, Flashcard,
    FlashcardStorage, ReviewStats, UpdateCardRequest, UpdateDeckRequest,
};
use crate::quiz::{grade, QuizHistory, QuizResult, QuizResultSummary, QuizStorage, QuizSubmission};

pub const USER_ID_HEADER: &str = "x-user-id";

/// JSON body extractor whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections render as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor whose rejections render as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Server state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub flashcards: Arc<Mutex<FlashcardStorage>>,
    pub quizzes: Arc<Mutex<QuizStorage>>,
}

impl AppState {
    pub fn new(flashcards: FlashcardStorage, quizzes: QuizStorage) -> Self {
        Self {
            flashcards: Arc::new(Mutex::new(flashcards)),
            quizzes: Arc::new(Mutex::new(quizzes)),
        }
    }

    fn flashcards(&self) -> ApiResult<MutexGuard<'_, FlashcardStorage>> {
        self.flashcards
            .lock()
            .map_err(|e| ApiError::Internal(format!("Failed to acquire flashcard storage lock: {}", e)))
    }

    fn quizzes(&self) -> ApiResult<MutexGuard<'_, QuizStorage>> {
        self.quizzes
            .lock()
            .map_err(|e| ApiError::Internal(format!("Failed to acquire quiz storage lock: {}", e)))
    }
}

/// Id of the user a request acts for, taken from `X-User-Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))?;

        value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(UserId)
            .ok_or_else(|| ApiError::BadRequest("X-User-Id must be a UUID".to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckFilter {
    pub deck_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// 1 = Again, 2 = Hard, 3 = Good, 4 = Easy
    pub rating: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPreview {
    pub again: String,
    pub hard: String,
    pub good: String,
    pub easy: String,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

// ==================== Decks ====================

async fn list_decks(State(state): State<AppState>, UserId(user): UserId) -> ApiResult<Json<Vec<Deck>>> {
    Ok(Json(state.flashcards()?.list_decks(user)?))
}

async fn create_deck(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiJson(request): ApiJson<CreateDeckRequest>,
) -> ApiResult<(StatusCode, Json<Deck>)> {
    let deck = state.flashcards()?.create_deck(user, request)?;
    log::info!("User {} created deck {} ({})", user, deck.id, deck.name);
    Ok((StatusCode::CREATED, Json(deck)))
}

async fn get_deck(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<Json<Deck>> {
    Ok(Json(state.flashcards()?.get_deck(user, deck_id)?))
}

async fn update_deck(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateDeckRequest>,
) -> ApiResult<Json<Deck>> {
    Ok(Json(state.flashcards()?.update_deck(user, deck_id, update)?))
}

async fn delete_deck(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    let flashcards = state.flashcards()?;
    let quizzes = state.quizzes()?;

    flashcards.delete_deck(user, deck_id)?;
    let removed = quizzes.delete_results_for_deck(user, deck_id)?;
    log::info!("User {} deleted deck {} and {} quiz results", user, deck_id, removed);

    Ok(StatusCode::NO_CONTENT)
}

// ==================== Cards ====================

async fn list_cards(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Flashcard>>> {
    let flashcards = state.flashcards()?;
    flashcards.get_deck(user, deck_id)?;
    Ok(Json(flashcards.list_cards(user, deck_id)?))
}

async fn create_card(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<Flashcard>)> {
    let card = state.flashcards()?.create_card(user, deck_id, request)?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn get_card(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(card_id): ApiPath<Uuid>,
) -> ApiResult<Json<Flashcard>> {
    Ok(Json(state.flashcards()?.get_card(user, card_id)?))
}

async fn update_card(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(card_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateCardRequest>,
) -> ApiResult<Json<Flashcard>> {
    Ok(Json(state.flashcards()?.update_card(user, card_id, update)?))
}

async fn delete_card(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(card_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.flashcards()?.delete_card(user, card_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Quizzes ====================

async fn submit_quiz(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
    ApiJson(submission): ApiJson<QuizSubmission>,
) -> ApiResult<(StatusCode, Json<QuizResult>)> {
    let flashcards = state.flashcards()?;
    let deck = flashcards.get_deck(user, deck_id)?;
    let cards = flashcards.list_cards(user, deck_id)?;

    let graded = grade(&cards, &submission.answers, submission.match_mode)?;
    let missed = graded.missed();
    let result = graded.into_result(user, &deck, submission.match_mode);

    // The schedule only moves once the result is on disk
    state.quizzes()?.save_result(&result)?;
    if submission.update_schedule {
        flashcards.apply_quiz_outcome(user, &result.correct, &missed)?;
    }
    drop(flashcards);

    log::info!(
        "User {} scored {}/{} on deck {}",
        user,
        result.score,
        result.total,
        deck_id
    );
    Ok((StatusCode::CREATED, Json(result)))
}

async fn quiz_history(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(deck_id): ApiPath<Uuid>,
) -> ApiResult<Json<QuizHistory>> {
    state.flashcards()?.get_deck(user, deck_id)?;
    Ok(Json(state.quizzes()?.deck_history(user, deck_id)?))
}

async fn list_quiz_results(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiQuery(filter): ApiQuery<DeckFilter>,
) -> ApiResult<Json<Vec<QuizResultSummary>>> {
    let results = state.quizzes()?.list_results(user, filter.deck_id)?;
    Ok(Json(results.iter().map(QuizResult::summary).collect()))
}

async fn get_quiz_result(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(result_id): ApiPath<Uuid>,
) -> ApiResult<Json<QuizResult>> {
    Ok(Json(state.quizzes()?.get_result(user, result_id)?))
}

async fn delete_quiz_result(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(result_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.quizzes()?.delete_result(user, result_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Reviews ====================

async fn due_cards(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiQuery(filter): ApiQuery<DeckFilter>,
) -> ApiResult<Json<Vec<CardWithState>>> {
    Ok(Json(state.flashcards()?.get_due_cards(user, filter.deck_id)?))
}

async fn review_stats(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiQuery(filter): ApiQuery<DeckFilter>,
) -> ApiResult<Json<ReviewStats>> {
    Ok(Json(state.flashcards()?.get_review_stats(user, filter.deck_id)?))
}

async fn submit_review(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(card_id): ApiPath<Uuid>,
    ApiJson(review): ApiJson<ReviewRequest>,
) -> ApiResult<Json<CardState>> {
    Ok(Json(state.flashcards()?.submit_review(user, card_id, review.rating)?))
}

async fn card_intervals(
    State(state): State<AppState>,
    UserId(user): UserId,
    ApiPath(card_id): ApiPath<Uuid>,
) -> ApiResult<Json<IntervalPreview>> {
    let flashcards = state.flashcards()?;
    flashcards.get_card(user, card_id)?;
    let [again, hard, good, easy] = preview_intervals(&flashcards.get_card_state(user, card_id)?);

    Ok(Json(IntervalPreview {
        again: format_interval(again),
        hard: format_interval(hard),
        good: format_interval(good),
        easy: format_interval(easy),
    }))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

/// Build the API router.
pub fn create_router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/decks", get(list_decks).post(create_deck))
        .route(
            "/decks/{deck_id}",
            get(get_deck).patch(update_deck).delete(delete_deck),
        )
        .route("/decks/{deck_id}/cards", get(list_cards).post(create_card))
        .route("/decks/{deck_id}/quiz", post(submit_quiz))
        .route("/decks/{deck_id}/quiz/history", get(quiz_history))
        .route(
            "/cards/{card_id}",
            get(get_card).patch(update_card).delete(delete_card),
        )
        .route("/cards/{card_id}/review", post(submit_review))
        .route("/cards/{card_id}/intervals", get(card_intervals))
        .route("/quiz-results", get(list_quiz_results))
        .route(
            "/quiz-results/{result_id}",
            get(get_quiz_result).delete(delete_quiz_result),
        )
        .route("/review/due", get(due_cards))
        .route("/review/stats", get(review_stats))
        .layer(ServiceBuilder::new().layer(cors_layer(config)))
        .with_state(state)
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the API server until Ctrl+C or SIGTERM.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let data_dir = config.resolve_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    log::info!("Using data directory {}", data_dir.display());

    let state = AppState::new(
        FlashcardStorage::new(data_dir.clone()),
        QuizStorage::new(data_dir),
    );
    let app = create_router(state, &config);

    let address = config.socket_addr()?;
    let listener = TcpListener::bind(address).await?;
    log::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<UserId, ApiError> {
        let mut builder = Request::builder().uri("/decks");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_user_id_from_header() {
        let id = Uuid::new_v4();
        let user = extract(&[("X-User-Id", id.to_string().as_str())]).await.unwrap();
        assert_eq!(user, UserId(id));
    }

    #[tokio::test]
    async fn test_user_id_missing_or_malformed() {
        assert!(matches!(extract(&[]).await, Err(ApiError::BadRequest(_))));
        assert!(matches!(
            extract(&[("X-User-Id", "alice")]).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        let config = Config {
            allowed_origins: vec!["https://app.example.com".into(), "bad\norigin".into()],
            ..Config::default()
        };
        // Building must not panic on the invalid entry
        let _ = cors_layer(&config);
    }
}
