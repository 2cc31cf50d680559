//! HTTP adapter: REST commands and a server-sent event stream per game.

use crate::auth::TokenAuth;
use crate::notifier::BroadcastNotifier;
use crate::service::{GameService, Registration};
use crate::store::MemoryStore;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use switcher_core::{
    Board, Coordinate, ErrorCategory, GameError, GameId, GameSnapshot, GameStatus, Movement,
    MovementType, PlayerId,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, instrument, warn};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: GameService,
    notifier: Arc<BroadcastNotifier>,
}

impl AppState {
    /// Bundles the service with the notifier it publishes to.
    pub fn new(service: GameService, notifier: Arc<BroadcastNotifier>) -> Self {
        Self { service, notifier }
    }

    /// In-memory store, token auth and broadcast notifications.
    #[instrument]
    pub fn in_memory(notification_buffer: usize) -> Self {
        let notifier = Arc::new(BroadcastNotifier::new(notification_buffer));
        let service = GameService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenAuth::new()),
            notifier.clone(),
        );
        Self::new(service, notifier)
    }

    /// Command service.
    pub fn service(&self) -> &GameService {
        &self.service
    }
}

/// A [`GameError`] on its way to becoming an HTTP response.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
#[display("{}", _0)]
pub struct ApiError(GameError);

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error class, e.g. `validation`.
    pub category: ErrorCategory,
    /// Human-readable detail.
    pub message: String,
}

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match (&self.0, self.0.category()) {
            (
                GameError::CapacityReached(_)
                | GameError::PlayerCountMismatch { .. }
                | GameError::AlreadyInGame { .. },
                _,
            ) => StatusCode::CONFLICT,
            (GameError::InvalidCredentials, _) => StatusCode::UNAUTHORIZED,
            (_, ErrorCategory::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorCategory::Authorization) => StatusCode::FORBIDDEN,
            (_, ErrorCategory::Consistency) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let category = self.0.category();
        let message = if category == ErrorCategory::Consistency {
            error!(error = %self.0, "Internal failure");
            "Internal server error".to_string()
        } else {
            warn!(error = %self.0, %status, "Request rejected");
            self.0.to_string()
        };
        (status, Json(ErrorBody { category, message })).into_response()
    }
}

/// The player behind the request's `Authorization: Bearer` token.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub PlayerId);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(GameError::InvalidCredentials)?;
        Ok(Self(state.service.authenticate(token)?))
    }
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
}

/// Body of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    /// Game name, letters and spaces.
    pub name: String,
    /// Number of players, 2 to 4.
    pub capacity: u8,
}

/// Body of `POST /games/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Card type, `MOV_01`..`MOV_07` or `1`..`7`.
    pub card: String,
    /// First cell.
    pub from: Coordinate,
    /// Second cell.
    pub to: Coordinate,
}

impl MoveRequest {
    fn movement(&self) -> Result<Movement, GameError> {
        Ok(Movement::new(MovementType::parse(&self.card)?, self.from, self.to))
    }
}

/// Query string of `GET /games`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Only games in this status.
    pub status: Option<GameStatus>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/players", post(register_player))
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/quit", post(quit_game))
        .route("/games/{id}/start", post(start_game))
        .route("/games/{id}/moves", post(apply_move).delete(undo_move))
        .route("/games/{id}/turn", post(finish_turn))
        .route("/games/{id}/board", get(partial_board))
        .route("/games/{id}/events", get(events))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state, request), fields(name = %request.name))]
async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let registration = state.service.register_player(&request.name)?;
    info!(player_id = %registration.player_id(), "Player registered");
    Ok((StatusCode::CREATED, Json(registration)))
}

#[instrument(skip(state))]
async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<GameSnapshot>>, ApiError> {
    Ok(Json(state.service.list_games(query.status)?))
}

#[instrument(skip(state, request), fields(player_id = %caller.0))]
async fn create_game(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameSnapshot>), ApiError> {
    let snapshot = state
        .service
        .create_game(caller.0, &request.name, request.capacity)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.game(GameId::from(id))?))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn join_game(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.join_game(caller.0, GameId::from(id)).await?))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn quit_game(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.quit_game(caller.0, GameId::from(id)).await?))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn start_game(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.start_game(caller.0, GameId::from(id)).await?))
}

#[instrument(skip(state, request), fields(player_id = %caller.0, card = %request.card))]
async fn apply_move(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<GameSnapshot>, ApiError> {
    let movement = request.movement()?;
    Ok(Json(
        state
            .service
            .apply_move(caller.0, GameId::from(id), movement)
            .await?,
    ))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn undo_move(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.undo_move(caller.0, GameId::from(id)).await?))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn finish_turn(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, ApiError> {
    Ok(Json(state.service.finish_turn(caller.0, GameId::from(id)).await?))
}

#[instrument(skip(state), fields(player_id = %caller.0))]
async fn partial_board(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<u64>,
) -> Result<Json<Board>, ApiError> {
    Ok(Json(state.service.partial_view(caller.0, GameId::from(id))?))
}

#[instrument(skip(state))]
async fn events(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let game_id = GameId::from(id);
    state.service.game(game_id)?;
    let receiver = state.notifier.subscribe(game_id)?;
    info!(%game_id, "Event stream opened");

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    match Event::default()
                        .event(notification.kind().to_string())
                        .json_data(&notification)
                    {
                        Ok(event) => return Some((Ok(event), receiver)),
                        Err(e) => error!(error = %e, "Failed to encode notification"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("Event channel closed");
                    return None;
                }
            }
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
