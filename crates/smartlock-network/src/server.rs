//! HTTP admin panel for the smart lock.
//!
//! The panel shares the [`AccessController`](smartlock_engine::AccessController)
//! with the lock runtime, so every change takes effect on the next credential
//! presented at the door.
//!
//! # Routes
//!
//! | Route                          | Auth | Effect                              |
//! |--------------------------------|------|-------------------------------------|
//! | `GET /`                        | no   | login form, or the panel if logged in |
//! | `GET /login?PASS=..`           | no   | start a session                     |
//! | `GET /login?LOGOUT`            | no   | end the session                     |
//! | `GET /delete?ID=a:b:c:d`       | yes  | remove a user card                  |
//! | `GET /changePass?PASS=..`      | yes  | set the admin password              |
//! | `GET /changePin?PIN=..`        | yes  | set the door PIN                    |
//! | `GET /changeLockTime?LOCKTIME=..` | yes | set the lockout minutes           |
//! | `GET /toggleNFC` etc.          | yes  | flip an input channel               |
//! | `GET /api/status`              | yes  | JSON controller and settings state  |
//! | `GET /api/logs?limit=&denied=` | yes  | JSON access log                     |
//!
//! Protected routes redirect to `/` without a live session. Unknown paths
//! answer 404 "Not found".
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use smartlock_network::{AdminServer, AdminServerConfig, AdminState};
//! # use smartlock_engine::SharedController;
//!
//! # async fn example(controller: SharedController) -> Result<(), Box<dyn std::error::Error>> {
//! let state = Arc::new(AdminState::new(controller));
//! let server = AdminServer::spawn(AdminServerConfig::default(), state).await?;
//! println!("admin panel on http://{}", server.local_addr());
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, Request, State};
use axum::http::header::{CACHE_CONTROL, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use smartlock_core::{AdminPassword, CardUid, Feature, LockTime, PinCode};
use smartlock_engine::{ControllerStatus, SharedController};
use smartlock_storage::{AccessLog, AccessLogRepository, LockSettings, SqliteAccessLogRepository};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::{AdminError, AdminResult};
use crate::pages;
use crate::session::{SessionStore, expired_cookie, session_cookie, session_token};

/// Default page size for `/api/logs`.
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Upper bound for `/api/logs?limit=`.
pub const MAX_LOG_LIMIT: i64 = 500;

type Params = Query<HashMap<String, String>>;

/// Configuration for the admin server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminServerConfig {
    /// Address to bind; port 0 picks a free port
    pub bind_addr: SocketAddr,
}

impl Default for AdminServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
        }
    }
}

/// State shared by the admin handlers.
#[derive(Debug)]
pub struct AdminState {
    controller: SharedController,
    access_log: Option<SqliteAccessLogRepository>,
    sessions: SessionStore,
}

impl AdminState {
    pub fn new(controller: SharedController) -> Self {
        Self {
            controller,
            access_log: None,
            sessions: SessionStore::new(),
        }
    }

    /// Serve the access log on `/api/logs`.
    pub fn with_access_log(mut self, repository: SqliteAccessLogRepository) -> Self {
        self.access_log = Some(repository);
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Build the admin router.
pub fn router(state: Arc<AdminState>) -> Router {
    let protected = Router::new()
        .route("/delete", get(delete_card))
        .route("/changePass", get(change_password))
        .route("/changePin", get(change_pin))
        .route("/changeLockTime", get(change_lock_time))
        .route("/toggleNFC", get(toggle_nfc))
        .route("/togglePIN", get(toggle_pin))
        .route("/toggleScanner", get(toggle_scanner))
        .route("/api/status", get(api_status))
        .route("/api/logs", get(api_logs))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_session,
        ));

    Router::new()
        .route("/", get(index))
        .route("/login", get(login))
        .merge(protected)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle to the running admin server.
#[derive(Debug)]
pub struct AdminServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<AdminResult<()>>,
}

impl AdminServer {
    /// Bind and start serving in a background task.
    ///
    /// # Errors
    /// Returns `AdminError::Io` if the address cannot be bound.
    pub async fn spawn(config: AdminServerConfig, state: Arc<AdminState>) -> AdminResult<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let app = router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            info!(address = %local_addr, "Admin panel listening");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(address = %local_addr, error = %e, "Admin panel exited with error");
                return Err(e.into());
            }
            info!("Admin panel stopped");
            Ok(())
        });

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> AdminResult<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(AdminError::Io(std::io::Error::other(e))),
        }
    }
}

async fn require_session(
    State(state): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.sessions.authenticated(request.headers()).await {
        next.run(request).await
    } else {
        back_to_panel()
    }
}

fn back_to_panel() -> Response {
    ([(CACHE_CONTROL, "no-cache")], Redirect::to("/")).into_response()
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found\n\n")
}

async fn index(State(state): State<Arc<AdminState>>, headers: HeaderMap) -> AdminResult<Html<String>> {
    if !state.sessions.authenticated(&headers).await {
        return Ok(Html(pages::LOGIN_FORM.to_string()));
    }

    let controller = state.controller.lock().await;
    let store = controller.store();
    Ok(Html(pages::panel(&store.settings()?, &store.cards()?)))
}

async fn login(
    State(state): State<Arc<AdminState>>,
    headers: HeaderMap,
    Query(params): Params,
) -> AdminResult<Response> {
    if params.contains_key("LOGOUT") {
        if let Some(token) = session_token(&headers) {
            state.sessions.revoke(&token).await;
        }
        info!("Admin logged out");
        return Ok((
            [
                (SET_COOKIE, expired_cookie()),
                (CACHE_CONTROL, "no-cache".to_string()),
            ],
            Redirect::to("/"),
        )
            .into_response());
    }

    let Some(password) = params.get("PASS") else {
        return Ok(Html(pages::LOGIN_FORM).into_response());
    };

    let valid = state
        .controller
        .lock()
        .await
        .store()
        .verify_admin_password(password)?;
    if !valid {
        warn!("Admin login with wrong password");
        return Err(AdminError::WrongPassword);
    }

    let token = state.sessions.create().await;
    info!("Admin logged in");
    Ok((
        [
            (SET_COOKIE, session_cookie(&token)),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        Redirect::to("/"),
    )
        .into_response())
}

async fn delete_card(State(state): State<Arc<AdminState>>, Query(params): Params) -> AdminResult<Response> {
    if let Some(id) = params.get("ID") {
        let uid = CardUid::parse_decimal(id.trim().trim_end_matches(':'))?;
        let removed = state.controller.lock().await.store_mut().remove_card(&uid)?;
        if !removed {
            info!(card = %uid, "Delete requested for unknown card");
        }
    }
    Ok(back_to_panel())
}

async fn change_password(State(state): State<Arc<AdminState>>, Query(params): Params) -> AdminResult<Response> {
    if let Some(password) = params.get("PASS") {
        let password = AdminPassword::new(password)?;
        state
            .controller
            .lock()
            .await
            .store_mut()
            .set_admin_password(&password)?;
        info!("Admin password changed");
    }
    Ok(back_to_panel())
}

async fn change_pin(State(state): State<Arc<AdminState>>, Query(params): Params) -> AdminResult<Response> {
    if let Some(pin) = params.get("PIN") {
        let pin = PinCode::new(pin)?;
        state.controller.lock().await.store_mut().set_pin_code(&pin)?;
        info!("PIN changed");
    }
    Ok(back_to_panel())
}

async fn change_lock_time(State(state): State<Arc<AdminState>>, Query(params): Params) -> AdminResult<Response> {
    if let Some(value) = params.get("LOCKTIME") {
        let lock_time: LockTime = value.parse()?;
        state
            .controller
            .lock()
            .await
            .store_mut()
            .set_lock_time(lock_time)?;
        info!(minutes = lock_time.minutes(), "Lock time changed");
    }
    Ok(back_to_panel())
}

async fn toggle(state: &AdminState, feature: Feature) -> AdminResult<Response> {
    let enabled = state.controller.lock().await.store_mut().toggle_feature(feature)?;
    info!(%feature, enabled, "Input toggled");
    Ok(back_to_panel())
}

async fn toggle_nfc(State(state): State<Arc<AdminState>>) -> AdminResult<Response> {
    toggle(&state, Feature::Nfc).await
}

async fn toggle_pin(State(state): State<Arc<AdminState>>) -> AdminResult<Response> {
    toggle(&state, Feature::Pin).await
}

async fn toggle_scanner(State(state): State<Arc<AdminState>>) -> AdminResult<Response> {
    toggle(&state, Feature::Scanner).await
}

/// Body of `/api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub controller: ControllerStatus,
    pub settings: LockSettings,
}

async fn api_status(State(state): State<Arc<AdminState>>) -> AdminResult<Json<StatusResponse>> {
    let controller = state.controller.lock().await;
    Ok(Json(StatusResponse {
        controller: controller.status(Instant::now()),
        settings: controller.store().settings()?,
    }))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<i64>,
    #[serde(default)]
    denied: bool,
}

async fn api_logs(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<LogsQuery>,
) -> AdminResult<Json<Vec<AccessLog>>> {
    let repository = state
        .access_log
        .as_ref()
        .ok_or(AdminError::Unavailable("Access log"))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);

    let logs = if query.denied {
        repository.find_recent_denied(limit).await?
    } else {
        repository.find_recent(limit).await?
    };
    Ok(Json(logs))
}
