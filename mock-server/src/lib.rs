use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Everything the server saw about a request, sent back as JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header lines in arrival order; repeated names stay separate.
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Echo {
    /// First value received for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }

    /// Every value received for `name`, in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum MockError {
    #[error("user not found")]
    UserNotFound,

    #[error("unsupported status code {0}")]
    BadStatus(u16),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match self {
            MockError::UserNotFound => StatusCode::NOT_FOUND,
            MockError::BadStatus(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Db = Arc<RwLock<HashMap<Uuid, User>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/status/{code}", any(status))
        .route("/plain", any(plain))
        .route("/redirect", any(redirect))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    };
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}

#[derive(Deserialize)]
struct ListFilter {
    name: Option<String>,
}

async fn list_users(State(db): State<Db>, Query(filter): Query<ListFilter>) -> Json<Vec<User>> {
    let users = db.read().await;
    let mut matching: Vec<User> = users
        .values()
        .filter(|user| filter.name.as_deref().map_or(true, |name| user.name == name))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    Json(matching)
}

async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
    };
    info!(id = %user.id, "created user");
    db.write().await.insert(user.id, user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn get_user(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<User>, MockError> {
    let users = db.read().await;
    users.get(&id).cloned().map(Json).ok_or(MockError::UserNotFound)
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, MockError> {
    let mut users = db.write().await;
    let user = users.get_mut(&id).ok_or(MockError::UserNotFound)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = Some(email);
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<User>, MockError> {
    let mut users = db.write().await;
    let user = users.remove(&id).ok_or(MockError::UserNotFound)?;
    info!(%id, "deleted user");
    Ok(Json(user))
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), MockError> {
    let status = StatusCode::from_u16(code).map_err(|_| MockError::BadStatus(code))?;
    Ok((status, Json(json!({ "status": code }))))
}

async fn plain() -> &'static str {
    "not json"
}

async fn redirect() -> Redirect {
    Redirect::temporary("/echo")
}
