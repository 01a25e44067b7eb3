//! REST backend against a local mock of the auth and table APIs.

#![cfg(feature = "rest")]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use uuid::Uuid;

use community_core::SessionStore;
use community_core::flows::{LoginFlow, ProfileFlow};
use community_core::listing::PostListing;
use community_core::ports::{
    AuthError, AuthService, CommentQuery, OAuthProvider, PostQuery, ProfileRepository,
    QueryError, StateStore,
};
use community_infra::rest::TOKEN_STORAGE_KEY;
use community_infra::{InMemoryStateStore, RestBackend, RestConfig};

const ANON_KEY: &str = "anon-key";
const ACCESS_TOKEN: &str = "access-token-1";
const CREATED_AT: &str = "2024-05-01T12:00:00Z";

struct MockState {
    user_id: Uuid,
    post_count: i64,
    nickname: String,
    comments: Vec<Value>,
    logged_out: bool,
}

type Shared = Arc<Mutex<MockState>>;

fn api_key_ok(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "JWT expired", "code": "PGRST301"})),
    )
        .into_response()
}

async fn token(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !api_key_ok(&headers) || params.get("grant_type").map(String::as_str) != Some("password")
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if body["email"] != "reader@example.com" || body["password"] != "hunter2" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response();
    }

    let user_id = state.lock().unwrap().user_id;
    Json(json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": {
            "id": user_id,
            "email": "reader@example.com",
            "created_at": CREATED_AT,
            "role": "authenticated"
        }
    }))
    .into_response()
}

async fn current_user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if bearer(&headers) != Some(ACCESS_TOKEN) {
        return unauthorized();
    }
    let user_id = state.lock().unwrap().user_id;
    Json(json!({"id": user_id, "email": "reader@example.com"})).into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if bearer(&headers) != Some(ACCESS_TOKEN) {
        return unauthorized();
    }
    state.lock().unwrap().logged_out = true;
    StatusCode::NO_CONTENT.into_response()
}

fn post_row(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id}"),
        "content": format!("Body {id}"),
        "author": "writer",
        "created_at": CREATED_AT
    })
}

async fn posts(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !api_key_ok(&headers) {
        return unauthorized();
    }
    let total = state.lock().unwrap().post_count;

    if let Some(id) = params.get("id").and_then(|f| f.strip_prefix("eq.")) {
        let rows: Vec<Value> = match id.parse::<i64>() {
            Ok(id) if (1..=total).contains(&id) => vec![post_row(id)],
            _ => Vec::new(),
        };
        return Json(rows).into_response();
    }

    assert_eq!(params.get("order").map(String::as_str), Some("created_at.desc"));
    assert_eq!(
        headers.get("prefer").and_then(|v| v.to_str().ok()),
        Some("count=exact")
    );
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once('-'))
        .and_then(|(from, to)| Some((from.parse::<i64>().ok()?, to.parse::<i64>().ok()?)));
    let Some((from, to)) = range else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if from >= total && total > 0 {
        return (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("*/{total}"))],
            Json(json!({"message": "Requested range not satisfiable"})),
        )
            .into_response();
    }

    let to = to.min(total - 1);
    let rows: Vec<Value> = (from..=to).map(|offset| post_row(total - offset)).collect();
    let content_range = if rows.is_empty() {
        format!("*/{total}")
    } else {
        format!("{from}-{to}/{total}")
    };

    (
        StatusCode::PARTIAL_CONTENT,
        [(header::CONTENT_RANGE, content_range)],
        Json(rows),
    )
        .into_response()
}

async fn list_comments(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let post_id = params
        .get("post_id")
        .and_then(|f| f.strip_prefix("eq."))
        .and_then(|id| id.parse::<i64>().ok());
    let state = state.lock().unwrap();
    let rows: Vec<Value> = state
        .comments
        .iter()
        .rev()
        .filter(|c| c["post_id"].as_i64() == post_id)
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn add_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers) != Some(ACCESS_TOKEN) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"comments\""
            })),
        )
            .into_response();
    }

    let mut state = state.lock().unwrap();
    let id = state.comments.len() as i64 + 1;
    state.comments.push(json!({
        "id": id,
        "post_id": body["post_id"],
        "content": body["content"],
        "created_at": CREATED_AT
    }));
    StatusCode::CREATED.into_response()
}

async fn get_profile(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    let wanted = format!("eq.{}", state.user_id);
    let rows = if params.get("id") == Some(&wanted) {
        vec![json!({"id": state.user_id, "nickname": state.nickname, "bio": "hello"})]
    } else {
        Vec::new()
    };
    Json(rows).into_response()
}

async fn patch_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers) != Some(ACCESS_TOKEN) {
        return unauthorized();
    }
    if let Some(nickname) = body["nickname"].as_str() {
        state.lock().unwrap().nickname = nickname.to_string();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_server(post_count: i64) -> (SocketAddr, Shared) {
    let state = Arc::new(Mutex::new(MockState {
        user_id: Uuid::new_v4(),
        post_count,
        nickname: "reader".to_string(),
        comments: Vec::new(),
        logged_out: false,
    }));

    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(current_user))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/posts", get(posts))
        .route("/rest/v1/comments", get(list_comments).post(add_comment))
        .route("/rest/v1/users", get(get_profile).patch(patch_profile))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr, storage: Arc<dyn StateStore>) -> Arc<RestBackend> {
    let config = RestConfig::new(&format!("http://{addr}"), ANON_KEY).unwrap();
    Arc::new(RestBackend::connect(config, storage).await.unwrap())
}

#[tokio::test]
async fn test_posts_page_reads_total_from_content_range() {
    let (addr, _) = spawn_server(25).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;

    let page = backend.fetch_posts(3, 10).await.unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.posts.len(), 5);
    assert_eq!(page.posts[0].title, "Post 5");

    let beyond = backend.fetch_posts(4, 10).await.unwrap();
    assert!(beyond.posts.is_empty());
    assert_eq!(beyond.total_count, 25);
}

#[tokio::test]
async fn test_listing_over_rest() {
    let (addr, _) = spawn_server(25).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;
    let listing = PostListing::new(backend);

    listing.load_page(1).await.unwrap();
    assert_eq!(listing.snapshot().pagination.total_pages, 3);
    assert!(listing.load_page(4).await.is_err());
}

#[tokio::test]
async fn test_fetch_missing_post_is_not_found() {
    let (addr, _) = spawn_server(3).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;

    assert_eq!(backend.fetch_post(2).await.unwrap().title, "Post 2");
    assert!(matches!(
        backend.fetch_post(42).await,
        Err(QueryError::NotFound)
    ));
}

#[tokio::test]
async fn test_bad_password_is_invalid_credentials() {
    let (addr, _) = spawn_server(0).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;

    assert!(matches!(
        backend.sign_in("reader@example.com", "nope").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_sign_in_flow_persists_token_and_nickname() {
    let (addr, mock) = spawn_server(1).await;
    let storage: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let backend = connect(addr, storage.clone()).await;
    let session = Arc::new(SessionStore::load(storage.clone()).await);
    let login = LoginFlow::new(backend.clone(), backend.clone(), session.clone());

    let user = login.sign_in("reader@example.com", "hunter2").await.unwrap();

    assert_eq!(user.id, mock.lock().unwrap().user_id);
    assert_eq!(user.nickname.as_deref(), Some("reader"));
    assert_eq!(user.extra.get("role"), Some(&Value::from("authenticated")));
    assert!(storage.get(TOKEN_STORAGE_KEY).await.unwrap().is_some());

    // A fresh client over the same storage reuses the persisted token.
    let restarted = connect(addr, storage.clone()).await;
    let restored = Arc::new(SessionStore::load(storage).await);
    let login = LoginFlow::new(restarted.clone(), restarted, restored);
    assert_eq!(login.restore().await.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_comments_require_signed_in_token() {
    let (addr, _) = spawn_server(2).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;

    let denied = backend.add_comment(1, "anonymous").await;
    match denied {
        Err(QueryError::Backend(message)) => assert!(message.contains("row-level security")),
        other => panic!("expected backend error, got {other:?}"),
    }

    backend.sign_in("reader@example.com", "hunter2").await.unwrap();
    backend.add_comment(1, "first").await.unwrap();
    backend.add_comment(1, "second").await.unwrap();
    backend.add_comment(2, "elsewhere").await.unwrap();

    let comments = backend.list_comments(1).await.unwrap();
    let bodies: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(bodies, ["second", "first"]);
}

#[tokio::test]
async fn test_nickname_update_and_sign_out() {
    let (addr, mock) = spawn_server(0).await;
    let storage: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let backend = connect(addr, storage.clone()).await;
    let session = Arc::new(SessionStore::new(storage.clone()));
    let login = LoginFlow::new(backend.clone(), backend.clone(), session.clone());
    let profile = ProfileFlow::new(backend.clone(), backend.clone(), session.clone());

    login.sign_in("reader@example.com", "hunter2").await.unwrap();
    let updated = profile.update_nickname("night owl").await.unwrap();

    assert_eq!(updated.nickname.as_deref(), Some("night owl"));
    assert_eq!(updated.extra.get("bio"), Some(&Value::from("hello")));
    assert_eq!(mock.lock().unwrap().nickname, "night owl");
    let stored = backend.fetch_profile(updated.id).await.unwrap();
    assert_eq!(stored.nickname.as_deref(), Some("night owl"));

    profile.sign_out().await;
    assert!(mock.lock().unwrap().logged_out);
    assert!(!session.is_signed_in());
    assert_eq!(storage.get(TOKEN_STORAGE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_oauth_redirect_url() {
    let (addr, _) = spawn_server(0).await;
    let backend = connect(addr, Arc::new(InMemoryStateStore::new())).await;

    let redirect = backend
        .sign_in_with_oauth(OAuthProvider::Github, "http://localhost:3000/callback")
        .await
        .unwrap();

    assert_eq!(redirect.provider, OAuthProvider::Github);
    assert_eq!(
        redirect.url,
        format!(
            "http://{addr}/auth/v1/authorize?provider=github&redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fcallback"
        )
    );
    assert!(backend.sign_in_with_oauth(OAuthProvider::Google, "not a url").await.is_err());
}
