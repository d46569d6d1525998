//! In-process fake of the Sweet Shop service for integration tests.
//!
//! [`FakeSweetShop::start`] binds an axum router on an ephemeral loopback port
//! and serves the same routes, auth rules, and error bodies as the real
//! service, backed by in-memory state. Tests point a [`ClientConfig`] at it
//! and drive the real HTTP gateways.
//!
//! # Accounts
//!
//! | username   | password      | role  |
//! |------------|---------------|-------|
//! | `admin`    | `admin123`    | ADMIN |
//! | `customer` | `customer123` | USER  |
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sweet-shop-integration-tests
//! ```

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{FromRequestParts, Path, Query, Request, State};
use axum::http::{Method, StatusCode, header, request::Parts};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sweet_shop_client::{
    ApiClient, ApiError, ClientConfig, HttpCatalogGateway, HttpIdentityGateway, InventoryStore,
    MemoryPersistence, SessionStore,
};
use sweet_shop_core::{Price, Sweet, SweetDraft, SweetId};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Token lifetime reported by the auth endpoints.
pub const TOKEN_LIFETIME_MS: i64 = 86_400_000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Errors
// ============================================================================

/// Error responses, shaped like the real service's exception handler output.
#[derive(Debug)]
enum ServiceError {
    Unauthorized(&'static str),
    Forbidden,
    NotFound(i64),
    BadRequest(&'static str),
    Validation(BTreeMap<&'static str, &'static str>),
    Conflict(&'static str),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": message, "status": "UNAUTHORIZED" }),
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Only admins can perform this action", "status": "FORBIDDEN" }),
            ),
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Sweet not found with id: {id}"), "status": "NOT_FOUND" }),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "status": "BAD_REQUEST" }),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "VALIDATION_ERROR", "errors": errors }),
            ),
            Self::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "status": "CONFLICT" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone)]
struct Account {
    username: String,
    email: String,
    password: String,
    role: &'static str,
}

/// A request as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// A canned response returned for the next request instead of routing it.
#[derive(Debug, Clone)]
struct Fault {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct ServiceState {
    sweets: Mutex<BTreeMap<i64, Sweet>>,
    next_id: Mutex<i64>,
    accounts: Mutex<Vec<Account>>,
    tokens: Mutex<HashMap<String, usize>>,
    requests: Mutex<Vec<RecordedRequest>>,
    fault: Mutex<Option<Fault>>,
}

impl ServiceState {
    fn seeded() -> Self {
        let state = Self::default();
        lock(&state.accounts).extend([
            Account {
                username: "admin".to_owned(),
                email: "admin@sweetshop.test".to_owned(),
                password: "admin123".to_owned(),
                role: "ADMIN",
            },
            Account {
                username: "customer".to_owned(),
                email: "customer@sweetshop.test".to_owned(),
                password: "customer123".to_owned(),
                role: "USER",
            },
        ]);
        state
    }

    fn insert(&self, draft: SweetDraft) -> Sweet {
        let id = {
            let mut next_id = lock(&self.next_id);
            *next_id += 1;
            *next_id
        };
        let now = Utc::now();
        let sweet = Sweet {
            id: SweetId::new(id),
            name: draft.name,
            category: draft.category,
            price: draft.price,
            quantity: draft.quantity,
            description: draft.description,
            created_at: Some(now),
            updated_at: Some(now),
        };
        lock(&self.sweets).insert(id, sweet.clone());
        sweet
    }

    fn issue_token(&self, account: usize) -> String {
        let mut tokens = lock(&self.tokens);
        let token = format!("fake-token-{}", tokens.len() + 1);
        tokens.insert(token.clone(), account);
        token
    }

    fn modify(
        &self,
        id: i64,
        change: impl FnOnce(&mut Sweet) -> Result<(), ServiceError>,
    ) -> Result<Sweet, ServiceError> {
        let mut sweets = lock(&self.sweets);
        let sweet = sweets.get_mut(&id).ok_or(ServiceError::NotFound(id))?;
        change(sweet)?;
        sweet.updated_at = Some(Utc::now());
        Ok(sweet.clone())
    }
}

type Shared = Arc<ServiceState>;

// ============================================================================
// Authentication
// ============================================================================

/// The account behind the request's bearer token.
struct Caller {
    role: &'static str,
}

impl Caller {
    fn require_admin(&self) -> Result<(), ServiceError> {
        if self.role == "ADMIN" {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }
}

impl FromRequestParts<Shared> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &Shared) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ServiceError::Unauthorized("Authentication required"))?;

        let account = *lock(&state.tokens)
            .get(token)
            .ok_or(ServiceError::Unauthorized("Invalid or expired token"))?;
        lock(&state.accounts)
            .get(account)
            .map(|a| Self { role: a.role })
            .ok_or(ServiceError::Unauthorized("Invalid or expired token"))
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct QuantityRequest {
    quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    name: Option<String>,
    category: Option<String>,
    min_price: Option<Price>,
    max_price: Option<Price>,
}

fn auth_body(account: &Account, token: String) -> Json<serde_json::Value> {
    Json(json!({
        "token": token,
        "username": account.username,
        "email": account.email,
        "role": account.role,
        "expiresIn": TOKEN_LIFETIME_MS,
    }))
}

async fn login(
    State(state): State<Shared>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let accounts = lock(&state.accounts).clone();
    let (index, account) = accounts
        .iter()
        .enumerate()
        .find(|(_, a)| a.username == request.username && a.password == request.password)
        .ok_or(ServiceError::Unauthorized("Invalid username or password"))?;

    Ok(auth_body(account, state.issue_token(index)))
}

async fn register(
    State(state): State<Shared>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let mut errors = BTreeMap::new();
    if request.username.trim().len() < 3 {
        errors.insert("username", "Username must be between 3 and 50 characters");
    }
    if !request.email.contains('@') {
        errors.insert("email", "Email should be valid");
    }
    if request.password.len() < 6 {
        errors.insert("password", "Password must be at least 6 characters");
    }
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let (index, account) = {
        let mut accounts = lock(&state.accounts);
        if accounts.iter().any(|a| a.username == request.username) {
            return Err(ServiceError::Conflict("Username already exists"));
        }
        if accounts.iter().any(|a| a.email == request.email) {
            return Err(ServiceError::Conflict("Email already exists"));
        }
        let account = Account {
            username: request.username,
            email: request.email,
            password: request.password,
            role: "USER",
        };
        accounts.push(account.clone());
        (accounts.len() - 1, account)
    };

    Ok((
        StatusCode::CREATED,
        auth_body(&account, state.issue_token(index)),
    ))
}

fn validate(draft: &SweetDraft) -> Result<(), ServiceError> {
    let mut errors = BTreeMap::new();
    if draft.name.trim().is_empty() {
        errors.insert("name", "Name is required");
    }
    if draft.category.trim().is_empty() {
        errors.insert("category", "Category is required");
    }
    if draft.price < Price::from_cents(1) {
        errors.insert("price", "Price must be greater than 0");
    }
    let description = draft.description.trim().chars().count();
    if !(10..=500).contains(&description) {
        errors.insert(
            "description",
            "Description must be between 10 and 500 characters",
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

async fn list_sweets(State(state): State<Shared>, _caller: Caller) -> Json<Vec<Sweet>> {
    Json(lock(&state.sweets).values().cloned().collect())
}

async fn search_sweets(
    State(state): State<Shared>,
    _caller: Caller,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Sweet>> {
    let name = query.name.map(|n| n.to_lowercase());
    let matches = lock(&state.sweets)
        .values()
        .filter(|s| {
            name.as_ref()
                .is_none_or(|n| s.name.to_lowercase().contains(n.as_str()))
        })
        .filter(|s| {
            query
                .category
                .as_ref()
                .is_none_or(|c| s.category.eq_ignore_ascii_case(c))
        })
        .filter(|s| query.min_price.is_none_or(|min| s.price >= min))
        .filter(|s| query.max_price.is_none_or(|max| s.price <= max))
        .cloned()
        .collect();
    Json(matches)
}

async fn get_sweet(
    State(state): State<Shared>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<Sweet>, ServiceError> {
    lock(&state.sweets)
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ServiceError::NotFound(id))
}

async fn create_sweet(
    State(state): State<Shared>,
    caller: Caller,
    Json(draft): Json<SweetDraft>,
) -> Result<(StatusCode, Json<Sweet>), ServiceError> {
    caller.require_admin()?;
    validate(&draft)?;
    Ok((StatusCode::CREATED, Json(state.insert(draft))))
}

async fn update_sweet(
    State(state): State<Shared>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(draft): Json<SweetDraft>,
) -> Result<Json<Sweet>, ServiceError> {
    caller.require_admin()?;
    validate(&draft)?;
    state
        .modify(id, |sweet| {
            sweet.name = draft.name;
            sweet.category = draft.category;
            sweet.price = draft.price;
            sweet.quantity = draft.quantity;
            sweet.description = draft.description;
            Ok(())
        })
        .map(Json)
}

async fn delete_sweet(
    State(state): State<Shared>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    caller.require_admin()?;
    lock(&state.sweets)
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ServiceError::NotFound(id))
}

fn positive(quantity: i64) -> Result<u32, ServiceError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| {
            ServiceError::Validation(BTreeMap::from([("quantity", "Quantity must be at least 1")]))
        })
}

async fn purchase_sweet(
    State(state): State<Shared>,
    _caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<Sweet>, ServiceError> {
    let quantity = positive(request.quantity)?;
    state
        .modify(id, |sweet| {
            sweet.quantity = sweet
                .quantity
                .checked_sub(quantity)
                .ok_or(ServiceError::BadRequest("Insufficient quantity available"))?;
            Ok(())
        })
        .map(Json)
}

async fn restock_sweet(
    State(state): State<Shared>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<Sweet>, ServiceError> {
    caller.require_admin()?;
    let quantity = positive(request.quantity)?;
    state
        .modify(id, |sweet| {
            sweet.quantity = sweet.quantity.saturating_add(quantity);
            Ok(())
        })
        .map(Json)
}

/// Record every request, and answer with the pending fault if one is set.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    lock(&state.requests).push(RecordedRequest {
        method: request.method().clone(),
        path: request.uri().path().to_owned(),
        query: request.uri().query().map(ToOwned::to_owned),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
    });

    if let Some(fault) = lock(&state.fault).take() {
        return (fault.status, fault.body).into_response();
    }
    next.run(request).await
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/sweets", get(list_sweets).post(create_sweet))
        .route("/sweets/search", get(search_sweets))
        .route(
            "/sweets/{id}",
            get(get_sweet).put(update_sweet).delete(delete_sweet),
        )
        .route("/sweets/{id}/purchase", post(purchase_sweet))
        .route("/sweets/{id}/restock", post(restock_sweet));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// ============================================================================
// Harness
// ============================================================================

/// Both stores wired to a fake service, sharing one session.
pub struct Stores {
    pub session: SessionStore<HttpIdentityGateway, Arc<MemoryPersistence>>,
    pub inventory: InventoryStore<HttpCatalogGateway>,
    /// The session's durable storage, for inspecting persisted entries.
    pub storage: Arc<MemoryPersistence>,
}

/// A running fake service. The server stops when this is dropped.
pub struct FakeSweetShop {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeSweetShop {
    /// Bind to an ephemeral loopback port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state: Shared = Arc::new(ServiceState::seeded());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = router(state.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake sweet shop stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the API, as `SWEET_SHOP_API_URL` would carry it.
    ///
    /// # Panics
    ///
    /// Never in practice: a socket address always forms a valid URL.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("socket address forms a URL")
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.api_url())
    }

    /// Fresh, signed-out stores talking to this server.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn stores(&self) -> Result<Stores, ApiError> {
        self.stores_with(Arc::new(MemoryPersistence::new()))
    }

    /// Stores over existing storage, as after a reload.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the HTTP client cannot be built.
    pub fn stores_with(&self, storage: Arc<MemoryPersistence>) -> Result<Stores, ApiError> {
        let api = ApiClient::new(&self.config())?;
        let session = SessionStore::new(HttpIdentityGateway::new(api.clone()), storage.clone());
        let inventory = InventoryStore::new(HttpCatalogGateway::new(api, session.token_source()));
        Ok(Stores {
            session,
            inventory,
            storage,
        })
    }

    /// Add a sweet directly, bypassing auth.
    pub fn seed(&self, name: &str, category: &str, price_cents: i64, quantity: u32) -> Sweet {
        self.state.insert(SweetDraft {
            name: name.to_owned(),
            category: category.to_owned(),
            price: Price::from_cents(price_cents),
            quantity,
            description: format!("{name} from the test fixtures"),
        })
    }

    /// Server-side stock level of a sweet.
    #[must_use]
    pub fn stock(&self, id: SweetId) -> Option<u32> {
        lock(&self.state.sweets)
            .get(&id.as_i64())
            .map(|s| s.quantity)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Answer the next request with `status` and a raw `body`.
    pub fn fail_next(&self, status: StatusCode, body: impl Into<String>) {
        *lock(&self.state.fault) = Some(Fault {
            status,
            body: body.into(),
        });
    }
}

impl Drop for FakeSweetShop {
    fn drop(&mut self) {
        self.server.abort();
    }
}
