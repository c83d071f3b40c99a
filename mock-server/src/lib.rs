use std::{collections::HashMap, io::Cursor, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Code every forgot-password request "sends".
pub const RESET_CODE: &str = "123456";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub id: String,
    pub name: String,
    pub series: String,
    pub language: String,
    pub symbol_url: Option<String>,
    pub logo_url: Option<String>,
    pub printed_total: u32,
    pub total_cards: u32,
    pub release_date: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub set_id: String,
    pub name: String,
    pub number: String,
    pub rarity: String,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCard {
    pub id: String,
    pub name: String,
    pub number: String,
    pub rarity: Option<String>,
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub id: i64,
    pub user_id: i64,
    pub quantity: i32,
    pub acquired_date: String,
    pub card: CollectionCard,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    pub timestamp: i64,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    pub card_id: String,
    pub user_id: i64,
    pub quantity: i32,
}

struct Account {
    id: i64,
    name: String,
    password: String,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, i64>,
    reset_codes: HashMap<String, String>,
    sets: Vec<CardSet>,
    cards: Vec<Card>,
    entries: HashMap<i64, CollectionEntry>,
    next_user_id: i64,
    next_entry_id: i64,
}

impl Store {
    /// A store holding the seeded catalog and no accounts.
    pub fn seeded() -> Self {
        Self {
            sets: seed_sets(),
            cards: seed_cards(),
            next_user_id: 1,
            next_entry_id: 1,
            ..Self::default()
        }
    }

    fn user_exists(&self, user_id: i64) -> bool {
        self.accounts.values().any(|a| a.id == user_id)
    }

    fn open_session(&mut self, user_id: i64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user_id);
        token
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Non-2xx reply rendered as the standard error envelope.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
    details: Option<HashMap<String, String>>,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: HashMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            error: self.status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.message,
            details: self.details,
            timestamp: Utc::now().timestamp_millis(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/verify-reset-code", post(verify_reset_code))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/test", get(token_check))
        .route("/api/sets/series/{series}", get(sets_by_series))
        .route("/api/cards/set/{set_id}", get(cards_by_set))
        .route("/api/collection/add", post(add_entry))
        .route("/api/collection/delete/{entry_id}", delete(delete_entry))
        .route("/api/collection/user/{user_id}", get(user_collection))
        .route("/images/{name}", get(serve_image))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
        timestamp: Utc::now().timestamp_millis(),
    })
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<i64, Failure> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| store.sessions.get(token).copied())
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Full authentication is required"))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, Failure> {
    let mut store = db.write().await;
    let email = input.email.to_lowercase();
    let (user_id, name) = match store.accounts.get(&email) {
        Some(account) if account.password == input.password => (account.id, account.name.clone()),
        _ => return Err(Failure::new(StatusCode::UNAUTHORIZED, "Bad credentials")),
    };
    let token = store.open_session(user_id);
    info!(user_id, "login");
    Ok(Json(AuthResponse {
        token,
        user_id,
        name,
        email,
    }))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Failure> {
    let mut details = HashMap::new();
    if input.name.trim().is_empty() {
        details.insert("name".to_string(), "must not be blank".to_string());
    }
    if !input.email.contains('@') {
        details.insert("email".to_string(), "must be a well-formed email address".to_string());
    }
    if input.password.len() < 8 {
        details.insert("password".to_string(), "size must be at least 8".to_string());
    }
    if !details.is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Validation failed").with_details(details));
    }

    let mut store = db.write().await;
    let email = input.email.to_lowercase();
    if store.accounts.contains_key(&email) {
        return Err(Failure::new(StatusCode::CONFLICT, "User already exists"));
    }
    let user_id = store.next_user_id;
    store.next_user_id += 1;
    store.accounts.insert(
        email.clone(),
        Account {
            id: user_id,
            name: input.name.clone(),
            password: input.password,
        },
    );
    let token = store.open_session(user_id);
    info!(user_id, "registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user_id,
            name: input.name,
            email,
        }),
    ))
}

async fn forgot_password(
    State(db): State<Db>,
    Json(input): Json<EmailRequest>,
) -> Json<MessageResponse> {
    let mut store = db.write().await;
    let email = input.email.to_lowercase();
    // Same reply for unknown accounts.
    if store.accounts.contains_key(&email) {
        store.reset_codes.insert(email, RESET_CODE.to_string());
    }
    message("If an account exists for that email, a reset code has been sent.")
}

async fn verify_reset_code(
    State(db): State<Db>,
    Json(input): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, Failure> {
    let store = db.read().await;
    match store.reset_codes.get(&input.email.to_lowercase()) {
        Some(code) if *code == input.code => Ok(message("Reset code verified.")),
        _ => Err(Failure::new(StatusCode::BAD_REQUEST, "Invalid or expired reset code")),
    }
}

async fn reset_password(
    State(db): State<Db>,
    Json(input): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, Failure> {
    let mut store = db.write().await;
    let email = input.email.to_lowercase();
    if !store.accounts.contains_key(&email) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "User not found"));
    }
    if store.reset_codes.get(&email) != Some(&input.code) {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Invalid or expired reset code"));
    }
    store.reset_codes.remove(&email);
    if let Some(account) = store.accounts.get_mut(&email) {
        account.password = input.new_password;
    }
    Ok(message("Password has been reset successfully."))
}

async fn token_check(State(db): State<Db>, headers: HeaderMap) -> Result<Json<String>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json("Hello, World!".to_string()))
}

async fn sets_by_series(State(db): State<Db>, Path(series): Path<String>) -> Json<Vec<CardSet>> {
    let store = db.read().await;
    debug!(%series, "sets by series");
    Json(store.sets.iter().filter(|s| s.series == series).cloned().collect())
}

async fn cards_by_set(State(db): State<Db>, Path(set_id): Path<String>) -> Json<Vec<Card>> {
    let store = db.read().await;
    Json(store.cards.iter().filter(|c| c.set_id == set_id).cloned().collect())
}

async fn add_entry(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<AddEntryRequest>,
) -> Result<(StatusCode, Json<CollectionEntry>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    if input.quantity < 1 {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Quantity must be at least 1"));
    }
    if !store.user_exists(input.user_id) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "User not found"));
    }
    let card = store
        .cards
        .iter()
        .find(|c| c.id == input.card_id)
        .map(collection_card)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Card not found"))?;

    let existing = store
        .entries
        .values_mut()
        .find(|e| e.user_id == input.user_id && e.card.id == input.card_id);
    if let Some(entry) = existing {
        entry.quantity = input.quantity;
        return Ok((StatusCode::OK, Json(entry.clone())));
    }

    let entry = CollectionEntry {
        id: store.next_entry_id,
        user_id: input.user_id,
        quantity: input.quantity,
        acquired_date: Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
        card,
    };
    store.next_entry_id += 1;
    store.entries.insert(entry.id, entry.clone());
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_entry(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(entry_id): Path<i64>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    store
        .entries
        .remove(&entry_id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Collection entry not found"))
}

async fn user_collection(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<CollectionEntry>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    if !store.user_exists(user_id) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "User not found"));
    }
    let mut entries: Vec<_> = store
        .entries
        .values()
        .filter(|e| e.user_id == user_id)
        .cloned()
        .collect();
    entries.sort_by_key(|e| e.id);
    Ok(Json(entries))
}

async fn serve_image(Path(name): Path<String>) -> Result<Response, Failure> {
    if !name.ends_with(".png") {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Image not found"));
    }
    let bytes = placeholder_png().map_err(|e| Failure::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

/// 4x4 solid PNG standing in for card art.
pub fn placeholder_png() -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

fn collection_card(card: &Card) -> CollectionCard {
    CollectionCard {
        id: card.id.clone(),
        name: card.name.clone(),
        number: card.number.clone(),
        rarity: Some(card.rarity.clone()),
        image_url: card.small_image_url.clone(),
        small_image_url: card.small_image_url.clone(),
        large_image_url: card.large_image_url.clone(),
    }
}

fn seed_sets() -> Vec<CardSet> {
    let set = |id: &str, name: &str, printed: u32, total: u32, released: &str| CardSet {
        id: id.to_string(),
        name: name.to_string(),
        series: "Scarlet & Violet".to_string(),
        language: "ENGLISH".to_string(),
        symbol_url: Some(format!("https://images.pokemontcg.io/{id}/symbol.png")),
        logo_url: Some(format!("https://images.pokemontcg.io/{id}/logo.png")),
        printed_total: printed,
        total_cards: total,
        release_date: released.to_string(),
    };
    vec![
        set("sv6", "Twilight Masquerade", 167, 226, "2024-05-24"),
        set("sv5", "Temporal Forces", 162, 218, "2024-03-22"),
    ]
}

fn seed_cards() -> Vec<Card> {
    let card = |n: u32, name: &str, rarity: &str| Card {
        id: format!("sv6-{n}"),
        set_id: "sv6".to_string(),
        name: name.to_string(),
        number: format!("{n:03}/167"),
        rarity: rarity.to_string(),
        small_image_url: Some(format!("https://images.pokemontcg.io/sv6/{n}.png")),
        large_image_url: Some(format!("https://images.pokemontcg.io/sv6/{n}_hires.png")),
    };
    vec![
        card(1, "Sewaddle", "Common"),
        card(2, "Swadloon", "Common"),
        card(3, "Leavanny", "Rare"),
    ]
}
