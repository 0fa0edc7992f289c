//! Account registration, sign-in and bearer-token guarding of the API.

pub mod password;
pub mod tokens;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hiring::choices::Gender;
use crate::hiring::users::{
    email_taken, find_by_login, is_valid_email, phone_taken, username_taken, User, UserView,
};
use crate::http::validation::{check_length, choice, REQUIRED};
use crate::http::{ApiError, FieldErrors, HubState};
use crate::store::{RecordId, Tables};

use self::password::{check_password_strength, hash_password, verify_password};
pub use self::tokens::{Claims, TokenError, TokenIssuer, TokenKind, TokenPair};

const USERNAME_MAX: usize = 150;
const NAME_MAX: usize = 150;
const PHONE_MAX: usize = 20;

/// The caller behind a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: RecordId,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
    }
}

/// Rejects requests without a valid access token for an existing user.
pub async fn require_bearer(
    State(state): State<HubState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state.tokens.authenticate(request.headers())?;
    let id = claims.user_id()?;
    let known = state.store.read()?.users.contains(id);
    if !known {
        return Err(ApiError::Unauthorized("user no longer exists".into()));
    }

    request.extensions_mut().insert(AuthUser {
        id,
        username: claims.username,
    });
    Ok(next.run(request).await)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserView,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshInput {
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub access: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_email(tables: &Tables, errors: &mut FieldErrors, email: &str, except: Option<RecordId>) {
    if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    } else if email_taken(tables, email, except) {
        errors.add("email", "A user with that email already exists.");
    }
}

fn check_phone(tables: &Tables, errors: &mut FieldErrors, phone: &str, except: Option<RecordId>) {
    check_length(errors, "phone", phone, PHONE_MAX);
    if phone_taken(tables, phone, except) {
        errors.add("phone", "A user with that phone number already exists.");
    }
}

/// Validates a registration payload and builds the new account.
pub fn register_user(tables: &Tables, input: RegisterInput) -> Result<User, ApiError> {
    let mut errors = FieldErrors::new();

    let username = trimmed(input.username).unwrap_or_default();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else {
        check_length(&mut errors, "username", &username, USERNAME_MAX);
        if username_taken(tables, &username) {
            errors.add("username", "A user with that username already exists.");
        }
    }

    let email = trimmed(input.email).unwrap_or_default();
    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else {
        check_email(tables, &mut errors, &email, None);
    }

    let phone = trimmed(input.phone);
    if let Some(phone) = phone.as_deref() {
        check_phone(tables, &mut errors, phone, None);
    }

    let password = input.password.unwrap_or_default();
    if password.is_empty() {
        errors.add("password", REQUIRED);
    } else {
        check_password_strength(&mut errors, &password, &username);
    }
    match input.password_confirm.as_deref() {
        None | Some("") => errors.add("password_confirm", REQUIRED),
        Some(confirm) if confirm != password => {
            errors.add("password_confirm", "Passwords do not match.")
        }
        Some(_) => {}
    }

    let first_name = input.first_name.unwrap_or_default();
    check_length(&mut errors, "first_name", &first_name, NAME_MAX);
    let last_name = input.last_name.unwrap_or_default();
    check_length(&mut errors, "last_name", &last_name, NAME_MAX);
    let gender: Option<Gender> = choice(&mut errors, "gender", input.gender);
    errors.into_result()?;

    Ok(User {
        id: tables.users.next_id(),
        username,
        email,
        first_name,
        last_name,
        phone,
        gender,
        password_hash: hash_password(&password),
        date_joined: Utc::now(),
    })
}

/// Applies a profile update to `user`; unique fields ignore the user's own row.
pub fn update_profile(tables: &Tables, user: &User, input: ProfileInput) -> Result<User, ApiError> {
    let mut errors = FieldErrors::new();
    let mut updated = user.clone();

    if let Some(email) = input.email {
        let email = email.trim().to_string();
        if email.is_empty() {
            errors.add("email", "This field may not be blank.");
        } else {
            check_email(tables, &mut errors, &email, Some(user.id));
        }
        updated.email = email;
    }
    if let Some(phone) = input.phone {
        updated.phone = trimmed(Some(phone));
        if let Some(phone) = updated.phone.as_deref() {
            check_phone(tables, &mut errors, phone, Some(user.id));
        }
    }
    if let Some(first_name) = input.first_name {
        check_length(&mut errors, "first_name", &first_name, NAME_MAX);
        updated.first_name = first_name;
    }
    if let Some(last_name) = input.last_name {
        check_length(&mut errors, "last_name", &last_name, NAME_MAX);
        updated.last_name = last_name;
    }
    if input.gender.is_some() {
        updated.gender = choice(&mut errors, "gender", input.gender);
    }
    errors.into_result()?;
    Ok(updated)
}

/// Public routes: registration, login and token refresh.
pub fn auth_routes() -> Router<HubState> {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/token/refresh", post(refresh_handler))
}

/// Routes for the signed-in user's own profile.
pub fn profile_routes() -> Router<HubState> {
    Router::new().route("/users/me", get(me_handler).patch(update_me_handler))
}

async fn register_handler(
    State(state): State<HubState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(payload) = payload?;
    let user = {
        let mut tables = state.store.write()?;
        let user = register_user(&tables, payload)?;
        tables.insert(user.clone());
        user
    };
    info!(user_id = user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully.".to_string(),
            user: user.view(),
        }),
    ))
}

async fn login_handler(
    State(state): State<HubState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let mut errors = FieldErrors::new();
    let login = trimmed(payload.login);
    if login.is_none() {
        errors.add("login", REQUIRED);
    }
    let password = payload.password.filter(|password| !password.is_empty());
    if password.is_none() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;
    let (login, password) = (login.unwrap_or_default(), password.unwrap_or_default());

    let user = {
        let tables = state.store.read()?;
        find_by_login(&tables, &login)
            .filter(|user| verify_password(&password, &user.password_hash))
            .cloned()
    }
    .ok_or_else(|| ApiError::Unauthorized("Invalid credentials.".into()))?;

    let pair = state.tokens.pair(&user, Utc::now())?;
    info!(user_id = user.id, "user signed in");
    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        user: user.view(),
    }))
}

async fn refresh_handler(
    State(state): State<HubState>,
    payload: Result<Json<RefreshInput>, JsonRejection>,
) -> Result<Json<AccessResponse>, ApiError> {
    let Json(payload) = payload?;
    let token = trimmed(payload.refresh).ok_or_else(|| ApiError::field("refresh", REQUIRED))?;
    let claims = state.tokens.verify(&token, TokenKind::Refresh)?;
    let user = {
        let tables = state.store.read()?;
        tables.get::<User>(claims.user_id()?).cloned()
    }
    .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    let access = state.tokens.issue(&user, TokenKind::Access, Utc::now())?;
    Ok(Json(AccessResponse { access }))
}

async fn me_handler(
    State(state): State<HubState>,
    caller: AuthUser,
) -> Result<Json<UserView>, ApiError> {
    let tables = state.store.read()?;
    let user = tables
        .get::<User>(caller.id)
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;
    Ok(Json(user.view()))
}

async fn update_me_handler(
    State(state): State<HubState>,
    caller: AuthUser,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Json(payload) = payload?;
    let mut tables = state.store.write()?;
    let user = tables
        .get::<User>(caller.id)
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;
    let updated = update_profile(&tables, &user, payload)?;
    tables.insert(updated.clone());
    info!(user_id = updated.id, "profile updated");
    Ok(Json(updated.view()))
}
