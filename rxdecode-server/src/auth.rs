use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{LoginRequest, PublicUser, RegisterRequest, UserResponse};
use crate::service::AppState;
use crate::store::{StoreError, User};

pub const SESSION_COOKIE: &str = "session";

const SESSION_TTL_DAYS: i64 = 7;
const BCRYPT_COST: u32 = 10;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    exp: i64,
}

pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, ApiError> {
    let exp = chrono::Utc::now().timestamp() + SESSION_TTL_DAYS * 24 * 60 * 60;
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify a session token and return the user id it names. Expiry is
/// enforced by the library's default validation.
pub fn verify_token(token: &str, secret: &str) -> Option<Uuid> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    Uuid::parse_str(&data.claims.sub).ok()
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_password(password: String, hashed: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))
}

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::DuplicateEmail => ApiError::EmailInUse,
        StoreError::Database(e) => {
            error!("database error: {}", e);
            ApiError::Internal("database error".to_string())
        }
    }
}

fn signed_in_response(
    jar: CookieJar,
    user: User,
    secret: &str,
    secure: bool,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let token = issue_token(user.id, secret)?;
    let jar = jar.add(session_cookie(token, secure));
    Ok((
        jar,
        Json(UserResponse {
            user: PublicUser::from(user),
        }),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::MissingFields);
    }

    let hashed = hash_password(req.password).await?;
    let user = state
        .store
        .create_user(req.name.trim(), req.email.trim(), &hashed)
        .await
        .map_err(store_error)?;

    info!(user_id = %user.id, "user registered");
    signed_in_response(jar, user, &state.config.jwt_secret, state.config.secure_cookies)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::MissingFields);
    }

    let user = state
        .store
        .find_by_email(req.email.trim())
        .await
        .map_err(store_error)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(req.password, user.hashed_password.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    signed_in_response(jar, user, &state.config.jwt_secret, state.config.secure_cookies)
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.remove(removal_cookie()), Json(json!({ "ok": true })))
}

pub async fn me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<UserResponse>, ApiError> {
    let token = jar.get(SESSION_COOKIE).ok_or(ApiError::NoSession)?;
    let user_id =
        verify_token(token.value(), &state.config.jwt_secret).ok_or(ApiError::InvalidSession)?;

    let user = state
        .store
        .find_by_id(user_id)
        .await
        .map_err(store_error)?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse {
        user: PublicUser::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips_to_the_same_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, SECRET).unwrap();
        assert_eq!(verify_token(&token, SECRET), Some(user_id));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), SECRET).unwrap();
        assert_eq!(verify_token(&token, "other-secret"), None);
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert_eq!(verify_token("not-a-jwt", SECRET), None);
    }

    #[test]
    fn session_cookie_is_http_only_lax_with_week_long_max_age() {
        let cookie = session_cookie("tok".to_string(), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn production_cookie_is_secure() {
        let cookie = session_cookie("tok".to_string(), true);
        assert_eq!(cookie.secure(), Some(true));
    }

    #[tokio::test]
    async fn password_hash_verifies_and_rejects() {
        let hashed = hash_password("hunter2".to_string()).await.unwrap();
        assert!(verify_password("hunter2".to_string(), hashed.clone())
            .await
            .unwrap());
        assert!(!verify_password("wrong".to_string(), hashed).await.unwrap());
    }
}
