use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use hmac::{Hmac, Mac};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::web::{ApiMessage, AppState, json_error};

pub const SESSION_COOKIE: &str = "token";
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Admin row including the password hash. Only the login and password-change
/// paths see this type; it is never serialized.
#[derive(Clone, sqlx::FromRow)]
pub struct DbAdminAuth {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Verified identity handed to gated handlers.
#[derive(Clone, sqlx::FromRow)]
pub struct AuthAdmin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Claims carried by a session token. Stateless: nothing is persisted
/// server-side, expiry is the only invalidation.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct AdminSummary {
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    message: String,
    admin: AdminSummary,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<LoginResponse>), (StatusCode, Json<ApiMessage>)> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(invalid_credentials());
    }

    let admin = match fetch_admin_by_email(state.pool_ref(), email).await {
        Ok(Some(admin)) => admin,
        // Unknown email and bad password must be indistinguishable.
        Ok(None) => return Err(invalid_credentials()),
        Err(err) => {
            error!(?err, "failed to fetch admin during login");
            return Err(server_error());
        }
    };

    if !verify_password(&payload.password, &admin.password_hash) {
        return Err(invalid_credentials());
    }

    let token = issue_token(state.token_secret(), admin.id, &admin.email);
    let jar = jar.add(session_cookie(token, state.is_production()));

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            admin: AdminSummary {
                name: admin.name,
                email: admin.email,
            },
        }),
    ))
}

/// Lightweight token probe used by the frontend to decide whether the admin
/// console should render.
pub async fn auth_check(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<ApiMessage>, (StatusCode, Json<ApiMessage>)> {
    let Some(token) = extract_token(&jar, &headers) else {
        return Err(json_error(StatusCode::UNAUTHORIZED, "Not authenticated"));
    };

    if decode_token(state.token_secret(), &token).is_none() {
        return Err(json_error(StatusCode::UNAUTHORIZED, "Invalid token"));
    }

    Ok(Json(ApiMessage::new("Authenticated")))
}

/// Gate for protected routes: extract the token, verify it, and re-fetch the
/// identity it names. Returns the identity as a value for the handler to
/// thread explicitly; nothing is attached to shared request state.
pub async fn require_admin(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<AuthAdmin, (StatusCode, Json<ApiMessage>)> {
    let Some(token) = extract_token(jar, headers) else {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "Access denied. No token provided.",
        ));
    };

    let Some(claims) = decode_token(state.token_secret(), &token) else {
        return Err(json_error(
            StatusCode::UNAUTHORIZED,
            "Invalid token. Access denied.",
        ));
    };

    match fetch_admin_by_id(state.pool_ref(), claims.sub).await {
        Ok(Some(admin)) => Ok(admin),
        Ok(None) => Err(json_error(
            StatusCode::UNAUTHORIZED,
            "Not authorized as admin",
        )),
        Err(err) => {
            error!(?err, "failed to load admin during auth gate");
            Err(server_error())
        }
    }
}

/// Second gate for routes that assume `require_admin` already ran: 403 when
/// no identity was attached.
pub fn require_role(
    admin: Option<AuthAdmin>,
) -> Result<AuthAdmin, (StatusCode, Json<ApiMessage>)> {
    admin.ok_or_else(|| json_error(StatusCode::FORBIDDEN, "Access forbidden: admins only"))
}

/// Token extraction: the session cookie wins, an Authorization bearer value
/// is the fallback path.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

pub fn issue_token(secret: &str, admin_id: Uuid, email: &str) -> String {
    let now = Utc::now().timestamp();
    encode_claims(
        secret,
        &TokenClaims {
            sub: admin_id,
            email: email.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        },
    )
}

/// Verify and decode a token. None for anything malformed, forged, or
/// expired; never panics on attacker-controlled input.
pub fn decode_token(secret: &str, token: &str) -> Option<TokenClaims> {
    let (payload, signature) = token.split_once('.')?;
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

    let mut mac = mac_for(secret);
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let claims: TokenClaims =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
    if claims.exp <= Utc::now().timestamp() {
        return None;
    }

    Some(claims)
}

fn encode_claims(secret: &str, claims: &TokenClaims) -> String {
    let json = serde_json::to_vec(claims).expect("token claims serialize to JSON");
    let payload = URL_SAFE_NO_PAD.encode(json);

    let mut mac = mac_for(secret);
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{payload}.{signature}")
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn fetch_admin_by_email(
    pool: &PgPool,
    email: &str,
) -> sqlx::Result<Option<DbAdminAuth>> {
    sqlx::query_as::<_, DbAdminAuth>(
        "SELECT id, name, email, password_hash FROM admins WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_admin_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<AuthAdmin>> {
    sqlx::query_as::<_, AuthAdmin>("SELECT id, name, email FROM admins WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_admin_auth_by_id(
    pool: &PgPool,
    id: Uuid,
) -> sqlx::Result<Option<DbAdminAuth>> {
    sqlx::query_as::<_, DbAdminAuth>(
        "SELECT id, name, email, password_hash FROM admins WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_max_age(CookieDuration::seconds(TOKEN_TTL_SECS));
    cookie
}

fn invalid_credentials() -> (StatusCode, Json<ApiMessage>) {
    json_error(StatusCode::UNAUTHORIZED, "Invalid email or password")
}

fn server_error() -> (StatusCode, Json<ApiMessage>) {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-signing-secret";

    fn claims_with_exp(exp: i64) -> TokenClaims {
        TokenClaims {
            sub: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            iat: Utc::now().timestamp(),
            exp,
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip_preserves_subject() {
        let id = Uuid::new_v4();
        let token = issue_token(SECRET, id, "admin@example.com");
        let claims = decode_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "admin@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = issue_token(SECRET, Uuid::new_v4(), "admin@example.com");
        assert!(decode_token("another-secret", &token).is_none());
    }

    #[test]
    fn token_rejects_tampered_payload() {
        let token = issue_token(SECRET, Uuid::new_v4(), "admin@example.com");
        let (payload, signature) = token.split_once('.').unwrap();
        let forged = TokenClaims {
            sub: Uuid::new_v4(),
            email: "intruder@example.com".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        assert_ne!(payload, forged_payload);
        assert!(decode_token(SECRET, &format!("{forged_payload}.{signature}")).is_none());
    }

    #[test]
    fn token_rejects_expired_claims() {
        let expired = encode_claims(SECRET, &claims_with_exp(Utc::now().timestamp() - 1));
        assert!(decode_token(SECRET, &expired).is_none());
    }

    #[test]
    fn token_rejects_malformed_input() {
        assert!(decode_token(SECRET, "").is_none());
        assert!(decode_token(SECRET, "no-dot-here").is_none());
        assert!(decode_token(SECRET, "a.b.c").is_none());
        assert!(decode_token(SECRET, "!!!.???").is_none());
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let jar = CookieJar::from_headers(&HeaderMap::new())
            .add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_is_the_fallback_path() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-header"));
        assert!(extract_token(&jar, &HeaderMap::new()).is_none());
    }
}
