//! Preview authentication.
//!
//! Editing is gated behind a single shared password configured on the
//! server (PREVIEW_PASSWORD). The password is hashed once at startup and
//! attempts are verified against the hash. A successful attempt sets the
//! session flag: for browsers that is an HMAC-signed session cookie with a
//! short expiry, for tests an in-memory flag.
//!
//! This is a speed bump against accidental edits by casual visitors. The
//! CMS write credential never leaves the server.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name
pub const SESSION_COOKIE: &str = "preview_authenticated";

/// Session token lifetime in minutes
pub const SESSION_TTL_MINUTES: i64 = 120;

/// How long the inline "wrong password" message stays visible.
pub const AUTH_ERROR_CLEAR_MS: i64 = 2000;

// ============================================================================
// Session Flag
// ============================================================================

/// The per-session "this editor has authenticated" flag.
pub trait SessionFlag {
    fn is_authenticated(&self) -> bool;
    fn mark_authenticated(&mut self);
}

/// Flag held in memory, counting how often it was set.
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    authenticated: bool,
    marks: u32,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marks(&self) -> u32 {
        self.marks
    }
}

impl SessionFlag for MemorySession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn mark_authenticated(&mut self) {
        self.authenticated = true;
        self.marks += 1;
    }
}

/// Flag carried by a signed session cookie.
pub struct CookieSession<'a> {
    jar: CookieJar,
    secret: &'a [u8],
}

impl<'a> CookieSession<'a> {
    pub fn new(jar: CookieJar, secret: &'a [u8]) -> Self {
        Self { jar, secret }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionFlag for CookieSession<'_> {
    fn is_authenticated(&self) -> bool {
        match self.jar.get(SESSION_COOKIE) {
            Some(cookie) => verify_session(cookie.value(), self.secret),
            None => false,
        }
    }

    fn mark_authenticated(&mut self) {
        let Some(token) = create_session(self.secret) else {
            tracing::error!("failed to sign preview session token");
            return;
        };
        // No Max-Age: the cookie lives as long as the browser session.
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict);
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(cookie);
    }
}

/// Cookie that clears the session flag.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

// ============================================================================
// Password Gate
// ============================================================================

pub struct PasswordGate {
    hash: String,
}

impl PasswordGate {
    /// Hash the configured password (Argon2id, done once at startup).
    pub fn new(password: &str) -> Option<Self> {
        if password.is_empty() {
            return None;
        }
        let hash = hash_password(password)?;
        Some(Self { hash })
    }

    pub fn verify(&self, attempt: &str) -> bool {
        verify_password(attempt, &self.hash)
    }

    /// Compare an attempt with the configured password. On a match the
    /// session flag is set and `true` returned; a miss leaves it untouched.
    pub fn check_password(&self, attempt: &str, session: &mut impl SessionFlag) -> bool {
        if !self.verify(attempt) {
            tracing::info!("preview login rejected");
            return false;
        }
        session.mark_authenticated();
        tracing::info!("preview session authenticated");
        true
    }
}

pub fn hash_password(password: &str) -> Option<String> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes).ok()?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .ok()
        .map(|h| h.to_string())
}

pub fn verify_password(attempt: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(attempt.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ============================================================================
// Session Tokens
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Session {
    created: i64,
    expires: i64,
    nonce: String,
}

/// Random key for signing session tokens when none is configured.
pub fn generate_secret() -> Vec<u8> {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.to_vec()
}

/// Create a new signed session token
pub fn create_session(secret: &[u8]) -> Option<String> {
    let now = Utc::now().timestamp();
    let expires = now + SESSION_TTL_MINUTES * 60;
    let nonce: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let session = Session {
        created: now,
        expires,
        nonce,
    };
    let session_json = serde_json::to_string(&session).ok()?;
    let signature = sign(secret, session_json.as_bytes())?;

    Some(format!("{}.{}", URL_SAFE_NO_PAD.encode(&session_json), signature))
}

/// Verify a session token's signature and expiry
pub fn verify_session(token: &str, secret: &[u8]) -> bool {
    let Some((payload, sig)) = token.split_once('.') else {
        return false;
    };
    let Some(session_json) = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
    else {
        return false;
    };
    let Some(expected) = sign(secret, session_json.as_bytes()) else {
        return false;
    };

    // Constant-time comparison
    let (sig, expected) = (sig.as_bytes(), expected.as_bytes());
    if sig.len() != expected.len() || sig.ct_eq(expected).unwrap_u8() != 1 {
        return false;
    }

    match serde_json::from_str::<Session>(&session_json) {
        Ok(session) => Utc::now().timestamp() < session.expires,
        Err(_) => false,
    }
}

fn sign(secret: &[u8], message: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(hex_encode(mac.finalize().into_bytes().as_slice()))
}

/// Encode bytes as hexadecimal
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
