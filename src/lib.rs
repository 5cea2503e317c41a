//! Hotel site library - re-exports for the server binary and for tests.
//!
//! The public pages are rendered from CMS documents; `?preview=true` adds
//! an inline editing layer that writes changes back through the server.

use axum_extra::extract::CookieJar;
use std::sync::Arc;

pub mod auth;
pub mod classify;
pub mod cms;
pub mod config;
pub mod dom;
pub mod error;
pub mod handlers;
pub mod models;
pub mod overlay;
pub mod patch;
pub mod payload;
pub mod preview;
pub mod reconcile;
pub mod schema;
pub mod seo;
pub mod site;
pub mod templates;
pub mod theme;

use auth::{generate_secret, CookieSession, PasswordGate, SessionFlag};
use cms::{DocumentStore, LocalStore, SanityClient};
use config::Config;
use error::RemoteError;
use patch::PatchClient;
use site::PageOptions;

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub patch: PatchClient,
    pub gate: Option<Arc<PasswordGate>>,
    pub session_secret: Vec<u8>,
}

impl AppState {
    /// Open the configured document store and hash the preview password.
    ///
    /// An empty local store is seeded with starter content.
    pub async fn new(config: Config) -> Result<Self, RemoteError> {
        let store: Arc<dyn DocumentStore> = match &config.sanity {
            Some(settings) => Arc::new(SanityClient::new(settings.clone())?),
            None => {
                let local = LocalStore::open(&config.db_path)?;
                site::seed_if_empty(&local).await?;
                Arc::new(local)
            }
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        // Argon2id hash, done once
        let gate = config
            .preview_password
            .as_deref()
            .and_then(PasswordGate::new)
            .map(Arc::new);
        let session_secret = config.session_secret.clone().unwrap_or_else(generate_secret);
        Self {
            patch: PatchClient::new(store.clone()),
            config,
            store,
            gate,
            session_secret,
        }
    }

    pub fn editing_enabled(&self) -> bool {
        self.gate.is_some()
    }

    pub fn session(&self, jar: CookieJar) -> CookieSession<'_> {
        CookieSession::new(jar, &self.session_secret)
    }

    pub fn is_authenticated(&self, jar: &CookieJar) -> bool {
        self.session(jar.clone()).is_authenticated()
    }

    pub fn page_options(&self, query: Option<&str>, jar: &CookieJar) -> PageOptions<'_> {
        PageOptions {
            preview: self.editing_enabled() && preview::preview_requested(query),
            authenticated: self.is_authenticated(jar),
            site_url: &self.config.site_url,
        }
    }
}

// Re-export commonly used types
pub use error::{Error, Result, ValidationError};
pub use models::{FieldRef, FieldType, LinkTarget, PatchPayload, SetOperation};
pub use preview::{preview_requested, PreviewSession, SaveOutcome};
pub use theme::{detect_optimal_theme, PaletteId};
