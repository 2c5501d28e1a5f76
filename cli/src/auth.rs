//! OAuth 2.0 installed-application flow against the platform's identity
//! provider.
//!
//! Consent, the loopback redirect and token refresh are driven by
//! `yup-oauth2`. Tokens are kept in an owner-only cache file so later runs
//! skip the browser step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::storage::{TokenInfo, TokenStorage};
use yup_oauth2::{ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};

/// Covers both uploading and changing the privacy status of own videos.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read client secrets {path}: {source}")]
    Secrets {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set up authorization: {0}")]
    Setup(#[source] std::io::Error),
    #[error("authorization failed: {0}")]
    Token(#[from] yup_oauth2::Error),
    #[error("authorization server returned no access token")]
    NoAccessToken,
}

/// Read a `client_secrets.json` (`installed` or `web` client) as downloaded
/// from the developer console.
pub async fn read_client_secrets(path: &Path) -> Result<ApplicationSecret, AuthError> {
    yup_oauth2::read_application_secret(path)
        .await
        .map_err(|source| AuthError::Secrets {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Serialize, Deserialize)]
struct CachedToken {
    scopes: Vec<String>,
    token: TokenInfo,
}

fn scope_key(scopes: &[&str]) -> Vec<String> {
    let mut key: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
    key.sort();
    key.dedup();
    key
}

/// Token storage backed by a single file readable by the owner only.
///
/// Only the most recently granted scope set is kept; asking for any other set
/// misses, which sends the flow back to the consent screen.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Option<CachedToken> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(cached) => Some(cached),
            Err(e) => {
                log::warn!("Ignoring unreadable token cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, cached: &CachedToken) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(serde_json::to_string_pretty(cached)?.as_bytes())?;
        file.flush()
    }
}

#[async_trait]
impl TokenStorage for TokenCache {
    async fn set(&self, scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        self.save(&CachedToken {
            scopes: scope_key(scopes),
            token,
        })?;
        log::debug!("Token cache updated at {}", self.path.display());
        Ok(())
    }

    async fn get(&self, scopes: &[&str]) -> Option<TokenInfo> {
        let cached = self.load()?;
        if cached.scopes != scope_key(scopes) {
            log::info!("Cached credentials were granted for a different scope, re-authorizing");
            return None;
        }
        Some(cached.token)
    }
}

enum Tokens {
    Flow {
        authenticator: DefaultAuthenticator,
        scopes: Vec<String>,
    },
    #[cfg(test)]
    Fixed(String),
}

/// Authenticated handle passed to the platform client.
pub struct Session {
    http: reqwest::Client,
    tokens: Tokens,
}

impl Session {
    #[cfg(test)]
    pub(crate) fn with_token(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens: Tokens::Fixed(token.into()),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current access token. Tokens within a minute of expiry are refreshed
    /// first.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        match &self.tokens {
            Tokens::Flow { authenticator, scopes } => {
                let token = authenticator.token(scopes).await?;
                token.token().map(str::to_string).ok_or(AuthError::NoAccessToken)
            }
            #[cfg(test)]
            Tokens::Fixed(token) => Ok(token.clone()),
        }
    }
}

#[async_trait]
pub trait Authenticator {
    async fn authenticate(&self) -> Result<Session, AuthError>;
}

pub struct InstalledAppFlow {
    secret: ApplicationSecret,
    scope: String,
    token_cache: Option<PathBuf>,
}

impl InstalledAppFlow {
    pub fn new(secret: ApplicationSecret, scope: impl Into<String>, token_cache: Option<PathBuf>) -> Self {
        Self {
            secret,
            scope: scope.into(),
            token_cache,
        }
    }
}

#[async_trait]
impl Authenticator for InstalledAppFlow {
    async fn authenticate(&self) -> Result<Session, AuthError> {
        let mut builder =
            InstalledFlowAuthenticator::builder(self.secret.clone(), InstalledFlowReturnMethod::HTTPRedirect);
        if let Some(path) = &self.token_cache {
            builder = builder.with_storage(Box::new(TokenCache::new(path)));
        }
        let authenticator = builder.build().await.map_err(AuthError::Setup)?;

        let session = Session {
            http: reqwest::Client::new(),
            tokens: Tokens::Flow {
                authenticator,
                scopes: vec![self.scope.clone()],
            },
        };
        // Any browser interaction happens here, before the first upload.
        session.access_token().await?;
        log::info!("Authorization complete");
        Ok(session)
    }
}
