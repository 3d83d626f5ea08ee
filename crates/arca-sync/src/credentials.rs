//! Credential resolution
//!
//! Turns the loose auth options of a push or pull into [`AuthMaterial`].
//! Precedence of [`DefaultCredentialSource`]: inline `user[:password]`,
//! then username/password, then a docker-style auth file, then anonymous.

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Registry assumed when a reference names none
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Opaque auth material handed to the transport
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthMaterial {
    #[default]
    Anonymous,
    Basic { username: String, password: String },
}

impl AuthMaterial {
    /// Basic credentials
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Username, if any
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, .. } => Some(username.as_str()),
        }
    }
}

impl fmt::Debug for AuthMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Auth-related options of a push or pull
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Docker-style auth file
    pub auth_file: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Inline `user[:password]`
    pub credentials: Option<String>,
}

impl CredentialRequest {
    /// True when no option is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Credential resolution errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Two mutually exclusive options were set
    #[error("{0}")]
    Conflict(String),

    /// Inline credentials are malformed
    #[error("invalid credentials: {0}")]
    Invalid(String),

    /// Auth file could not be read
    #[error("reading auth file {path:?}: {source}")]
    AuthFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Auth file is not valid auth JSON
    #[error("parsing auth file {path:?}: {reason}")]
    AuthFileFormat { path: PathBuf, reason: String },
}

/// Resolves auth options into auth material
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Resolve credentials for `registry`
    ///
    /// # Errors
    /// Returns `CredentialError` for contradictory or unreadable options
    async fn resolve(
        &self,
        registry: Option<&str>,
        request: &CredentialRequest,
    ) -> Result<AuthMaterial, CredentialError>;
}

/// Precedence-based resolver over inline options and a docker auth file
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCredentialSource;

#[derive(Debug, Default, Deserialize)]
struct AuthFile {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[async_trait]
impl CredentialSource for DefaultCredentialSource {
    async fn resolve(
        &self,
        registry: Option<&str>,
        request: &CredentialRequest,
    ) -> Result<AuthMaterial, CredentialError> {
        if request.credentials.is_some() && request.username.is_some() {
            return Err(CredentialError::Conflict(
                "inline credentials and username are mutually exclusive".to_string(),
            ));
        }
        if request.password.is_some() && request.username.is_none() {
            return Err(CredentialError::Conflict(
                "password given without username".to_string(),
            ));
        }

        if let Some(inline) = &request.credentials {
            return parse_user_password(inline);
        }
        if let Some(username) = &request.username {
            return Ok(AuthMaterial::basic(
                username.clone(),
                request.password.clone().unwrap_or_default(),
            ));
        }
        if let Some(path) = &request.auth_file {
            return from_auth_file(path, registry.unwrap_or(DEFAULT_REGISTRY)).await;
        }
        Ok(AuthMaterial::Anonymous)
    }
}

fn parse_user_password(raw: &str) -> Result<AuthMaterial, CredentialError> {
    let (username, password) = raw.split_once(':').unwrap_or((raw, ""));
    if username.is_empty() {
        return Err(CredentialError::Invalid("empty username".to_string()));
    }
    Ok(AuthMaterial::basic(username, password))
}

async fn from_auth_file(path: &Path, registry: &str) -> Result<AuthMaterial, CredentialError> {
    let format_error = |reason: String| CredentialError::AuthFileFormat {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = tokio::fs::read(path).await.map_err(|source| CredentialError::AuthFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file: AuthFile = serde_json::from_slice(&bytes).map_err(|e| format_error(e.to_string()))?;

    let Some(entry) = file
        .auths
        .iter()
        .find(|(key, _)| registry_host(key) == registry)
        .map(|(_, entry)| entry)
    else {
        tracing::debug!(registry, "no auth file entry, using anonymous access");
        return Ok(AuthMaterial::Anonymous);
    };

    if let Some(encoded) = &entry.auth {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| format_error(format!("auth for {registry}: {e}")))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| format_error(format!("auth for {registry} is not UTF-8")))?;
        return parse_user_password(&decoded);
    }
    match (&entry.username, &entry.password) {
        (Some(username), password) => Ok(AuthMaterial::basic(
            username.clone(),
            password.clone().unwrap_or_default(),
        )),
        (None, _) => Ok(AuthMaterial::Anonymous),
    }
}

/// `https://quay.io/v2/` -> `quay.io`
fn registry_host(key: &str) -> &str {
    let key = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    key.split('/').next().unwrap_or(key)
}
