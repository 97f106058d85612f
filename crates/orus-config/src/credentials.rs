// crates/orus-config/src/credentials.rs
// ============================================================================
// Module: ORUS Credentials
// Description: Secret resolution for the database and the MQTT broker.
// Purpose: Keep passwords out of the main config and out of log output.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! A [`CredentialProvider`] combines non-secret endpoints from the config
//! with a user/password pair from a secret source. Two sources exist: a TOML
//! secrets file and the process environment. Missing credentials are a
//! startup failure; callers do not retry.
//!
//! Secrets file layout:
//!
//! ```toml
//! [database]
//! user = "orus"
//! password = "..."
//!
//! [broker]
//! user = "orus-api"
//! password = "..."
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum secrets file size in bytes.
const MAX_CREDENTIALS_FILE_SIZE: usize = 64 * 1024;
/// Database user variable for [`EnvCredentialProvider`].
pub const DB_USER_ENV_VAR: &str = "ORUS_DB_USER";
/// Database password variable for [`EnvCredentialProvider`].
pub const DB_PASSWORD_ENV_VAR: &str = "ORUS_DB_PASSWORD";
/// Broker user variable for [`EnvCredentialProvider`].
pub const BROKER_USER_ENV_VAR: &str = "ORUS_BROKER_USER";
/// Broker password variable for [`EnvCredentialProvider`].
pub const BROKER_PASSWORD_ENV_VAR: &str = "ORUS_BROKER_PASSWORD";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Secret string that never prints its contents.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Database location without secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEndpoint {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub database: String,
}

/// Broker location without secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic filter.
    pub topic: String,
}

/// Resolved database credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: Secret,
    /// Database name.
    pub database: String,
}

/// Resolved broker credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerCredentials {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: Secret,
    /// Topic filter.
    pub topic: String,
}

/// Credential resolution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Secrets file could not be read.
    #[error("credentials io error: {0}")]
    Io(String),
    /// Secrets file is malformed.
    #[error("credentials parse error: {0}")]
    Parse(String),
    /// A required credential is absent.
    #[error("missing credentials: {0}")]
    Missing(String),
}

/// Source of database and broker credentials.
pub trait CredentialProvider {
    /// Returns the database credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the credentials are unavailable.
    fn database_credentials(&self) -> Result<DatabaseCredentials, CredentialError>;

    /// Returns the broker credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the credentials are unavailable.
    fn broker_credentials(&self) -> Result<BrokerCredentials, CredentialError>;
}

// ============================================================================
// SECTION: File Provider
// ============================================================================

/// One `[database]` or `[broker]` table of the secrets file.
#[derive(Debug, Clone, Default, Deserialize)]
struct LoginSection {
    /// Login user.
    #[serde(default)]
    user: Option<String>,
    /// Login password.
    #[serde(default)]
    password: Option<Secret>,
}

/// Parsed secrets file.
#[derive(Debug, Clone, Default, Deserialize)]
struct SecretsFile {
    /// Database login.
    #[serde(default)]
    database: Option<LoginSection>,
    /// Broker login.
    #[serde(default)]
    broker: Option<LoginSection>,
}

/// Credentials read once from a TOML secrets file.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    /// Parsed secrets.
    secrets: SecretsFile,
    /// Database endpoint from config.
    database: DatabaseEndpoint,
    /// Broker endpoint from config.
    broker: BrokerEndpoint,
}

impl FileCredentialProvider {
    /// Reads and parses the secrets file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the file is unreadable, oversized, or
    /// not valid TOML.
    pub fn load(
        path: &Path,
        database: DatabaseEndpoint,
        broker: BrokerEndpoint,
    ) -> Result<Self, CredentialError> {
        let bytes = fs::read(path)
            .map_err(|err| CredentialError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CREDENTIALS_FILE_SIZE {
            return Err(CredentialError::Parse("credentials file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| CredentialError::Parse("credentials file must be utf-8".to_string()))?;
        Self::from_toml(content, database, broker)
    }

    /// Parses secrets from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Parse`] when the text is not valid TOML.
    pub fn from_toml(
        content: &str,
        database: DatabaseEndpoint,
        broker: BrokerEndpoint,
    ) -> Result<Self, CredentialError> {
        let secrets: SecretsFile =
            toml::from_str(content).map_err(|err| CredentialError::Parse(err.to_string()))?;
        Ok(Self { secrets, database, broker })
    }
}

impl CredentialProvider for FileCredentialProvider {
    fn database_credentials(&self) -> Result<DatabaseCredentials, CredentialError> {
        let (user, password) = login(self.secrets.database.as_ref(), "database")?;
        Ok(DatabaseCredentials {
            host: self.database.host.clone(),
            port: self.database.port,
            user,
            password,
            database: self.database.database.clone(),
        })
    }

    fn broker_credentials(&self) -> Result<BrokerCredentials, CredentialError> {
        let (user, password) = login(self.secrets.broker.as_ref(), "broker")?;
        Ok(BrokerCredentials {
            host: self.broker.host.clone(),
            port: self.broker.port,
            user,
            password,
            topic: self.broker.topic.clone(),
        })
    }
}

/// Extracts a non-blank user and password from `section`.
fn login(section: Option<&LoginSection>, name: &str) -> Result<(String, Secret), CredentialError> {
    let section =
        section.ok_or_else(|| CredentialError::Missing(format!("[{name}] section")))?;
    let user = section
        .user
        .clone()
        .filter(|user| !user.trim().is_empty())
        .ok_or_else(|| CredentialError::Missing(format!("{name}.user")))?;
    let password = section
        .password
        .clone()
        .ok_or_else(|| CredentialError::Missing(format!("{name}.password")))?;
    Ok((user, password))
}

// ============================================================================
// SECTION: Environment Provider
// ============================================================================

/// Variable lookup used by [`EnvCredentialProvider`].
type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials read from environment variables at call time.
#[derive(Clone)]
pub struct EnvCredentialProvider {
    /// Variable lookup.
    lookup: Lookup,
    /// Database endpoint from config.
    database: DatabaseEndpoint,
    /// Broker endpoint from config.
    broker: BrokerEndpoint,
}

impl EnvCredentialProvider {
    /// Creates a provider over the process environment.
    #[must_use]
    pub fn new(database: DatabaseEndpoint, broker: BrokerEndpoint) -> Self {
        Self::with_lookup(database, broker, |name| env::var(name).ok())
    }

    /// Creates a provider over a custom variable lookup.
    #[must_use]
    pub fn with_lookup(
        database: DatabaseEndpoint,
        broker: BrokerEndpoint,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self { lookup: Arc::new(lookup), database, broker }
    }

    /// Reads a non-empty variable or reports it missing.
    fn require(&self, name: &str) -> Result<String, CredentialError> {
        (self.lookup)(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CredentialError::Missing(name.to_string()))
    }
}

impl fmt::Debug for EnvCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentialProvider")
            .field("database", &self.database)
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn database_credentials(&self) -> Result<DatabaseCredentials, CredentialError> {
        Ok(DatabaseCredentials {
            host: self.database.host.clone(),
            port: self.database.port,
            user: self.require(DB_USER_ENV_VAR)?,
            password: Secret::new(self.require(DB_PASSWORD_ENV_VAR)?),
            database: self.database.database.clone(),
        })
    }

    fn broker_credentials(&self) -> Result<BrokerCredentials, CredentialError> {
        Ok(BrokerCredentials {
            host: self.broker.host.clone(),
            port: self.broker.port,
            user: self.require(BROKER_USER_ENV_VAR)?,
            password: Secret::new(self.require(BROKER_PASSWORD_ENV_VAR)?),
            topic: self.broker.topic.clone(),
        })
    }
}
