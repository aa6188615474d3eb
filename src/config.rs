//! Gate configuration: storage keys, navigation targets, and page sets.
//!
//! Defaults match the deployed application. `GateConfig::from_env` lets a
//! host (or the CLI) override any of them without code changes.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::GateError;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/students";
pub const DEFAULT_PRIVILEGED_ROLE: &str = "ADMIN";
pub const DEFAULT_PUBLIC_PATHS: [&str; 2] = ["/login", "/register"];
pub const DEFAULT_RESTRICTED_PATHS: [&str; 2] = ["/departments", "/courses"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Flat key names under which the session fields are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub credential: String,
    pub display_name: String,
    pub subject_id: String,
    pub roles: String,
}

impl StorageKeys {
    /// All four keys, in the order they are cleared on logout.
    #[must_use]
    pub fn all(&self) -> [&str; 4] {
        [
            self.credential.as_str(),
            self.display_name.as_str(),
            self.subject_id.as_str(),
            self.roles.as_str(),
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            credential: "token".to_owned(),
            display_name: "username".to_owned(),
            subject_id: "userId".to_owned(),
            roles: "roles".to_owned(),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub keys: StorageKeys,
    /// Entry point for unauthenticated users and the logout target.
    pub login_path: String,
    /// Where an authenticated user landing on a public page is sent.
    pub landing_path: String,
    pub privileged_role: String,
    /// Exact paths rendered without a session.
    pub public_paths: Vec<String>,
    /// Exact resource-listing paths that become view-only for non-privileged users.
    pub restricted_paths: Vec<String>,
    /// Origin prepended to relative request URLs by the native transport.
    pub base_url: Option<String>,
    pub timeouts: Timeouts,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            landing_path: DEFAULT_LANDING_PATH.to_owned(),
            privileged_role: DEFAULT_PRIVILEGED_ROLE.to_owned(),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            restricted_paths: DEFAULT_RESTRICTED_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            base_url: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl GateConfig {
    /// Build gate config from environment variables.
    ///
    /// Optional:
    /// - `SESSION_GATE_LOGIN_PATH`: default `/login`
    /// - `SESSION_GATE_LANDING_PATH`: default `/students`
    /// - `SESSION_GATE_PRIVILEGED_ROLE`: default `ADMIN`
    /// - `SESSION_GATE_PUBLIC_PATHS`: comma-separated, default `/login,/register`
    /// - `SESSION_GATE_RESTRICTED_PATHS`: comma-separated, default `/departments,/courses`
    /// - `SESSION_GATE_BASE_URL`: no default
    /// - `SESSION_GATE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SESSION_GATE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `GateError::ConfigParse` if a path does not start with `/` or
    /// the privileged role is blank.
    pub fn from_env() -> Result<Self, GateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build gate config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GateConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let login_path = match lookup("SESSION_GATE_LOGIN_PATH") {
            Some(raw) => parse_path("SESSION_GATE_LOGIN_PATH", &raw)?,
            None => defaults.login_path,
        };
        let landing_path = match lookup("SESSION_GATE_LANDING_PATH") {
            Some(raw) => parse_path("SESSION_GATE_LANDING_PATH", &raw)?,
            None => defaults.landing_path,
        };
        let privileged_role = match lookup("SESSION_GATE_PRIVILEGED_ROLE") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(GateError::ConfigParse("SESSION_GATE_PRIVILEGED_ROLE is blank".into()));
            }
            Some(raw) => raw.trim().to_owned(),
            None => defaults.privileged_role,
        };
        let public_paths = match lookup("SESSION_GATE_PUBLIC_PATHS") {
            Some(raw) => parse_path_list("SESSION_GATE_PUBLIC_PATHS", &raw)?,
            None => defaults.public_paths,
        };
        let restricted_paths = match lookup("SESSION_GATE_RESTRICTED_PATHS") {
            Some(raw) => parse_path_list("SESSION_GATE_RESTRICTED_PATHS", &raw)?,
            None => defaults.restricted_paths,
        };
        let base_url = lookup("SESSION_GATE_BASE_URL")
            .map(|raw| raw.trim().trim_end_matches('/').to_owned())
            .filter(|raw| !raw.is_empty());
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("SESSION_GATE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("SESSION_GATE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            keys: defaults.keys,
            login_path,
            landing_path,
            privileged_role,
            public_paths,
            restricted_paths,
            base_url,
            timeouts,
        })
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    /// Resource name for a restricted listing path, e.g. `/courses` -> `courses`.
    #[must_use]
    pub fn restricted_resource(&self, path: &str) -> Option<String> {
        self.restricted_paths
            .iter()
            .find(|p| *p == path)
            .map(|p| resource_name(p))
    }
}

fn resource_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_owned()
}

fn parse_path(key: &str, raw: &str) -> Result<String, GateError> {
    let path = raw.trim();
    if !path.starts_with('/') {
        return Err(GateError::ConfigParse(format!("{key} must start with '/': {path:?}")));
    }
    Ok(path.to_owned())
}

fn parse_path_list(key: &str, raw: &str) -> Result<Vec<String>, GateError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| parse_path(key, p))
        .collect()
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
