//! Server settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `USER_ROUTER_*` environment variables, or a
//! configuration file, in that order of precedence. Unset values fall back
//! to the defaults exposed by the accessor methods.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 5_000;

/// Runtime configuration for the user router service.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_ROUTER")]
pub struct ServerSettings {
    /// Interface the HTTP listener binds to.
    pub host: Option<String>,
    /// TCP port the HTTP listener binds to.
    pub port: Option<u16>,
    /// Secret used to sign bearer tokens. A random one is generated when unset.
    pub token_secret: Option<String>,
    /// Deadline for the authorization gate plus handler, in milliseconds.
    pub handler_timeout_ms: Option<u64>,
    /// Username of the administrator seeded at startup.
    pub admin_username: Option<String>,
    /// Password of the administrator seeded at startup.
    pub admin_password: Option<String>,
    /// Emit human-readable logs instead of JSON.
    #[ortho_config(default = false)]
    pub pretty_logs: bool,
}

impl ServerSettings {
    /// Bind host, falling back to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Bind port, falling back to 8080.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Gate and handler deadline.
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(
            self.handler_timeout_ms
                .unwrap_or(DEFAULT_HANDLER_TIMEOUT_MS),
        )
    }

    /// Configured signing secret, ignoring blank values.
    pub fn token_secret(&self) -> Option<&str> {
        self.token_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }

    /// Administrator credentials, when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_username.as_deref(), self.admin_password.as_deref()) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("host", &self.host())
            .field("port", &self.port())
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("handler_timeout_ms", &self.handler_timeout_ms)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("pretty_logs", &self.pretty_logs)
            .finish()
    }
}
