//! Database URL configuration.
//!
//! Format: `scheme://[user[:password]@][host[:port]]/database`. Missing
//! parts fall back to host `localhost`, user `postgres`, and the driver's
//! default port.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:(?P<user>[^:@/]*)(?::(?P<password>[^@/]*))?@)?(?P<host>[^:/]*)(?::(?P<port>[^/]*))?/(?P<database>[^/?#]+)$",
    )
    .expect("valid regex")
});

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_USER: &str = "postgres";

/// A parsed database URL.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseUrl {
    pub scheme: String,
    pub user: String,
    #[serde(skip)]
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: redact(url),
            reason: reason.to_string(),
        };
        let caps = URL_PATTERN
            .captures(url.trim())
            .ok_or_else(|| invalid("expected scheme://[user[:password]@][host[:port]]/database"))?;

        let port = match caps.name("port").map(|m| m.as_str()) {
            None | Some("") => None,
            Some(port) => Some(port.parse::<u16>().map_err(|_| invalid("invalid port"))?),
        };
        let non_empty = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            scheme: caps["scheme"].to_ascii_lowercase(),
            user: non_empty("user").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: non_empty("password"),
            host: non_empty("host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database: caps["database"].to_string(),
        })
    }

    /// Read and parse the URL stored in an environment variable.
    pub fn from_env(var: &str) -> Result<Self> {
        let url = std::env::var(var).map_err(|_| Error::InvalidUrl {
            url: format!("${var}"),
            reason: "environment variable not set".to_string(),
        })?;
        Self::parse(&url)
    }

    /// The explicit port, or `default`.
    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }

    /// Fail with [`Error::InvalidScheme`] unless the scheme is accepted.
    pub fn check_scheme(&self, accepted: &[&str]) -> Result<()> {
        if accepted.iter().any(|s| s.eq_ignore_ascii_case(&self.scheme)) {
            Ok(())
        } else {
            Err(Error::InvalidScheme {
                scheme: self.scheme.clone(),
            })
        }
    }
}

/// Hide the password part of a raw URL for error messages.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(start), Some(at)) if at > start => {
            let creds = &url[start + 3..at];
            match creds.split_once(':') {
                Some((user, _)) => format!("{}{user}:***{}", &url[..start + 3], &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

impl FromStr for DatabaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.user)?;
        if self.password.is_some() {
            write!(f, ":***")?;
        }
        write!(f, "@{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "/{}", self.database)
    }
}

impl fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseUrl")
            .field("scheme", &self.scheme)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}
