//! Worker endpoints and the server list file.
//!
//! The server list holds one `host:port` per line. Blank lines and lines
//! starting with `#` are ignored. A malformed line is skipped with a warning;
//! it never fails the whole file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address of one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;

        // [::1]:9000
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(EndpointError::EmptyHost(s.to_string()));
        }

        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| EndpointError::InvalidPort(port.to_string()))?;
        if port == 0 {
            return Err(EndpointError::InvalidPort("0".to_string()));
        }

        Ok(Self::new(host, port))
    }
}

// ── Server list ───────────────────────────────────────────────────────────────

/// A line of the server list that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number.
    pub line_no: usize,
    pub text: String,
    pub error: EndpointError,
}

/// Parsed contents of a server list file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerList {
    pub endpoints: Vec<Endpoint>,
    pub rejected: Vec<RejectedLine>,
}

impl ServerList {
    /// Parse server list text. Never fails; bad lines land in `rejected`.
    pub fn parse(text: &str) -> Self {
        let mut list = ServerList::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<Endpoint>() {
                Ok(endpoint) => list.endpoints.push(endpoint),
                Err(error) => {
                    tracing::warn!(line_no = idx + 1, line, %error, "skipping invalid server entry");
                    list.rejected.push(RejectedLine {
                        line_no: idx + 1,
                        text: line.to_string(),
                        error,
                    });
                }
            }
        }
        list
    }

    /// Read and parse a server list file.
    ///
    /// Fails only if the file cannot be read; an empty result is the
    /// caller's decision.
    pub fn load(path: &Path) -> Result<Self, EndpointError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EndpointError::ReadFailed(path.to_path_buf(), e.to_string()))?;
        Ok(Self::parse(&text))
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("missing ':' in {0:?} (expected host:port)")]
    MissingPort(String),
    #[error("empty host in {0:?}")]
    EmptyHost(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("cannot read server list {0}: {1}")]
    ReadFailed(PathBuf, String),
}
