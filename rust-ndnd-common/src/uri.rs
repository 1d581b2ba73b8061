//! Face URIs.
//!
//! Canonical strings of the form `<scheme>://<authority>[/<path>]`.
//! Recognized schemes: tcp4, tcp6, udp4, udp6, unix, ether, ws. The
//! `ether` authority is `<iface>/<mac>`; the `unix` path is an absolute
//! filesystem path.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    Tcp4,
    Tcp6,
    Udp4,
    Udp6,
    Unix,
    Ether,
    Ws,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
            Self::Unix => "unix",
            Self::Ether => "ether",
            Self::Ws => "ws",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            "udp4" => Ok(Self::Udp4),
            "udp6" => Ok(Self::Udp6),
            "unix" => Ok(Self::Unix),
            "ether" => Ok(Self::Ether),
            "ws" => Ok(Self::Ws),
            other => Err(Error::Uri(format!("Unknown scheme '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceUri {
    pub scheme: Scheme,
    /// `host:port` for tcp/udp/ws, `<iface>/<mac>` for ether, empty for unix.
    pub authority: String,
    /// Absolute filesystem path for unix, request path for ws.
    pub path: Option<String>,
}

impl FaceUri {
    pub fn new(scheme: Scheme, authority: impl Into<String>) -> Self {
        Self {
            scheme,
            authority: authority.into(),
            path: None,
        }
    }

    /// Parses `<scheme>://<authority>[/<path>]`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let (scheme_str, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::Uri(format!("Missing '://' in '{}'", s)))?;
        let scheme = scheme_str.parse::<Scheme>()?;

        match scheme {
            Scheme::Unix => {
                // The whole remainder is the socket path and must be absolute.
                if !rest.starts_with('/') {
                    return Err(Error::Uri(format!(
                        "Unix socket path must be absolute in '{}'",
                        s
                    )));
                }
                Ok(Self {
                    scheme,
                    authority: String::new(),
                    path: Some(rest.to_string()),
                })
            }
            Scheme::Ether => {
                // Authority is <iface>/<mac>.
                let (iface, mac) = rest.split_once('/').ok_or_else(|| {
                    Error::Uri(format!("ether authority must be <iface>/<mac> in '{}'", s))
                })?;
                if iface.is_empty() || mac.is_empty() {
                    return Err(Error::Uri(format!(
                        "ether authority must be <iface>/<mac> in '{}'",
                        s
                    )));
                }
                Ok(Self {
                    scheme,
                    authority: rest.to_string(),
                    path: None,
                })
            }
            _ => {
                let (authority, path) = match rest.split_once('/') {
                    Some((authority, path)) => (authority, Some(format!("/{}", path))),
                    None => (rest, None),
                };
                if authority.is_empty() {
                    return Err(Error::Uri(format!("Missing authority in '{}'", s)));
                }
                Ok(Self {
                    scheme,
                    authority: authority.to_string(),
                    path,
                })
            }
        }
    }

    /// Returns the `host:port` authority for socket-based schemes.
    pub fn host_port(&self) -> Result<&str, Error> {
        match self.scheme {
            Scheme::Tcp4 | Scheme::Tcp6 | Scheme::Udp4 | Scheme::Udp6 | Scheme::Ws => {
                Ok(&self.authority)
            }
            _ => Err(Error::Uri(format!(
                "Scheme {} has no host:port authority",
                self.scheme.as_str()
            ))),
        }
    }

    /// Returns the filesystem path for unix-scheme URIs.
    pub fn socket_path(&self) -> Result<&str, Error> {
        match (&self.scheme, &self.path) {
            (Scheme::Unix, Some(path)) => Ok(path),
            _ => Err(Error::Uri(format!(
                "Scheme {} has no socket path",
                self.scheme.as_str()
            ))),
        }
    }
}

impl fmt::Display for FaceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.authority)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}

impl FromStr for FaceUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_uris() {
        let uri = FaceUri::parse("tcp4://127.0.0.1:6363").unwrap();
        assert_eq!(uri.scheme, Scheme::Tcp4);
        assert_eq!(uri.host_port().unwrap(), "127.0.0.1:6363");
        assert_eq!(uri.to_string(), "tcp4://127.0.0.1:6363");

        let uri = FaceUri::parse("udp6://[::1]:6363").unwrap();
        assert_eq!(uri.scheme, Scheme::Udp6);
        assert_eq!(uri.host_port().unwrap(), "[::1]:6363");
    }

    #[test]
    fn test_unix_uri() {
        let uri = FaceUri::parse("unix:///run/ndnd.sock").unwrap();
        assert_eq!(uri.scheme, Scheme::Unix);
        assert_eq!(uri.socket_path().unwrap(), "/run/ndnd.sock");
        assert_eq!(uri.to_string(), "unix:///run/ndnd.sock");

        // Relative paths are rejected
        assert!(FaceUri::parse("unix://run/ndnd.sock").is_err());
    }

    #[test]
    fn test_ether_uri() {
        let uri = FaceUri::parse("ether://eth0/01:00:5e:00:17:aa").unwrap();
        assert_eq!(uri.scheme, Scheme::Ether);
        assert_eq!(uri.authority, "eth0/01:00:5e:00:17:aa");
        assert!(uri.host_port().is_err());

        assert!(FaceUri::parse("ether://eth0").is_err());
    }

    #[test]
    fn test_invalid_uris() {
        assert!(FaceUri::parse("tcp4:127.0.0.1").is_err());
        assert!(FaceUri::parse("quic://host:1").is_err());
        assert!(FaceUri::parse("tcp4://").is_err());
    }
}
