//! Endpoint addressing: `tcp://host[:port]` or `file:///path`.

use std::fmt;

/// A parsed endpoint address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A TCP endpoint, with an optional explicit port (`0`/absent means an
    /// ephemeral port assigned by the OS at bind time).
    Tcp {
        /// Hostname or IP literal.
        host: String,
        /// Port, or `None` for an ephemeral port.
        port: Option<u16>,
    },
    /// A local domain socket path.
    Unix(String),
}

impl Address {
    /// Parses a `tcp://` or `file://` URL.
    pub fn parse(input: &str) -> Result<Self, InvalidAddress> {
        if let Some(rest) = input.strip_prefix("tcp://") {
            let (host, port) = match rest.rsplit_once(':') {
                Some((host, port_str)) => {
                    let port = port_str.parse().map_err(|_| InvalidAddress(input.to_string()))?;
                    (host.to_string(), Some(port))
                }
                None => (rest.to_string(), None),
            };
            if host.is_empty() {
                return Err(InvalidAddress(input.to_string()));
            }
            Ok(Address::Tcp { host, port })
        } else if let Some(rest) = input.strip_prefix("file://") {
            if rest.is_empty() {
                return Err(InvalidAddress(input.to_string()));
            }
            Ok(Address::Unix(rest.to_string()))
        } else {
            Err(InvalidAddress(input.to_string()))
        }
    }

    /// Renders this address as a socket address string, if it's TCP and has
    /// a known port.
    pub fn socket_addr_string(&self) -> Option<String> {
        match self {
            Address::Tcp { host, port: Some(port) } => Some(format!("{host}:{port}")),
            _ => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp { host, port: Some(port) } => write!(f, "tcp://{host}:{port}"),
            Address::Tcp { host, port: None } => write!(f, "tcp://{host}"),
            Address::Unix(path) => write!(f, "file://{path}"),
        }
    }
}

/// The input string was not a valid `tcp://` or `file://` address.
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct InvalidAddress(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_with_explicit_port() {
        let addr = Address::parse("tcp://127.0.0.1:9000").unwrap();
        assert_eq!(addr, Address::Tcp { host: "127.0.0.1".into(), port: Some(9000) });
    }

    #[test]
    fn parses_tcp_without_port() {
        let addr = Address::parse("tcp://example.com").unwrap();
        assert_eq!(addr, Address::Tcp { host: "example.com".into(), port: None });
    }

    #[test]
    fn parses_unix_socket_path() {
        let addr = Address::parse("file:///tmp/cicada.sock").unwrap();
        assert_eq!(addr, Address::Unix("/tmp/cicada.sock".into()));
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(Address::parse("http://example.com").is_err());
    }
}
