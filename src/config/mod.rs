#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Where the Transmission RPC endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEndpoint {
    Http(Url),
    /// HTTP/1.1 over a local domain socket.
    Unix(PathBuf),
}

impl ControlEndpoint {
    pub fn parse(field_name: &str, value: &str) -> Result<Self> {
        validate_non_empty_string(field_name, value)?;

        if let Some(path) = value.strip_prefix("unix://") {
            validate_non_empty_string(field_name, path)?;
            return Ok(ControlEndpoint::Unix(PathBuf::from(path)));
        }

        let url = validate_url(field_name, value)?;
        Ok(ControlEndpoint::Http(url))
    }
}

/// Process-wide configuration, fixed after startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub transmission: ControlEndpoint,
    pub gateway: IpAddr,
    /// Lease duration requested from the gateway.
    pub period: Duration,
    /// Deadline for one NAT-PMP request including retransmissions.
    pub gateway_timeout: Duration,
    pub verbose: bool,
    pub log_json: bool,
}

impl AppConfig {
    pub fn lease_secs(&self) -> u32 {
        u32::try_from(self.period.as_secs()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_endpoint() {
        let endpoint = ControlEndpoint::parse("transmission.url", "http://nas:9091").unwrap();
        assert_eq!(
            endpoint,
            ControlEndpoint::Http(Url::parse("http://nas:9091").unwrap())
        );
    }

    #[test]
    fn test_parse_unix_endpoint() {
        let endpoint =
            ControlEndpoint::parse("transmission.url", "unix:///run/transmission.sock").unwrap();
        assert_eq!(
            endpoint,
            ControlEndpoint::Unix(PathBuf::from("/run/transmission.sock"))
        );
    }

    #[test]
    fn test_parse_rejects_bad_endpoints() {
        assert!(ControlEndpoint::parse("transmission.url", "").is_err());
        assert!(ControlEndpoint::parse("transmission.url", "unix://").is_err());
        assert!(ControlEndpoint::parse("transmission.url", "ftp://nas").is_err());
        assert!(ControlEndpoint::parse("transmission.url", "not a url").is_err());
    }

    #[test]
    fn test_lease_secs() {
        let config = AppConfig {
            transmission: ControlEndpoint::Unix(PathBuf::from("/tmp/t.sock")),
            gateway: "10.2.0.1".parse().unwrap(),
            period: Duration::from_secs(60),
            gateway_timeout: Duration::from_secs(4),
            verbose: false,
            log_json: false,
        };
        assert_eq!(config.lease_secs(), 60);
    }
}
