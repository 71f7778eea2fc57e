//! Source endpoint addressing

use reqwest::Url;

use crate::error::CollectError;

/// Port used when an endpoint is given as a bare host name
pub const DEFAULT_ALERTMANAGER_PORT: u16 = 9093;

/// One alert-manager instance to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Entry as configured, used in logs
    pub name: String,
    /// Full alerts URL
    pub url: Url,
}

impl Endpoint {
    /// Resolve a configured entry against the alerts path.
    ///
    /// `am01.example.com` becomes `http://am01.example.com:9093{path}`.
    /// An entry with a scheme is taken as the base URL.
    pub fn parse(entry: &str, alerts_path: &str) -> Result<Self, CollectError> {
        let name = entry.trim();
        let invalid = |reason: String| CollectError::InvalidEndpoint {
            entry: entry.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("empty entry".to_string()));
        }

        let base = if name.contains("://") {
            name.trim_end_matches('/').to_string()
        } else {
            format!("http://{name}:{DEFAULT_ALERTMANAGER_PORT}")
        };
        let path = if alerts_path.starts_with('/') {
            alerts_path.to_string()
        } else {
            format!("/{alerts_path}")
        };

        let url = Url::parse(&format!("{base}{path}")).map_err(|e| invalid(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/api/v2/alerts?silenced=false&inhibited=false&group=uniq_id";

    #[test]
    fn test_bare_host_gets_default_port() {
        let ep = Endpoint::parse("n01.b3.alertmanager.example.com", PATH).unwrap();
        assert_eq!(
            ep.url.as_str(),
            "http://n01.b3.alertmanager.example.com:9093/api/v2/alerts?silenced=false&inhibited=false&group=uniq_id"
        );
        assert_eq!(ep.name, "n01.b3.alertmanager.example.com");
    }

    #[test]
    fn test_base_url_kept() {
        let ep = Endpoint::parse("https://am.example.com:8443/", "api/v2/alerts").unwrap();
        assert_eq!(ep.url.as_str(), "https://am.example.com:8443/api/v2/alerts");
    }

    #[test]
    fn test_invalid_entries() {
        assert!(Endpoint::parse("  ", PATH).is_err());
        assert!(Endpoint::parse("bad host name", PATH).is_err());
        assert!(matches!(
            Endpoint::parse("http://:9093", PATH),
            Err(CollectError::InvalidEndpoint { .. })
        ));
    }
}
