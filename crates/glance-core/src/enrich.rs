// Enrichment seams: user-agent parsing and IP geolocation
//
// Both collaborators sit behind traits so the ingestion handler can be tested
// with canned values. Failures never propagate: an unparseable user agent
// degrades to "Unknown"/"desktop" and an unresolvable IP yields no country.

use std::net::IpAddr;
use std::path::Path;

use anyhow::Context;
use woothee::parser::Parser;

// ============================================
// User agent -> browser / os / device type
// ============================================

/// Browser, OS and device type derived from a user-agent string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub browser: String,
    pub os: String,
    pub device_type: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            browser: "Unknown".to_string(),
            os: "Unknown".to_string(),
            device_type: "desktop".to_string(),
        }
    }
}

/// Derives client info from a raw user-agent header
pub trait UserAgentParser: Send + Sync {
    fn parse(&self, user_agent: &str) -> ClientInfo;
}

/// woothee-backed user agent parser
pub struct WootheeParser {
    inner: Parser,
}

impl WootheeParser {
    pub fn new() -> Self {
        Self {
            inner: Parser::new(),
        }
    }
}

impl Default for WootheeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentParser for WootheeParser {
    fn parse(&self, user_agent: &str) -> ClientInfo {
        let Some(result) = self.inner.parse(user_agent) else {
            return ClientInfo::default();
        };

        // woothee reports "UNKNOWN" rather than failing the parse
        let known = |value: &str, fallback: &str| {
            if value.is_empty() || value == "UNKNOWN" {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        let device_type = match result.category {
            "smartphone" | "mobilephone" => "mobile",
            "appliance" => "tv",
            "crawler" => "crawler",
            _ => "desktop",
        };

        ClientInfo {
            browser: known(result.name, "Unknown"),
            os: known(result.os, "Unknown"),
            device_type: device_type.to_string(),
        }
    }
}

// ============================================
// IP -> country
// ============================================

/// Resolves an IP address to an ISO country code
pub trait GeoResolver: Send + Sync {
    fn country(&self, ip: IpAddr) -> Option<String>;
}

/// MaxMind GeoLite2 country database resolver
pub struct MaxmindGeo {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxmindGeo {
    /// Open a GeoLite2-Country mmdb file
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader = maxminddb::Reader::open_readfile(path)
            .with_context(|| format!("failed to open GeoIP database at {}", path.display()))?;
        Ok(Self { reader })
    }
}

impl GeoResolver for MaxmindGeo {
    fn country(&self, ip: IpAddr) -> Option<String> {
        self.reader
            .lookup::<maxminddb::geoip2::Country>(ip)
            .ok()
            .and_then(|record| record.country)
            .and_then(|country| country.iso_code)
            .map(str::to_string)
    }
}

/// Resolver used when no GeoIP database is configured
pub struct NoopGeo;

impl GeoResolver for NoopGeo {
    fn country(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_desktop_browser_parsed() {
        let parser = WootheeParser::new();
        let info = parser.parse(CHROME_DESKTOP);
        assert_eq!(info.browser, "Chrome");
        assert!(info.os.starts_with("Windows"));
        assert_eq!(info.device_type, "desktop");
    }

    #[test]
    fn test_mobile_browser_parsed() {
        let parser = WootheeParser::new();
        let info = parser.parse(SAFARI_IPHONE);
        assert_eq!(info.device_type, "mobile");
    }

    #[test]
    fn test_garbage_user_agent_degrades_to_defaults() {
        let parser = WootheeParser::new();
        let info = parser.parse("");
        assert_eq!(info, ClientInfo::default());
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.device_type, "desktop");
    }

    #[test]
    fn test_noop_geo_resolves_nothing() {
        let geo = NoopGeo;
        assert_eq!(geo.country("203.0.113.7".parse().unwrap()), None);
    }
}
