//! Working out which game session to probe and where its socket lives.

use crate::config::ProbeConfig;
use crate::error::ProbeError;

#[derive(Debug, Clone, PartialEq)]
pub struct PageLocation {
    /// Scheme including the trailing colon, e.g. `https:`.
    pub protocol: String,
    pub host: String,
    pub pathname: String,
}

impl PageLocation {
    pub fn new(protocol: &str, host: &str, pathname: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
            host: host.to_string(),
            pathname: pathname.to_string(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.protocol == "https:"
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_window(window: &web_sys::Window) -> Result<Self, ProbeError> {
        let location = window.location();
        Ok(Self {
            protocol: location.protocol()?,
            host: location.host()?,
            pathname: location.pathname()?,
        })
    }
}

/// Explicit attribute wins, verbatim. Otherwise the last non-empty path segment.
pub fn resolve_identifier(explicit: Option<&str>, pathname: &str) -> Result<String, ProbeError> {
    if let Some(id) = explicit.filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }
    pathname
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .ok_or(ProbeError::MissingIdentifier)
}

pub fn build_address(location: &PageLocation, config: &ProbeConfig, identifier: &str) -> String {
    let scheme = if location.is_secure() { "wss" } else { "ws" };
    format!(
        "{}://{}{}",
        scheme,
        location.host,
        config.socket_path(identifier)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_identifier_ignores_path() {
        let id = resolve_identifier(Some("XYZ9"), "/lobby/ABC123/").unwrap();
        assert_eq!(id, "XYZ9");
    }

    #[test]
    fn identifier_from_last_segment() {
        assert_eq!(resolve_identifier(None, "/lobby/ABC123/").unwrap(), "ABC123");
        assert_eq!(resolve_identifier(None, "/lobby//ABC123").unwrap(), "ABC123");
    }

    #[test]
    fn empty_attribute_falls_back_to_path() {
        assert_eq!(resolve_identifier(Some(""), "/host/QQ7/").unwrap(), "QQ7");
    }

    #[test]
    fn missing_identifier() {
        assert!(matches!(
            resolve_identifier(None, "/"),
            Err(ProbeError::MissingIdentifier)
        ));
        assert!(matches!(
            resolve_identifier(None, ""),
            Err(ProbeError::MissingIdentifier)
        ));
    }

    #[test]
    fn scheme_follows_page() {
        let config = ProbeConfig::default();
        let secure = PageLocation::new("https:", "quiz.example:8443", "/game/A1/");
        let plain = PageLocation::new("http:", "localhost:8000", "/game/A1/");
        assert_eq!(
            build_address(&secure, &config, "A1"),
            "wss://quiz.example:8443/ws/game/A1/"
        );
        assert_eq!(
            build_address(&plain, &config, "A1"),
            "ws://localhost:8000/ws/game/A1/"
        );
    }
}
