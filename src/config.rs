#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub container_id: String,
    pub identifier_attribute: String,
    /// Socket path, `{id}` is replaced with the resolved identifier.
    pub path_template: String,
    pub probe_text: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            container_id: "websocket-test-container".to_string(),
            identifier_attribute: "data-game-code".to_string(),
            path_template: "/ws/game/{id}/".to_string(),
            probe_text: "Connection test from ws-probe".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn with_container_id(mut self, id: &str) -> Self {
        self.container_id = id.to_string();
        self
    }

    pub fn socket_path(&self, identifier: &str) -> String {
        self.path_template.replace("{id}", identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_matches_game_route() {
        let config = ProbeConfig::default();
        assert_eq!(config.socket_path("ABC123"), "/ws/game/ABC123/");
    }

    #[test]
    fn container_override() {
        let config = ProbeConfig::default().with_container_id("probe");
        assert_eq!(config.container_id, "probe");
        assert_eq!(config.identifier_attribute, "data-game-code");
    }
}
