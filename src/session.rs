//! One probe run, from resolving the game code to the socket closing.

use log::{debug, error, info, warn};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::message::{ClientMessage, Inbound, ServerMessage};
use crate::panel::{Level, Panel};
use crate::target::{build_address, resolve_identifier, PageLocation};

pub trait Transport {
    fn send_text(&self, text: &str) -> Result<(), ProbeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseInfo {
    pub was_clean: bool,
    pub code: u16,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Failed,
}

pub struct ProbeSession {
    config: ProbeConfig,
    panel: Panel,
    address: Option<String>,
    state: SessionState,
    ping_sent: bool,
}

impl ProbeSession {
    pub fn new(config: ProbeConfig, panel: Panel) -> Self {
        Self {
            config,
            panel,
            address: None,
            state: SessionState::Idle,
            ping_sent: false,
        }
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn begin(&mut self) {
        self.panel.log("Starting WebSocket connection test");
    }

    /// On failure the panel already shows the problem and no connection
    /// should be attempted.
    pub fn prepare(
        &mut self,
        location: &PageLocation,
        explicit: Option<&str>,
    ) -> Result<String, ProbeError> {
        let identifier = match resolve_identifier(explicit, &location.pathname) {
            Ok(identifier) => identifier,
            Err(err) => {
                error!("{}", err);
                self.state = SessionState::Failed;
                self.panel
                    .set_status(Level::Danger, "Error: Could not determine game code");
                self.panel.log("Could not determine game code from URL");
                return Err(err);
            }
        };
        self.panel.log(&format!("Using game code: {}", identifier));

        let address = build_address(location, &self.config, &identifier);
        info!("Connecting to {}", address);
        self.panel.log(&format!("Connecting to: {}", address));
        self.address = Some(address.clone());
        self.state = SessionState::Connecting;
        Ok(address)
    }

    pub fn fail_setup(&mut self, err: &ProbeError) {
        error!("probe setup failed: {}", err);
        self.state = SessionState::Failed;
        self.panel
            .set_status(Level::Danger, "Error setting up WebSocket test");
        self.panel.log(&format!("Error: {}", err));
    }

    pub fn on_open(&mut self, transport: &dyn Transport) {
        info!("socket opened");
        self.state = SessionState::Open;
        self.panel
            .set_status(Level::Success, "WebSocket connection established!");
        self.panel.log("Connection opened successfully");

        if self.ping_sent {
            return;
        }
        self.ping_sent = true;
        let sent = ClientMessage::ping(&self.config.probe_text)
            .encode()
            .and_then(|text| transport.send_text(&text));
        match sent {
            Ok(()) => self.panel.log("Sent ping message"),
            Err(err) => {
                error!("error sending ping: {}", err);
                self.panel.log(&format!("Error sending ping: {}", err));
            }
        }
    }

    pub fn on_text(&mut self, text: &str) {
        debug!("message event, received text: {}", text);
        self.panel.log(&format!("Received message: {}", text));

        let inbound = Inbound::parse(text);
        match &inbound {
            Inbound::Unparseable { reason } => {
                self.panel.log(&format!("Error parsing message: {}", reason));
                return;
            }
            _ => self
                .panel
                .log(&format!("Message type: {}", inbound.kind().unwrap_or("(none)"))),
        }

        match inbound {
            Inbound::Known(ServerMessage::Pong {
                message: Some(message),
                ..
            }) => self.panel.log(&format!("Server says: {}", message)),
            Inbound::Known(ServerMessage::Error {
                message: Some(message),
            }) => {
                warn!("server reported an error: {}", message);
                self.panel.log(&format!("Server error: {}", message));
            }
            _ => {}
        }
    }

    pub fn on_binary(&mut self, len: usize) {
        debug!("message event, received {} bytes", len);
        self.panel
            .log(&format!("Received binary message ({} bytes)", len));
    }

    pub fn on_close(&mut self, close: &CloseInfo) {
        warn!("socket closed: {:?}", close);
        self.state = SessionState::Closed;
        self.panel
            .set_status(Level::Warning, "WebSocket connection closed");
        if close.was_clean {
            self.panel.log(&format!(
                "Connection closed cleanly, code={}, reason={}",
                close.code, close.reason
            ));
        } else {
            self.panel.log("Connection died");
        }
    }

    /// Not every environment gives a description, hence the `Option`.
    pub fn on_error(&mut self, description: Option<&str>) {
        let description = description
            .filter(|text| !text.is_empty())
            .unwrap_or("unknown error");
        error!("error event: {}", description);
        self.panel
            .set_status(Level::Danger, "WebSocket error occurred");
        self.panel
            .log(&format!("WebSocket Error: {}", description));

        let address = self.address.clone().unwrap_or_default();
        for check in error_checklist(&address) {
            self.panel.log(&check);
        }
    }
}

pub fn error_checklist(address: &str) -> Vec<String> {
    vec![
        "- Is the server running with Daphne or another ASGI server?".to_string(),
        format!("- Is the routing pattern correct? Current URL: {}", address),
        "- Check server logs for exceptions".to_string(),
        "- Ensure CHANNEL_LAYERS is properly configured in settings.py".to_string(),
        "- Check ASGI_APPLICATION setting is correct".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::{well_formed, TickingClock};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Transport for Recorder {
        fn send_text(&self, text: &str) -> Result<(), ProbeError> {
            if self.fail {
                return Err(ProbeError::Send("socket not open".to_string()));
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn session() -> ProbeSession {
        ProbeSession::new(
            ProbeConfig::default(),
            Panel::new(Box::new(TickingClock::new())),
        )
    }

    fn connected() -> ProbeSession {
        let mut session = session();
        session.begin();
        let location = PageLocation::new("http:", "localhost:8000", "/lobby/ABC123/");
        session.prepare(&location, None).unwrap();
        session
    }

    fn texts(session: &ProbeSession) -> Vec<String> {
        session
            .panel()
            .lines()
            .iter()
            .map(|line| line[11..].to_string())
            .collect()
    }

    #[test]
    fn prepare_narrates_target() {
        let session = connected();
        assert_eq!(session.state(), SessionState::Connecting);
        assert_eq!(session.address(), Some("ws://localhost:8000/ws/game/ABC123/"));
        assert_eq!(
            texts(&session),
            vec![
                "Starting WebSocket connection test",
                "Using game code: ABC123",
                "Connecting to: ws://localhost:8000/ws/game/ABC123/",
            ]
        );
    }

    #[test]
    fn explicit_code_used_in_address() {
        let mut session = session();
        let location = PageLocation::new("https:", "quiz.example", "/lobby/ABC123/");
        let address = session.prepare(&location, Some("ZZ42")).unwrap();
        assert_eq!(address, "wss://quiz.example/ws/game/ZZ42/");
    }

    #[test]
    fn missing_code_stops_before_connecting() {
        let mut session = session();
        let location = PageLocation::new("http:", "localhost", "/");
        assert!(matches!(
            session.prepare(&location, None),
            Err(ProbeError::MissingIdentifier)
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.address(), None);
        assert_eq!(session.panel().status().level, Level::Danger);
        assert_eq!(
            session.panel().status().text,
            "Error: Could not determine game code"
        );
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Could not determine game code from URL")
        );
    }

    #[test]
    fn setup_failure_is_reported() {
        let mut session = session();
        session.begin();
        session.fail_setup(&ProbeError::Dom("location unavailable".to_string()));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.panel().status().level, Level::Danger);
        assert_eq!(session.panel().status().text, "Error setting up WebSocket test");
        assert_eq!(
            texts(&session),
            vec![
                "Starting WebSocket connection test",
                "Error: DOM error: location unavailable",
            ]
        );
    }

    #[test]
    fn fresh_session_is_idle() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.panel().lines().is_empty());
    }

    #[test]
    fn nothing_sent_before_open() {
        let recorder = Recorder::default();
        let mut session = connected();
        session.on_text(r#"{"type":"pong"}"#);
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn exactly_one_ping_after_open() {
        let recorder = Recorder::default();
        let mut session = connected();
        session.on_open(&recorder);
        session.on_open(&recorder);

        let sent = recorder.sent.borrow();
        assert_eq!(sent.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(value["type"], "ping");
        assert_eq!(value["data"], "Connection test from ws-probe");

        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.panel().status().level, Level::Success);
        let lines = texts(&session);
        assert_eq!(
            lines.iter().filter(|l| l.as_str() == "Sent ping message").count(),
            1
        );
    }

    #[test]
    fn failed_send_is_logged() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut session = connected();
        session.on_open(&recorder);
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Error sending ping: Failed to send message: socket not open")
        );
    }

    #[test]
    fn pong_reports_type() {
        let mut session = connected();
        session.on_open(&Recorder::default());
        session.on_text(r#"{"type":"pong"}"#);
        let lines = texts(&session);
        assert!(lines.contains(&r#"Received message: {"type":"pong"}"#.to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Message type: pong"));
    }

    #[test]
    fn pong_with_server_text() {
        let mut session = connected();
        session.on_text(r#"{"type":"pong","message":"Connection is working!"}"#);
        let lines = texts(&session);
        assert_eq!(
            &lines[lines.len() - 2..],
            &["Message type: pong", "Server says: Connection is working!"]
        );
    }

    #[test]
    fn garbage_keeps_connection_open() {
        let mut session = connected();
        session.on_open(&Recorder::default());
        session.on_text("not json");
        assert_eq!(session.state(), SessionState::Open);
        let lines = texts(&session);
        assert_eq!(lines[lines.len() - 2], "Received message: not json");
        assert!(lines[lines.len() - 1].starts_with("Error parsing message: "));

        session.on_text(r#"{"type":"player_list","players":[]}"#);
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Message type: player_list")
        );
    }

    #[test]
    fn non_string_type_is_reported() {
        let mut session = connected();
        session.on_text(r#"{"type":5}"#);
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Message type: 5")
        );

        session.on_text("null");
        let lines = texts(&session);
        assert_eq!(lines[lines.len() - 2], "Received message: null");
        assert_eq!(
            lines[lines.len() - 1],
            "Error parsing message: cannot read type of null"
        );
        assert_eq!(session.state(), SessionState::Connecting);
    }

    #[test]
    fn untyped_json() {
        let mut session = connected();
        session.on_text("{}");
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Message type: (none)")
        );
    }

    #[test]
    fn binary_frame() {
        let mut session = connected();
        session.on_binary(4);
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Received binary message (4 bytes)")
        );
    }

    #[test]
    fn clean_close() {
        let mut session = connected();
        session.on_close(&CloseInfo {
            was_clean: true,
            code: 1000,
            reason: "done".to_string(),
        });
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.panel().status().level, Level::Warning);
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Connection closed cleanly, code=1000, reason=done")
        );
    }

    #[test]
    fn abrupt_close() {
        let mut session = connected();
        session.on_close(&CloseInfo {
            was_clean: false,
            code: 1006,
            reason: String::new(),
        });
        assert_eq!(
            texts(&session).last().map(String::as_str),
            Some("Connection died")
        );
    }

    #[test]
    fn error_lists_checks() {
        let mut session = connected();
        session.on_error(None);
        assert_eq!(session.panel().status().level, Level::Danger);
        assert_eq!(session.panel().status().text, "WebSocket error occurred");
        let lines = texts(&session);
        let tail = &lines[lines.len() - 6..];
        assert_eq!(tail[0], "WebSocket Error: unknown error");
        assert_eq!(
            tail[2],
            "- Is the routing pattern correct? Current URL: ws://localhost:8000/ws/game/ABC123/"
        );
        assert_eq!(tail[5], "- Check ASGI_APPLICATION setting is correct");
    }

    #[test]
    fn error_description_kept() {
        let mut session = connected();
        session.on_error(Some("connection refused"));
        assert!(texts(&session).contains(&"WebSocket Error: connection refused".to_string()));
    }

    #[test]
    fn every_event_logs_in_order() {
        let mut session = connected();
        let before = session.panel().lines().len();
        session.on_open(&Recorder::default());
        let after_open = session.panel().lines().len();
        session.on_text("x");
        let after_message = session.panel().lines().len();
        session.on_error(Some("boom"));
        let after_error = session.panel().lines().len();
        session.on_close(&CloseInfo {
            was_clean: false,
            code: 1006,
            reason: String::new(),
        });
        let after_close = session.panel().lines().len();

        assert!(before < after_open);
        assert!(after_open < after_message);
        assert!(after_message < after_error);
        assert!(after_error < after_close);
        assert!(session.panel().lines().iter().all(|line| well_formed(line)));

        let lines = texts(&session);
        let position = |needle: &str| lines.iter().position(|l| l == needle).unwrap();
        assert!(position("Connection opened successfully") < position("Received message: x"));
        assert!(position("Received message: x") < position("WebSocket Error: boom"));
        assert!(position("WebSocket Error: boom") < position("Connection died"));
    }
}
