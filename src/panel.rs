use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Danger,
}

impl Level {
    pub fn class_name(self) -> &'static str {
        match self {
            Level::Info => "alert alert-info",
            Level::Success => "alert alert-success",
            Level::Warning => "alert alert-warning",
            Level::Danger => "alert alert-danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub level: Level,
    pub text: String,
}

pub struct Panel {
    status: Status,
    transcript: Vec<String>,
    clock: Box<dyn Clock>,
}

impl Panel {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            status: Status {
                level: Level::Info,
                text: "Testing WebSocket connection...".to_string(),
            },
            transcript: vec![],
            clock,
        }
    }

    pub fn set_status(&mut self, level: Level, text: &str) {
        self.status = Status {
            level,
            text: text.to_string(),
        };
    }

    /// Appends one timestamped line. Lines are never reordered or dropped.
    pub fn log(&mut self, text: &str) {
        let line = format!("[{}] {}", self.clock.now(), text);
        self.transcript.push(line);
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn lines(&self) -> &[String] {
        &self.transcript
    }

    pub fn transcript_text(&self) -> String {
        let mut text = String::new();
        for line in &self.transcript {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}
