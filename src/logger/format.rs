//! Replay log format module
//!
//! One line per classified request. Supported formats:
//! - `text`: `[time] remote code METHOD "uri" "user-agent"`
//! - `json`: one JSON object per line

use crate::config::LogFormat;
use chrono::{DateTime, Local};

/// Replay log entry describing one replayed request
#[derive(Debug, Clone)]
pub struct ReplayLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Time the request was classified
    pub time: DateTime<Local>,
    /// Status code taken from the descriptor
    pub status: u16,
    /// HTTP method
    pub method: String,
    /// Request URI as received (path and query)
    pub uri: String,
    /// User-Agent header
    pub user_agent: Option<String>,
}

impl ReplayLogEntry {
    /// Create a new entry stamped with the current time
    pub fn new(remote_addr: String, status: u16, method: String, uri: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            status,
            method,
            uri,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn format(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Text => self.format_text(),
            LogFormat::Json => self.format_json(),
        }
    }

    fn format_text(&self) -> String {
        format!(
            "[{}] {} {} {} {:?} {:?}",
            self.time.format("%Y/%m/%d %H:%M:%S"),
            self.remote_addr,
            self.status,
            self.method,
            self.uri,
            self.user_agent.as_deref().unwrap_or_default(),
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "time": self.time.to_rfc3339(),
            "remote_addr": self.remote_addr,
            "status": self.status,
            "method": self.method,
            "uri": self.uri,
            "user_agent": self.user_agent,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> ReplayLogEntry {
        ReplayLogEntry::new(
            "192.168.1.1:5000".to_string(),
            301,
            "GET".to_string(),
            "/abc?x=1".to_string(),
        )
        .with_user_agent(Some("Mozilla/5.0 \"quoted\"".to_string()))
    }

    #[test]
    fn test_format_text() {
        let log = create_test_entry().format(LogFormat::Text);
        assert!(log.contains("192.168.1.1:5000"));
        assert!(log.contains("301 GET \"/abc?x=1\""));
        assert!(log.ends_with(r#""Mozilla/5.0 \"quoted\"""#));
    }

    #[test]
    fn test_format_text_without_user_agent() {
        let mut entry = create_test_entry();
        entry.user_agent = None;
        assert!(entry.format(LogFormat::Text).ends_with("\"/abc?x=1\" \"\""));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format(LogFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["status"], 301);
        assert_eq!(value["method"], "GET");
        assert_eq!(value["uri"], "/abc?x=1");
        assert_eq!(value["remote_addr"], "192.168.1.1:5000");
        assert_eq!(value["user_agent"], "Mozilla/5.0 \"quoted\"");
    }
}
