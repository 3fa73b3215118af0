//! Access log format module
//!
//! Supported formats:
//! - `common` (Common Log Format - CLF), the default
//! - `combined` (CLF plus referer and user agent)
//! - `json` (one JSON object per line)

use chrono::{DateTime, Local};
use serde::Serialize;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log entry for one dispatched request
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Client address as reported by the transport
    pub remote_addr: String,
    /// Time the request was received
    #[serde(serialize_with = "serialize_rfc3339")]
    pub time: DateTime<Local>,
    pub method: String,
    /// Request URI as received, query string included
    pub request_uri: String,
    /// Protocol label, e.g. `HTTP/1.1`
    pub protocol: String,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl AccessLogEntry {
    /// Create a new access log entry stamped with the current time
    pub fn new(remote_addr: String, method: String, request_uri: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            request_uri,
            protocol: "HTTP/1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
        }
    }

    /// Format the log entry according to the specified format.
    /// Unknown formats fall back to `common`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    /// `remote-addr - - [dd/Mon/yyyy:HH:MM:SS ±zzzz] "METHOD uri protocol" status size`
    ///
    /// IDENT and the authenticated user are always `-`.
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} {}\" {} {}",
            dash_if_empty(&self.remote_addr),
            self.time.format(CLF_TIME),
            self.method,
            self.request_uri,
            self.protocol,
            self.status,
            self.body_bytes,
        )
    }

    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"log_error\":\"{e}\"}}"))
    }
}

fn dash_if_empty(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn serialize_rfc3339<S: serde::Serializer>(
    time: &DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1:4242".to_string(),
            "GET".to_string(),
            "/users/show/42?full=1".to_string(),
        );
        entry.time = FixedOffset::east_opt(-6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2012, 10, 3, 14, 5, 9)
            .unwrap()
            .with_timezone(&Local);
        entry.status = 200;
        entry.body_bytes = 1234;
        entry.referer = Some("https://example.com".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry
    }

    #[test]
    fn test_format_common() {
        let entry = create_test_entry();
        let log = entry.format("common");
        assert!(log.starts_with("192.168.1.1:4242 - - ["));
        assert!(log.ends_with("] \"GET /users/show/42?full=1 HTTP/1.1\" 200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_time_layout() {
        let entry = create_test_entry();
        let log = entry.format("common");
        let start = log.find('[').unwrap();
        let end = log.find(']').unwrap();
        let stamp = &log[start + 1..end];
        // dd/Mon/yyyy:HH:MM:SS ±zzzz
        assert_eq!(stamp.len(), 26);
        assert_eq!(&stamp[2..3], "/");
        assert_eq!(&stamp[6..7], "/");
        assert!(stamp[21..22] == *"+" || stamp[21..22] == *"-");
    }

    #[test]
    fn test_empty_remote_is_dash() {
        let mut entry = create_test_entry();
        entry.remote_addr = String::new();
        assert!(entry.format("common").starts_with("- - - ["));
    }

    #[test]
    fn test_format_combined() {
        let entry = create_test_entry();
        let log = entry.format("combined");
        assert!(log.contains("200 1234 \"https://example.com\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_json() {
        let entry = create_test_entry();
        let log = entry.format("json");
        let parsed: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(parsed["remote_addr"], "192.168.1.1:4242");
        assert_eq!(parsed["status"], 200);
        assert_eq!(parsed["body_bytes"], 1234);
    }

    #[test]
    fn test_unknown_format_is_common() {
        let entry = create_test_entry();
        assert_eq!(entry.format("nope"), entry.format("common"));
    }
}
