use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::request::RequestLine;

/// Timestamp layout of the NCSA log formats, e.g. `10/Oct/2000:13:55:36 -0700`.
pub const TIME_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One parsed access-log line.
///
/// Every field carries its own absent marker: `None` for host, time, request
/// and referer, an empty string for user and user agent, `-1` for status,
/// `0` for bytes and `0.0` for the trailing response time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Address of the client which made the request.
    pub host: Option<IpAddr>,
    /// Logged-in user making the request, stored verbatim. The parser does
    /// not special-case the `-` anonymous convention.
    pub user: String,
    /// Time the request was made.
    pub time: Option<DateTime<FixedOffset>>,
    /// HTTP request line from the client.
    pub request: Option<RequestLine>,
    /// Status code returned to the client.
    pub status: i32,
    /// Size in bytes of the data sent to the client.
    pub bytes: u64,
    /// URL of the page the client came from.
    pub referer: Option<Url>,
    /// Raw user-agent text, uninterpreted.
    pub user_agent: String,
    /// Trailing latency field of extended combined lines.
    pub response_time: f64,
}

impl Default for Entry {
    fn default() -> Self {
        Entry {
            host: None,
            user: String::new(),
            time: None,
            request: None,
            status: -1,
            bytes: 0,
            referer: None,
            user_agent: String::new(),
            response_time: 0.0,
        }
    }
}

/// Formats the entry back into the combined log format, field order and
/// placeholders matching what the parser accepts.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Some(ip) => write!(f, "{ip}")?,
            None => f.write_str("-")?,
        }

        f.write_str(" - ")?;

        if self.user.is_empty() {
            f.write_str("-")?;
        } else {
            f.write_str(&self.user)?;
        }

        match &self.time {
            Some(t) => write!(f, " [{}]", t.format(TIME_LAYOUT))?,
            None => f.write_str(" -")?,
        }

        match &self.request {
            Some(r) => write!(f, " \"{r}\"")?,
            None => f.write_str(" -")?,
        }

        if self.status < 0 {
            f.write_str(" -")?;
        } else {
            write!(f, " {}", self.status)?;
        }

        write!(f, " {}", self.bytes)?;

        match &self.referer {
            Some(u) => write!(f, " \"{u}\"")?,
            None => f.write_str(" \"-\"")?,
        }

        if self.user_agent.is_empty() {
            f.write_str(" \"-\"")?;
        } else {
            write!(f, " \"{}\"", self.user_agent)?;
        }

        if self.response_time > 0.0 {
            write!(f, " {}", self.response_time)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry_formats_with_placeholders() {
        let e = Entry::default();
        assert_eq!(e.to_string(), r#"- - - - - 0 "-" "-""#);
    }

    #[test]
    fn test_populated_entry_formats_in_field_order() {
        let e = Entry {
            host: Some("127.0.0.1".parse().unwrap()),
            user: "frank".to_string(),
            time: Some(
                DateTime::parse_from_str("10/Oct/2000:13:55:36 -0700", TIME_LAYOUT).unwrap(),
            ),
            request: Some(crate::request::parse("GET /apache_pb.gif HTTP/1.0").unwrap()),
            status: 200,
            bytes: 2326,
            referer: Some(Url::parse("http://www.example.com/start.html").unwrap()),
            user_agent: "Mozilla/4.08".to_string(),
            response_time: 0.0,
        };
        assert_eq!(
            e.to_string(),
            r#"127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326 "http://www.example.com/start.html" "Mozilla/4.08""#
        );
    }

    #[test]
    fn test_response_time_appended_when_present() {
        let e = Entry {
            response_time: 0.25,
            ..Entry::default()
        };
        assert!(e.to_string().ends_with(" 0.25"));
    }
}
