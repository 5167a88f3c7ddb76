use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use thiserror::Error;
use winnow::{combinator::alt, token::take_until, PResult, Parser};

/// Parsed HTTP request line: `METHOD TARGET PROTOCOL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: HttpMethod,
    pub target: String,
    pub protocol: HttpProtocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Connect,
    Trace,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpProtocol {
    Http1_0,
    Http1_1,
    Http2_0,
    Http3_0,
}

/// The quoted request field did not parse as a request line.
#[derive(Debug, Clone, Error)]
#[error("malformed request line {text:?}: {reason}")]
pub struct RequestLineError {
    pub text: String,
    pub reason: String,
}

/// Parses the text between the quotes of the request field. The whole field
/// must be consumed; trailing junk after the protocol is an error.
pub fn parse(text: &str) -> Result<RequestLine, RequestLineError> {
    request_line.parse(text).map_err(|e| RequestLineError {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

fn request_line(input: &mut &str) -> PResult<RequestLine> {
    let method = parse_method(input)?;
    ' '.parse_next(input)?;
    let target = parse_target(input)?;
    ' '.parse_next(input)?;
    let protocol = parse_protocol(input)?;
    Ok(RequestLine {
        method,
        target,
        protocol,
    })
}

fn parse_method(input: &mut &str) -> PResult<HttpMethod> {
    alt((
        "GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "CONNECT", "TRACE", "PATCH",
    ))
    .parse_to()
    .parse_next(input)
}

fn parse_target(input: &mut &str) -> PResult<String> {
    take_until(1.., ' ')
        .map(str::to_string)
        .parse_next(input)
}

fn parse_protocol(input: &mut &str) -> PResult<HttpProtocol> {
    alt(("HTTP/1.0", "HTTP/1.1", "HTTP/2.0", "HTTP/3.0"))
        .parse_to()
        .parse_next(input)
}

impl FromStr for HttpMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "CONNECT" => Ok(HttpMethod::Connect),
            "TRACE" => Ok(HttpMethod::Trace),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(anyhow!("invalid HTTP method")),
        }
    }
}

impl FromStr for HttpProtocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "HTTP/1.0" => Ok(HttpProtocol::Http1_0),
            "HTTP/1.1" => Ok(HttpProtocol::Http1_1),
            "HTTP/2.0" => Ok(HttpProtocol::Http2_0),
            "HTTP/3.0" => Ok(HttpProtocol::Http3_0),
            _ => Err(anyhow!("invalid HTTP protocol")),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
        })
    }
}

impl fmt::Display for HttpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpProtocol::Http1_0 => "HTTP/1.0",
            HttpProtocol::Http1_1 => "HTTP/1.1",
            HttpProtocol::Http2_0 => "HTTP/2.0",
            HttpProtocol::Http3_0 => "HTTP/3.0",
        })
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_request_line_should_work() -> Result<()> {
        let r = parse("GET /apache_pb.gif HTTP/1.0")?;

        assert_eq!(r.method, HttpMethod::Get);
        assert_eq!(r.target, "/apache_pb.gif");
        assert_eq!(r.protocol, HttpProtocol::Http1_0);

        Ok(())
    }

    #[test]
    fn test_parse_rejects_unknown_method() {
        let err = parse("YEET /x HTTP/1.1").unwrap_err();
        assert_eq!(err.text, "YEET /x HTTP/1.1");
    }

    #[test]
    fn test_parse_rejects_trailing_junk() {
        assert!(parse("GET /x HTTP/1.0 extra").is_err());
        assert!(parse("GET /x").is_err());
    }

    #[test]
    fn test_display_round_trips() -> Result<()> {
        let text = "POST /submit?q=1 HTTP/1.1";
        assert_eq!(parse(text)?.to_string(), text);
        Ok(())
    }
}
