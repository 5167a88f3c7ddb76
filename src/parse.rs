use std::net::IpAddr;

use chrono::DateTime;
use url::Url;

use crate::cursor::Cursor;
use crate::entry::{Entry, TIME_LAYOUT};
use crate::error::{Field, ParseError, ValueError};
use crate::request;

/// How a field is terminated.
enum Sep {
    /// The field runs up to this exact separator string.
    Str(&'static str),
    /// Up to the separator, or to the end of the line when it never occurs
    /// (the field may be the last token on the line).
    StrOrEol(&'static str),
}

type Convert = fn(&mut Entry, &str) -> Result<(), ParseError>;

/// One grammar rule: an optional expected literal, the delimiter terminating
/// the field, and the converter storing it into the entry.
struct Step {
    literal: Option<char>,
    sep: Sep,
    /// The whole step is skipped when no input remains.
    skip_at_eol: bool,
    convert: Convert,
}

const COMMON_STEPS: &[Step] = &[
    Step {
        literal: None,
        sep: Sep::Str(" "),
        skip_at_eol: false,
        convert: host,
    },
    // identity field, reserved by the format but never used
    Step {
        literal: None,
        sep: Sep::Str(" "),
        skip_at_eol: false,
        convert: identity,
    },
    Step {
        literal: None,
        sep: Sep::Str(" "),
        skip_at_eol: false,
        convert: user,
    },
    Step {
        literal: Some('['),
        sep: Sep::Str("] "),
        skip_at_eol: false,
        convert: timestamp,
    },
    Step {
        literal: Some('"'),
        sep: Sep::Str("\" "),
        skip_at_eol: false,
        convert: http_request,
    },
    Step {
        literal: None,
        sep: Sep::Str(" "),
        skip_at_eol: false,
        convert: status,
    },
    Step {
        literal: None,
        sep: Sep::StrOrEol(" "),
        skip_at_eol: false,
        convert: bytes,
    },
];

const COMBINED_STEPS: &[Step] = &[
    Step {
        literal: Some('"'),
        sep: Sep::Str("\" "),
        skip_at_eol: false,
        convert: referer,
    },
    // last quoted field: terminated by a bare quote, no trailing space
    Step {
        literal: Some('"'),
        sep: Sep::Str("\""),
        skip_at_eol: false,
        convert: user_agent,
    },
    // optional trailing latency token
    Step {
        literal: Some(' '),
        sep: Sep::StrOrEol(" "),
        skip_at_eol: true,
        convert: response_time,
    },
];

/// Parses a line in the common log format:
/// `HOST - USER [TIMESTAMP] "METHOD TARGET PROTOCOL" STATUS BYTES`.
pub fn common(line: &str) -> Result<Entry, ParseError> {
    let mut cur = Cursor::new(line);
    let mut entry = Entry::default();
    run_steps(&mut cur, &mut entry, COMMON_STEPS)?;
    Ok(entry)
}

/// Parses a line in the combined log format: the common fields plus quoted
/// referer and user-agent fields and an optional trailing response time.
pub fn combined(line: &str) -> Result<Entry, ParseError> {
    let mut cur = Cursor::new(line);
    let mut entry = Entry::default();
    run_steps(&mut cur, &mut entry, COMMON_STEPS)?;
    run_steps(&mut cur, &mut entry, COMBINED_STEPS)?;
    Ok(entry)
}

/// Executes the rules in order. Strict and non-backtracking: each step either
/// succeeds and advances the cursor, or the whole parse stops with the first
/// error and no partial entry escapes.
fn run_steps(cur: &mut Cursor<'_>, entry: &mut Entry, steps: &[Step]) -> Result<(), ParseError> {
    for step in steps {
        if step.skip_at_eol && cur.at_end() {
            continue;
        }
        if let Some(literal) = step.literal {
            expect(cur, literal)?;
        }
        let raw = next_field(cur, &step.sep)?;
        (step.convert)(entry, raw).map_err(|e| cur.record(e))?;
    }
    Ok(())
}

fn expect(cur: &mut Cursor<'_>, literal: char) -> Result<(), ParseError> {
    let mut buf = [0u8; 4];
    if cur.match_literal(literal.encode_utf8(&mut buf)) {
        return Ok(());
    }
    let err = match cur.advance() {
        Some(found) => ParseError::MalformedField {
            expected: literal,
            found,
            column: cur.column_number() - cur.last_width(),
        },
        None => ParseError::UnexpectedEof { expected: literal },
    };
    Err(cur.record(err))
}

fn next_field<'a>(cur: &mut Cursor<'a>, sep: &Sep) -> Result<&'a str, ParseError> {
    match *sep {
        Sep::Str(s) => cur.span_to(s).ok_or_else(|| {
            cur.record(ParseError::MissingSeparator {
                rest: cur.rest().to_string(),
                separator: s.to_string(),
                line: cur.input().to_string(),
            })
        }),
        Sep::StrOrEol(s) => Ok(cur.span_to(s).unwrap_or_else(|| cur.take_rest())),
    }
}

fn invalid(field: Field, value: &str, source: ValueError) -> ParseError {
    ParseError::InvalidValue {
        field,
        value: value.to_string(),
        source,
    }
}

fn host(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    let ip = raw
        .parse::<IpAddr>()
        .map_err(|e| invalid(Field::Host, raw, e.into()))?;
    entry.host = Some(ip);
    Ok(())
}

fn identity(_: &mut Entry, _: &str) -> Result<(), ParseError> {
    Ok(())
}

fn user(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    entry.user = raw.to_string();
    Ok(())
}

fn timestamp(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    let t = DateTime::parse_from_str(raw, TIME_LAYOUT)
        .map_err(|e| invalid(Field::Timestamp, raw, e.into()))?;
    entry.time = Some(t);
    Ok(())
}

fn http_request(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    let r = request::parse(raw).map_err(|e| invalid(Field::Request, raw, e.into()))?;
    entry.request = Some(r);
    Ok(())
}

fn status(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    entry.status = raw
        .parse::<i32>()
        .map_err(|e| invalid(Field::Status, raw, e.into()))?;
    Ok(())
}

fn bytes(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    entry.bytes = raw
        .parse::<u64>()
        .map_err(|e| invalid(Field::Bytes, raw, e.into()))?;
    Ok(())
}

/// A referer of `-` marks the field absent; an unparseable URL is swallowed
/// and leaves the field absent without failing the line.
fn referer(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    if raw != "-" {
        entry.referer = Url::parse(raw).ok();
    }
    Ok(())
}

fn user_agent(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    entry.user_agent = raw.to_string();
    Ok(())
}

fn response_time(entry: &mut Entry, raw: &str) -> Result<(), ParseError> {
    entry.response_time = raw
        .parse::<f64>()
        .map_err(|e| invalid(Field::ResponseTime, raw, e.into()))?;
    Ok(())
}
