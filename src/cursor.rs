use crate::error::ParseError;

/// Position-tracking scanner over one line of already-read text.
///
/// Fields in the access-log formats are separated by single spaces except
/// where quoting or bracketing changes the delimiter (the timestamp ends at
/// `] `, the request line at `" `), so the scanner only needs prefix matching
/// and "span to delimiter" jumps, never backtracking.
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    width: usize,
    err: Option<ParseError>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Cursor {
            input,
            pos: 0,
            width: 0,
            err: None,
        }
    }

    /// Consumes and returns the next code point, or `None` at end of input.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.width = c.len_utf8();
        self.pos += self.width;
        Some(c)
    }

    /// Byte width of the most recently consumed code point.
    pub fn last_width(&self) -> usize {
        self.width
    }

    /// 1-based line count of the current position.
    pub fn line_number(&self) -> usize {
        1 + self.input[..self.pos].matches('\n').count()
    }

    /// 1-based column of the current position, counted in bytes from the
    /// last newline.
    pub fn column_number(&self) -> usize {
        match self.input[..self.pos].rfind('\n') {
            Some(i) => self.pos - i,
            None => self.pos + 1,
        }
    }

    /// Consumes `literal` if the remaining input starts with it. No movement
    /// otherwise.
    pub fn match_literal(&mut self, literal: &str) -> bool {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Returns the text up to the first occurrence of `delimiter`, advancing
    /// past the delimiter itself. `None` (no movement) if the delimiter never
    /// occurs in the remainder.
    pub fn span_to(&mut self, delimiter: &str) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let i = rest.find(delimiter)?;
        self.pos += i + delimiter.len();
        Some(&rest[..i])
    }

    /// Like [`span_to`](Self::span_to), but the delimiter is any single code
    /// point drawn from `set`. Only the matched code point is consumed.
    pub fn span_to_any(&mut self, set: &str) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let (i, c) = rest.char_indices().find(|(_, c)| set.contains(*c))?;
        self.pos += i + c.len_utf8();
        Some(&rest[..i])
    }

    /// Remaining unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Consumes and returns everything left on the line.
    pub fn take_rest(&mut self) -> &'a str {
        let rest = &self.input[self.pos..];
        self.pos = self.input.len();
        rest
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The full input this cursor scans.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Latches `err` as this cursor's error unless one is already recorded
    /// (first error wins), and hands it back for propagation.
    pub fn record(&mut self, err: ParseError) -> ParseError {
        if self.err.is_none() {
            self.err = Some(err.clone());
        }
        err
    }

    /// The first error recorded on this cursor, if any.
    pub fn error(&self) -> Option<&ParseError> {
        self.err.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_should_work() {
        let mut cur = Cursor::new("aé!");
        assert_eq!(cur.advance(), Some('a'));
        assert_eq!(cur.last_width(), 1);
        assert_eq!(cur.advance(), Some('é'));
        assert_eq!(cur.last_width(), 2);
        assert_eq!(cur.advance(), Some('!'));
        assert_eq!(cur.advance(), None);
        assert!(cur.at_end());
    }

    #[test]
    fn test_line_and_column_should_work() {
        let mut cur = Cursor::new("ab\ncd");
        assert_eq!(cur.line_number(), 1);
        assert_eq!(cur.column_number(), 1);
        for _ in 0..4 {
            cur.advance();
        }
        // consumed "ab\nc", now sitting after the 'c' on line 2
        assert_eq!(cur.line_number(), 2);
        assert_eq!(cur.column_number(), 2);
    }

    #[test]
    fn test_match_literal_should_work() {
        let mut cur = Cursor::new("GET /");
        assert!(cur.match_literal("GET "));
        assert_eq!(cur.rest(), "/");
        assert!(!cur.match_literal("POST"));
        assert_eq!(cur.rest(), "/");
    }

    #[test]
    fn test_span_to_should_work() {
        let mut cur = Cursor::new("10/Oct/2000] rest");
        assert_eq!(cur.span_to("] "), Some("10/Oct/2000"));
        assert_eq!(cur.rest(), "rest");
        // missing delimiter: no result, no movement
        assert_eq!(cur.span_to("] "), None);
        assert_eq!(cur.rest(), "rest");
    }

    #[test]
    fn test_span_to_any_consumes_single_code_point() {
        let mut cur = Cursor::new("field;next,end");
        assert_eq!(cur.span_to_any(";,"), Some("field"));
        assert_eq!(cur.rest(), "next,end");
        assert_eq!(cur.span_to_any(";,"), Some("next"));
        assert_eq!(cur.rest(), "end");
        assert_eq!(cur.span_to_any(";,"), None);
    }

    #[test]
    fn test_take_rest_should_work() {
        let mut cur = Cursor::new("200 2326");
        cur.span_to(" ");
        assert_eq!(cur.take_rest(), "2326");
        assert!(cur.at_end());
        assert_eq!(cur.take_rest(), "");
    }

    #[test]
    fn test_error_latch_keeps_first_error() {
        let mut cur = Cursor::new("x");
        cur.record(ParseError::UnexpectedEof { expected: '[' });
        cur.record(ParseError::UnexpectedEof { expected: '"' });
        match cur.error() {
            Some(ParseError::UnexpectedEof { expected }) => assert_eq!(*expected, '['),
            other => panic!("unexpected latched error: {:?}", other),
        }
        // probing for positions stays available after an error
        assert_eq!(cur.line_number(), 1);
    }
}
