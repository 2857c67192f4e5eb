//! Delimited-text row codec
//!
//! One row per line, fields separated by `,`. A field containing a comma,
//! a double quote, CR or LF is wrapped in double quotes with embedded quotes
//! doubled. The reader accepts LF, CRLF and lone CR line endings, quoted
//! line breaks, and skips blank lines.
//!
//! # Format
//!
//! ```text
//! timestamp,factory_area,violation_type
//! 01/02/24 09:15 AM,"KP2,Jabar",NoHelmet
//! 01/02/24 09:20 AM,Gate,"says ""stop"""
//! ```

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Field separator
pub const DELIMITER: char = ',';
/// Quote character
pub const QUOTE: char = '"';

/// Row-level decoding failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Input ended inside a quoted field
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote {
        /// 1-based line on which the row starts
        line: usize,
    },

    /// Characters after a closing quote, before the next separator
    #[error("line {line}: unexpected character {found:?} after closing quote")]
    TrailingAfterQuote {
        /// 1-based line of the offending character
        line: usize,
        /// The character found
        found: char,
    },
}

impl RowError {
    /// Line the error refers to
    pub fn line(&self) -> usize {
        match self {
            RowError::UnterminatedQuote { line } | RowError::TrailingAfterQuote { line, .. } => *line,
        }
    }
}

/// One decoded row and the line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    /// 1-based line number of the row's first character
    pub line: usize,
    /// Field values, unescaped
    pub fields: Vec<String>,
}

fn needs_quoting(field: &str) -> bool {
    field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r')
}

/// Encode one row, without a line terminator
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        let field = field.as_ref();
        if needs_quoting(field) {
            out.push(QUOTE);
            for c in field.chars() {
                if c == QUOTE {
                    out.push(QUOTE);
                }
                out.push(c);
            }
            out.push(QUOTE);
        } else {
            out.push_str(field);
        }
    }
    out
}

/// Streaming row decoder over a complete document
///
/// Yields rows in order. After the first error the reader is exhausted.
pub struct RowReader<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    failed: bool,
}

impl<'a> RowReader<'a> {
    /// Decode rows from `input`
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            failed: false,
        }
    }

    /// Consume a line terminator whose first character was already taken
    fn finish_line(&mut self, first: char) {
        if first == '\r' && self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
        self.line += 1;
    }

    /// Read one row. Returns the fields and whether the line was blank.
    fn read_row(&mut self) -> Result<(Vec<String>, bool), RowError> {
        let start = self.line;
        let mut fields = Vec::new();
        let mut blank = true;

        loop {
            let mut field = String::new();

            if self.chars.peek() == Some(&QUOTE) {
                blank = false;
                self.chars.next();
                loop {
                    match self.chars.next() {
                        None => return Err(RowError::UnterminatedQuote { line: start }),
                        Some(QUOTE) => {
                            if self.chars.peek() == Some(&QUOTE) {
                                self.chars.next();
                                field.push(QUOTE);
                            } else {
                                break;
                            }
                        }
                        Some(c) => {
                            if c == '\n' {
                                self.line += 1;
                            }
                            field.push(c);
                        }
                    }
                }
            } else {
                while let Some(&c) = self.chars.peek() {
                    if c == DELIMITER || c == '\n' || c == '\r' {
                        break;
                    }
                    blank = false;
                    field.push(c);
                    self.chars.next();
                }
            }

            match self.chars.next() {
                Some(DELIMITER) => {
                    blank = false;
                    fields.push(field);
                }
                Some(c @ ('\n' | '\r')) => {
                    self.finish_line(c);
                    fields.push(field);
                    return Ok((fields, blank));
                }
                None => {
                    fields.push(field);
                    return Ok((fields, blank));
                }
                Some(found) => {
                    return Err(RowError::TrailingAfterQuote {
                        line: self.line,
                        found,
                    })
                }
            }
        }
    }
}

impl Iterator for RowReader<'_> {
    type Item = Result<DecodedRow, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.chars.peek()?;
            let line = self.line;
            match self.read_row() {
                Ok((_, true)) => continue,
                Ok((fields, false)) => return Some(Ok(DecodedRow { line, fields })),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decode every row of `input`
pub fn decode_rows(input: &str) -> Result<Vec<DecodedRow>, RowError> {
    RowReader::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(input: &str) -> Vec<Vec<String>> {
        decode_rows(input)
            .unwrap()
            .into_iter()
            .map(|r| r.fields)
            .collect()
    }

    #[test]
    fn test_encode_plain() {
        assert_eq!(encode_row(&["a", "b", ""]), "a,b,");
    }

    #[test]
    fn test_encode_quotes_when_needed() {
        assert_eq!(encode_row(&["KP2,Jabar"]), "\"KP2,Jabar\"");
        assert_eq!(encode_row(&["say \"hi\""]), "\"say \"\"hi\"\"\"");
        assert_eq!(encode_row(&["two\nlines"]), "\"two\nlines\"");
        assert_eq!(encode_row(&["cr\rhere"]), "\"cr\rhere\"");
    }

    #[test]
    fn test_decode_simple() {
        assert_eq!(
            fields("a,b,c\n1,2,3\n"),
            vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]
        );
    }

    #[test]
    fn test_decode_without_trailing_newline() {
        assert_eq!(fields("a,b"), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_decode_crlf_and_blank_lines() {
        assert_eq!(
            fields("a,b\r\n\r\n\nc,d\r\n"),
            vec![vec!["a", "b"], vec!["c", "d"]]
        );
    }

    #[test]
    fn test_decode_empty_fields() {
        assert_eq!(fields(",,\n"), vec![vec!["", "", ""]]);
    }

    #[test]
    fn test_decode_quoted() {
        let rows = fields("\"KP2,Jabar\",\"say \"\"hi\"\"\",\"multi\nline\"\nnext,row\n");
        assert_eq!(rows[0], vec!["KP2,Jabar", "say \"hi\"", "multi\nline"]);
        assert_eq!(rows[1], vec!["next", "row"]);
    }

    #[test]
    fn test_line_numbers_account_for_quoted_newlines() {
        let rows = decode_rows("h\n\"a\nb\"\nc\n").unwrap();
        assert_eq!(rows.iter().map(|r| r.line).collect::<Vec<_>>(), vec![1, 2, 4]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = decode_rows("ok\n\"never closed,x\n").unwrap_err();
        assert_eq!(err, RowError::UnterminatedQuote { line: 2 });
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_trailing_after_quote() {
        let err = decode_rows("\"a\"b,c\n").unwrap_err();
        assert!(matches!(err, RowError::TrailingAfterQuote { found: 'b', .. }));
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = RowReader::new("\"x\"y\nok\n");
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_round_trip_awkward_fields() {
        let row = vec![
            "plain".to_string(),
            "".to_string(),
            "comma, inside".to_string(),
            "\"quoted\"".to_string(),
            "line\nbreak".to_string(),
            "crlf\r\nbreak".to_string(),
        ];
        let encoded = format!("{}\n", encode_row(&row));
        assert_eq!(fields(&encoded), vec![row]);
    }
}
