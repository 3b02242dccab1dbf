//! Command-list reformatting.
//!
//! The core store answers `/get/command` with a printed list of records,
//! e.g. `[{'id': 1, 'mode': 'shell', 'arguments': 'ls', 'options': ''}]`.
//! Agents expect the compact form `id:mode:arguments`, entries joined by
//! `<||>`. The `options` field is not forwarded.

use thiserror::Error;
use tracing::warn;

use crate::protocol::{LIST_SEP, NO_COMMANDS};

/// A pending command as the agent sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub id: String,
    pub mode: String,
    pub arguments: String,
}

impl CommandRecord {
    fn compact(&self) -> String {
        format!("{}:{}:{}", self.id, self.mode, self.arguments)
    }
}

/// Failure to parse a command list.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid command list at byte {pos}: {message}")]
pub struct ParseError {
    pub pos: usize,
    pub message: String,
}

/// Convert a `/get/command` response body into the agent's compact shape.
///
/// Bodies that do not parse as a record list fall back to the literal
/// substring rewrite the agents were originally served.
pub fn reformat(body: &str) -> String {
    match parse_command_list(body) {
        Ok(records) if records.is_empty() => NO_COMMANDS.to_string(),
        Ok(records) => records
            .iter()
            .map(CommandRecord::compact)
            .collect::<Vec<_>>()
            .join(LIST_SEP),
        Err(e) => {
            warn!(error = %e, "Command list did not parse, using literal rewrite");
            reformat_literal(body)
        }
    }
}

/// Rewrite a printed record list by fixed substring replacement.
///
/// Each replacement applies to its first occurrence within a record only.
/// The output is only meaningful for the exact quoting the core store
/// produced when the agents were written.
pub fn reformat_literal(body: &str) -> String {
    body.split("}, {")
        .map(|chunk| {
            chunk
                .replacen("[{", "", 1)
                .replacen("}]", "", 1)
                .replacen("'id': ", "", 1)
                .replacen(", 'mode': '", ":", 1)
                .replacen("', 'arguments': '", ":", 1)
                .replacen("', 'options': ''", "", 1)
        })
        .collect::<Vec<_>>()
        .join(LIST_SEP)
}

/// Parse a printed list of command records.
///
/// Accepts single- or double-quoted strings, integers, and the bare words
/// `None`, `True`, `False`, `null`, `true`, `false`. Every record needs
/// `id`, `mode` and `arguments`; other keys are ignored.
pub fn parse_command_list(body: &str) -> Result<Vec<CommandRecord>, ParseError> {
    let mut parser = Parser::new(body);
    let records = parser.list()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("trailing characters after list"));
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    Int(String),
    Word(&'static str),
}

impl Literal {
    fn into_text(self) -> String {
        match self {
            Self::Str(s) | Self::Int(s) => s,
            Self::Word(w) => w.to_string(),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            pos: self.pos,
            message: message.into(),
        }
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{want}', found '{c}'"))),
            None => Err(self.error(format!("expected '{want}', found end of input"))),
        }
    }

    /// Consume `close` if it is next; otherwise require a `,` and report
    /// whether a trailing comma was followed by `close`.
    fn list_step(&mut self, close: char) -> Result<bool, ParseError> {
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(true);
        }
        self.expect(',')?;
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn list(&mut self) -> Result<Vec<CommandRecord>, ParseError> {
        self.expect('[')?;
        let mut records = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(records);
        }
        loop {
            records.push(self.record()?);
            if self.list_step(']')? {
                return Ok(records);
            }
        }
    }

    fn record(&mut self) -> Result<CommandRecord, ParseError> {
        self.expect('{')?;
        let start = self.pos;
        let (mut id, mut mode, mut arguments) = (None, None, None);

        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
        } else {
            loop {
                self.skip_ws();
                let key = match self.literal()? {
                    Literal::Str(key) => key,
                    _ => return Err(self.error("record keys must be strings")),
                };
                self.expect(':')?;
                let value = self.literal()?.into_text();
                match key.as_str() {
                    "id" => id = Some(value),
                    "mode" => mode = Some(value),
                    "arguments" => arguments = Some(value),
                    _ => {}
                }
                if self.list_step('}')? {
                    break;
                }
            }
        }

        match (id, mode, arguments) {
            (Some(id), Some(mode), Some(arguments)) => Ok(CommandRecord {
                id,
                mode,
                arguments,
            }),
            _ => Err(ParseError {
                pos: start,
                message: "record is missing id, mode or arguments".into(),
            }),
        }
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                self.string(q).map(Literal::Str)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => Ok(Literal::Int(self.integer()?)),
            Some(c) if c.is_ascii_alphabetic() => self.word(),
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"' | '/')) => out.push(c),
            Some('x') => out.push(self.hex_char(2)?),
            Some('u') => out.push(self.hex_char(4)?),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(self.error("unterminated escape")),
        }
        Ok(())
    }

    fn hex_char(&mut self, digits: usize) -> Result<char, ParseError> {
        let src = self.src;
        let end = self.pos + digits;
        let hex = src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        let c = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos = end;
        Ok(c)
    }

    fn integer(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        if text.is_empty() || text == "-" {
            return Err(self.error("expected digits"));
        }
        Ok(text.to_string())
    }

    fn word(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let word = match &self.src[start..self.pos] {
            "None" | "null" => "None",
            "True" | "true" => "True",
            "False" | "false" => "False",
            other => {
                let message = format!("unknown word '{other}'");
                self.pos = start;
                return Err(self.error(message));
            }
        };
        Ok(Literal::Word(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_COMMANDS: &str = "[{'id': '1', 'mode': 'shell', 'arguments': 'ls', 'options': ''}, \
                                {'id': '2', 'mode': 'shell', 'arguments': 'pwd', 'options': ''}]";

    #[test]
    fn empty_list_means_no_commands() {
        assert_eq!(reformat("[]"), NO_COMMANDS);
        assert_eq!(reformat("[ ]"), NO_COMMANDS);
    }

    #[test]
    fn quoted_ids() {
        assert_eq!(reformat(TWO_COMMANDS), "1:shell:ls<||>2:shell:pwd");
    }

    #[test]
    fn integer_ids() {
        let body = "[{'id': 14, 'mode': 'shell', 'arguments': 'whoami', 'options': ''}]";
        assert_eq!(reformat(body), "14:shell:whoami");
    }

    #[test]
    fn json_shape() {
        let body = r#"[{"id": 3, "mode": "upload", "arguments": "/tmp/a b", "options": null}]"#;
        assert_eq!(reformat(body), "3:upload:/tmp/a b");
    }

    #[test]
    fn arguments_keep_separators_and_escapes() {
        let body = r#"[{'id': 9, 'mode': 'shell', 'arguments': 'echo \'hi\' | cat: x', 'options': ''}]"#;
        assert_eq!(reformat(body), "9:shell:echo 'hi' | cat: x");
    }

    #[test]
    fn key_order_does_not_matter() {
        let body = "[{'options': '', 'arguments': 'id', 'mode': 'shell', 'id': 5}]";
        assert_eq!(reformat(body), "5:shell:id");
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let err = parse_command_list("[{'id': 1, 'mode': 'shell'}]").unwrap_err();
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn trailing_garbage_is_a_parse_error() {
        assert!(parse_command_list("[] extra").is_err());
        assert!(parse_command_list("[{'id': 1").is_err());
    }

    #[test]
    fn literal_rewrite_integer_ids() {
        let body = "[{'id': 1, 'mode': 'shell', 'arguments': 'ls', 'options': ''}, \
                    {'id': 2, 'mode': 'shell', 'arguments': 'pwd', 'options': ''}]";
        assert_eq!(reformat_literal(body), "1:shell:ls<||>2:shell:pwd");
    }

    #[test]
    fn unparseable_body_uses_literal_rewrite() {
        // Unbalanced quote in the arguments defeats the parser.
        let body = "[{'id': 4, 'mode': 'shell', 'arguments': 'it's', 'options': ''}]";
        assert_eq!(reformat(body), "4:shell:it's");
    }
}
