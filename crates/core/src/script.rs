//! Dialect-aware DDL script splitting.
//!
//! A single-pass lexer walks the script and emits one entry per top-level
//! `;`-terminated statement. Comments are consumed. Quoted regions
//! (single-quoted literals with `''` escapes, double-quoted identifiers,
//! MySQL backtick identifiers, SQL Server bracket identifiers, PostgreSQL
//! dollar-quoted bodies) are copied verbatim, so a separator inside them
//! never splits.
//!
//! Known limitations: SQL Server's `GO` batch separator and Oracle's
//! `/` PL/SQL terminator are not recognised; scripts using them must be
//! preprocessed externally.

use crate::DialectKind;

/// Splits DDL source into executable statements, trimmed and non-empty,
/// in script order.
#[must_use]
pub fn split_script(dialect: DialectKind, source: &str) -> Vec<String> {
    Splitter::new(dialect, source).run()
}

struct Splitter {
    dialect: DialectKind,
    chars: Vec<char>,
    pos: usize,
    current: String,
    statements: Vec<String>,
}

impl Splitter {
    fn new(dialect: DialectKind, source: &str) -> Self {
        Self {
            dialect,
            chars: source.chars().collect(),
            pos: 0,
            current: String::new(),
            statements: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<String> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            match ch {
                '-' if self.peek(1) == Some('-') => self.consume_line_comment(),
                '/' if self.peek(1) == Some('*') => self.consume_block_comment(),
                '$' if self.dialect == DialectKind::Postgres => self.copy_dollar_quoted(),
                '\'' => self.copy_single_quoted(),
                '"' => self.copy_delimited('"'),
                '`' if self.dialect == DialectKind::Mysql => self.copy_delimited('`'),
                '[' if self.dialect == DialectKind::Mssql => self.copy_bracketed(),
                ';' => {
                    self.pos += 1;
                    self.emit();
                }
                _ => {
                    self.current.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.emit();
        self.statements
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn emit(&mut self) {
        let statement = self.current.trim();
        if !statement.is_empty() {
            self.statements.push(statement.to_string());
        }
        self.current.clear();
    }

    fn consume_line_comment(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
        // The newline itself is kept so adjacent tokens stay separated.
    }

    fn consume_block_comment(&mut self) {
        // PostgreSQL block comments nest; the other engines end at the first
        // terminator.
        let nests = self.dialect == DialectKind::Postgres;
        let mut depth = 1;
        self.pos += 2;
        while self.pos < self.chars.len() && depth > 0 {
            if self.chars[self.pos] == '/' && self.peek(1) == Some('*') && nests {
                depth += 1;
                self.pos += 2;
            } else if self.chars[self.pos] == '*' && self.peek(1) == Some('/') {
                depth -= 1;
                self.pos += 2;
            } else {
                self.pos += 1;
            }
        }
        // Keep tokens on either side of the comment separated.
        self.current.push(' ');
    }

    /// At a `$`: scan forward for the closing `$` of the tag. When the
    /// characters between form a valid tag (`$$`, `$body$`, ...), copy
    /// verbatim through the next identical tag; otherwise the `$` is an
    /// ordinary character.
    fn copy_dollar_quoted(&mut self) {
        let Some(tag_len) = self.dollar_tag_length() else {
            self.current.push('$');
            self.pos += 1;
            return;
        };

        let tag: String = self.chars[self.pos..self.pos + tag_len].iter().collect();
        self.current.push_str(&tag);
        self.pos += tag_len;

        while self.pos < self.chars.len() {
            if self.chars[self.pos] == '$' && self.matches_tag(&tag) {
                self.current.push_str(&tag);
                self.pos += tag_len;
                return;
            }
            self.current.push(self.chars[self.pos]);
            self.pos += 1;
        }
    }

    fn dollar_tag_length(&self) -> Option<usize> {
        let mut offset = 1;
        loop {
            match self.peek(offset) {
                Some('$') => return Some(offset + 1),
                Some(ch) if ch.is_alphanumeric() || ch == '_' => offset += 1,
                _ => return None,
            }
        }
    }

    fn matches_tag(&self, tag: &str) -> bool {
        let tag_chars: Vec<char> = tag.chars().collect();
        self.chars[self.pos..]
            .iter()
            .take(tag_chars.len())
            .copied()
            .eq(tag_chars)
    }

    fn copy_single_quoted(&mut self) {
        self.current.push('\'');
        self.pos += 1;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == '\'' {
                // An adjacent pair is an escaped quote, not a terminator.
                if self.peek(1) == Some('\'') {
                    self.current.push_str("''");
                    self.pos += 2;
                    continue;
                }
                self.current.push('\'');
                self.pos += 1;
                return;
            }
            self.current.push(ch);
            self.pos += 1;
        }
    }

    fn copy_delimited(&mut self, delimiter: char) {
        self.current.push(delimiter);
        self.pos += 1;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            self.current.push(ch);
            self.pos += 1;
            if ch == delimiter {
                return;
            }
        }
    }

    fn copy_bracketed(&mut self) {
        self.current.push('[');
        self.pos += 1;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            self.current.push(ch);
            self.pos += 1;
            if ch == ']' {
                return;
            }
        }
    }
}
