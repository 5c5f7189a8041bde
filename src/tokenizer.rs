//! Splitting an input line into an argument vector and a background flag.
//!
//! Arguments are separated by whitespace. Single or double quotes group text, including
//! whitespace, into one argument; the quotes themselves are removed. A final unquoted `&`
//! argument requests background execution and is not part of the argument vector.

use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenizerError {
    UnterminatedQuote,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnterminatedQuote => {
                f.write_str("Unexpected end of string, quotes are not balanced")
            }
        }
    }
}

impl std::error::Error for TokenizerError {}

/// One argument, and whether any part of it was quoted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tok {
    pub text: String,
    pub quoted: bool,
}

/// Iterates over the arguments of a line.
pub struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Tokenizer {
            chars: line.chars().peekable(),
            failed: false,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Tok, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
        self.chars.peek()?;

        let mut tok = Tok {
            text: String::new(),
            quoted: false,
        };
        while let Some(c) = self.chars.next_if(|c| !c.is_whitespace()) {
            if c != '\'' && c != '"' {
                tok.text.push(c);
                continue;
            }
            tok.quoted = true;
            loop {
                match self.chars.next() {
                    Some(q) if q == c => break,
                    Some(other) => tok.text.push(other),
                    None => {
                        self.failed = true;
                        return Some(Err(TokenizerError::UnterminatedQuote));
                    }
                }
            }
        }
        Some(Ok(tok))
    }
}

/// A line ready for execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub background: bool,
}

/// Tokenize `line`. An empty `argv` means there is nothing to run.
pub fn parse_command_line(line: &str) -> Result<ParsedCommand, TokenizerError> {
    let mut toks = Tokenizer::new(line).collect::<Result<Vec<_>, _>>()?;
    let background = toks.last().is_some_and(|tok| !tok.quoted && tok.text == "&");
    if background {
        toks.pop();
    }
    Ok(ParsedCommand {
        argv: toks.into_iter().map(|tok| tok.text).collect(),
        background,
    })
}
