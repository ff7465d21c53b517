//! Console line parser
//!
//! A line holds one or more commands separated by `;`. Words are split on
//! whitespace; double quotes group words and understand `\"`, `\\`, `\n`
//! and `\t`; single quotes group words verbatim.

use crate::command::Command;

/// Parse error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Unclosed quote")]
    UnclosedQuote,

    #[error("Expected a command name, found '{0}'")]
    ExpectedName(String),
}

/// Token type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare or quoted word
    Word { text: String, quoted: bool },
    /// Command separator (;)
    Separator,
}

/// Console line parser
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a line into its commands
    pub fn parse(&self, input: &str) -> Result<Vec<Command>, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let tokens = self.tokenize(input)?;
        let mut commands = Vec::new();
        for group in tokens.split(|t| *t == Token::Separator) {
            if let Some(cmd) = Self::parse_group(group)? {
                commands.push(cmd);
            }
        }

        if commands.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        Ok(commands)
    }

    /// Parse a line that must hold exactly one command
    pub fn parse_one(&self, input: &str) -> Result<Command, ParseError> {
        self.parse(input)?
            .into_iter()
            .next()
            .ok_or(ParseError::EmptyInput)
    }

    fn tokenize(&self, input: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut chars = input.chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                ' ' | '\t' => {
                    chars.next();
                }

                ';' => {
                    chars.next();
                    tokens.push(Token::Separator);
                }

                '"' => {
                    chars.next();
                    let mut word = String::new();
                    let mut closed = false;

                    while let Some(c) = chars.next() {
                        match c {
                            '"' => {
                                closed = true;
                                break;
                            }
                            '\\' => match chars.next() {
                                Some('n') => word.push('\n'),
                                Some('t') => word.push('\t'),
                                Some('\\') => word.push('\\'),
                                Some('"') => word.push('"'),
                                Some(other) => {
                                    word.push('\\');
                                    word.push(other);
                                }
                                None => word.push('\\'),
                            },
                            _ => word.push(c),
                        }
                    }

                    if !closed {
                        return Err(ParseError::UnclosedQuote);
                    }
                    tokens.push(Token::Word { text: word, quoted: true });
                }

                '\'' => {
                    chars.next();
                    let mut word = String::new();
                    let mut closed = false;

                    for c in chars.by_ref() {
                        if c == '\'' {
                            closed = true;
                            break;
                        }
                        word.push(c);
                    }

                    if !closed {
                        return Err(ParseError::UnclosedQuote);
                    }
                    tokens.push(Token::Word { text: word, quoted: true });
                }

                _ => {
                    let mut word = String::new();
                    while let Some(&c) = chars.peek() {
                        if matches!(c, ' ' | '\t' | '"' | '\'' | ';') {
                            break;
                        }
                        word.push(c);
                        chars.next();
                    }
                    tokens.push(Token::Word { text: word, quoted: false });
                }
            }
        }

        Ok(tokens)
    }

    fn parse_group(tokens: &[Token]) -> Result<Option<Command>, ParseError> {
        let mut words = tokens.iter().filter_map(|t| match t {
            Token::Word { text, quoted } => Some((text, *quoted)),
            Token::Separator => None,
        });

        let mut cmd = match words.next() {
            Some((name, false)) => Command::new(name.as_str()),
            Some((name, true)) => return Err(ParseError::ExpectedName(name.clone())),
            None => return Ok(None),
        };
        cmd.args.extend(words.map(|(text, _)| text.clone()));
        Ok(Some(cmd))
    }
}
