use super::{Keyword, SourceToken, Symbol, Token, TokenizedProgram};
use crate::error::{LexError, LexErrorKind};
use std::iter::Peekable;
use std::str::CharIndices;

/// Largest value an integer constant may have.
pub const MAX_INTEGER_CONSTANT: u16 = 32767;

/// How many characters of source a lexical error quotes.
const SNIPPET_LENGTH: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum TokenizerState {
    /// Used when we are traversing through whitespace.
    LookingForToken,
    /// Used when we are inside double quotes.
    StringLiteral,
    IntegerLiteral,
    KeywordOrIdentifier,
    LineComment,
    /// Used for the asterisk right after the slash that opened a block comment, so that `/*/`
    /// does not count as a complete comment.
    BlockCommentOpening,
    BlockComment,
    /// Used when BlockComment sees a * that might end the block.
    BlockComment2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Position {
    offset: usize,
    line: usize,
    col: usize,
}

pub struct Tokenizer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Line and column of the character that will be processed next.
    line: usize,
    col: usize,
    state: TokenizerState,
    /// Used when reading literals, keywords and identifiers.
    buffer: String,
    /// Where the token currently being built started.
    token_start: Position,
    finished: bool,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            col: 1,
            state: TokenizerState::LookingForToken,
            buffer: String::new(),
            token_start: Position {
                offset: 0,
                line: 1,
                col: 1,
            },
            finished: false,
        }
    }

    fn finish_integer_literal(&mut self) -> Result<Token, LexErrorKind> {
        let literal_text = std::mem::take(&mut self.buffer);
        self.state = TokenizerState::LookingForToken;
        // A run of digits only fails to parse when it overflows, which is out of range anyway.
        match literal_text.parse::<u16>() {
            Ok(value) if value <= MAX_INTEGER_CONSTANT => Ok(Token::IntegerConstant(value)),
            _ => Err(LexErrorKind::IntegerOutOfRange(literal_text)),
        }
    }

    fn finish_keyword_or_identifier(&mut self) -> Token {
        let token = if let Some(keyword) = Keyword::from_text(&self.buffer) {
            // Clear the buffer and use the detected keyword.
            self.buffer.clear();
            Token::Keyword(keyword)
        } else {
            // Take the identifier out of the buffer, leaving behind an empty string.
            Token::Identifier(std::mem::take(&mut self.buffer))
        };
        // Go back to looking for tokens.
        self.state = TokenizerState::LookingForToken;
        token
    }

    /// Ends a literal, keyword or identifier once the next character can no longer be part of
    /// it.
    fn end_run_before(&mut self, next: Option<char>) -> Result<Option<Token>, LexErrorKind> {
        use TokenizerState::*;
        match self.state {
            IntegerLiteral if !matches!(next, Some('0'..='9')) => {
                self.finish_integer_literal().map(Some)
            }
            KeywordOrIdentifier if !next.is_some_and(is_identifier_char) => {
                Ok(Some(self.finish_keyword_or_identifier()))
            }
            _ => Ok(None),
        }
    }

    fn process_char(&mut self, c: char, next: Option<char>) -> Result<Option<Token>, LexErrorKind> {
        use TokenizerState::*;
        match self.state {
            LookingForToken => match c {
                ' ' | '\t' | '\r' | '\n' => (),
                '0'..='9' => {
                    self.buffer.push(c);
                    self.state = IntegerLiteral;
                    return self.end_run_before(next);
                }
                'a'..='z' | 'A'..='Z' | '_' => {
                    self.buffer.push(c);
                    self.state = KeywordOrIdentifier;
                    return self.end_run_before(next);
                }
                '"' => {
                    // The quote itself is not part of the contents of the string literal.
                    self.state = StringLiteral;
                }
                '/' => {
                    // Check if this is just a division operator or if we are starting a comment.
                    match next {
                        Some('*') => self.state = BlockCommentOpening,
                        Some('/') => self.state = LineComment,
                        _ => return Ok(Some(Token::Symbol(Symbol::ForwardSlash))),
                    }
                }
                _ => {
                    let mut text = [0u8; 4];
                    return match Symbol::from_text(c.encode_utf8(&mut text)) {
                        Some(symbol) => Ok(Some(Token::Symbol(symbol))),
                        None => Err(LexErrorKind::UnexpectedCharacter(c)),
                    };
                }
            },
            StringLiteral => match c {
                '\n' => return Err(LexErrorKind::NewlineInString),
                '"' => {
                    // Take the string content out of the buffer, leaving behind an empty string.
                    let contents = std::mem::take(&mut self.buffer);
                    self.state = LookingForToken;
                    return Ok(Some(Token::StringConstant(contents)));
                }
                _ => self.buffer.push(c),
            },
            IntegerLiteral | KeywordOrIdentifier => {
                self.buffer.push(c);
                return self.end_run_before(next);
            }
            LineComment => {
                if c == '\n' {
                    self.state = LookingForToken;
                }
            }
            BlockCommentOpening => self.state = BlockComment,
            BlockComment => {
                // If there is an asterisk, it might have a slash after it ending the comment.
                if c == '*' {
                    self.state = BlockComment2;
                }
            }
            BlockComment2 => match c {
                // There is just another asterisk. This one still might have a slash after it.
                '*' => (),
                '/' => self.state = LookingForToken,
                // The asterisk was a red herring, comment continues.
                _ => self.state = BlockComment,
            },
        }
        Ok(None)
    }

    /// Called when the end of the input is reached. Literals and identifiers are always closed
    /// by `end_run_before`, so only strings and comments can still be open here.
    fn process_eof(&mut self) -> Result<(), LexErrorKind> {
        use TokenizerState::*;
        let res = match self.state {
            LookingForToken | LineComment | IntegerLiteral | KeywordOrIdentifier => Ok(()),
            StringLiteral => Err(LexErrorKind::UnterminatedString),
            BlockCommentOpening | BlockComment | BlockComment2 => {
                Err(LexErrorKind::UnterminatedBlockComment)
            }
        };
        self.state = LookingForToken;
        res
    }

    fn error_at(&self, kind: LexErrorKind) -> LexError {
        let start = self.token_start;
        LexError {
            offset: start.offset,
            line: start.line,
            col: start.col,
            snippet: self.input[start.offset..]
                .chars()
                .take(SNIPPET_LENGTH)
                .collect(),
            kind,
        }
    }

    fn next_token(&mut self) -> Option<Result<SourceToken, LexError>> {
        if self.finished {
            return None;
        }
        while let Some((offset, c)) = self.chars.next() {
            let here = Position {
                offset,
                line: self.line,
                col: self.col,
            };
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            if self.state == TokenizerState::LookingForToken {
                self.token_start = here;
            }
            let next = self.chars.peek().map(|&(_, next)| next);
            match self.process_char(c, next) {
                Ok(Some(token)) => {
                    let start = self.token_start;
                    return Some(Ok(SourceToken {
                        token,
                        offset: start.offset,
                        line: start.line,
                        col: start.col,
                    }));
                }
                Ok(None) => (),
                Err(kind) => {
                    self.finished = true;
                    return Some(Err(self.error_at(kind)));
                }
            }
        }
        self.finished = true;
        match self.process_eof() {
            Ok(()) => None,
            Err(kind) => Some(Err(self.error_at(kind))),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<SourceToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Converts a whole compilation unit into tokens, stopping at the first lexical error.
pub fn tokenize(program: &str) -> Result<TokenizedProgram, LexError> {
    let tokens = Tokenizer::new(program).collect::<Result<Vec<_>, _>>()?;
    log::debug!("tokenized {} bytes into {} tokens", program.len(), tokens.len());
    Ok(TokenizedProgram { tokens })
}
