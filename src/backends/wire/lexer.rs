use crate::error::TextFormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Ident(String),
    Number(String),
    Str(Vec<u8>),
    Symbol(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 12 | 11)
}

#[inline]
fn is_ident(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn parse_until<F: FnMut(u8) -> bool>(buf: &[u8], mut delim: F) -> &[u8] {
    let mut cursor = 0;

    while cursor < buf.len() {
        if delim(buf[cursor]) {
            break;
        } else {
            cursor += 1;
        }
    }

    &buf[..cursor]
}

struct Lexer<'a> {
    buf: &'a [u8],
    cursor: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    fn column(&self) -> usize {
        self.cursor - self.line_start + 1
    }
    
    fn error<S: Into<String>>(&self, msg: S) -> TextFormatError {
        TextFormatError {
            line: self.line,
            column: self.column(),
            msg: msg.into(),
        }
    }
    
    fn advance(&mut self, len: usize) {
        for _ in 0..len {
            if self.buf[self.cursor] == b'\n' {
                self.line += 1;
                self.line_start = self.cursor + 1;
            }
            
            self.cursor += 1;
        }
    }
    
    fn skip_whitespace_and_comments(&mut self) {
        while self.cursor < self.buf.len() {
            let c = self.buf[self.cursor];
            
            if is_whitespace(c) {
                self.advance(1);
            } else if c == b'#' {
                let comment = parse_until(&self.buf[self.cursor..], |x| x == b'\n');
                self.advance(comment.len());
            } else {
                break;
            }
        }
    }
    
    fn string(&mut self, quote: u8) -> Result<Vec<u8>, TextFormatError> {
        let mut content = Vec::new();
        self.advance(1);
        
        loop {
            let c = match self.buf.get(self.cursor) {
                Some(b'\n') | None => return Err(self.error("Unterminated string literal")),
                Some(c) => *c,
            };
            
            if c == quote {
                self.advance(1);
                return Ok(content);
            }
            
            if c != b'\\' {
                content.push(c);
                self.advance(1);
                continue;
            }
            
            let escape = match self.buf.get(self.cursor + 1) {
                Some(escape) => *escape,
                None => return Err(self.error("Unterminated string literal")),
            };
            
            match escape {
                b'n' => content.push(b'\n'),
                b'r' => content.push(b'\r'),
                b't' => content.push(b'\t'),
                b'a' => content.push(7),
                b'b' => content.push(8),
                b'f' => content.push(12),
                b'v' => content.push(11),
                b'\\' | b'\'' | b'"' | b'?' => content.push(escape),
                b'x' | b'X' => {
                    let digits = parse_until(&self.buf[self.cursor + 2..], |x| !x.is_ascii_hexdigit());
                    let digits = &digits[..digits.len().min(2)];
                    
                    if digits.is_empty() {
                        return Err(self.error("Expected hex digits after \\x"));
                    }
                    
                    let value = digits.iter().fold(0u8, |acc, d| acc * 16 + (*d as char).to_digit(16).unwrap_or(0) as u8);
                    content.push(value);
                    self.advance(2 + digits.len());
                    continue;
                },
                b'0'..=b'7' => {
                    let digits = parse_until(&self.buf[self.cursor + 1..], |x| !(b'0'..=b'7').contains(&x));
                    let digits = &digits[..digits.len().min(3)];
                    let value = digits.iter().fold(0u32, |acc, d| acc * 8 + (*d - b'0') as u32);
                    
                    if value > 255 {
                        return Err(self.error("Octal escape out of range"));
                    }
                    
                    content.push(value as u8);
                    self.advance(1 + digits.len());
                    continue;
                },
                _ => return Err(self.error(format!("Invalid escape sequence \\{}", escape as char))),
            }
            
            self.advance(2);
        }
    }
    
    fn next_token(&mut self) -> Result<Option<Spanned>, TextFormatError> {
        self.skip_whitespace_and_comments();
        
        let c = match self.buf.get(self.cursor) {
            Some(c) => *c,
            None => return Ok(None),
        };
        let line = self.line;
        let column = self.column();
        
        let token = match c {
            b'"' | b'\'' => Token::Str(self.string(c)?),
            b'{' | b'}' | b'<' | b'>' | b'[' | b']' | b':' | b';' | b',' | b'-' => {
                self.advance(1);
                Token::Symbol(c)
            },
            c if c.is_ascii_digit() => {
                let content = parse_until(&self.buf[self.cursor..], |x| !is_ident(x));
                let content = String::from_utf8_lossy(content).into_owned();
                self.advance(content.len());
                Token::Number(content)
            },
            c if is_ident(c) => {
                let content = parse_until(&self.buf[self.cursor..], |x| !is_ident(x));
                let content = String::from_utf8_lossy(content).into_owned();
                self.advance(content.len());
                Token::Ident(content)
            },
            c => return Err(self.error(format!("Unexpected character '{}'", c.escape_ascii()))),
        };
        
        Ok(Some(Spanned {
            token,
            line,
            column,
        }))
    }
}

/// Split text format into tokens. Also returns the position right after the last character.
pub(crate) fn tokenize(text: &str) -> Result<(Vec<Spanned>, (usize, usize)), TextFormatError> {
    let mut lexer = Lexer {
        buf: text.as_bytes(),
        cursor: 0,
        line: 1,
        line_start: 0,
    };
    let mut tokens = Vec::new();
    
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    
    Ok((tokens, (lexer.line, lexer.column())))
}
