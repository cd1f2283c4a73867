//! Tokenizer for the PDF file grammar.
//!
//! Pull-based lexer over a seekable byte source. Positions are tracked
//! exactly: parse errors carry the byte offset they occurred at, and the
//! object parser relies on [`Lexer::position`] to record stream offsets.

use crate::error::{PdfError, Result};
use std::io::{Read, Seek, SeekFrom};

/// Whitespace per the PDF grammar: NUL, tab, LF, FF, CR, space.
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Delimiters terminate names, numbers and keywords.
pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// A lexical token of the PDF grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Literal or hexadecimal string, already decoded to raw bytes.
    String(Vec<u8>),
    /// Name with `#xx` escapes resolved.
    Name(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    Null,
    Obj,
    EndObj,
    Stream,
    EndStream,
    Xref,
    Trailer,
    StartXref,
    /// The `R` marker completing an indirect reference.
    RefMarker,
    /// Any other bare keyword, e.g. the `n`/`f` markers of a classic table.
    Keyword(String),
    Eof,
}

impl Token {
    /// Token rendering used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Boolean(b) => b.to_string(),
            Token::Integer(i) => i.to_string(),
            Token::Real(r) => r.to_string(),
            Token::String(_) => "string".to_string(),
            Token::Name(n) => format!("/{n}"),
            Token::ArrayStart => "[".to_string(),
            Token::ArrayEnd => "]".to_string(),
            Token::DictStart => "<<".to_string(),
            Token::DictEnd => ">>".to_string(),
            Token::Null => "null".to_string(),
            Token::Obj => "obj".to_string(),
            Token::EndObj => "endobj".to_string(),
            Token::Stream => "stream".to_string(),
            Token::EndStream => "endstream".to_string(),
            Token::Xref => "xref".to_string(),
            Token::Trailer => "trailer".to_string(),
            Token::StartXref => "startxref".to_string(),
            Token::RefMarker => "R".to_string(),
            Token::Keyword(k) => k.clone(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// Tokenizer over a seekable byte source.
pub struct Lexer<R> {
    reader: R,
    /// Bytes consumed from the underlying reader.
    pos: u64,
    peeked: Option<u8>,
    /// Pushed-back tokens with the position they started at.
    token_buffer: Vec<(Token, u64)>,
}

impl<R: Read + Seek> Lexer<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let pos = reader.stream_position()?;
        Ok(Self {
            reader,
            pos,
            peeked: None,
            token_buffer: Vec::new(),
        })
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Logical read position: the offset of the next unconsumed byte.
    pub fn position(&self) -> u64 {
        if let Some((_, pos)) = self.token_buffer.last() {
            return *pos;
        }
        self.pos - self.peeked.map_or(0, |_| 1)
    }

    /// Reposition the source, discarding any lookahead.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        self.peeked = None;
        self.token_buffer.clear();
        Ok(())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8; 1];
            match self.reader.read(&mut buf)? {
                0 => return Ok(None),
                _ => {
                    self.pos += 1;
                    self.peeked = Some(buf[0]);
                }
            }
        }
        Ok(self.peeked)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf)? {
            0 => Ok(None),
            _ => {
                self.pos += 1;
                Ok(Some(buf[0]))
            }
        }
    }

    fn require_byte(&mut self) -> Result<u8> {
        let position = self.position();
        self.read_byte()?
            .ok_or(PdfError::UnexpectedEof { position })
    }

    /// Read exactly `count` raw bytes starting at the logical position.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        debug_assert!(self.token_buffer.is_empty(), "raw read past pushed tokens");
        let mut data = Vec::with_capacity(count);
        if count == 0 {
            return Ok(data);
        }
        if let Some(b) = self.peeked.take() {
            data.push(b);
        }
        let remaining = count - data.len();
        if remaining > 0 {
            let start = data.len();
            data.resize(count, 0);
            self.reader.read_exact(&mut data[start..]).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    PdfError::UnexpectedEof { position: self.pos }
                } else {
                    PdfError::Io(e)
                }
            })?;
            self.pos += remaining as u64;
        }
        Ok(data)
    }

    /// Consume the end-of-line marker after the `stream` keyword: LF or
    /// CRLF, never a bare CR.
    pub fn read_stream_eol(&mut self) -> Result<()> {
        let position = self.position();
        match self.read_byte()? {
            Some(b'\n') => Ok(()),
            Some(b'\r') => match self.read_byte()? {
                Some(b'\n') => Ok(()),
                _ => Err(PdfError::UnexpectedToken {
                    position,
                    expected: "line feed after carriage return",
                    found: "bare carriage return".to_string(),
                }),
            },
            Some(other) => Err(PdfError::UnexpectedToken {
                position,
                expected: "end-of-line after 'stream'",
                found: (other as char).to_string(),
            }),
            None => Err(PdfError::UnexpectedEof { position }),
        }
    }

    pub fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            match self.peek_byte()? {
                Some(b) if is_whitespace(b) => {
                    self.read_byte()?;
                }
                Some(b'%') => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        while let Some(b) = self.read_byte()? {
            if b == b'\n' || b == b'\r' {
                break;
            }
        }
        Ok(())
    }

    /// Push a token back; it is returned by the next [`Lexer::next_token`].
    pub fn push_token(&mut self, token: Token, position: u64) {
        self.token_buffer.push((token, position));
    }

    /// The next token together with its starting byte offset.
    pub fn next_token_at(&mut self) -> Result<(Token, u64)> {
        if let Some(entry) = self.token_buffer.pop() {
            return Ok(entry);
        }

        self.skip_whitespace()?;
        let position = self.position();

        let byte = match self.peek_byte()? {
            Some(b) => b,
            None => return Ok((Token::Eof, position)),
        };

        let token = match byte {
            b'/' => self.read_name()?,
            b'(' => self.read_literal_string()?,
            b'<' => self.read_angle_bracket()?,
            b'>' => {
                self.read_byte()?;
                match self.read_byte()? {
                    Some(b'>') => Token::DictEnd,
                    _ => {
                        return Err(PdfError::UnexpectedToken {
                            position,
                            expected: ">> dictionary end",
                            found: ">".to_string(),
                        })
                    }
                }
            }
            b'[' => {
                self.read_byte()?;
                Token::ArrayStart
            }
            b']' => {
                self.read_byte()?;
                Token::ArrayEnd
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(position)?,
            b if b.is_ascii_alphabetic() => self.read_keyword()?,
            other => {
                return Err(PdfError::UnexpectedToken {
                    position,
                    expected: "token",
                    found: (other as char).to_string(),
                })
            }
        };
        Ok((token, position))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.next_token_at().map(|(token, _)| token)
    }

    fn read_number(&mut self, position: u64) -> Result<Token> {
        let mut text = String::new();
        if let Some(b @ (b'+' | b'-')) = self.peek_byte()? {
            self.read_byte()?;
            text.push(b as char);
        }
        let mut is_real = false;
        while let Some(b) = self.peek_byte()? {
            match b {
                b'0'..=b'9' => {
                    self.read_byte()?;
                    text.push(b as char);
                }
                b'.' if !is_real => {
                    self.read_byte()?;
                    is_real = true;
                    text.push('.');
                }
                _ => break,
            }
        }
        if text.is_empty() || text == "+" || text == "-" || text == "." {
            return Err(PdfError::UnexpectedToken {
                position,
                expected: "number",
                found: text,
            });
        }
        if is_real {
            let value: f64 = text.parse().map_err(|_| PdfError::ValueOutOfRange(text))?;
            Ok(Token::Real(value))
        } else {
            let value: i64 = text.parse().map_err(|_| PdfError::ValueOutOfRange(text))?;
            Ok(Token::Integer(value))
        }
    }

    fn read_literal_string(&mut self) -> Result<Token> {
        self.read_byte()?; // consume '('
        let mut bytes = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self.require_byte()?;
            match b {
                b'(' => {
                    depth += 1;
                    bytes.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    bytes.push(b);
                }
                b'\\' => {
                    let escaped = self.require_byte()?;
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b'r' => bytes.push(b'\r'),
                        b't' => bytes.push(b'\t'),
                        b'b' => bytes.push(0x08),
                        b'f' => bytes.push(0x0C),
                        b'(' | b')' | b'\\' => bytes.push(escaped),
                        b'\r' => {
                            // Line continuation; swallow an optional LF too
                            if self.peek_byte()? == Some(b'\n') {
                                self.read_byte()?;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut code = (escaped - b'0') as u16;
                            for _ in 0..2 {
                                match self.peek_byte()? {
                                    Some(d @ b'0'..=b'7') => {
                                        self.read_byte()?;
                                        code = code * 8 + (d - b'0') as u16;
                                    }
                                    _ => break,
                                }
                            }
                            bytes.push((code & 0xFF) as u8);
                        }
                        // Unknown escape: the backslash is dropped
                        other => bytes.push(other),
                    }
                }
                // End-of-line inside a string is recorded as a line feed
                b'\r' => {
                    if self.peek_byte()? == Some(b'\n') {
                        self.read_byte()?;
                    }
                    bytes.push(b'\n');
                }
                other => bytes.push(other),
            }
        }
        Ok(Token::String(bytes))
    }

    fn read_angle_bracket(&mut self) -> Result<Token> {
        let position = self.position();
        self.read_byte()?; // consume '<'
        if self.peek_byte()? == Some(b'<') {
            self.read_byte()?;
            return Ok(Token::DictStart);
        }
        // Hex string
        let mut bytes = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            let b = self.require_byte()?;
            let digit = match b {
                b'>' => break,
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                b if is_whitespace(b) => continue,
                other => {
                    return Err(PdfError::UnexpectedToken {
                        position,
                        expected: "hexadecimal digit",
                        found: (other as char).to_string(),
                    })
                }
            };
            match pending.take() {
                Some(high) => bytes.push((high << 4) | digit),
                None => pending = Some(digit),
            }
        }
        // Odd digit count: final digit is padded with zero
        if let Some(high) = pending {
            bytes.push(high << 4);
        }
        Ok(Token::String(bytes))
    }

    fn read_name(&mut self) -> Result<Token> {
        let position = self.position();
        self.read_byte()?; // consume '/'
        // Escapes and raw high bytes both contribute UTF-8 sequences, so
        // the bytes are collected first and decoded as one unit
        let mut bytes = Vec::new();
        while let Some(b) = self.peek_byte()? {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.read_byte()?;
            if b == b'#' {
                let hi = self.require_byte()?;
                let lo = self.require_byte()?;
                let decode = |d: u8| -> Result<u8> {
                    match d {
                        b'0'..=b'9' => Ok(d - b'0'),
                        b'a'..=b'f' => Ok(d - b'a' + 10),
                        b'A'..=b'F' => Ok(d - b'A' + 10),
                        other => Err(PdfError::UnexpectedToken {
                            position,
                            expected: "hexadecimal digit in name escape",
                            found: (other as char).to_string(),
                        }),
                    }
                };
                bytes.push((decode(hi)? << 4) | decode(lo)?);
            } else {
                bytes.push(b);
            }
        }
        Ok(Token::Name(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn read_keyword(&mut self) -> Result<Token> {
        let mut word = String::new();
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_alphanumeric() && b != b'*' {
                break;
            }
            self.read_byte()?;
            word.push(b as char);
        }
        let token = match word.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "obj" => Token::Obj,
            "endobj" => Token::EndObj,
            "stream" => Token::Stream,
            "endstream" => Token::EndStream,
            "xref" => Token::Xref,
            "trailer" => Token::Trailer,
            "startxref" => Token::StartXref,
            "R" => Token::RefMarker,
            _ => Token::Keyword(word),
        };
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lex_all(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(Cursor::new(input.to_vec())).unwrap();
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_all(b"42 -17 +3 3.14 -0.5 .25 4."),
            vec![
                Token::Integer(42),
                Token::Integer(-17),
                Token::Integer(3),
                Token::Real(3.14),
                Token::Real(-0.5),
                Token::Real(0.25),
                Token::Real(4.0),
            ]
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(
            lex_all(b"(Hello \\(nested\\) \\n\\t \\101)"),
            vec![Token::String(b"Hello (nested) \n\t A".to_vec())]
        );
    }

    #[test]
    fn test_literal_string_balanced_parens() {
        assert_eq!(
            lex_all(b"(a (b (c) d) e)"),
            vec![Token::String(b"a (b (c) d) e".to_vec())]
        );
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(
            lex_all(b"<48 65 6C6C 6F>"),
            vec![Token::String(b"Hello".to_vec())]
        );
        // Odd digit count pads with zero
        assert_eq!(lex_all(b"<4F7>"), vec![Token::String(vec![0x4F, 0x70])]);
    }

    #[test]
    fn test_name_with_hash_escape() {
        assert_eq!(
            lex_all(b"/Name /A#20B /Lime#20Green"),
            vec![
                Token::Name("Name".to_string()),
                Token::Name("A B".to_string()),
                Token::Name("Lime Green".to_string()),
            ]
        );
    }

    #[test]
    fn test_name_with_multibyte_characters() {
        // Escaped and raw UTF-8 sequences decode to the same name
        assert_eq!(
            lex_all(b"/Caf#C3#A9"),
            vec![Token::Name("Caf\u{e9}".to_string())]
        );
        assert_eq!(
            lex_all("/Café".as_bytes()),
            vec![Token::Name("Caf\u{e9}".to_string())]
        );
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            lex_all(b"<< /K [1 2] >>"),
            vec![
                Token::DictStart,
                Token::Name("K".to_string()),
                Token::ArrayStart,
                Token::Integer(1),
                Token::Integer(2),
                Token::ArrayEnd,
                Token::DictEnd,
            ]
        );
    }

    #[test]
    fn test_keywords_and_booleans() {
        assert_eq!(
            lex_all(b"true false null obj endobj stream endstream R n"),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::Obj,
                Token::EndObj,
                Token::Stream,
                Token::EndStream,
                Token::RefMarker,
                Token::Keyword("n".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            lex_all(b"1 % a comment\n2"),
            vec![Token::Integer(1), Token::Integer(2)]
        );
    }

    #[test]
    fn test_push_token_restores_position() {
        let mut lexer = Lexer::new(Cursor::new(b"12 34".to_vec())).unwrap();
        let (token, pos) = lexer.next_token_at().unwrap();
        assert_eq!(token, Token::Integer(12));
        lexer.push_token(token, pos);
        assert_eq!(lexer.position(), 0);
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(12));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(34));
    }

    #[test]
    fn test_stream_eol_rejects_bare_cr() {
        let mut lexer = Lexer::new(Cursor::new(b"\nX".to_vec())).unwrap();
        lexer.read_stream_eol().unwrap();
        assert_eq!(lexer.position(), 1);

        let mut lexer = Lexer::new(Cursor::new(b"\r\nX".to_vec())).unwrap();
        lexer.read_stream_eol().unwrap();
        assert_eq!(lexer.position(), 2);

        let mut lexer = Lexer::new(Cursor::new(b"\rX".to_vec())).unwrap();
        assert!(lexer.read_stream_eol().is_err());
    }

    #[test]
    fn test_position_after_keyword() {
        let mut lexer = Lexer::new(Cursor::new(b"stream\nDATA".to_vec())).unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Stream);
        lexer.read_stream_eol().unwrap();
        assert_eq!(lexer.position(), 7);
        assert_eq!(lexer.read_bytes(4).unwrap(), b"DATA");
    }

    #[test]
    fn test_unexpected_byte_error_carries_offset() {
        let mut lexer = Lexer::new(Cursor::new(b"   #".to_vec())).unwrap();
        match lexer.next_token().unwrap_err() {
            PdfError::UnexpectedToken { position, .. } => assert_eq!(position, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
