//! Deferred parsing of indirect objects discovered in a file.
//!
//! A parser-backed [`Object`] records where its `obj` keyword lives and
//! performs no I/O until the store first triggers a load. Header and stream
//! are two independent stages; the stream stage is only reachable once the
//! header stage has completed, so resolving an indirect `/Length` can never
//! reenter the header parse of the same object.

use super::lexer::{Lexer, Token};
use super::object_parser::parse_value_from_token;
use crate::error::{PdfError, Result};
use crate::object::{Object, ObjectRef};
use std::io::{Read, Seek};
use tracing::warn;

/// Where and how a lazily-loaded object can be materialized.
#[derive(Debug, Clone)]
pub(crate) struct ParseSource {
    /// Offset of the object header (`N G obj`), or of the value itself for
    /// the trailer variant.
    pub offset: u64,
    /// The trailer has no object/generation header preceding its value.
    pub is_trailer: bool,
    /// Set by header loading when a `stream` keyword followed the value.
    pub has_stream: bool,
    /// Offset of the first stream byte, immediately after the keyword's
    /// LF or CRLF terminator.
    pub stream_offset: u64,
    /// Whether the store's decryption context applies to this object.
    pub encrypted: bool,
}

impl ParseSource {
    pub fn new(offset: u64, encrypted: bool) -> Self {
        Self {
            offset,
            is_trailer: false,
            has_stream: false,
            stream_offset: 0,
            encrypted,
        }
    }

    pub fn trailer(offset: u64) -> Self {
        Self {
            offset,
            is_trailer: true,
            has_stream: false,
            stream_offset: 0,
            encrypted: false,
        }
    }
}

/// Read the `N G obj` header, yielding the reference the file claims.
fn read_object_header<R: Read + Seek>(lexer: &mut Lexer<R>) -> Result<ObjectRef> {
    let expect_integer = |lexer: &mut Lexer<R>| -> Result<i64> {
        let (token, position) = lexer.next_token_at()?;
        match token {
            Token::Integer(i) => Ok(i),
            other => Err(PdfError::UnexpectedToken {
                position,
                expected: "object number",
                found: other.describe(),
            }),
        }
    };
    let number = expect_integer(lexer)?;
    let generation = expect_integer(lexer)?;

    let number = u32::try_from(number)
        .map_err(|_| PdfError::ValueOutOfRange(format!("object number {number}")))?;
    let generation = u16::try_from(generation)
        .map_err(|_| PdfError::ValueOutOfRange(format!("generation number {generation}")))?;

    let (token, position) = lexer.next_token_at()?;
    if token != Token::Obj {
        return Err(PdfError::MissingObjectKeyword {
            position,
            found: token.describe(),
        });
    }
    Ok(ObjectRef::new(number, generation))
}

/// Header-loading hook: seek to the recorded offset, read the header and
/// the full value, and detect a trailing `stream` keyword without consuming
/// stream bytes. Called exactly once per object by the store.
pub(crate) fn load_header<R: Read + Seek>(reader: R, object: &mut Object) -> Result<()> {
    let mut source = object
        .load
        .source
        .clone()
        .ok_or_else(|| PdfError::InvalidHandle("object has no parse source".to_string()))?;

    let mut lexer = Lexer::new(reader)?;
    lexer.seek(source.offset)?;

    if !source.is_trailer {
        let parsed = read_object_header(&mut lexer)?;
        if let Some(expected) = object.indirect_reference() {
            if expected != parsed {
                warn!(%expected, %parsed, "object header disagrees with cross-reference entry");
            }
        }
        object.set_indirect_reference(Some(parsed));
    }

    // Do not parse a value straight away: `N G obj endobj` is a legal
    // empty object whose value stays null.
    let (token, position) = lexer.next_token_at()?;
    if token == Token::EndObj {
        object.load.header_loaded = true;
        object.reset_dirty();
        return Ok(());
    }
    if token == Token::Eof {
        return Err(PdfError::UnexpectedEof { position });
    }

    let value = parse_value_from_token(&mut lexer, token, position)?;

    if !source.is_trailer {
        let (token, position) = lexer.next_token_at()?;
        match token {
            Token::EndObj => {}
            Token::Stream if value.as_dict().is_some() => {
                source.has_stream = true;
                lexer.read_stream_eol()?;
                source.stream_offset = lexer.position();
            }
            other => {
                return Err(PdfError::UnexpectedToken {
                    position,
                    expected: "'endobj' or 'stream'",
                    found: other.describe(),
                })
            }
        }
    }

    object.set_parsed_value(value);
    object.load.source = Some(source);
    object.load.header_loaded = true;
    object.reset_dirty();
    Ok(())
}
