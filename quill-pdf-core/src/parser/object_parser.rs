//! Recursive-descent materialization of [`Value`] trees from tokens.
//!
//! Indirect references need two tokens of lookahead: `7 0 R` starts out
//! looking like two integers. The lexer's push-back buffer keeps the
//! grammar single-pass.

use super::lexer::{Lexer, Token};
use crate::error::{PdfError, Result};
use crate::object::{Dictionary, Object, ObjectRef, PdfString, Value};
use std::io::{Read, Seek};

/// Parse the next complete value from the token stream.
pub fn parse_value<R: Read + Seek>(lexer: &mut Lexer<R>) -> Result<Value> {
    let (token, position) = lexer.next_token_at()?;
    parse_value_from_token(lexer, token, position)
}

/// Parse a value whose first token has already been consumed.
pub fn parse_value_from_token<R: Read + Seek>(
    lexer: &mut Lexer<R>,
    token: Token,
    position: u64,
) -> Result<Value> {
    match token {
        Token::Null => Ok(Value::Null),
        Token::Boolean(b) => Ok(Value::Boolean(b)),
        Token::Integer(i) => parse_integer_or_reference(lexer, i, position),
        Token::Real(r) => Ok(Value::Real(r)),
        Token::String(bytes) => Ok(Value::String(PdfString::new(bytes))),
        Token::Name(name) => Ok(Value::Name(name)),
        Token::ArrayStart => parse_array(lexer),
        Token::DictStart => parse_dictionary(lexer).map(Value::Dictionary),
        Token::Eof => Err(PdfError::UnexpectedEof { position }),
        other => Err(PdfError::UnexpectedToken {
            position,
            expected: "value",
            found: other.describe(),
        }),
    }
}

/// An integer may begin an indirect reference (`N G R`); otherwise the
/// lookahead tokens are pushed back untouched.
fn parse_integer_or_reference<R: Read + Seek>(
    lexer: &mut Lexer<R>,
    number: i64,
    position: u64,
) -> Result<Value> {
    let (second, second_pos) = lexer.next_token_at()?;
    if let Token::Integer(generation) = second {
        let (third, third_pos) = lexer.next_token_at()?;
        if third == Token::RefMarker {
            let number = u32::try_from(number).map_err(|_| {
                PdfError::ValueOutOfRange(format!("object number {number} at offset {position}"))
            })?;
            let generation = u16::try_from(generation).map_err(|_| {
                PdfError::ValueOutOfRange(format!(
                    "generation number {generation} at offset {position}"
                ))
            })?;
            return Ok(Value::Reference(ObjectRef::new(number, generation)));
        }
        lexer.push_token(third, third_pos);
    }
    lexer.push_token(second, second_pos);
    Ok(Value::Integer(number))
}

fn parse_array<R: Read + Seek>(lexer: &mut Lexer<R>) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        let (token, position) = lexer.next_token_at()?;
        match token {
            Token::ArrayEnd => break,
            Token::Eof => return Err(PdfError::UnexpectedEof { position }),
            other => {
                let value = parse_value_from_token(lexer, other, position)?;
                items.push(Object::new(value));
            }
        }
    }
    Ok(Value::Array(items))
}

pub(crate) fn parse_dictionary<R: Read + Seek>(lexer: &mut Lexer<R>) -> Result<Dictionary> {
    let mut dict = Dictionary::new();
    loop {
        let (token, position) = lexer.next_token_at()?;
        match token {
            Token::DictEnd => break,
            Token::Name(key) => {
                let value = parse_value(lexer)?;
                dict.set(key, Object::new(value));
            }
            Token::Eof => return Err(PdfError::UnexpectedEof { position }),
            other => {
                return Err(PdfError::UnexpectedToken {
                    position,
                    expected: "dictionary key or >>",
                    found: other.describe(),
                })
            }
        }
    }
    Ok(dict)
}
