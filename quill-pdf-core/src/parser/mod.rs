//! Tokenizing and parsing of PDF syntax, from single values up to whole
//! files.

mod lexer;
mod object_parser;
mod parser_object;
mod reader;

pub use lexer::{Lexer, Token};
pub use object_parser::{parse_value, parse_value_from_token};
pub use reader::Document;

pub(crate) use parser_object::{load_header, ParseSource};
