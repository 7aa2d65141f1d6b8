//! Binary reader for SN object files: a bounds-checked cursor (C1) and the
//! record-dispatching parser that builds a `sn_model::Unit` from it (C2).

pub mod cursor;
pub mod error;
pub mod parser;

pub use cursor::{Cursor, ReadError};
pub use error::ParseError;
pub use parser::parse_unit;
