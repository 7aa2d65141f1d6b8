use std::fmt::Display;

use sn_reader::ParseError;

/// Fatal linking failures. Each carries enough context (unit path,
/// file/line recovered from a relocation's `file_id`/`line`) to report a
/// useful source location.
#[derive(Debug, Clone)]
pub enum LinkError {
    Parse(ParseError),
    UnknownSymbol { name: String },
    UnknownExtern { unit: String, extern_id: u16 },
    UnknownSectionQuery { id: u16 },
    UnknownGroupQuery { name: String },
    DuplicateSymbol { name: String, first: u32, second: u32 },
    RelocationTooComplex { file: String, line: u32, shape: String },
    BadRelocationAddress { file: String, line: u32 },
}

impl Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::Parse(e) => write!(f, "{}", e),
            LinkError::UnknownSymbol { name } => write!(f, "unresolved symbol '{}'", name),
            LinkError::UnknownExtern { unit, extern_id } => {
                write!(f, "{}: no extern with id {}", unit, extern_id)
            }
            LinkError::UnknownSectionQuery { id } => write!(f, "query references unknown section {}", id),
            LinkError::UnknownGroupQuery { name } => write!(f, "query references unknown group '{}'", name),
            LinkError::DuplicateSymbol { name, first, second } => write!(
                f,
                "duplicate definition of '{}' with conflicting values (0x{:x} vs 0x{:x})",
                name, first, second
            ),
            LinkError::RelocationTooComplex { file, line, shape } => {
                write!(f, "{}:{}: relocation expression too complex: {}", file, line, shape)
            }
            LinkError::BadRelocationAddress { file, line } => {
                write!(f, "{}:{}: relocation address out of bounds", file, line)
            }
        }
    }
}

impl std::error::Error for LinkError {}

impl From<ParseError> for LinkError {
    fn from(err: ParseError) -> Self {
        LinkError::Parse(err)
    }
}
