use std::fmt::Display;

/// Non-fatal conditions the linker reports but continues past, per the
/// fatal/warning split of the error handling design.
#[derive(Debug, Clone)]
pub enum Warning {
    PcRelativeOutOfRange { file: String, line: u32, delta: i64 },
    CrossSegmentPcRel { file: String, line: u32 },
    PcRelativeConstant { file: String, line: u32 },
    ValueOverflow { file: String, line: u32, value: u32, width: u8 },
    DuplicateAbsoluteSymbol { name: String, first: u32, second: u32 },
    OutOfBankReference { file: String, line: u32 },
    UnconfirmedFlagBits { context: String, flags: u8 },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::PcRelativeOutOfRange { file, line, delta } => {
                write!(f, "{}:{}: PC-relative branch out of range (delta {})", file, line, delta)
            }
            Warning::CrossSegmentPcRel { file, line } => {
                write!(f, "{}:{}: PC-relative relocation crosses segments, not supported", file, line)
            }
            Warning::PcRelativeConstant { file, line } => {
                write!(f, "{}:{}: PC-relative relocation of a constant expression", file, line)
            }
            Warning::ValueOverflow { file, line, value, width } => {
                write!(f, "{}:{}: value 0x{:x} overflows declared width {}", file, line, value, width)
            }
            Warning::DuplicateAbsoluteSymbol { name, first, second } => write!(
                f,
                "duplicate absolute symbol '{}' with mismatched values (0x{:x} vs 0x{:x})",
                name, first, second
            ),
            Warning::OutOfBankReference { file, line } => {
                write!(f, "{}:{}: jsr target is in a different bank than the call site", file, line)
            }
            Warning::UnconfirmedFlagBits { context, flags } => write!(
                f,
                "{}: flag bits 0x{:02x} are set but their meaning is unconfirmed; ignored",
                context, flags
            ),
        }
    }
}
