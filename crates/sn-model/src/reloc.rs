use crate::expr::Expr;

/// Wire relocation type tag. Selects patch width, PC-relative behavior, and
/// whether an overflow past the declared width is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocType {
    Reloc1,
    Reloc2,
    Reloc3,
    Reloc4,
    Reloc1Warn,
    Reloc2Warn,
    Reloc3Warn,
    PcRel1,
    PcRel2,
}

impl RelocType {
    pub fn from_wire(tag: u8) -> Option<Self> {
        Some(match tag {
            0x02 => RelocType::Reloc1,
            0x1a => RelocType::Reloc2,
            0x2c => RelocType::Reloc3,
            0x10 => RelocType::Reloc4,
            0x0a => RelocType::Reloc1Warn,
            0x1c => RelocType::Reloc2Warn,
            0x30 => RelocType::Reloc3Warn,
            0x32 => RelocType::PcRel1,
            0x34 => RelocType::PcRel2,
            _ => return None,
        })
    }

    pub fn wire_tag(self) -> u8 {
        match self {
            RelocType::Reloc1 => 0x02,
            RelocType::Reloc2 => 0x1a,
            RelocType::Reloc3 => 0x2c,
            RelocType::Reloc4 => 0x10,
            RelocType::Reloc1Warn => 0x0a,
            RelocType::Reloc2Warn => 0x1c,
            RelocType::Reloc3Warn => 0x30,
            RelocType::PcRel1 => 0x32,
            RelocType::PcRel2 => 0x34,
        }
    }

    pub fn width(self) -> u8 {
        match self {
            RelocType::Reloc1 | RelocType::Reloc1Warn | RelocType::PcRel1 => 1,
            RelocType::Reloc2 | RelocType::Reloc2Warn | RelocType::PcRel2 => 2,
            RelocType::Reloc3 | RelocType::Reloc3Warn => 3,
            RelocType::Reloc4 => 4,
        }
    }

    pub fn is_pc_relative(self) -> bool {
        matches!(self, RelocType::PcRel1 | RelocType::PcRel2)
    }

    pub fn warns_on_overflow(self) -> bool {
        matches!(
            self,
            RelocType::Reloc1Warn | RelocType::Reloc2Warn | RelocType::Reloc3Warn
        )
    }

    /// The non-warning counterpart of a `*Warn` variant, used once the
    /// truncation-strip pass proves the mask matches the declared width.
    pub fn without_warning(self) -> RelocType {
        match self {
            RelocType::Reloc1Warn => RelocType::Reloc1,
            RelocType::Reloc2Warn => RelocType::Reloc2,
            RelocType::Reloc3Warn => RelocType::Reloc3,
            other => other,
        }
    }
}

/// A relocation site: where to patch, what width/behavior, and the
/// (possibly still-unresolved) expression describing the value.
#[derive(Debug, Clone)]
pub struct Reloc {
    pub reloc_type: RelocType,
    /// Section-relative on input; rewritten to segment-relative during merge.
    pub address: u32,
    pub file_id: u16,
    pub line: u32,
    pub expr: Vec<Expr>,
}

impl Reloc {
    pub fn new(reloc_type: RelocType, address: u32, file_id: u16, line: u32, expr: Vec<Expr>) -> Self {
        Reloc {
            reloc_type,
            address,
            file_id,
            line,
            expr,
        }
    }
}
