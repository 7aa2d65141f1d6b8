use std::fmt;

use crate::reloc::Reloc;

/// `group_id == 0` means "no group" throughout the model.
pub const NO_GROUP: u16 = 0;

#[derive(Debug, Clone)]
pub struct Group {
    pub group_id: u16,
    pub name: String,
    /// Parsed but unacted-upon: the assembler's own headers mark these bits
    /// unconfirmed (bss/word/org). Carried for diagnostics only.
    pub flags: u8,
}

/// Raised when a `Section` would be built (or mutated) in a way that
/// violates the data/bss exclusivity invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BssConflict {
    pub section_id: u16,
}

impl fmt::Display for BssConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "section {} has both data and a nonzero bss size",
            self.section_id
        )
    }
}

impl std::error::Error for BssConflict {}

#[derive(Debug, Clone)]
pub struct Section {
    pub section_id: u16,
    pub group_id: u16,
    pub name: String,
    /// Alignment bits, also unconfirmed in the original headers.
    pub flags: u8,
    data: Vec<u8>,
    bss_size: u32,
    pub relocs: Vec<Reloc>,
    pub placed_segnum: u32,
    pub placed_offset: u32,
}

impl Section {
    pub fn new(section_id: u16, group_id: u16, name: String, flags: u8) -> Self {
        Section {
            section_id,
            group_id,
            name,
            flags,
            data: Vec::new(),
            bss_size: 0,
            relocs: Vec::new(),
            placed_segnum: 0,
            placed_offset: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bss_size(&self) -> u32 {
        self.bss_size
    }

    /// Append bytes from a data-block record (`0x02`). Fails if the section
    /// already carries a reserved BSS size, per the §3 exclusivity invariant.
    pub fn append_data(&mut self, bytes: &[u8]) -> Result<(), BssConflict> {
        if self.bss_size != 0 {
            return Err(BssConflict {
                section_id: self.section_id,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Apply a reserve-BSS record (`0x08`). The parser accumulates the
    /// reservation rather than extending `data` with zeros — see DESIGN.md
    /// for why this policy was chosen over the source's other variant.
    pub fn reserve_bss(&mut self, size: u32) -> Result<(), BssConflict> {
        if !self.data.is_empty() {
            return Err(BssConflict {
                section_id: self.section_id,
            });
        }
        self.bss_size = self.bss_size.saturating_add(size);
        Ok(())
    }

    /// Total size a placed instance of this section occupies in a segment.
    pub fn placed_len(&self) -> u32 {
        if self.bss_size != 0 {
            self.bss_size
        } else {
            self.data.len() as u32
        }
    }
}

#[derive(Debug, Clone)]
pub enum Symbol {
    Global {
        symbol_id: u16,
        section_id: u16,
        name: String,
        value: u32,
    },
    /// Exported only when the assembler chose to; the linker never resolves
    /// references against these, only reports them (e.g. via dump-symbols).
    Local {
        symbol_id: u16,
        section_id: u16,
        name: String,
        value: u32,
    },
    Extern {
        symbol_id: u16,
        name: String,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Global { name, .. } => name,
            Symbol::Local { name, .. } => name,
            Symbol::Extern { name, .. } => name,
        }
    }

    pub fn symbol_id(&self) -> u16 {
        match self {
            Symbol::Global { symbol_id, .. } => *symbol_id,
            Symbol::Local { symbol_id, .. } => *symbol_id,
            Symbol::Extern { symbol_id, .. } => *symbol_id,
        }
    }
}

/// A source-file record (`0x1c`): maps a `file_id` to a display name.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_id: u16,
    pub name: String,
}

/// One parsed SN object file.
#[derive(Debug, Clone)]
pub struct Unit {
    pub path: String,
    pub sections: Vec<Section>,
    pub groups: Vec<Group>,
    pub source_files: Vec<SourceFile>,
    pub locals: Vec<Symbol>,
    pub globals: Vec<Symbol>,
    pub externs: Vec<Symbol>,
}

impl Unit {
    pub fn new(path: String) -> Self {
        Unit {
            path,
            sections: Vec::new(),
            groups: Vec::new(),
            source_files: Vec::new(),
            locals: Vec::new(),
            globals: Vec::new(),
            externs: Vec::new(),
        }
    }

    pub fn find_section(&self, section_id: u16) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    pub fn find_section_mut(&mut self, section_id: u16) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.section_id == section_id)
    }

    pub fn find_group(&self, group_id: u16) -> Option<&Group> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub fn find_extern(&self, symbol_id: u16) -> Option<&Symbol> {
        self.externs.iter().find(|s| s.symbol_id() == symbol_id)
    }

    pub fn file_name(&self, file_id: u16) -> Option<&str> {
        self.source_files
            .iter()
            .find(|f| f.file_id == file_id)
            .map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_then_bss_conflicts() {
        let mut s = Section::new(1, NO_GROUP, "CODE".into(), 0);
        s.append_data(&[1, 2, 3]).unwrap();
        assert!(s.reserve_bss(4).is_err());
    }

    #[test]
    fn bss_then_data_conflicts() {
        let mut s = Section::new(1, NO_GROUP, "BSS".into(), 0);
        s.reserve_bss(16).unwrap();
        assert!(s.append_data(&[0]).is_err());
        assert_eq!(s.placed_len(), 16);
    }

    #[test]
    fn repeated_bss_reservations_accumulate() {
        let mut s = Section::new(2, NO_GROUP, "BSS".into(), 0);
        s.reserve_bss(4).unwrap();
        s.reserve_bss(6).unwrap();
        assert_eq!(s.bss_size(), 10);
        assert_eq!(s.placed_len(), 10);
    }
}
