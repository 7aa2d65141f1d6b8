//! The 44-byte OMF segment header and its 48-byte ExpressLoad variant.
//! Field layout matches `original_source/omf.cpp`'s `omf_header` /
//! `omf_express_header` exactly (both `static_assert`ed to these sizes
//! in the source).

use crate::push::{push_u16, push_u32, push_u8};

pub const HEADER_SIZE: u32 = 44;
pub const EXPRESS_HEADER_SIZE: u32 = 48;

#[derive(Debug, Clone, Default)]
pub struct OmfHeader {
    pub bytecount: u32,
    pub reserved_space: u32,
    pub length: u32,
    pub unused1: u8,
    pub lablen: u8,
    pub numlen: u8,
    pub version: u8,
    pub banksize: u32,
    pub kind: u16,
    pub unused2: u16,
    pub org: u32,
    pub alignment: u32,
    pub numsex: u8,
    pub unused3: u8,
    pub segnum: u16,
    pub entry: u32,
    pub dispname: u16,
    pub dispdata: u16,
}

impl OmfHeader {
    pub fn new() -> Self {
        OmfHeader {
            numlen: 4,
            version: 2,
            ..Default::default()
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE as usize);
        push_u32(&mut out, self.bytecount);
        push_u32(&mut out, self.reserved_space);
        push_u32(&mut out, self.length);
        push_u8(&mut out, self.unused1);
        push_u8(&mut out, self.lablen);
        push_u8(&mut out, self.numlen);
        push_u8(&mut out, self.version);
        push_u32(&mut out, self.banksize);
        push_u16(&mut out, self.kind);
        push_u16(&mut out, self.unused2);
        push_u32(&mut out, self.org);
        push_u32(&mut out, self.alignment);
        push_u8(&mut out, self.numsex);
        push_u8(&mut out, self.unused3);
        push_u16(&mut out, self.segnum);
        push_u32(&mut out, self.entry);
        push_u16(&mut out, self.dispname);
        push_u16(&mut out, self.dispdata);
        debug_assert_eq!(out.len(), HEADER_SIZE as usize);
        out
    }

    /// `version=1, bytecount` becomes a 512-byte block count, `kind` moves
    /// into the reserved byte and is zeroed. KIND's own value is used as-is,
    /// with no translation.
    pub fn to_v1(&mut self) {
        self.version = 1;
        self.bytecount = (self.bytecount + 511) >> 9;
        self.unused1 = self.kind as u8;
        self.kind = 0;
    }
}

/// The per-segment record embedded in the ExpressLoad pre-segment's LCONST
/// data: the express-specific offset/size quad plus a copy of the target
/// segment's header fields and segname.
#[derive(Debug, Clone)]
pub struct ExpressEntry {
    pub lconst_mark: u32,
    pub lconst_size: u32,
    pub reloc_mark: u32,
    pub reloc_size: u32,
    pub header: OmfHeader,
    pub segname: String,
}

impl ExpressEntry {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(EXPRESS_HEADER_SIZE as usize + 10 + self.segname.len() + 1);
        push_u32(&mut out, self.lconst_mark);
        push_u32(&mut out, self.lconst_size);
        push_u32(&mut out, self.reloc_mark);
        push_u32(&mut out, self.reloc_size);
        let h = &self.header;
        push_u8(&mut out, h.unused1);
        push_u8(&mut out, h.lablen);
        push_u8(&mut out, h.numlen);
        push_u8(&mut out, h.version);
        push_u32(&mut out, h.banksize);
        push_u16(&mut out, h.kind);
        push_u16(&mut out, h.unused2);
        push_u32(&mut out, h.org);
        push_u32(&mut out, h.alignment);
        push_u8(&mut out, h.numsex);
        push_u8(&mut out, h.unused3);
        push_u16(&mut out, h.segnum);
        push_u32(&mut out, h.entry);
        push_u16(&mut out, h.dispname);
        push_u16(&mut out, h.dispdata);
        debug_assert_eq!(out.len(), EXPRESS_HEADER_SIZE as usize);
        out.resize(out.len() + 10, b' ');
        crate::push::push_pstring(&mut out, &self.segname);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_44_bytes() {
        let h = OmfHeader::new();
        assert_eq!(h.to_bytes().len(), 44);
    }

    #[test]
    fn express_entry_size_matches_forecast() {
        let entry = ExpressEntry {
            lconst_mark: 1,
            lconst_size: 2,
            reloc_mark: 3,
            reloc_size: 4,
            header: OmfHeader::new(),
            segname: "CODE".into(),
        };
        assert_eq!(entry.to_bytes().len(), EXPRESS_HEADER_SIZE as usize + 10 + "CODE".len() + 1);
    }

    #[test]
    fn to_v1_moves_kind_into_unused1_and_blocks_bytecount() {
        let mut h = OmfHeader::new();
        h.kind = 0x05;
        h.bytecount = 1024;
        h.to_v1();
        assert_eq!(h.version, 1);
        assert_eq!(h.unused1, 0x05);
        assert_eq!(h.kind, 0);
        assert_eq!(h.bytecount, 2);
    }

    #[test]
    fn to_v1_rounds_up_partial_block() {
        let mut h = OmfHeader::new();
        h.bytecount = 513;
        h.to_v1();
        assert_eq!(h.bytecount, 2);
    }
}
