//! Per-segment relocation record emission: routes each `OmfReloc`/
//! `OmfInterseg` into a super bucket (patched in place) or a full/
//! compressed record, then appends the packed `SUPER` records. Ported
//! field-for-field from `original_source/omf.cpp`'s `add_relocs()`.

use sn_model::{OmfInterseg, OmfReloc};

use crate::push::{push_i8, push_u16, push_u32, push_u8};
use crate::super_record::{super_interseg, SuperHelper, SUPER_INTERSEG1, SUPER_KIND_COUNT, SUPER_RELOC2, SUPER_RELOC3};

const RELOC: u8 = 0xe2;
const CRELOC: u8 = 0xf5;
const INTERSEG: u8 = 0xe3;
const CINTERSEG: u8 = 0xf6;
const SUPER: u8 = 0xf7;

fn reloc_can_compress(r: &OmfReloc) -> bool {
    r.offset <= 0xffff && r.value <= 0xffff
}

fn interseg_can_compress(r: &OmfInterseg) -> bool {
    r.offset <= 0xffff && r.segment <= 0xff && r.segment_offset <= 0xffff && r.file == 1
}

/// Pack `relocs`/`intersegs` for one segment. `data` is the segment's
/// record-stream buffer with the raw LCONST bytes already appended at
/// `data_offset`; super-eligible items are patched directly into that
/// region (mirroring how the original's `data[data_offset + r.offset]`
/// patch is read back by an OMF loader instead of re-declared). Returns
/// the byte size of the relocation records written, for the ExpressLoad
/// `reloc_size` field.
pub fn pack_relocations(
    data: &mut Vec<u8>,
    data_offset: usize,
    segnum: u16,
    relocs: &[OmfReloc],
    intersegs: &[OmfInterseg],
    compress: bool,
    super_enabled: bool,
) -> u32 {
    let mut buckets: Vec<Option<SuperHelper>> = (0..SUPER_KIND_COUNT).map(|_| None).collect();
    let mut reloc_size = 0u32;

    for r in relocs {
        if compress && reloc_can_compress(r) {
            if super_enabled {
                if r.shift == 0 && r.size == 2 {
                    patch_super(&mut buckets, SUPER_RELOC2, r.offset, data, data_offset, r.value, 2);
                    continue;
                }
                if r.shift == 0 && (r.size == 2 || r.size == 3) {
                    patch_super(&mut buckets, SUPER_RELOC3, r.offset, data, data_offset, r.value, 3);
                    continue;
                }
                if segnum <= 12 && r.shift == -16i8 && r.size == 2 {
                    let kind = super_interseg(24) + segnum as usize;
                    patch_super(&mut buckets, kind, r.offset, data, data_offset, r.value, 2);
                    continue;
                }
            }
            push_u8(data, CRELOC);
            push_u8(data, r.size);
            push_i8(data, r.shift);
            push_u16(data, r.offset as u16);
            push_u16(data, r.value as u16);
            reloc_size += 7;
        } else {
            push_u8(data, RELOC);
            push_u8(data, r.size);
            push_i8(data, r.shift);
            push_u32(data, r.offset);
            push_u32(data, r.value);
            reloc_size += 11;
        }
    }

    for r in intersegs {
        if compress && interseg_can_compress(r) {
            if super_enabled {
                if r.shift == 0 && r.size == 3 {
                    patch_super_interseg1(&mut buckets, r, data, data_offset);
                    continue;
                }
                if r.shift == 0 && r.size == 2 && r.segment <= 12 {
                    let kind = super_interseg(12) + r.segment as usize;
                    patch_super(&mut buckets, kind, r.offset, data, data_offset, r.segment_offset, 2);
                    continue;
                }
                if r.shift == -16i8 && r.size == 2 && r.segment <= 12 {
                    let kind = super_interseg(24) + r.segment as usize;
                    patch_super(&mut buckets, kind, r.offset, data, data_offset, r.segment_offset, 2);
                    continue;
                }
            }
            push_u8(data, CINTERSEG);
            push_u8(data, r.size);
            push_i8(data, r.shift);
            push_u16(data, r.offset as u16);
            push_u8(data, r.segment as u8);
            push_u16(data, r.segment_offset as u16);
            reloc_size += 8;
        } else {
            push_u8(data, INTERSEG);
            push_u8(data, r.size);
            push_i8(data, r.shift);
            push_u32(data, r.offset);
            push_u16(data, r.file);
            push_u16(data, r.segment);
            push_u32(data, r.segment_offset);
            reloc_size += 15;
        }
    }

    for (kind, bucket) in buckets.iter().enumerate() {
        let Some(helper) = bucket else { continue };
        let bytes = helper.data();
        if bytes.is_empty() {
            continue;
        }
        reloc_size += bytes.len() as u32 + 6;
        push_u8(data, SUPER);
        push_u32(data, bytes.len() as u32 + 1);
        push_u8(data, kind as u8);
        data.extend_from_slice(bytes);
    }

    reloc_size
}

fn patch_super(
    buckets: &mut [Option<SuperHelper>],
    kind: usize,
    offset: u32,
    data: &mut [u8],
    data_offset: usize,
    mut value: u32,
    width: usize,
) {
    buckets[kind].get_or_insert_with(SuperHelper::new).append(offset);
    for i in 0..width {
        data[data_offset + offset as usize + i] = (value & 0xff) as u8;
        value >>= 8;
    }
}

fn patch_super_interseg1(
    buckets: &mut [Option<SuperHelper>],
    r: &OmfInterseg,
    data: &mut [u8],
    data_offset: usize,
) {
    buckets[SUPER_INTERSEG1].get_or_insert_with(SuperHelper::new).append(r.offset);
    let mut value = r.segment_offset;
    data[data_offset + r.offset as usize] = (value & 0xff) as u8;
    value >>= 8;
    data[data_offset + r.offset as usize + 1] = (value & 0xff) as u8;
    data[data_offset + r.offset as usize + 2] = r.segment as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reloc2_shape_patches_in_place_and_uses_super() {
        let mut data = vec![0u8; 4];
        let relocs = vec![OmfReloc { size: 2, shift: 0, offset: 0, value: 0x1234 }];
        let size = pack_relocations(&mut data, 0, 1, &relocs, &[], true, true);
        assert_eq!(&data[0..2], &[0x34, 0x12]);
        assert!(size > 0);
        // SUPER opcode present somewhere after the patched bytes.
        assert!(data.contains(&0xf7));
    }

    #[test]
    fn ineligible_reloc_falls_back_to_full_record() {
        let mut data = vec![0u8; 4];
        let relocs = vec![OmfReloc { size: 2, shift: 3, offset: 0, value: 0x1234 }];
        pack_relocations(&mut data, 0, 1, &relocs, &[], true, true);
        assert_eq!(data[4], RELOC);
    }

    #[test]
    fn interseg1_shape_patches_three_bytes() {
        let mut data = vec![0u8; 4];
        let intersegs = vec![OmfInterseg { size: 3, shift: 0, offset: 0, segment: 7, segment_offset: 0x0203, file: 1 }];
        pack_relocations(&mut data, 0, 1, &[], &intersegs, true, true);
        assert_eq!(&data[0..3], &[0x03, 0x02, 7]);
    }

    #[test]
    fn compressed_without_super_emits_creloc() {
        let mut data = Vec::new();
        let relocs = vec![OmfReloc { size: 2, shift: 0, offset: 0x10, value: 0x20 }];
        pack_relocations(&mut data, 0, 1, &relocs, &[], true, false);
        assert_eq!(data[0], CRELOC);
    }

    #[test]
    fn uncompressible_value_emits_full_reloc() {
        let mut data = Vec::new();
        let relocs = vec![OmfReloc { size: 4, shift: 0, offset: 0x10, value: 0x0001_0000 }];
        pack_relocations(&mut data, 0, 1, &relocs, &[], true, true);
        assert_eq!(data[0], RELOC);
    }
}
