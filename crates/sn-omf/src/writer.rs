//! Top-level OMF file assembly (C7/C8/C9): per-segment header + LCONST +
//! relocation records, optional ExpressLoad pre-segment, optional V1
//! conversion. Ported field-for-field from `original_source/omf.cpp`'s
//! `save_omf()`. Builds into an in-memory buffer rather than seeking a
//! file descriptor; the ExpressLoad pre-segment's reserved region is
//! backfilled by overwriting the front of that buffer once every real
//! segment's size is known, which is the in-memory equivalent of the
//! source's single trailing `lseek(0)`.

use sn_model::Segment;

use crate::header::{ExpressEntry, OmfHeader};
use crate::push::{push_padded, push_pstring, push_u16, push_u32, push_u8};
use crate::reloc_pack::pack_relocations;

const LCONST: u8 = 0xf2;
const END: u8 = 0x00;
const SUPER_OP: u8 = 0xf7;
const EXPRESSLOAD_NAME: &str = "~ExpressLoad";

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub compress: bool,
    pub super_records: bool,
    pub expressload: bool,
    /// `false` = version 2 (the default), `true` = version 1.
    pub v1: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            compress: true,
            super_records: true,
            expressload: true,
            v1: false,
        }
    }
}

/// Serialize every segment to a single OMF load file image. Mutates
/// `segments` in place: when ExpressLoad is enabled every segment's
/// `segnum` and every interseg's target `segment` are incremented by one,
/// matching the source's own in-place bump before serialization.
pub fn write_omf(segments: &mut [Segment], options: &WriteOptions) -> Vec<u8> {
    let expressload = options.expressload && !options.v1;
    let super_records = options.super_records && !options.v1;

    if expressload {
        for seg in segments.iter_mut() {
            seg.segnum += 1;
            for r in seg.intersegs.iter_mut() {
                r.segment += 1;
            }
        }
    }

    let reserve_len = if expressload { forecast_express_len(segments) } else { 0 };
    let mut out = vec![0u8; reserve_len as usize];

    let mut expr_entries: Vec<ExpressEntry> = Vec::new();

    for (i, seg) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        let start = out.len() as u32;

        let mut h = OmfHeader::new();
        h.length = seg.byte_count();
        h.kind = seg.kind as u16;
        h.banksize = if seg.data.len() > 0xffff { 0 } else { 0x0001_0000 };
        h.segnum = seg.segnum;
        h.alignment = seg.alignment;
        h.reserved_space = seg.reserved_space;
        h.org = seg.org;

        let mut reserved_space = 0u32;
        if expressload {
            reserved_space = h.reserved_space;
            h.reserved_space = 0;
        }

        let mut rec: Vec<u8> = Vec::new();
        push_padded(&mut rec, &seg.loadname, 10);
        push_pstring(&mut rec, &seg.segname);

        h.dispname = crate::header::HEADER_SIZE as u16;
        h.dispdata = crate::header::HEADER_SIZE as u16 + rec.len() as u16;

        let lconst_offset_calc = start + crate::header::HEADER_SIZE + rec.len() as u32 + 5;
        let lconst_size = seg.data.len() as u32 + reserved_space;

        push_u8(&mut rec, LCONST);
        push_u32(&mut rec, lconst_size);

        let data_offset = rec.len();
        rec.extend_from_slice(&seg.data);
        if reserved_space > 0 {
            rec.resize(rec.len() + reserved_space as usize, 0);
        }

        let reloc_offset_calc = start + crate::header::HEADER_SIZE + rec.len() as u32;
        let reloc_size = pack_relocations(
            &mut rec,
            data_offset,
            seg.segnum,
            &seg.relocs,
            &seg.intersegs,
            options.compress,
            super_records,
        );

        push_u8(&mut rec, END);

        h.bytecount = crate::header::HEADER_SIZE + rec.len() as u32;

        if expressload {
            let lconst_offset = if lconst_size == 0 { 0 } else { lconst_offset_calc };
            let reloc_offset = if reloc_size == 0 { 0 } else { reloc_offset_calc };
            expr_entries.push(ExpressEntry {
                lconst_mark: lconst_offset,
                lconst_size,
                reloc_mark: reloc_offset,
                reloc_size,
                header: h.clone(),
                segname: seg.segname.clone(),
            });
        }

        if options.v1 {
            h.to_v1();
        }

        out.extend_from_slice(&h.to_bytes());
        out.extend_from_slice(&rec);

        if options.v1 && !is_last {
            let pad = 512 - (out.len() & 511);
            if pad != 512 {
                out.resize(out.len() + pad, 0);
            }
        }
    }

    if expressload {
        write_expressload_pre_segment(&mut out, segments, &expr_entries, reserve_len);
    }

    out
}

fn forecast_express_len(segments: &[Segment]) -> u32 {
    let mut len = crate::header::HEADER_SIZE + 10 + EXPRESSLOAD_NAME.len() as u32 + 1;
    len += 6; // lconst opcode+len (5) and the trailing end byte (1)
    len += 6; // reserved (4) + seg-count-1 (2)
    for seg in segments {
        len += 8 + 2;
        len += crate::header::EXPRESS_HEADER_SIZE + 10;
        len += seg.segname.len() as u32 + 1;
    }
    len
}

fn write_expressload_pre_segment(
    out: &mut [u8],
    segments: &[Segment],
    expr_entries: &[ExpressEntry],
    reserve_len: u32,
) {
    let mut h = OmfHeader::new();
    h.segnum = 1;
    h.banksize = 0x0001_0000;
    h.kind = 0x8001;
    h.dispname = 0x2c;
    h.dispdata = 0x43;

    let mut fudge = 10u32 * segments.len() as u32;
    let expr_headers: Vec<u8> = expr_entries.iter().flat_map(|e| e.to_bytes()).collect();
    h.length = 6 + expr_headers.len() as u32 + fudge;

    let mut data: Vec<u8> = Vec::new();
    data.resize(10, b' ');
    push_pstring(&mut data, EXPRESSLOAD_NAME);
    push_u8(&mut data, 0xf2); // lconst
    push_u32(&mut data, h.length);
    push_u32(&mut data, 0); // reserved
    push_u16(&mut data, segments.len() as u16 - 1); // seg count - 1

    let mut entry_offset = 0u32;
    for entry in expr_entries {
        push_u16(&mut data, (fudge + entry_offset) as u16);
        push_u16(&mut data, 0);
        push_u32(&mut data, 0);
        entry_offset += crate::header::EXPRESS_HEADER_SIZE + 10 + entry.segname.len() as u32 + 1;
        fudge -= 8;
    }

    for seg in segments {
        push_u16(&mut data, seg.segnum);
    }

    data.extend_from_slice(&expr_headers);
    push_u8(&mut data, 0); // end

    h.bytecount = crate::header::HEADER_SIZE + data.len() as u32;

    let mut frame = Vec::with_capacity(reserve_len as usize);
    frame.extend_from_slice(&h.to_bytes());
    frame.extend_from_slice(&data);
    frame.resize(reserve_len as usize, 0);
    out[..frame.len()].copy_from_slice(&frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment_no_expressload_round_trips_header_fields() {
        let mut seg = Segment::new(1, "PROGRAM".into(), "PROGRAM".into());
        seg.data = vec![0xde, 0xad];
        let mut segments = vec![seg];
        let opts = WriteOptions { expressload: false, ..Default::default() };
        let out = write_omf(&mut segments, &opts);

        // length field (offset 8, u32 LE) == data.len()
        let length = u32::from_le_bytes([out[8], out[9], out[10], out[11]]);
        assert_eq!(length, 2);
        assert_eq!(segments[0].segnum, 1); // unchanged without expressload
    }

    #[test]
    fn expressload_bumps_segnum_and_interseg_targets() {
        let mut a = Segment::new(1, "A".into(), "A".into());
        a.data = vec![0, 0];
        let mut b = Segment::new(2, "B".into(), "B".into());
        b.data = vec![0, 0];
        b.intersegs.push(sn_model::OmfInterseg {
            size: 2,
            shift: 0,
            offset: 0,
            segment: 1,
            segment_offset: 0,
            file: 1,
        });
        let mut segments = vec![a, b];
        let opts = WriteOptions::default();
        let out = write_omf(&mut segments, &opts);

        assert_eq!(segments[0].segnum, 2);
        assert_eq!(segments[1].segnum, 3);
        assert_eq!(segments[1].intersegs[0].segment, 2);
        assert!(!out.is_empty());
    }

    #[test]
    fn v1_disables_expressload_and_super() {
        let mut seg = Segment::new(1, "A".into(), "A".into());
        seg.data = vec![1, 2, 3, 4];
        let mut segments = vec![seg];
        let opts = WriteOptions { v1: true, ..Default::default() };
        let out = write_omf(&mut segments, &opts);
        assert_eq!(segments[0].segnum, 1); // not bumped: expressload forced off
        // version byte is at offset 15 in the 44-byte header.
        assert_eq!(out[15], 1);
    }

    #[test]
    fn expressload_offset_table_uses_cumulative_entry_byte_offsets() {
        // Segment names of different lengths ("A" vs "CODE") make the bug
        // this guards against visible: a bare loop index would produce
        // [20, 13] instead of the correct [20, 72].
        let mut a = Segment::new(1, "A".into(), "A".into());
        a.data = vec![1, 2];
        let mut b = Segment::new(2, "CODE".into(), "CODE".into());
        b.data = vec![3, 4];
        let mut segments = vec![a, b];
        let opts = WriteOptions::default();
        let out = write_omf(&mut segments, &opts);

        let table_start = crate::header::HEADER_SIZE as usize + 34;
        let first = u16::from_le_bytes([out[table_start], out[table_start + 1]]);
        let second = u16::from_le_bytes([out[table_start + 8], out[table_start + 9]]);
        assert_eq!(first, 20);
        assert_eq!(second, 72);
    }

    #[test]
    fn express_forecast_matches_actual_pre_segment_length() {
        let mut a = Segment::new(1, "A".into(), "A".into());
        a.data = vec![1, 2, 3];
        let mut b = Segment::new(2, "CODE".into(), "CODE".into());
        b.data = vec![4, 5];
        let segments_before = vec![a, b];
        let forecast = forecast_express_len(&segments_before);

        let mut segments = segments_before;
        let opts = WriteOptions::default();
        let out = write_omf(&mut segments, &opts);
        assert!(out.len() as u32 >= forecast);
    }
}
