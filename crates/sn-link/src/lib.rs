//! Linker stages: expression simplification (C4), merge/placement (C5),
//! and relocation resolution (C6). Consumes `sn_model::Unit`s produced by
//! `sn-reader` and produces `sn_model::Segment`s ready for `sn-omf`.

pub mod diagnostics;
pub mod error;
pub mod merge;
pub mod resolve;
pub mod simplify;

pub use diagnostics::Warning;
pub use error::LinkError;
pub use merge::{merge, LinkType, ResolvedSymbol};
pub use resolve::resolve_section;

use sn_model::{Segment, Unit};
use std::collections::HashMap;

/// Run the full C5+C6 pipeline: merge/place all units into segments, rewrite
/// and simplify every relocation expression, then resolve each section's
/// relocations against its placed segment.
pub fn link(
    units: &mut [Unit],
    link_type: LinkType,
    predefined: &[(String, u32)],
) -> Result<(Vec<Segment>, HashMap<String, ResolvedSymbol>, Vec<Warning>), LinkError> {
    let mut warnings = Vec::new();
    let (mut segments, symbols) = merge::merge(units, link_type, predefined, &mut warnings)?;

    for u in units.iter_mut() {
        let file_names: HashMap<u16, String> =
            u.source_files.iter().map(|f| (f.file_id, f.name.clone())).collect();
        for section in u.sections.iter_mut() {
            let segnum = section.placed_segnum as u16;
            if segnum == 0 {
                continue;
            }
            let seg = &mut segments[segnum as usize - 1];
            resolve::resolve_section(
                seg,
                &mut section.relocs,
                |id| file_names.get(&id).cloned().unwrap_or_else(|| format!("<file {id}>")),
                &mut warnings,
            )?;
        }
    }

    for seg in segments.iter_mut() {
        seg.sort_relocations();
    }

    Ok((segments, symbols, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_model::{Reloc, RelocType, Section, Symbol, Unit};

    #[test]
    fn end_to_end_absolute_extern() {
        let mut producer = Unit::new("producer.o".into());
        producer.globals.push(Symbol::Global {
            symbol_id: 1,
            section_id: 0,
            name: "FOO".into(),
            value: 0x1234,
        });

        let mut consumer = Unit::new("consumer.o".into());
        let mut section = Section::new(1, 0, "CODE".into(), 0);
        section.append_data(&[0, 0, 0, 0]).unwrap();
        section
            .relocs
            .push(Reloc::new(RelocType::Reloc2, 0, 0, 0, vec![sn_model::Expr::Extern(1)]));
        consumer.sections.push(section);
        consumer.externs.push(Symbol::Extern { symbol_id: 1, name: "FOO".into() });

        let mut units = vec![producer, consumer];
        let (segments, _symbols, warnings) = link(&mut units, LinkType::PerGroup, &[]).unwrap();
        assert!(warnings.is_empty());
        let seg = segments.iter().find(|s| !s.data.is_empty()).unwrap();
        assert_eq!(&seg.data[..2], &[0x34, 0x12]);
        assert!(seg.relocs.is_empty());
        assert!(seg.intersegs.is_empty());
    }
}
