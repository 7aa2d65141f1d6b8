//! Linker/merge stage (C5): section placement, the three link-type
//! layouts, symbol table construction, and the query-operator rewrite.
//! The symbol table is threaded explicitly through this function rather
//! than living as a global, generalizing `atlas-linker::Linker`'s explicit
//! `LabelMap` to the three placement layouts this format needs.

use std::collections::HashMap;

use sn_model::{Expr, Group, Segment, Symbol, Unit};

use crate::diagnostics::Warning;
use crate::error::LinkError;
use crate::simplify::simplify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkType {
    /// `L0` — one output segment for everything.
    OneSegment,
    /// `L1` — one segment per group (sections with no group form a single
    /// anonymous-group segment). Default.
    #[default]
    PerGroup,
    /// `L2` — one segment per (group, section-name) pair.
    PerSection,
}

#[derive(Debug, Clone, Copy)]
pub enum ResolvedSymbol {
    Absolute(u32),
    Located { segnum: u16, offset: u32 },
}

#[derive(Debug, Clone, Copy, Default)]
struct Range {
    segnum: u16,
    start: u32,
    end: u32,
}

const ANONYMOUS_GROUP: &str = "";

fn group_name(unit: &Unit, group_id: u16) -> String {
    if group_id == sn_model::NO_GROUP {
        return ANONYMOUS_GROUP.to_string();
    }
    unit.find_group(group_id).map(|g: &Group| g.name.clone()).unwrap_or_default()
}

/// Run the full merge/placement pipeline over a set of already-parsed
/// units, producing the OMF segments and the program-wide symbol table.
/// Relocation expressions inside `units` are rewritten and simplified in
/// place; section `placed_segnum`/`placed_offset` fields are filled in.
pub fn merge(
    units: &mut [Unit],
    link_type: LinkType,
    predefined: &[(String, u32)],
    warnings: &mut Vec<Warning>,
) -> Result<(Vec<Segment>, HashMap<String, ResolvedSymbol>), LinkError> {
    // 1. union of group names, first-seen order; anonymous group included
    //    if any section has group_id == 0.
    let mut group_order: Vec<String> = Vec::new();
    for u in units.iter() {
        for g in &u.groups {
            if !group_order.contains(&g.name) {
                group_order.push(g.name.clone());
            }
        }
    }
    let has_anonymous = units
        .iter()
        .any(|u| u.sections.iter().any(|s| s.group_id == sn_model::NO_GROUP));
    if has_anonymous && !group_order.contains(&ANONYMOUS_GROUP.to_string()) {
        group_order.push(ANONYMOUS_GROUP.to_string());
    }

    // 2. for each group, union of section names belonging to it.
    let mut sections_of_group: HashMap<String, Vec<String>> = HashMap::new();
    for gname in &group_order {
        let mut names = Vec::new();
        for u in units.iter() {
            for s in &u.sections {
                if &group_name(u, s.group_id) == gname && !names.contains(&s.name) {
                    names.push(s.name.clone());
                }
            }
        }
        sections_of_group.insert(gname.clone(), names);
    }

    // 3. walk groups -> section names -> units, placing matching sections.
    let mut segments: Vec<Segment> = Vec::new();
    let mut segnum_by_key: HashMap<String, u16> = HashMap::new();
    let mut group_ranges: HashMap<String, Range> = HashMap::new();
    let mut section_ranges: HashMap<(String, String), Range> = HashMap::new();

    for gname in &group_order {
        let section_names = sections_of_group.get(gname).cloned().unwrap_or_default();
        for sname in &section_names {
            for u in units.iter_mut() {
                let matches: Vec<usize> = u
                    .sections
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| &group_name(u, s.group_id) == gname && &s.name == sname)
                    .map(|(i, _)| i)
                    .collect();

                for idx in matches {
                    let key = match link_type {
                        LinkType::OneSegment => "ALL".to_string(),
                        LinkType::PerGroup => gname.clone(),
                        LinkType::PerSection => format!("{gname}\u{0}{sname}"),
                    };
                    let segnum = *segnum_by_key.entry(key.clone()).or_insert_with(|| {
                        let loadname = match link_type {
                            LinkType::OneSegment => "PROGRAM".to_string(),
                            LinkType::PerGroup => display_name(gname),
                            LinkType::PerSection => display_name(sname),
                        };
                        segments.push(Segment::new(segments.len() as u16 + 1, loadname.clone(), loadname));
                        segments.len() as u16
                    });

                    let seg = &mut segments[segnum as usize - 1];
                    let placed_offset = seg.data.len() as u32;
                    let section = &mut u.sections[idx];
                    section.placed_segnum = segnum as u32;
                    section.placed_offset = placed_offset;

                    if section.bss_size() != 0 {
                        seg.data.resize(seg.data.len() + section.bss_size() as usize, 0);
                    } else {
                        seg.data.extend_from_slice(section.data());
                    }
                    let placed_len = section.placed_len();

                    for reloc in section.relocs.iter_mut() {
                        reloc.address += placed_offset;
                    }

                    // 4. record per-(group,section) and per-group ranges.
                    let end = placed_offset + placed_len;
                    section_ranges
                        .entry((gname.clone(), sname.clone()))
                        .and_modify(|r| {
                            r.start = r.start.min(placed_offset);
                            r.end = r.end.max(end);
                        })
                        .or_insert(Range { segnum, start: placed_offset, end });
                    group_ranges
                        .entry(gname.clone())
                        .and_modify(|r| {
                            r.start = r.start.min(placed_offset);
                            r.end = r.end.max(end);
                        })
                        .or_insert(Range { segnum, start: placed_offset, end });

                    if section.flags != 0 {
                        warnings.push(Warning::UnconfirmedFlagBits {
                            context: format!("section '{}'", section.name),
                            flags: section.flags,
                        });
                    }
                }
            }
        }
    }

    // 5. query-operator rewrite: V_SECTION / V_FN_SECT(_END) / V_FN_GROUP(_END).
    for u in units.iter_mut() {
        let sections_by_id: HashMap<u16, (String, String)> = u
            .sections
            .iter()
            .map(|s| (s.section_id, (group_name(u, s.group_id), s.name.clone())))
            .collect();
        for section in u.sections.iter_mut() {
            for reloc in section.relocs.iter_mut() {
                for tok in reloc.expr.iter_mut() {
                    rewrite_query(tok, &sections_by_id, &u.groups, &section_ranges, &group_ranges)?;
                }
            }
        }
    }

    // 6. program-wide symbol table. CLI `-D name[=value]` defines seed it
    //    as absolute symbols before any unit's globals are inserted, so a
    //    conflicting global definition is reported the same as any other
    //    duplicate-symbol error.
    let mut symbols: HashMap<String, ResolvedSymbol> = HashMap::new();
    for (name, value) in predefined {
        insert_symbol(&mut symbols, name.clone(), ResolvedSymbol::Absolute(*value))?;
    }
    for u in units.iter() {
        for sym in &u.globals {
            let Symbol::Global { section_id, name, value, .. } = sym else {
                continue;
            };
            let resolved = if *section_id == 0 {
                ResolvedSymbol::Absolute(*value)
            } else {
                let section = u
                    .find_section(*section_id)
                    .ok_or(LinkError::UnknownSectionQuery { id: *section_id })?;
                ResolvedSymbol::Located {
                    segnum: section.placed_segnum as u16,
                    offset: section.placed_offset + value,
                }
            };
            insert_symbol(&mut symbols, name.clone(), resolved)?;
        }
    }

    // 7. extern rewrite.
    for u in units.iter_mut() {
        for section in u.sections.iter_mut() {
            for reloc in section.relocs.iter_mut() {
                for tok in reloc.expr.iter_mut() {
                    if let Expr::Extern(extern_id) = *tok {
                        let ext = u
                            .find_extern(extern_id)
                            .ok_or_else(|| LinkError::UnknownExtern { unit: u.path.clone(), extern_id })?;
                        let resolved = symbols
                            .get(ext.name())
                            .ok_or_else(|| LinkError::UnknownSymbol { name: ext.name().to_string() })?;
                        *tok = match resolved {
                            ResolvedSymbol::Absolute(v) => Expr::Const(*v),
                            ResolvedSymbol::Located { segnum, offset } => Expr::Omf {
                                segment: *segnum,
                                offset: *offset,
                            },
                        };
                    }
                }
            }
        }
    }

    // 8. simplify every relocation expression.
    for u in units.iter_mut() {
        for section in u.sections.iter_mut() {
            for reloc in section.relocs.iter_mut() {
                simplify(&mut reloc.expr);
            }
        }
    }

    Ok((segments, symbols))
}

fn insert_symbol(
    symbols: &mut HashMap<String, ResolvedSymbol>,
    name: String,
    resolved: ResolvedSymbol,
) -> Result<(), LinkError> {
    match symbols.get(&name) {
        None => {
            symbols.insert(name, resolved);
            Ok(())
        }
        Some(ResolvedSymbol::Absolute(existing)) => match resolved {
            ResolvedSymbol::Absolute(v) if v == *existing => Ok(()),
            ResolvedSymbol::Absolute(v) => Err(LinkError::DuplicateSymbol {
                name,
                first: *existing,
                second: v,
            }),
            ResolvedSymbol::Located { offset, .. } => Err(LinkError::DuplicateSymbol {
                name,
                first: *existing,
                second: offset,
            }),
        },
        Some(ResolvedSymbol::Located { segnum, offset }) => {
            let (first_seg, first_off) = (*segnum, *offset);
            let second = match resolved {
                ResolvedSymbol::Absolute(v) => v,
                ResolvedSymbol::Located { offset, .. } => offset,
            };
            Err(LinkError::DuplicateSymbol {
                name,
                first: ((first_seg as u32) << 16) | first_off,
                second,
            })
        }
    }
}

fn rewrite_query(
    tok: &mut Expr,
    sections_by_id: &HashMap<u16, (String, String)>,
    groups: &[Group],
    section_ranges: &HashMap<(String, String), Range>,
    group_ranges: &HashMap<String, Range>,
) -> Result<(), LinkError> {
    match *tok {
        Expr::Section(id) => {
            let (g, s) = sections_by_id.get(&id).cloned().ok_or(LinkError::UnknownSectionQuery { id })?;
            let r = section_ranges.get(&(g, s)).ok_or(LinkError::UnknownSectionQuery { id })?;
            *tok = Expr::Omf { segment: r.segnum, offset: r.start };
        }
        Expr::SectionStart(id) => {
            let (g, s) = sections_by_id.get(&id).cloned().ok_or(LinkError::UnknownSectionQuery { id })?;
            let r = section_ranges.get(&(g, s)).ok_or(LinkError::UnknownSectionQuery { id })?;
            *tok = Expr::Omf { segment: r.segnum, offset: r.start };
        }
        Expr::SectionEnd(id) => {
            let (g, s) = sections_by_id.get(&id).cloned().ok_or(LinkError::UnknownSectionQuery { id })?;
            let r = section_ranges.get(&(g, s)).ok_or(LinkError::UnknownSectionQuery { id })?;
            *tok = Expr::Omf { segment: r.segnum, offset: r.end };
        }
        Expr::GroupStart(id) => {
            let name = groups
                .iter()
                .find(|g| g.group_id == id)
                .map(|g| g.name.clone())
                .ok_or(LinkError::UnknownGroupQuery { name: id.to_string() })?;
            let r = group_ranges
                .get(&name)
                .ok_or(LinkError::UnknownGroupQuery { name: name.clone() })?;
            *tok = Expr::Omf { segment: r.segnum, offset: r.start };
        }
        Expr::GroupEnd(id) => {
            let name = groups
                .iter()
                .find(|g| g.group_id == id)
                .map(|g| g.name.clone())
                .ok_or(LinkError::UnknownGroupQuery { name: id.to_string() })?;
            let r = group_ranges
                .get(&name)
                .ok_or(LinkError::UnknownGroupQuery { name: name.clone() })?;
            *tok = Expr::Omf { segment: r.segnum, offset: r.end };
        }
        _ => {}
    }
    Ok(())
}

/// OMF loadnames are at most 10 characters; longer group/section names are
/// truncated (the writer pads/truncates again, this just keeps the name
/// usable before that point).
fn display_name(name: &str) -> String {
    if name.is_empty() {
        "UNNAMED".to_string()
    } else {
        name.chars().take(10).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_model::{Reloc, RelocType, Section};

    #[test]
    fn bss_section_places_as_zero_filled_run() {
        let mut u = Unit::new("a.o".into());
        let mut s = Section::new(1, NO_GROUP, "BSS".into(), 0);
        s.reserve_bss(4).unwrap();
        u.sections.push(s);
        let mut units = vec![u];
        let (segments, _symbols) = merge(&mut units, LinkType::PerGroup, &[], &mut Vec::new()).unwrap();
        assert_eq!(segments[0].data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn predefined_symbol_resolves_an_extern() {
        let mut u = Unit::new("a.o".into());
        let mut s = Section::new(1, NO_GROUP, "CODE".into(), 0);
        s.append_data(&[0, 0]).unwrap();
        s.relocs.push(Reloc::new(RelocType::Reloc2, 0, 0, 0, vec![Expr::Extern(1)]));
        u.sections.push(s);
        u.externs.push(Symbol::Extern { symbol_id: 1, name: "VERSION".into() });
        let mut units = vec![u];
        let (_segments, symbols) = merge(
            &mut units,
            LinkType::PerGroup,
            &[("VERSION".to_string(), 7)],
            &mut Vec::new(),
        )
        .unwrap();
        assert!(matches!(symbols.get("VERSION"), Some(ResolvedSymbol::Absolute(7))));
    }

    #[test]
    fn conflicting_predefine_and_global_is_an_error() {
        let mut u = Unit::new("a.o".into());
        u.globals.push(Symbol::Global { symbol_id: 1, section_id: 0, name: "VERSION".into(), value: 9 });
        let mut units = vec![u];
        let err = merge(&mut units, LinkType::PerGroup, &[("VERSION".to_string(), 7)], &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, LinkError::DuplicateSymbol { .. }));
    }

    #[test]
    fn one_segment_link_type_merges_all_groups() {
        let mut a = Unit::new("a.o".into());
        let mut sa = Section::new(1, NO_GROUP, "CODE".into(), 0);
        sa.append_data(&[1, 2]).unwrap();
        a.sections.push(sa);
        let mut b = Unit::new("b.o".into());
        let mut sb = Section::new(1, NO_GROUP, "DATA".into(), 0);
        sb.append_data(&[3, 4]).unwrap();
        b.sections.push(sb);
        let mut units = vec![a, b];
        let (segments, _symbols) = merge(&mut units, LinkType::OneSegment, &[], &mut Vec::new()).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].data, vec![1, 2, 3, 4]);
    }
}
