//! `dump-symbols` subcommand: one entry per local/global/extern symbol,
//! in the style of the reference toolchain's `nm` companion
//! (`original_source/nm.cpp`). Not part of the original `snlink`; added
//! as a linker-adjacent inspection utility.

use sn_model::{Symbol, Unit};

use crate::args::DumpSymbolsArgs;

struct Entry {
    name: String,
    value: u32,
    kind: char,
}

pub fn run(args: &DumpSymbolsArgs, units: &[(String, Unit)]) {
    let include_local;
    let include_global;
    let include_extern;
    if args.undefined_only {
        include_local = false;
        include_global = false;
        include_extern = true;
    } else if args.global_only {
        include_local = false;
        include_global = true;
        include_extern = false;
    } else if args.external_only {
        include_local = true;
        include_global = true;
        include_extern = false;
    } else {
        include_local = true;
        include_global = true;
        include_extern = true;
    }

    for (path, unit) in units {
        let mut entries = Vec::new();

        if include_local {
            for sym in &unit.locals {
                entries.push(entry_for(sym, if is_absolute(sym) { 'a' } else { 't' }));
            }
        }
        if include_global {
            for sym in &unit.globals {
                entries.push(entry_for(sym, if is_absolute(sym) { 'A' } else { 'T' }));
            }
        }
        if include_extern {
            for sym in &unit.externs {
                entries.push(Entry { name: sym.name().to_string(), value: 0, kind: 'U' });
            }
        }

        if !args.no_sort {
            entries.sort_by(|a, b| {
                if args.sort_by_value { a.value.cmp(&b.value) } else { a.name.cmp(&b.name) }
            });
        }
        if args.reverse {
            entries.reverse();
        }

        if !args.with_filename {
            println!("\n{}:", path);
        }
        for e in &entries {
            let value_str = if e.kind == 'U' {
                " ".repeat(10)
            } else {
                match args.radix {
                    'o' => format!("{:010o}", e.value),
                    'd' => format!("{:010}", e.value),
                    _ => format!("{:010x}", e.value),
                }
            };
            if args.with_filename {
                print!("{}: ", path);
            }
            println!("{} {} {}", value_str, e.kind, e.name);
        }
    }
}

fn is_absolute(sym: &Symbol) -> bool {
    matches!(sym, Symbol::Global { section_id: 0, .. } | Symbol::Local { section_id: 0, .. })
}

fn entry_for(sym: &Symbol, kind: char) -> Entry {
    let value = match sym {
        Symbol::Global { value, .. } | Symbol::Local { value, .. } => *value,
        Symbol::Extern { .. } => 0,
    };
    Entry { name: sym.name().to_string(), value, kind }
}
