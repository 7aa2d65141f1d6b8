mod args;
mod defines;
mod diagnostics;
mod dump_symbols;
mod file_type;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use args::{Arguments, Command, DumpSymbolsArgs, LinkArgs};
use sn_link::LinkType;
use sn_model::Unit;

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_USAGE: u8 = 64;

fn main() -> ExitCode {
    let args = match Arguments::try_parse() {
        Ok(a) => a,
        Err(e) => {
            e.print().ok();
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let code = match args.command {
        Command::Link(link_args) => run_link(&link_args),
        Command::DumpSymbols(dump_args) => run_dump_symbols(&dump_args),
    };
    ExitCode::from(code)
}

fn load_units(paths: &[String]) -> Result<Vec<(String, Unit)>, String> {
    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
        let unit = sn_reader::parse_unit(path, &bytes).map_err(|e| format!("{}: {}", path, e))?;
        units.push((path.clone(), unit));
    }
    Ok(units)
}

fn run_link(args: &LinkArgs) -> u8 {
    let mut predefined = Vec::with_capacity(args.defines.len());
    for raw in &args.defines {
        match defines::parse_define(raw) {
            Ok(pair) => predefined.push(pair),
            Err(e) => {
                eprintln!("snlink: {}", e);
                return EXIT_USAGE;
            }
        }
    }

    let loaded = match load_units(&args.inputs) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("snlink: {}", e);
            return EXIT_ERROR;
        }
    };
    let mut units: Vec<Unit> = loaded.into_iter().map(|(_, u)| u).collect();

    let link_type = match args.link_type {
        0 => LinkType::OneSegment,
        2 => LinkType::PerSection,
        _ => LinkType::PerGroup,
    };

    let (mut segments, _symbols, warnings) = match sn_link::link(&mut units, link_type, &predefined) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("snlink: {}", e);
            return EXIT_ERROR;
        }
    };

    for w in &warnings {
        diagnostics::print_warning(w);
    }

    let options = sn_omf::WriteOptions {
        compress: !args.no_compress,
        super_records: !args.no_super,
        expressload: !args.no_expressload,
        v1: args.v1,
    };
    let bytes = sn_omf::write_omf(&mut segments, &options);

    if let Err(e) = std::fs::write(&args.output, &bytes) {
        eprintln!("snlink: {}: {}", args.output, e);
        return EXIT_ERROR;
    }

    if let Some(tag) = &args.file_type_tag {
        if let Err(e) = file_type::set_file_type(Path::new(&args.output), tag) {
            eprintln!("snlink: warning: could not set file type on {}: {}", args.output, e);
        }
    }

    if args.verbose {
        diagnostics::print_link_summary(&segments, warnings.len());
    }

    EXIT_OK
}

fn run_dump_symbols(args: &DumpSymbolsArgs) -> u8 {
    let units = match load_units(&args.inputs) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("snlink: {}", e);
            return EXIT_ERROR;
        }
    };
    dump_symbols::run(args, &units);
    EXIT_OK
}
