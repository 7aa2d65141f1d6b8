use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, name = "snlink")]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Link one or more SN object files into an OMF load file.
    Link(LinkArgs),
    /// Display the symbol table of one or more SN object files.
    DumpSymbols(DumpSymbolsArgs),
}

#[derive(Debug, clap::Args)]
pub struct LinkArgs {
    /// input object files
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<String>,

    /// output load file
    #[arg(short = 'o', long = "output", value_name = "OUTPUT", default_value = "a.out")]
    pub output: String,

    /// host file-type tag applied to the output after writing
    #[arg(short = 't', long = "type", value_name = "TAG")]
    pub file_type_tag: Option<String>,

    /// 0 = one segment, 1 = one per group (default), 2 = one per section
    #[arg(short = 'l', long = "link-type", value_parser = clap::value_parser!(u8).range(0..=2), default_value_t = 1)]
    pub link_type: u8,

    /// emit version-1 OMF (disables ExpressLoad and super records)
    #[arg(short = '1', long = "v1")]
    pub v1: bool,

    #[arg(long = "no-expressload")]
    pub no_expressload: bool,

    #[arg(long = "no-compress")]
    pub no_compress: bool,

    #[arg(long = "no-super")]
    pub no_super: bool,

    /// print a summary of segments, symbols, and warnings
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// predefine a symbol: NAME or NAME=VALUE (decimal, 0x/$ hex, % binary)
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct DumpSymbolsArgs {
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<String>,

    /// only external (global + local) symbols
    #[arg(short = 'e', long = "external")]
    pub external_only: bool,

    /// only global symbols
    #[arg(short = 'g', long = "global-only")]
    pub global_only: bool,

    /// only undefined (extern) symbols
    #[arg(short = 'u', long = "undefined-only")]
    pub undefined_only: bool,

    /// sort by value instead of name
    #[arg(short = 'v', long = "sort-by-value")]
    pub sort_by_value: bool,

    /// reverse the sort order
    #[arg(short = 'r', long = "reverse")]
    pub reverse: bool,

    /// do not sort
    #[arg(short = 'p', long = "no-sort")]
    pub no_sort: bool,

    /// prefix each line with the source file name
    #[arg(short = 'A', long = "with-filename")]
    pub with_filename: bool,

    /// value radix: d(ecimal), o(ctal), or x (default)
    #[arg(short = 't', long = "radix", value_name = "d|o|x", default_value = "x")]
    pub radix: char,
}
