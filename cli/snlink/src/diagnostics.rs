//! Colored terminal output for warnings and the verbose link summary.
//! Color helpers mirror `atlas_inspect::formatting`'s `dim`/`bold`/etc.,
//! respecting `NO_COLOR`.

use sn_link::Warning;
use sn_model::Segment;

pub fn use_colour() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn dim(s: &str) -> String {
    if use_colour() { format!("\x1b[2m{}\x1b[0m", s) } else { s.to_string() }
}

pub fn bold(s: &str) -> String {
    if use_colour() { format!("\x1b[1m{}\x1b[0m", s) } else { s.to_string() }
}

pub fn yellow(s: &str) -> String {
    if use_colour() { format!("\x1b[33m{}\x1b[0m", s) } else { s.to_string() }
}

pub fn green(s: &str) -> String {
    if use_colour() { format!("\x1b[32m{}\x1b[0m", s) } else { s.to_string() }
}

pub fn print_warning(w: &Warning) {
    eprintln!("{} {}", yellow("warning:"), w);
}

pub fn print_link_summary(segments: &[Segment], warning_count: usize) {
    println!("{}", bold("link summary"));
    for seg in segments {
        println!(
            "  {} segnum={} bytes={} relocs={} intersegs={}",
            green(&seg.loadname),
            seg.segnum,
            seg.data.len(),
            seg.relocs.len(),
            seg.intersegs.len()
        );
    }
    println!("{}", dim(&format!("{} warning(s)", warning_count)));
}
