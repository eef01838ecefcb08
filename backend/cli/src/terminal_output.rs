//! Terminal output: notes on stderr and plain tables.
//!
//! Notes go to stderr so stdout carries only command output (JSON from
//! `inspect` and `config`, the section table from `run`).

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn note(symbol: &str, color: &str, plain: &str, msg: &str) {
    if supports_color() {
        eprintln!("{color}{BOLD}{symbol}{RESET} {msg}");
    } else {
        eprintln!("{plain}: {msg}");
    }
}

pub fn note_info(msg: &str) {
    note("ℹ", CYAN, "INFO", msg);
}

pub fn note_warn(msg: &str) {
    note("⚠", YELLOW, "WARN", msg);
}

pub fn note_error(msg: &str) {
    note("✗", RED, "ERROR", msg);
}

pub fn note_success(msg: &str) {
    note("✓", GREEN, "OK", msg);
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
    /// Longer cells are cut and end with `…`.
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
            max_width: None,
        }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width.max(1));
        self
    }
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn truncate(s: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if visible_width(s) > max => {
            let plain = strip_ansi(s);
            let mut cut: String = plain.chars().take(max - 1).collect();
            cut.push('…');
            cut
        }
        _ => s.to_string(),
    }
}

/// Render a table; `bold` styles the header row.
pub fn render_table(columns: &[Column], rows: &[Vec<String>], bold: bool) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, col)| truncate(row.get(i).map(String::as_str).unwrap_or(""), col.max_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            rows.iter()
                .map(|r| visible_width(&r[i]))
                .chain(std::iter::once(visible_width(&col.header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| pad_cell(&col.header, *w, &col.align))
        .collect();
    if bold {
        out.push_str(&format!("{BOLD}  {}{RESET}\n", header.join("  ").trim_end()));
    } else {
        out.push_str(&format!("  {}\n", header.join("  ").trim_end()));
    }
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (col, w))| pad_cell(cell, *w, &col.align))
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }
    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = " ".repeat(width.saturating_sub(visible_width(s)));
    match align {
        Align::Left => format!("{s}{pad}"),
        Align::Right => format!("{pad}{s}"),
    }
}
