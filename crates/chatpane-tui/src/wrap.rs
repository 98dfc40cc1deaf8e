//! Hard wrapping by terminal cell width
//!
//! Transcript rows are counted and rendered from the same rules, so the
//! scroll target always matches what is drawn.

use unicode_width::UnicodeWidthChar;

fn cell_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Split `line` into rows of at most `width` cells. A character wider than
/// the whole row still gets a row of its own.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for c in line.chars() {
        let w = cell_width(c);
        if used > 0 && used + w > width {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    rows.push(current);
    rows
}

/// Row count of `wrap_line` without building the rows
pub fn line_rows(line: &str, width: usize) -> usize {
    let width = width.max(1);
    let mut rows = 1;
    let mut used = 0;

    for c in line.chars() {
        let w = cell_width(c);
        if used > 0 && used + w > width {
            rows += 1;
            used = 0;
        }
        used += w;
    }
    rows
}
