// Copyright (c) the Coral project contributors.

use crate::span::Location;
use console::style;

// Tabs render as four spaces so marker positions stay aligned with the source text.
const TAB: &str = "    ";

/// A Coral source file as handed to the front-end by the driver.
///
/// The inference core never reads files itself; drivers register sources here so the
/// diagnostic emitter can extract snippets for spans that reference them.
#[derive(Debug)]
pub struct SourceFile {
    pub filename: String,
    pub relative_path: String,
    pub raw_text: String,
}

impl SourceFile {
    pub fn new(relative_path: String, raw_text: String) -> Self {
        // The name of the source file, without its directory or extension.
        let filename = std::path::Path::new(&relative_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative_path.clone());

        SourceFile {
            filename,
            relative_path,
            raw_text,
        }
    }

    /// Renders the lines a span covers, each prefixed with a numbered gutter and followed by a
    /// marker line carrying `^`s under the spanned columns.
    pub(crate) fn get_snippet(&self, start: Location, end: Location) -> String {
        debug_assert!(start <= end);

        // The gutter is sized by the widest line number shown (always the last one), plus one
        // space of padding.
        let gutter_width = end.row.to_string().len() + 1;
        let gutter = |label: String| style(format!("{label:<gutter_width$}|")).blue().bold().to_string();
        let spacer = gutter(String::new());

        let mut snippet = spacer.clone() + "\n";

        let spanned_rows = self
            .raw_text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(row, _)| (start.row..=end.row).contains(row));

        for (row, line) in spanned_rows {
            let (rendered, starts) = render_line(line);
            snippet += &format!("{} {rendered}\n", gutter(row.to_string()));

            // Rows in the middle of a multi-line span are marked end to end.
            let from = if row == start.row { start.col } else { 1 };
            let to = if row == end.row { end.col } else { starts.len() };
            snippet += &format!("{spacer}{}\n", marker_line(&starts, from, to));
        }

        snippet + &spacer
    }
}

/// Expands tabs in a source line and records the display column each source column lands on.
/// The returned vector carries one extra entry: the width of the whole rendered line, which is
/// where a span ending past the last character points.
fn render_line(line: &str) -> (String, Vec<usize>) {
    let mut rendered = String::new();
    let mut starts = Vec::new();
    let mut width = 0;

    for character in line.chars() {
        starts.push(width);
        if character == '\t' {
            rendered.push_str(TAB);
            width += TAB.len();
        } else {
            rendered.push(character);
            width += 1;
        }
    }
    starts.push(width);

    (rendered, starts)
}

/// Builds the marker printed under a rendered line. `from` and `to` are 1-indexed source
/// columns with `to` exclusive; a zero-width range still gets a single `^` pointing at the
/// position between two characters.
fn marker_line(starts: &[usize], from: usize, to: usize) -> String {
    let display = |column: usize| starts[column.saturating_sub(1).min(starts.len() - 1)];

    let lead = display(from);
    let width = display(to).saturating_sub(lead).max(1);
    let marker = style("^".repeat(width)).yellow().bold();

    format!(" {}{marker}", " ".repeat(lead))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_line_up_under_the_spanned_columns() {
        console::set_colors_enabled(false);
        let file = SourceFile::new("main.coral".to_owned(), "a\nfoo bar\nc".to_owned());

        // Span covering "bar" on the second line.
        let snippet = file.get_snippet((2, 5).into(), (2, 8).into());
        let lines: Vec<&str> = snippet.lines().collect();

        assert_eq!(lines[1], "2 | foo bar");
        assert_eq!(lines[2], "  |     ^^^");
    }

    #[test]
    fn a_zero_width_span_marks_a_single_position() {
        console::set_colors_enabled(false);
        let file = SourceFile::new("main.coral".to_owned(), "foo".to_owned());

        let snippet = file.get_snippet((1, 2).into(), (1, 2).into());
        let lines: Vec<&str> = snippet.lines().collect();

        assert_eq!(lines[1], "1 | foo");
        assert_eq!(lines[2], "  |  ^");
    }

    #[test]
    fn tabs_expand_consistently_in_line_and_marker() {
        console::set_colors_enabled(false);
        let file = SourceFile::new("main.coral".to_owned(), "\tfoo".to_owned());

        // Span covering "foo", which sits after one tab.
        let snippet = file.get_snippet((1, 2).into(), (1, 5).into());
        let lines: Vec<&str> = snippet.lines().collect();

        assert_eq!(lines[1], "1 |     foo");
        assert_eq!(lines[2], "  |     ^^^");
    }
}
