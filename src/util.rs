/// Utility functions for the FillClass server.
///
/// This module contains helpers for converting between LSP positions and
/// byte offsets, applying engine text changes to a string, and client
/// logging.
use std::ops::Range;

use tower_lsp::lsp_types::{MessageType, Position, TextEdit};

use crate::Backend;
use crate::fill::TextChange;

/// Byte offsets at which each line of `content` starts.
fn line_starts(content: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(memchr::memchr_iter(b'\n', content.as_bytes()).map(|i| i + 1))
        .collect()
}

/// Convert an LSP position (line, UTF-16 column) to a byte offset.
///
/// Columns past the end of the line clamp to the line end; lines past the
/// end of the document clamp to the document end.
pub fn position_to_offset(content: &str, position: Position) -> usize {
    let starts = line_starts(content);
    let Some(&line_start) = starts.get(position.line as usize) else {
        return content.len();
    };
    let line_end = starts
        .get(position.line as usize + 1)
        .map_or(content.len(), |next| next - 1);
    let line = &content[line_start..line_end];

    let mut units = 0usize;
    for (idx, ch) in line.char_indices() {
        if units >= position.character as usize {
            return line_start + idx;
        }
        units += ch.len_utf16();
    }
    line_end
}

/// Convert a byte offset to an LSP position.
pub fn offset_to_position(content: &str, offset: usize) -> Position {
    let offset = offset.min(content.len());
    let starts = line_starts(content);
    let line = starts.partition_point(|&s| s <= offset) - 1;
    let line_start = starts[line];
    let character: usize = content
        .get(line_start..offset)
        .map_or(0, |prefix| prefix.chars().map(char::len_utf16).sum());
    Position {
        line: line as u32,
        character: character as u32,
    }
}

pub fn to_lsp_range(content: &str, range: &Range<usize>) -> tower_lsp::lsp_types::Range {
    tower_lsp::lsp_types::Range {
        start: offset_to_position(content, range.start),
        end: offset_to_position(content, range.end),
    }
}

/// Engine changes as LSP edits against the unmodified `content`.
pub fn to_text_edits(content: &str, changes: &[TextChange]) -> Vec<TextEdit> {
    changes
        .iter()
        .map(|c| TextEdit {
            range: to_lsp_range(content, &c.range),
            new_text: c.new_text.clone(),
        })
        .collect()
}

/// Apply non-overlapping changes to `source`.
pub fn apply_changes(source: &str, changes: &[TextChange]) -> String {
    let mut sorted: Vec<&TextChange> = changes.iter().collect();
    sorted.sort_by_key(|c| std::cmp::Reverse(c.range.start));
    let mut result = source.to_string();
    for change in sorted {
        result.replace_range(change.range.clone(), &change.new_text);
    }
    result
}

impl Backend {
    pub(crate) async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_round_trip_through_offsets() {
        let content = "fun a() {}\n    val x = foo()\n";
        let offset = content.find("foo").unwrap();
        let position = offset_to_position(content, offset);
        assert_eq!(position, Position::new(1, 12));
        assert_eq!(position_to_offset(content, position), offset);
    }

    #[test]
    fn utf16_columns() {
        // 'é' is one UTF-16 unit and two bytes, '𝄞' two units and four bytes.
        let content = "val s = \"é𝄞\"; foo()";
        let offset = content.find("foo").unwrap();
        let position = offset_to_position(content, offset);
        assert_eq!(position.character, 15);
        assert_eq!(position_to_offset(content, position), offset);
    }

    #[test]
    fn positions_clamp() {
        let content = "ab\ncd";
        assert_eq!(position_to_offset(content, Position::new(0, 99)), 2);
        assert_eq!(position_to_offset(content, Position::new(9, 0)), content.len());
        assert_eq!(offset_to_position(content, 99), Position::new(1, 2));
    }

    #[test]
    fn applies_changes_in_any_order() {
        let changes = vec![
            TextChange::insert(0, "import a\n"),
            TextChange::insert(10, "x = 1"),
        ];
        assert_eq!(apply_changes("val v = f()", &changes), "import a\nval v = f(x = 1)");
    }
}
