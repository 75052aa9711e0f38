//! Conversion between byte offsets and 1-based line/column positions.

use text_size::{TextRange, TextSize};

/// Line start table for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineIndex {
    line_starts: Vec<TextSize>,
    /// Characters longer than one byte, in source order.
    wide_chars: Vec<TextRange>,
    len: TextSize,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let mut wide_chars = Vec::new();
        for (offset, ch) in text.char_indices() {
            let start = TextSize::from(offset as u32);
            if ch == '\n' {
                line_starts.push(start + TextSize::from(1));
            } else if ch.len_utf8() > 1 {
                wide_chars.push(TextRange::at(start, TextSize::of(ch)));
            }
        }
        Self {
            line_starts,
            wide_chars,
            len: TextSize::of(text),
        }
    }

    /// Returns the offset of a 1-based `line`/`column` pair.
    ///
    /// Columns count bytes. A column past the end of its line is clamped to
    /// the line end and a column inside a multi-byte character moves to the
    /// start of that character; a line past the end of the file yields
    /// `None`.
    pub(crate) fn offset(&self, line: u32, column: u32) -> Option<TextSize> {
        if column == 0 {
            return None;
        }
        let range = self.line_range(line)?;
        let offset = range.start() + TextSize::from(column - 1).min(range.len());
        Some(self.char_boundary(offset))
    }

    /// Length in bytes of 1-based `line`, without its newline.
    pub(crate) fn line_len(&self, line: u32) -> Option<u32> {
        self.line_range(line).map(|range| u32::from(range.len()))
    }

    fn line_range(&self, line: u32) -> Option<TextRange> {
        let index = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.len, |next| *next - TextSize::from(1));
        Some(TextRange::new(start, end))
    }

    fn char_boundary(&self, offset: TextSize) -> TextSize {
        let next = self.wide_chars.partition_point(|range| range.start() <= offset);
        match next.checked_sub(1).map(|index| self.wide_chars[index]) {
            Some(range) if range.start() < offset && offset < range.end() => range.start(),
            _ => offset,
        }
    }

    /// Returns the 1-based line and column of `offset`.
    pub(crate) fn line_col(&self, offset: TextSize) -> (u32, u32) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, u32::from(column) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_round_trip_through_line_columns() {
        let index = LineIndex::new("int a;\nint bc;\n");
        assert_eq!(index.offset(1, 1), Some(TextSize::from(0)));
        assert_eq!(index.offset(2, 5), Some(TextSize::from(11)));
        assert_eq!(index.line_col(TextSize::from(11)), (2, 5));
        assert_eq!(index.line_col(TextSize::from(7)), (2, 1));
    }

    #[test]
    fn columns_past_line_end_are_clamped() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(1, 40), Some(TextSize::from(2)));
        assert_eq!(index.offset(2, 40), Some(TextSize::from(5)));
        assert_eq!(index.offset(3, 1), None);
        assert_eq!(index.offset(0, 1), None);
        assert_eq!(index.offset(1, u32::MAX), Some(TextSize::from(2)));
        assert_eq!(index.offset(2, u32::MAX), Some(TextSize::from(5)));
        assert_eq!(index.line_len(1), Some(2));
        assert_eq!(index.line_len(2), Some(2));
        assert_eq!(index.line_len(3), None);
    }

    #[test]
    fn columns_inside_wide_characters_snap_to_their_start() {
        let text = "s = \"é€\";\nx";
        let index = LineIndex::new(text);
        // é occupies bytes 5..7, € occupies 7..10
        assert_eq!(index.offset(1, 7), Some(TextSize::from(5)));
        assert_eq!(index.offset(1, 9), Some(TextSize::from(7)));
        assert_eq!(index.offset(1, 10), Some(TextSize::from(7)));
        assert_eq!(index.offset(1, 11), Some(TextSize::from(10)));
        for column in 1..=14 {
            let offset = index.offset(1, column).expect("line exists");
            assert!(text.is_char_boundary(usize::from(offset)));
        }
    }
}
