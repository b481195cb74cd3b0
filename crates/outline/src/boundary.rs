//! Section boundary calculation.
//!
//! A section owns every line from its heading up to the line before the next
//! heading of equal or shallower level, or to the document's last line.

use crate::types::HeadingOccurrence;

/// Byte offsets of line starts, for mapping source spans to line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
    trailing_newline: bool,
}

impl LineIndex {
    pub fn new(content: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .iter()
                .enumerate()
                .filter(|&(_, &b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            line_starts,
            len: content.len(),
            trailing_newline: content.last() == Some(&b'\n'),
        }
    }

    /// Line terminators plus one; an empty document has one line.
    pub fn total_lines(&self) -> usize {
        self.line_starts.len()
    }

    /// Last line a section can extend to.
    ///
    /// A trailing terminator ends the final line rather than opening a new one.
    pub fn last_line(&self) -> usize {
        let total = self.total_lines();
        if self.trailing_newline && total > 1 {
            total - 1
        } else {
            total
        }
    }

    /// 1-based line containing `byte`.
    pub fn line_of(&self, byte: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= byte).max(1)
    }

    /// Sum of (line length + 1) over `start..=end`, lengths in bytes.
    pub fn span_chars(&self, start: usize, end: usize) -> usize {
        let total = self.total_lines();
        if start == 0 || start > end || start > total {
            return 0;
        }

        let from = self.line_starts[start - 1];
        if end < total {
            self.line_starts[end] - from
        } else {
            // The final line has no terminator of its own but still counts one.
            self.len - from + 1
        }
    }
}

/// Inclusive line span attributed to one heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionBounds {
    pub start_line: usize,
    pub end_line: usize,
    pub line_count: usize,
    pub char_count: usize,
}

/// Compute the span of every heading in `headings` (document order).
///
/// Each open heading is closed by the first later heading whose level is equal
/// or shallower; headings still open at the end run to the last line.
pub fn compute_boundaries(headings: &[HeadingOccurrence], lines: &LineIndex) -> Vec<SectionBounds> {
    let last_line = lines.last_line();
    let mut end_lines = vec![last_line; headings.len()];
    let mut open: Vec<usize> = Vec::new();

    for (idx, heading) in headings.iter().enumerate() {
        while let Some(&top) = open.last() {
            if headings[top].level < heading.level {
                break;
            }
            end_lines[top] = heading.start_line.saturating_sub(1);
            open.pop();
        }
        open.push(idx);
    }

    headings
        .iter()
        .zip(end_lines)
        .map(|(heading, end_line)| {
            let start_line = heading.start_line;
            let end_line = end_line.max(start_line);
            SectionBounds {
                start_line,
                end_line,
                line_count: end_line - start_line + 1,
                char_count: lines.span_chars(start_line, end_line),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, start_line: usize) -> HeadingOccurrence {
        HeadingOccurrence {
            level,
            title: format!("h{}", start_line),
            start_line,
            byte_range: 0..0,
        }
    }

    #[test]
    fn test_line_index_counts() {
        let empty = LineIndex::new(b"");
        assert_eq!(empty.total_lines(), 1);
        assert_eq!(empty.last_line(), 1);

        let trailing = LineIndex::new(b"a\nb\n");
        assert_eq!(trailing.total_lines(), 3);
        assert_eq!(trailing.last_line(), 2);

        let open = LineIndex::new(b"a\nb");
        assert_eq!(open.total_lines(), 2);
        assert_eq!(open.last_line(), 2);
    }

    #[test]
    fn test_line_of() {
        let index = LineIndex::new(b"ab\ncd\n\nef");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 1);
        assert_eq!(index.line_of(3), 2);
        assert_eq!(index.line_of(6), 3);
        assert_eq!(index.line_of(7), 4);
    }

    #[test]
    fn test_span_chars_matches_line_sum() {
        let content = "# A\n\nbody text\n## B\nlast";
        let index = LineIndex::new(content.as_bytes());
        let lines: Vec<&str> = content.split('\n').collect();

        for start in 1..=lines.len() {
            for end in start..=lines.len() {
                let expected: usize = lines[start - 1..end].iter().map(|l| l.len() + 1).sum();
                assert_eq!(index.span_chars(start, end), expected, "span {}..={}", start, end);
            }
        }
    }

    #[test]
    fn test_boundaries_close_on_equal_or_shallower() {
        // # A (1), ## B (3), ### C (5), ## D (7), # E (9), 10 lines total
        let content = "# A\n\n## B\n\n### C\n\n## D\n\n# E\nend\n";
        let index = LineIndex::new(content.as_bytes());
        let headings = vec![heading(1, 1), heading(2, 3), heading(3, 5), heading(2, 7), heading(1, 9)];

        let bounds = compute_boundaries(&headings, &index);
        let ends: Vec<usize> = bounds.iter().map(|b| b.end_line).collect();
        assert_eq!(ends, vec![8, 6, 6, 8, 10]);
        assert_eq!(bounds[0].line_count, 8);
        assert!(bounds.iter().all(|b| b.end_line >= b.start_line));
    }

    #[test]
    fn test_deeper_heading_does_not_close_parent() {
        let index = LineIndex::new(b"### deep\n# top\n");
        let headings = vec![heading(3, 1), heading(1, 2)];

        let bounds = compute_boundaries(&headings, &index);
        assert_eq!(bounds[0].end_line, 1);
        assert_eq!(bounds[1].end_line, 2);
    }
}
