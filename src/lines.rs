/// One physical line of a source text.
///
/// `start..end` covers the line including its terminator; `text` excludes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    pub is_blank: bool,
}

pub fn collect_lines(source_text: &str) -> Vec<LineInfo<'_>> {
    fn push_line<'a>(lines: &mut Vec<LineInfo<'a>>, source_text: &'a str, start: usize, end: usize) {
        let segment = &source_text[start..end];
        let text = segment.trim_end_matches(['\r', '\n']);

        lines.push(LineInfo {
            start,
            end,
            text,
            is_blank: text.trim().is_empty(),
        });
    }

    let mut lines = Vec::new();
    let mut start = 0usize;

    for (index, byte) in source_text.bytes().enumerate() {
        if byte == b'\n' {
            push_line(&mut lines, source_text, start, index + 1);
            start = index + 1;
        }
    }

    if start < source_text.len() || lines.is_empty() {
        push_line(&mut lines, source_text, start, source_text.len());
    }

    lines
}

/// Zero-based index of the line containing `offset`. Offsets past the end map
/// to the last line.
pub fn line_index_for_offset(lines: &[LineInfo<'_>], offset: usize) -> usize {
    let index = lines.partition_point(|line| line.end <= offset);
    index.min(lines.len().saturating_sub(1))
}

/// One-based line number of `offset`.
pub fn line_number_for_offset(lines: &[LineInfo<'_>], offset: usize) -> usize {
    line_index_for_offset(lines, offset) + 1
}
