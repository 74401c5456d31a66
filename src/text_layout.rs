#[derive(Debug, Clone)]
pub struct WrappedText {
    pub rendered: String,
    pub positions: Vec<(u16, u16)>,
    pub line_count: u16,
}

#[derive(Debug, Default)]
struct LineCursor {
    rendered: String,
    line: u16,
    col: u16,
}

impl LineCursor {
    fn break_line(&mut self) {
        self.rendered.push('\n');
        self.line = self.line.saturating_add(1);
        self.col = 0;
    }

    fn position(&self) -> (u16, u16) {
        (self.line, self.col)
    }
}

/// Word-wraps `text` to `width` columns and records the (line, col) of every
/// char boundary so the input cursor can be placed on the wrapped output.
/// Words longer than a line are split hard.
pub fn wrap_word_with_positions(text: &str, width: u16) -> WrappedText {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut cursor = LineCursor::default();
    let mut positions = Vec::with_capacity(chars.len() + 1);
    positions.push(cursor.position());

    for (idx, &ch) in chars.iter().enumerate() {
        if ch == '\n' {
            cursor.break_line();
            positions.push(cursor.position());
            continue;
        }
        if cursor.col >= width || word_overflows(&chars, idx, cursor.col, width) {
            cursor.break_line();
        }
        cursor.rendered.push(ch);
        cursor.col = cursor.col.saturating_add(1);
        if cursor.col >= width {
            cursor.break_line();
        }
        positions.push(cursor.position());
    }

    let line_count = positions
        .iter()
        .map(|&(line, _)| line)
        .max()
        .unwrap_or(0)
        .saturating_add(1);
    WrappedText {
        rendered: cursor.rendered,
        positions,
        line_count,
    }
}

/// Wrapped lines of a transcript turn, without trailing blank lines.
pub fn wrap_lines(text: &str, width: u16) -> Vec<String> {
    let rendered = wrap_word_with_positions(text, width).rendered;
    let mut lines: Vec<String> = rendered.split('\n').map(ToString::to_string).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Converts a char index into a byte index for `String` editing.
pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

/// True when `idx` starts a word that fits on an empty line but not on the
/// remainder of the current one.
fn word_overflows(chars: &[char], idx: usize, col: u16, width: u16) -> bool {
    let starts_word = !chars[idx].is_whitespace()
        && (idx == 0 || chars[idx - 1].is_whitespace());
    if col == 0 || !starts_word {
        return false;
    }
    let word_len = chars[idx..]
        .iter()
        .take_while(|c| !c.is_whitespace())
        .count();
    let word_len = u16::try_from(word_len).unwrap_or(u16::MAX);
    word_len <= width && col.saturating_add(word_len) > width
}
