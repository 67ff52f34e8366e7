use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Greedy word wrap measured in terminal-style columns.
///
/// Text that already fits is returned as a single line unchanged. Otherwise whitespace runs are
/// collapsed and words longer than `width` are broken across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if width == 0 || text.width() <= width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_w = 0usize;
    for word in text.split_whitespace() {
        let word_w = word.width();
        if word_w > width {
            if line_w > 0 && line_w + 1 < width {
                line.push(' ');
                line_w += 1;
            } else if line_w > 0 {
                lines.push(std::mem::take(&mut line));
                line_w = 0;
            }
            for ch in word.chars() {
                let ch_w = ch.width().unwrap_or(0);
                if line_w + ch_w > width && line_w > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0;
                }
                line.push(ch);
                line_w += ch_w;
            }
            continue;
        }

        if line_w == 0 {
            line.push_str(word);
            line_w = word_w;
        } else if line_w + 1 + word_w <= width {
            line.push(' ');
            line.push_str(word);
            line_w += 1 + word_w;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
            line_w = word_w;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Baseline-to-baseline distance for stacked label lines.
pub fn line_height(font_size: i64) -> i64 {
    (font_size as f64 * 1.25).round() as i64
}
