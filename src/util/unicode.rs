use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Control characters count as zero.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Collapse newlines and tabs to single spaces so a task fits on one row.
pub fn single_line(s: &str) -> String {
    s.split(['\n', '\r', '\t'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max_cells` cells, ending in `…` when cut.
/// Never splits a grapheme cluster.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1; // room for '…'
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = grapheme_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Truncate or right-pad with spaces to exactly `cells` cells.
/// A wide character that would straddle the edge is replaced by padding.
pub fn fit_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}

fn grapheme_width(g: &str) -> usize {
    if g.chars().all(char::is_control) {
        return 0;
    }
    UnicodeWidthStr::width(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_ascii() {
        assert_eq!(display_width("hello"), 5);
    }

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("你好"), 4);
    }

    #[test]
    fn display_width_emoji() {
        assert_eq!(display_width("🎉"), 2);
    }

    #[test]
    fn display_width_combining() {
        assert_eq!(display_width("cafe\u{0301}"), 4);
    }

    #[test]
    fn single_line_joins_parts() {
        assert_eq!(single_line("a\nb\tc"), "a b c");
        assert_eq!(single_line("plain"), "plain");
    }

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_to_width("milk", 10), "milk");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Pay the bills", 8), "Pay the…");
        assert_eq!(truncate_to_width("anything", 1), "…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn truncate_wide_chars_stay_whole() {
        // 你好世界 is 8 cells; budget 4 leaves room for one 2-cell char + …
        assert_eq!(truncate_to_width("你好世界", 4), "你…");
    }

    #[test]
    fn fit_pads_to_exact_width() {
        assert_eq!(fit_to_width("ab", 5), "ab   ");
        assert_eq!(display_width(&fit_to_width("你好世界", 5)), 5);
        assert_eq!(fit_to_width("abcdef", 4), "abc…");
    }
}
