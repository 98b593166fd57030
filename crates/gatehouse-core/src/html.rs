//! Pure HTML response normalization.
//!
//! Backends wrap their report fragment in conversational prose, stringified
//! structures, or JSON artifacts. Two transforms compensate:
//!
//! - [`clean_html`] strips formatting noise around the fragment; applied to
//!   every backend result before delivery and persistence. Idempotent.
//! - [`extract_html`] pulls the canonical block out of free text; applied
//!   only when persisting, to avoid storing wrapper prose.
//!
//! Both are pure and total: on any input they return a string, never fail.

use std::sync::LazyLock;

use regex::Regex;

static HTML_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<html>.*?</html>").expect("valid regex"));
static BODY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<body>.*?</body>").expect("valid regex"));

/// Known fragment start tags, searched for the earliest occurrence.
const START_TAGS: [&str; 5] = ["<div", "<html", "<body", "<section", "<h1"];

/// Extract the canonical HTML block from free text.
///
/// Priority: first `<html>…</html>` block, else first `<body>…</body>`
/// block, else the whole text if it holds a `<div` / `</div>` pair, else the
/// original text unchanged.
pub fn extract_html(text: &str) -> String {
    if let Some(m) = HTML_BLOCK.find(text) {
        return m.as_str().to_string();
    }
    if let Some(m) = BODY_BLOCK.find(text) {
        return m.as_str().to_string();
    }
    if text.contains("<div") && text.contains("</div>") {
        return text.to_string();
    }
    text.to_string()
}

/// Clean a raw backend result down to a displayable HTML fragment.
///
/// Collapses literal `\n` sequences and real newlines/tabs/CRs to spaces,
/// strips trailing `}`/`]`/`)` and surrounding quote noise, cuts to the
/// earliest known start tag, drops anything after the last closing tag, and
/// wraps bare text in a `<div>`.
pub fn clean_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw
        .replace("\\n", "")
        .replace('\n', " ")
        .replace('\r', "")
        .replace('\t', " ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = text.trim_end_matches(['}', ']', ')']);
    let mut text = text.trim_matches(['"', '\'']).to_string();

    // Cut to the earliest known start tag.
    if let Some(start) = START_TAGS.iter().filter_map(|t| text.find(t)).min() {
        if start > 0 {
            text = text[start..].to_string();
        }
    }

    // Drop any leading non-tag prefix when a tag exists at all.
    if let Some(lt) = text.find('<') {
        if lt > 0 {
            text = text[lt..].to_string();
        }
    }

    if !text.is_empty() && !text.starts_with('<') {
        text = format!("<div>{text}</div>");
    }

    // Truncate after the last closing tag when only bare text follows it.
    if let Some(open) = text.rfind("</") {
        if let Some(close) = text[open..].find('>') {
            let end = open + close + 1;
            if !text[end..].contains('<') {
                text.truncate(end);
            }
        }
    }

    text.trim().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_prefers_html_block() {
        let text = "Here is the report: <html><body><div>R</div></body></html> done";
        assert_eq!(extract_html(text), "<html><body><div>R</div></body></html>");
    }

    #[test]
    fn extract_falls_back_to_body_block() {
        let text = "intro <body><div>R</div></body> outro";
        assert_eq!(extract_html(text), "<body><div>R</div></body>");
    }

    #[test]
    fn extract_keeps_whole_text_on_div_pair() {
        let text = "note <div class=\"a\">R</div> note";
        assert_eq!(extract_html(text), text);
    }

    #[test]
    fn extract_returns_tagless_input_unchanged() {
        let text = "no markup here at all";
        assert_eq!(extract_html(text), text);
    }

    #[test]
    fn extract_html_block_spans_newlines() {
        let text = "x<html>\nline1\nline2\n</html>y";
        assert_eq!(extract_html(text), "<html>\nline1\nline2\n</html>");
    }

    #[test]
    fn clean_empty_input() {
        assert_eq!(clean_html(""), "");
    }

    #[test]
    fn clean_collapses_whitespace_and_literal_newlines() {
        let raw = "<div>line\\none\n\ttwo\r</div>";
        assert_eq!(clean_html(raw), "<div>lineone two</div>");
    }

    #[test]
    fn clean_strips_json_artifacts() {
        let raw = "\"<div>Report</div>\"}]}";
        assert_eq!(clean_html(raw), "<div>Report</div>");
    }

    #[test]
    fn clean_cuts_leading_prose() {
        let raw = "Sure, here is the check: <div>Report</div>";
        assert_eq!(clean_html(raw), "<div>Report</div>");
    }

    #[test]
    fn clean_drops_trailing_prose() {
        let raw = "<div>Report</div> let me know if you need more";
        assert_eq!(clean_html(raw), "<div>Report</div>");
    }

    #[test]
    fn clean_wraps_bare_text() {
        assert_eq!(clean_html("all clear"), "<div>all clear</div>");
    }

    #[test]
    fn clean_preserves_section_and_h1_starts() {
        assert_eq!(clean_html("x <section>a</section>"), "<section>a</section>");
        assert_eq!(clean_html("x <h1>T</h1>"), "<h1>T</h1>");
    }

    #[test]
    fn clean_is_idempotent() {
        let cases = [
            "",
            "plain prose with no tags",
            "\"<div>Report</div>\"}]}",
            "prefix <div>a</div> suffix",
            "<h1>T</h1> trailing",
            "<div>line\\none\ntwo</div>",
            "{'response': '<section>s</section>'}",
        ];
        for case in cases {
            let once = clean_html(case);
            assert_eq!(clean_html(&once), once, "not idempotent for {case:?}");
        }
    }

    #[test]
    fn clean_already_clean_fragment_unchanged() {
        let fragment = "<div>Report</div>";
        assert_eq!(clean_html(fragment), fragment);
    }

    #[test]
    fn clean_keeps_unknown_tags_when_first() {
        // No known start tag, but the text begins with markup.
        assert_eq!(clean_html("<p>x</p>"), "<p>x</p>");
    }
}
