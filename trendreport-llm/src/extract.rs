//! Locate the HTML report inside a free-text model reply.
//!
//! Replies are inconsistently formatted, so the scan degrades through three
//! strategies in order and stops at the first that yields non-blank content:
//!
//! 1. [`Strategy::Fenced`]: a complete ```` ```html ... ``` ```` block, trimmed interior.
//! 2. [`Strategy::Unterminated`]: an opening ```` ```html ```` with no closing fence after it;
//!    everything from the marker to the last ```` ``` ```` in the text (if that lies after
//!    the marker) or to end of input, trimmed.
//! 3. [`Strategy::RawDocument`]: a bare `<!DOCTYPE html ... </html>` span, verbatim.
//!
//! [`extract_report`] additionally applies the acceptance gate: whatever was
//! found must contain the doctype marker, otherwise the reply yields nothing.
use regex::Regex;

pub const FENCE: &str = "```";
pub const DOCTYPE_MARKER: &str = "<!doctype html";

const DIAGNOSTIC_EDGE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fenced,
    Unterminated,
    RawDocument,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Fenced => "fenced",
            Strategy::Unterminated => "unterminated_fence",
            Strategy::RawDocument => "raw_document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub html: String,
    pub strategy: Strategy,
}

/// Run the strategies in priority order without the acceptance gate.
pub fn extract_html(text: &str) -> Option<Extracted> {
    let found = fenced_block(text)
        .map(|html| (html, Strategy::Fenced))
        .or_else(|| unterminated_fence(text).map(|html| (html, Strategy::Unterminated)))
        .or_else(|| raw_document(text).map(|html| (html, Strategy::RawDocument)))?;

    Some(Extracted {
        html: found.0.to_string(),
        strategy: found.1,
    })
}

/// Extraction followed by the doctype acceptance gate.
pub fn extract_report(text: &str) -> Option<Extracted> {
    let extracted = extract_html(text)?;
    if is_html_document(&extracted.html) {
        return Some(extracted);
    }
    tracing::warn!(
        strategy = extracted.strategy.as_str(),
        chars = extracted.html.chars().count(),
        "extract.rejected: candidate has no doctype marker"
    );
    None
}

/// The acceptance gate: does `candidate` carry the doctype declaration?
pub fn is_html_document(candidate: &str) -> bool {
    candidate.to_ascii_lowercase().contains(DOCTYPE_MARKER)
}

fn fenced_block(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?is)```html(.*?)```").ok()?;
    let found = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|interior| !interior.is_empty());
    found
}

fn unterminated_fence(text: &str) -> Option<&str> {
    let open = Regex::new(r"(?i)```html").ok()?.find(text)?;
    let start = open.end();
    let end = match text.rfind(FENCE) {
        Some(close) if close >= start => close,
        _ => text.len(),
    };
    let interior = text[start..end].trim();
    (!interior.is_empty()).then_some(interior)
}

fn raw_document(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?is)<!doctype\s+html.*</html\s*>").ok()?;
    re.find(text).map(|m| m.as_str())
}

/// First and last [`DIAGNOSTIC_EDGE_CHARS`] characters of a reply, for logs.
pub fn response_edges(text: &str) -> (String, String) {
    let head: String = text.chars().take(DIAGNOSTIC_EDGE_CHARS).collect();
    let total = text.chars().count();
    let tail: String = text
        .chars()
        .skip(total.saturating_sub(DIAGNOSTIC_EDGE_CHARS))
        .collect();
    (head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<!DOCTYPE html>\n<html><head><title>热搜</title></head><body>ok</body></html>";

    #[test]
    fn fenced_block_returns_trimmed_interior() {
        let reply = format!("Here is the report:\n\n```html\n{DOC}\n```\n\nEnjoy.");
        let got = extract_html(&reply).unwrap();
        assert_eq!(got.strategy, Strategy::Fenced);
        assert_eq!(got.html, DOC);
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        let reply = format!("```HTML\n{DOC}\n```");
        assert_eq!(extract_html(&reply).unwrap().html, DOC);
    }

    #[test]
    fn first_non_blank_fenced_block_wins() {
        let reply = format!("```html\n  \n```\ntext\n```html\n{DOC}\n```");
        let got = extract_html(&reply).unwrap();
        assert_eq!(got.strategy, Strategy::Fenced);
        assert_eq!(got.html, DOC);
    }

    #[test]
    fn unterminated_fence_runs_to_end_of_input() {
        let partial = "<!DOCTYPE html>\n<html><body><h1>截断的报告</h1><p>still writing";
        let reply = format!("Report follows\n```html\n{partial}");
        let got = extract_html(&reply).unwrap();
        assert_eq!(got.strategy, Strategy::Unterminated);
        assert_eq!(got.html, partial);
    }

    #[test]
    fn unterminated_fence_ignores_closing_markers_before_it() {
        let reply = "```json\n{}\n```\nthen\n```html\n<!DOCTYPE html><p>cut";
        let got = extract_html(reply).unwrap();
        assert_eq!(got.strategy, Strategy::Unterminated);
        assert_eq!(got.html, "<!DOCTYPE html><p>cut");
    }

    #[test]
    fn raw_document_span_is_returned_verbatim() {
        let reply = format!("Sure! {DOC}  Let me know if you need changes.");
        let got = extract_html(&reply).unwrap();
        assert_eq!(got.strategy, Strategy::RawDocument);
        assert_eq!(got.html, DOC);
    }

    #[test]
    fn raw_document_match_is_case_insensitive_and_multiline() {
        let doc = "<!doctype HTML>\n<HTML>\n<body>\nx\n</body>\n</HTML>";
        let reply = format!("preface\n{doc}\n");
        assert_eq!(extract_html(&reply).unwrap().html, doc);
    }

    #[test]
    fn nothing_found_is_absence() {
        assert_eq!(extract_html("I cannot produce a report today."), None);
        assert_eq!(extract_report("<html><body>no doctype, no fence</body></html>"), None);
        assert_eq!(extract_html(""), None);
    }

    #[test]
    fn gate_rejects_fenced_content_without_doctype() {
        let reply = "```html\n<div>fragment only</div>\n```";
        assert!(extract_html(reply).is_some());
        assert_eq!(extract_report(reply), None);
    }

    #[test]
    fn gate_accepts_fenced_document() {
        let reply = format!("```html\n{DOC}\n```");
        let got = extract_report(&reply).unwrap();
        assert_eq!(got.html, DOC);
    }

    #[test]
    fn gate_is_case_insensitive() {
        assert!(is_html_document("<!doctype html><html></html>"));
        assert!(is_html_document("<!DOCTYPE HTML><html></html>"));
        assert!(!is_html_document("<html><body>doctype html</body></html>"));
    }

    #[test]
    fn edges_are_char_based() {
        let text = "热".repeat(250);
        let (head, tail) = response_edges(&text);
        assert_eq!(head.chars().count(), 100);
        assert_eq!(tail.chars().count(), 100);

        let (head, tail) = response_edges("short");
        assert_eq!(head, "short");
        assert_eq!(tail, "short");
    }
}
