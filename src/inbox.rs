//! Inbox badge mirrored from the message-center link.

use std::sync::OnceLock;

use regex::Regex;

use crate::dom::{Document, NodeId};

fn digit() -> &'static Regex {
    static DIGIT: OnceLock<Regex> = OnceLock::new();
    DIGIT.get_or_init(|| Regex::new(r"[0-9]").expect("static pattern"))
}

fn non_digits() -> &'static Regex {
    static NON_DIGITS: OnceLock<Regex> = OnceLock::new();
    NON_DIGITS.get_or_init(|| Regex::new(r"[^0-9]").expect("static pattern"))
}

/// Strips everything but digits and parses the rest; no digits is zero.
#[must_use]
pub fn parse_count(text: &str) -> u64 {
    let digits = non_digits().replace_all(text, "");
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

/// Badge text for `count`: `None` hides the badge.
#[must_use]
pub fn badge_text(count: u64) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}

/// The inbox button, its badge and the link the count is read from.
#[derive(Debug, Clone, Copy)]
pub struct InboxBadge {
    button: NodeId,
    badge: NodeId,
    source: Option<NodeId>,
}

impl InboxBadge {
    /// Binds `.iconDiv[data-key="inbox"]`, `#inbox-badge` and the first
    /// `a[href*="messagecenter"]`, then syncs once.
    pub fn mount(doc: &mut Document) -> Option<Self> {
        let root = doc.root();
        let button = doc.query(root, |d, n| {
            d.has_class(n, "iconDiv") && d.attr(n, "data-key") == Some("inbox")
        })?;
        let badge = doc.element_by_id("inbox-badge")?;
        let source = doc.query(root, |d, n| {
            d.tag(n) == Some("a") && d.attr(n, "href").is_some_and(|h| h.contains("messagecenter"))
        });
        let this = Self {
            button,
            badge,
            source,
        };
        this.sync(doc);
        Some(this)
    }

    /// Count shown by the source link: the first `<span>` whose text holds a
    /// digit.
    #[must_use]
    pub fn read_source(&self, doc: &Document) -> u64 {
        let Some(link) = self.source else {
            return 0;
        };
        doc.query_all(link, |d, n| d.tag(n) == Some("span"))
            .into_iter()
            .map(|span| doc.text_content(span))
            .find(|text| digit().is_match(text))
            .map_or(0, |text| parse_count(&text))
    }

    /// Re-reads the source link and updates the badge.
    pub fn sync(&self, doc: &mut Document) {
        let count = self.read_source(doc);
        self.set_count(doc, count);
    }

    /// Shows `count` on the badge.
    pub fn set_count(&self, doc: &mut Document, count: u64) {
        match badge_text(count) {
            None => {
                doc.set_attr(self.badge, "hidden", "");
                doc.set_attr(self.button, "aria-label", "Inbox");
            }
            Some(text) => {
                doc.remove_attr(self.badge, "hidden");
                doc.set_text(self.badge, &text);
                doc.set_attr(self.button, "aria-label", &format!("Inbox ({text})"));
            }
        }
    }

    /// Hides the badge.
    pub fn clear(&self, doc: &mut Document) {
        self.set_count(doc, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(source_spans: &[&str]) -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let btn = doc.create_element_with_class("div", "iconDiv");
        doc.set_attr(btn, "data-key", "inbox");
        let badge = doc.create_element("span");
        doc.set_attr(badge, "id", "inbox-badge");
        doc.append_child(btn, badge);
        doc.append_child(body, btn);
        let link = doc.create_element("a");
        doc.set_attr(link, "href", "?p=messagecenter");
        for text in source_spans {
            let span = doc.create_element("span");
            doc.set_text(span, text);
            doc.append_child(link, span);
        }
        doc.append_child(body, link);
        (doc, btn, badge)
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("(12)"), 12);
        assert_eq!(parse_count("1,204 new"), 1204);
        assert_eq!(parse_count("none"), 0);
    }

    #[test]
    fn test_sync_from_first_numeric_span() {
        let (mut doc, btn, badge) = page(&["Messages", "(7)", "3"]);
        InboxBadge::mount(&mut doc).unwrap();
        assert_eq!(doc.text_content(badge), "7");
        assert!(!doc.has_attr(badge, "hidden"));
        assert_eq!(doc.attr(btn, "aria-label"), Some("Inbox (7)"));
    }

    #[test]
    fn test_overflow_and_zero() {
        let (mut doc, btn, badge) = page(&["250"]);
        let inbox = InboxBadge::mount(&mut doc).unwrap();
        assert_eq!(doc.text_content(badge), "99+");
        assert_eq!(doc.attr(btn, "aria-label"), Some("Inbox (99+)"));
        inbox.clear(&mut doc);
        assert!(doc.has_attr(badge, "hidden"));
        assert_eq!(doc.attr(btn, "aria-label"), Some("Inbox"));
    }

    #[test]
    fn test_missing_source_is_zero() {
        let (mut doc, _, badge) = page(&["no digits here"]);
        InboxBadge::mount(&mut doc).unwrap();
        assert!(doc.has_attr(badge, "hidden"));
    }
}
