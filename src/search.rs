//! Menubar search: responsive placeholder, double-press shortcuts, scope
//! menu and scope-aware submission.

use std::time::Duration;

use crate::constants::DOUBLE_PRESS_THRESHOLD;
use crate::dom::{Document, NodeId};
use crate::expandable::Expandables;
use crate::hover::{Modifiers, NavKey};

/// Detects two presses within a threshold. A detected pair resets the
/// detector so a third press starts over.
#[derive(Debug, Clone, Copy)]
pub struct DoublePress {
    threshold: Duration,
    last: Option<Duration>,
}

impl Default for DoublePress {
    fn default() -> Self {
        Self::new(DOUBLE_PRESS_THRESHOLD)
    }
}

impl DoublePress {
    /// Detector with the given threshold.
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    /// Records a press at `now`; true when it completes a pair.
    pub fn press(&mut self, now: Duration) -> bool {
        let hit = self
            .last
            .is_some_and(|last| now.saturating_sub(last) <= self.threshold);
        self.last = if hit { None } else { Some(now) };
        hit
    }
}

/// Placeholder text for a menubar `width` in CSS pixels.
#[must_use]
pub fn placeholder_for_width(width: f64) -> &'static str {
    if width <= 400.0 {
        "search..."
    } else if width <= 550.0 {
        "Search..."
    } else if width <= 1000.0 {
        "Feeling Lucky?"
    } else {
        "Looking for something...?"
    }
}

/// Search scope selected in `#searchScopeForm`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SearchScope {
    #[default]
    General,
    Quotes,
    Account,
    Email,
    Amount,
    Order,
    Phone,
    Invoice,
    PurchaseOrder,
}

/// Where a scoped query is posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTarget {
    /// Form action.
    pub url: &'static str,
    /// Field carrying the query.
    pub param: &'static str,
    /// Value of `extraOption`, when scoped.
    pub extra_option: Option<&'static str>,
}

impl SearchScope {
    /// Maps a radio value; unknown values fall back to `General`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "quotes" => Self::Quotes,
            "account" => Self::Account,
            "email" => Self::Email,
            "amount" => Self::Amount,
            "order" => Self::Order,
            "phone" => Self::Phone,
            "invoice" => Self::Invoice,
            "po" => Self::PurchaseOrder,
            _ => Self::General,
        }
    }

    /// Posting target for this scope.
    #[must_use]
    pub const fn target(self) -> SearchTarget {
        let extra = match self {
            Self::General | Self::Quotes => None,
            Self::Account => Some("Account"),
            Self::Email => Some("Email"),
            Self::Amount => Some("Amount"),
            Self::Order => Some("Order"),
            Self::Phone => Some("Phone"),
            Self::Invoice => Some("Invoice"),
            Self::PurchaseOrder => Some("PurchaseOrder"),
        };
        match self {
            Self::Quotes => SearchTarget {
                url: "?p=search_quotes",
                param: "search_quotes",
                extra_option: None,
            },
            _ => SearchTarget {
                url: "?p=search",
                param: "search",
                extra_option: extra,
            },
        }
    }
}

/// A form POST the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Form action.
    pub url: String,
    /// Hidden fields in order.
    pub fields: Vec<(String, String)>,
}

/// Builds the POST for `query` under `scope`; blank queries yield nothing.
#[must_use]
pub fn build_request(scope: SearchScope, query: &str) -> Option<SearchRequest> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let target = scope.target();
    let mut fields = vec![(target.param.to_string(), query.to_string())];
    if let Some(extra) = target.extra_option {
        fields.push(("extraOption".to_string(), extra.to_string()));
    }
    Some(SearchRequest {
        url: target.url.to_string(),
        fields,
    })
}

/// What the host should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// Nothing.
    None,
    /// Focus and select the search input.
    FocusInput,
    /// Blur the search input.
    Blur,
    /// Post the form.
    Submit(SearchRequest),
}

/// True for inputs, textareas, selects and contenteditable elements other
/// than `except`.
#[must_use]
pub fn is_other_editable(doc: &Document, target: Option<NodeId>, except: NodeId) -> bool {
    let Some(target) = target.filter(|&t| t != except) else {
        return false;
    };
    if doc
        .closest(target, |d, n| d.has_attr(n, "contenteditable"))
        .and_then(|n| doc.attr(n, "contenteditable"))
        .is_some_and(|v| v != "false")
    {
        return true;
    }
    matches!(doc.tag(target), Some("input" | "textarea" | "select"))
}

/// Search group in `header.menu-top` plus the optional scope menu.
#[derive(Debug, Clone)]
pub struct SearchBox {
    group: NodeId,
    input: NodeId,
    scope_form: Option<NodeId>,
    trigger: Option<NodeId>,
    menu: Option<NodeId>,
    double_enter: DoublePress,
    double_escape: DoublePress,
}

impl SearchBox {
    /// Binds `header.menu-top .group[role=search]` and its first input.
    pub fn mount(doc: &mut Document) -> Option<Self> {
        let root = doc.root();
        let header = doc.query(root, |d, n| {
            d.tag(n) == Some("header") && d.has_class(n, "menu-top")
        })?;
        let group = doc.query(header, |d, n| {
            d.has_class(n, "group") && d.attr(n, "role") == Some("search")
        })?;
        let input = doc.query(group, |d, n| d.tag(n) == Some("input"))?;
        let trigger = doc.element_by_id("searchTrigger");
        let menu = doc.element_by_id("searchMenu");
        if let (Some(trigger), Some(menu)) = (trigger, menu) {
            let id = doc.attr(menu, "id").unwrap_or("searchMenu").to_string();
            doc.set_attr(trigger, "aria-controls", &id);
        }
        Some(Self {
            group,
            input,
            scope_form: doc.element_by_id("searchScopeForm"),
            trigger,
            menu,
            double_enter: DoublePress::default(),
            double_escape: DoublePress::default(),
        })
    }

    /// Replaces the double-press window of both shortcuts.
    pub fn with_double_press(mut self, threshold: Duration) -> Self {
        self.double_enter = DoublePress::new(threshold);
        self.double_escape = DoublePress::new(threshold);
        self
    }

    /// The search input.
    #[must_use]
    pub const fn input(&self) -> NodeId {
        self.input
    }

    /// The scope menu trigger, if present.
    #[must_use]
    pub const fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    /// Updates placeholder and `aria-label` for a menubar width.
    pub fn set_width(&self, doc: &mut Document, width: f64) {
        let text = placeholder_for_width(width);
        doc.set_attr(self.input, "placeholder", text);
        doc.set_attr(self.input, "aria-label", text);
    }

    /// Current query text.
    #[must_use]
    pub fn query<'d>(&self, doc: &'d Document) -> &'d str {
        doc.attr(self.input, "value").unwrap_or_default()
    }

    /// Replaces the query text.
    pub fn set_query(&self, doc: &mut Document, value: &str) {
        doc.set_attr(self.input, "value", value);
    }

    fn scope_radios(&self, doc: &Document) -> Vec<NodeId> {
        let Some(form) = self.scope_form else {
            return Vec::new();
        };
        doc.query_all(form, |d, n| {
            d.tag(n) == Some("input") && d.attr(n, "name") == Some("searchScope")
        })
    }

    /// Scope of the checked radio, `General` otherwise.
    #[must_use]
    pub fn scope(&self, doc: &Document) -> SearchScope {
        self.scope_radios(doc)
            .into_iter()
            .find(|&r| doc.has_attr(r, "checked"))
            .and_then(|r| doc.attr(r, "value"))
            .map_or(SearchScope::General, SearchScope::parse)
    }

    /// Toggles the scope menu.
    pub fn toggle_menu(&self, doc: &mut Document, expandables: &mut Expandables) {
        if let Some(trigger) = self.trigger {
            expandables.toggle(doc, trigger);
        }
    }

    /// True when `node` is the scope trigger or inside it.
    #[must_use]
    pub fn is_trigger(&self, doc: &Document, node: NodeId) -> bool {
        self.trigger.is_some_and(|t| doc.contains(t, node))
    }

    /// Checks `radio` (unchecking its group) and collapses the scope menu.
    /// Returns false when `radio` is not a scope option.
    pub fn pick_scope(&self, doc: &mut Document, expandables: &mut Expandables, radio: NodeId) -> bool {
        let radios = self.scope_radios(doc);
        if !radios.contains(&radio) {
            return false;
        }
        for r in radios {
            doc.toggle_attr(r, "checked", r == radio);
        }
        if let Some(trigger) = self.trigger {
            expandables.set_expanded(doc, trigger, false);
        }
        true
    }

    /// Builds the POST for the current query and scope.
    #[must_use]
    pub fn submit(&self, doc: &Document) -> Option<SearchRequest> {
        let request = build_request(self.scope(doc), self.query(doc));
        if let Some(req) = &request {
            tracing::debug!("Search submit to {}", req.url);
        }
        request
    }

    /// Keyboard shortcuts. Enter in the input submits. Enter twice
    /// elsewhere focuses the input, except inside other editables. Escape
    /// twice inside the search group blurs it. Presses with Ctrl, Alt or
    /// Meta are ignored.
    pub fn key_down(
        &mut self,
        doc: &Document,
        focused: Option<NodeId>,
        key: NavKey,
        mods: Modifiers,
        now: Duration,
    ) -> SearchAction {
        if mods.any_command() {
            return SearchAction::None;
        }
        match key {
            NavKey::Enter if focused == Some(self.input) => {
                self.submit(doc).map_or(SearchAction::None, SearchAction::Submit)
            }
            NavKey::Enter => {
                if is_other_editable(doc, focused, self.input) || !self.double_enter.press(now) {
                    return SearchAction::None;
                }
                SearchAction::FocusInput
            }
            NavKey::Escape => {
                let in_search = focused.is_some_and(|f| doc.contains(self.group, f));
                if in_search && self.double_escape.press(now) {
                    SearchAction::Blur
                } else {
                    SearchAction::None
                }
            }
            _ => SearchAction::None,
        }
    }

    /// The scope menu node, if present.
    #[must_use]
    pub const fn menu(&self) -> Option<NodeId> {
        self.menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn page() -> (Document, SearchBox, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let header = doc.create_element_with_class("header", "menu-top");
        let group = doc.create_element_with_class("div", "group");
        doc.set_attr(group, "role", "search");
        let input = doc.create_element("input");
        doc.set_attr(input, "type", "search");
        doc.append_child(group, input);
        doc.append_child(header, group);

        let trigger = doc.create_element("button");
        doc.set_attr(trigger, "id", "searchTrigger");
        let menu = doc.create_element("div");
        doc.set_attr(menu, "id", "searchMenu");
        let form = doc.create_element("form");
        doc.set_attr(form, "id", "searchScopeForm");
        let mut radios = Vec::new();
        for value in ["general", "quotes", "po"] {
            let r = doc.create_element("input");
            doc.set_attr(r, "type", "radio");
            doc.set_attr(r, "name", "searchScope");
            doc.set_attr(r, "value", value);
            doc.append_child(form, r);
            radios.push(r);
        }
        doc.append_child(menu, form);
        doc.append_child(header, trigger);
        doc.append_child(header, menu);
        doc.append_child(body, header);
        let search = SearchBox::mount(&mut doc).unwrap();
        (doc, search, radios)
    }

    #[test]
    fn test_double_press_window() {
        let mut dp = DoublePress::default();
        assert!(!dp.press(ms(1000)));
        assert!(dp.press(ms(1400)));
        assert!(!dp.press(ms(1500)));
        assert!(!dp.press(ms(2000)));
        assert!(dp.press(ms(2100)));
    }

    #[test]
    fn test_placeholder_breakpoints() {
        assert_eq!(placeholder_for_width(400.0), "search...");
        assert_eq!(placeholder_for_width(401.0), "Search...");
        assert_eq!(placeholder_for_width(1000.0), "Feeling Lucky?");
        assert_eq!(placeholder_for_width(1600.0), "Looking for something...?");
    }

    #[test]
    fn test_scope_routing() {
        let req = build_request(SearchScope::PurchaseOrder, "  1234 ").unwrap();
        assert_eq!(req.url, "?p=search");
        assert_eq!(
            req.fields,
            vec![
                ("search".to_string(), "1234".to_string()),
                ("extraOption".to_string(), "PurchaseOrder".to_string())
            ]
        );
        let quotes = build_request(SearchScope::Quotes, "q").unwrap();
        assert_eq!(quotes.url, "?p=search_quotes");
        assert_eq!(quotes.fields.len(), 1);
        assert!(build_request(SearchScope::General, "   ").is_none());
        assert_eq!(SearchScope::parse("bogus"), SearchScope::General);
    }

    #[test]
    fn test_pick_scope_closes_menu() {
        let (mut doc, search, radios) = page();
        let mut exp = Expandables::new();
        search.toggle_menu(&mut doc, &mut exp);
        let trigger = search.trigger().unwrap();
        assert_eq!(doc.attr(trigger, "aria-expanded"), Some("true"));
        assert!(search.pick_scope(&mut doc, &mut exp, radios[1]));
        assert_eq!(doc.attr(trigger, "aria-expanded"), Some("false"));
        assert_eq!(search.scope(&doc), SearchScope::Quotes);
    }

    #[test]
    fn test_enter_shortcuts() {
        let (mut doc, mut search, _) = page();
        let body = doc.body();
        let none = Modifiers::default();
        assert_eq!(
            search.key_down(&doc, Some(body), NavKey::Enter, none, ms(1000)),
            SearchAction::None
        );
        assert_eq!(
            search.key_down(&doc, Some(body), NavKey::Enter, none, ms(1200)),
            SearchAction::FocusInput
        );

        let input = search.input();
        search.set_query(&mut doc, "widgets");
        let SearchAction::Submit(req) =
            search.key_down(&doc, Some(input), NavKey::Enter, none, ms(5000))
        else {
            panic!("expected submit");
        };
        assert_eq!(req.fields[0].1, "widgets");

        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        assert_eq!(
            search.key_down(&doc, Some(input), NavKey::Enter, ctrl, ms(6000)),
            SearchAction::None
        );
    }

    #[test]
    fn test_other_editables_block_double_enter() {
        let (mut doc, mut search, _) = page();
        let textarea = doc.create_element("textarea");
        let body = doc.body();
        doc.append_child(body, textarea);
        let none = Modifiers::default();
        for t in [0, 100, 200] {
            assert_eq!(
                search.key_down(&doc, Some(textarea), NavKey::Enter, none, ms(t)),
                SearchAction::None
            );
        }
    }

    #[test]
    fn test_double_escape_only_inside_group() {
        let (doc, mut search, _) = page();
        let input = search.input();
        let none = Modifiers::default();
        let body = doc.body();
        assert_eq!(
            search.key_down(&doc, Some(body), NavKey::Escape, none, ms(0)),
            SearchAction::None
        );
        assert_eq!(
            search.key_down(&doc, Some(body), NavKey::Escape, none, ms(100)),
            SearchAction::None
        );
        assert_eq!(
            search.key_down(&doc, Some(input), NavKey::Escape, none, ms(1000)),
            SearchAction::None
        );
        assert_eq!(
            search.key_down(&doc, Some(input), NavKey::Escape, none, ms(1300)),
            SearchAction::Blur
        );
    }
}
