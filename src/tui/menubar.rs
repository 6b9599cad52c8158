//! Menubar widget.
//!
//! Paints the document owned by [`NavShell`]: the bar itself, every open
//! top-level menu, open flyouts, the search scope menu and the settings
//! panel. Every painted node is recorded in a [`HitMap`] so mouse events can
//! be mapped back to document nodes.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::dom::{Document, NodeId};
use crate::shell::NavShell;

use super::Theme;

/// Deepest flyout level painted.
const MAX_DEPTH: usize = 8;

/// Screen regions of painted nodes. Later entries sit on top.
#[derive(Debug, Default, Clone)]
pub struct HitMap {
    regions: Vec<(Rect, NodeId)>,
}

impl HitMap {
    /// Forgets every region.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Records `node` at `area`.
    pub fn push(&mut self, area: Rect, node: NodeId) {
        self.regions.push((area, node));
    }

    /// Topmost node under a cell.
    #[must_use]
    pub fn node_at(&self, column: u16, row: u16) -> Option<NodeId> {
        self.regions
            .iter()
            .rev()
            .find(|(r, _)| {
                column >= r.x && column < r.x.saturating_add(r.width) && row >= r.y && row < r.y.saturating_add(r.height)
            })
            .map(|(_, n)| *n)
    }

    /// Where `node` was painted last.
    #[must_use]
    pub fn area_of(&self, node: NodeId) -> Option<Rect> {
        self.regions.iter().rev().find(|(_, n)| *n == node).map(|(r, _)| *r)
    }

    /// Number of recorded regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when nothing was painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One row of a painted menu list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuRow {
    /// Section break.
    Separator,
    /// A menu entry.
    #[allow(missing_docs)]
    Entry {
        node: NodeId,
        label: String,
        flyout: bool,
        open: bool,
    },
}

/// Rows of a rendered menu container or flyout sublist, in document order.
#[must_use]
pub fn menu_rows(doc: &Document, container: NodeId) -> Vec<MenuRow> {
    let mut rows = Vec::new();
    for child in doc.element_children(container) {
        if doc.has_class(child, "separator") {
            rows.push(MenuRow::Separator);
        } else if doc.tag(child) == Some("ul") {
            rows.extend(menu_rows(doc, child));
        } else if doc.tag(child) == Some("li") {
            let label = doc
                .query(child, |d, n| d.has_class(n, "label"))
                .map(|l| doc.text_content(l))
                .unwrap_or_default();
            rows.push(MenuRow::Entry {
                node: child,
                label: label.trim().to_string(),
                flyout: doc.has_class(child, "has-submenu"),
                open: doc.has_class(child, "open"),
            });
        }
    }
    rows
}

/// A control painted on the bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarItem {
    /// Document node.
    pub node: NodeId,
    /// Visible text.
    pub label: String,
    /// Whether its menu or panel is expanded.
    pub expanded: bool,
}

fn bar_label(doc: &Document, node: NodeId) -> String {
    let text = doc
        .query(node, |d, n| d.has_class(n, "text"))
        .map(|t| doc.text_content(t))
        .unwrap_or_default();
    let mut label = text.trim().to_string();
    if let Some(badge) = doc.query(node, |d, n| d.has_class(n, "badge")) {
        if !doc.has_attr(badge, "hidden") {
            label.push_str(&format!(" ({})", doc.text_content(badge).trim()));
        }
    }
    label
}

/// Visible triggers, hotbuttons and the inbox in bar order, then the
/// settings button.
#[must_use]
pub fn bar_items(doc: &Document) -> Vec<BarItem> {
    let mut items: Vec<BarItem> = doc
        .query_all(doc.root(), |d, n| d.has_class(n, "iconDiv"))
        .into_iter()
        .filter(|&n| !doc.has_attr(n, "hidden"))
        .map(|node| BarItem {
            node,
            label: bar_label(doc, node),
            expanded: doc.attr(node, "aria-expanded") == Some("true"),
        })
        .collect();
    if let Some(button) = doc.element_by_id("settings-toggle") {
        items.push(BarItem {
            node: button,
            label: doc.text_content(button).trim().to_string(),
            expanded: doc.attr(button, "aria-expanded") == Some("true"),
        });
    }
    items
}

fn width_of(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

fn clamp_into(rect: Rect, bounds: Rect) -> Rect {
    let width = rect.width.min(bounds.width);
    let height = rect.height.min(bounds.height);
    let max_x = bounds.x + bounds.width - width;
    let max_y = bounds.y + bounds.height - height;
    Rect::new(rect.x.min(max_x), rect.y.min(max_y), width, height)
}

/// Paint state shared by the helpers.
struct Painter<'a> {
    doc: &'a Document,
    theme: &'a Theme,
    focused: Option<NodeId>,
    hovered: Option<NodeId>,
    bounds: Rect,
}

impl Painter<'_> {
    fn row_style(&self, node: NodeId, active: bool) -> Style {
        let mut style = Style::default().fg(self.theme.text).bg(self.theme.surface);
        if self.doc.has_class(node, "delete") {
            style = style.fg(self.theme.error);
        } else if self.doc.has_class(node, "special") {
            style = style.fg(self.theme.special);
        }
        if active || self.hovered == Some(node) {
            style = style.bg(self.theme.highlight_bg);
        }
        if self.focused == Some(node) {
            style = style.fg(self.theme.accent).add_modifier(Modifier::BOLD);
        }
        style
    }

    /// Paints a bordered list anchored at `(x, y)` and recurses into open flyouts.
    fn list(&self, f: &mut Frame, hits: &mut HitMap, container: NodeId, x: u16, y: u16, depth: usize) {
        let rows = menu_rows(self.doc, container);
        if rows.is_empty() || depth > MAX_DEPTH {
            return;
        }
        let inner_width = rows
            .iter()
            .map(|r| match r {
                MenuRow::Separator => 0,
                MenuRow::Entry { label, .. } => width_of(label) + 4,
            })
            .max()
            .unwrap_or(0)
            .max(12);
        let height = u16::try_from(rows.len()).unwrap_or(u16::MAX).saturating_add(2);
        let area = clamp_into(Rect::new(x, y, inner_width + 2, height), self.bounds);
        if area.width < 3 || area.height < 3 {
            return;
        }

        f.render_widget(Clear, area);
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(self.theme.primary).bg(self.theme.surface)),
            area,
        );

        let mut open_flyouts = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let Ok(offset) = u16::try_from(i) else { break };
            let line_y = area.y + 1 + offset;
            if line_y >= area.y + area.height - 1 {
                break;
            }
            let line_area = Rect::new(area.x + 1, line_y, area.width - 2, 1);
            match row {
                MenuRow::Separator => {
                    let rule = "─".repeat(usize::from(line_area.width));
                    f.render_widget(
                        Paragraph::new(rule).style(Style::default().fg(self.theme.text_muted).bg(self.theme.surface)),
                        line_area,
                    );
                }
                MenuRow::Entry { node, label, flyout, open } => {
                    let marker = if *flyout { " ›" } else { "" };
                    let text = format!(" {label}{marker}");
                    f.render_widget(Paragraph::new(text).style(self.row_style(*node, *open)), line_area);
                    hits.push(line_area, *node);
                    if *flyout && *open {
                        open_flyouts.push((*node, line_y));
                    }
                }
            }
        }

        for (li, line_y) in open_flyouts {
            if let Some(sub) = self.doc.query(li, |d, n| d.has_class(n, "sublist")) {
                self.list(f, hits, sub, area.x + area.width, line_y, depth + 1);
            }
        }
    }

    /// Checkbox-style rows for the given inputs.
    fn checklist(&self, f: &mut Frame, hits: &mut HitMap, title: &str, rows: &[(NodeId, String, bool)], anchor: Rect) {
        if rows.is_empty() {
            return;
        }
        let inner_width = rows.iter().map(|(_, l, _)| width_of(l) + 6).max().unwrap_or(0).max(width_of(title) + 2);
        let height = u16::try_from(rows.len()).unwrap_or(u16::MAX).saturating_add(2);
        let x = (anchor.x + anchor.width).saturating_sub(inner_width + 2);
        let area = clamp_into(Rect::new(x, anchor.y + anchor.height, inner_width + 2, height), self.bounds);
        if area.width < 3 || area.height < 3 {
            return;
        }
        f.render_widget(Clear, area);
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} "))
                .style(Style::default().fg(self.theme.primary).bg(self.theme.surface)),
            area,
        );
        for (i, (node, label, checked)) in rows.iter().enumerate() {
            let Ok(offset) = u16::try_from(i) else { break };
            let line_y = area.y + 1 + offset;
            if line_y >= area.y + area.height - 1 {
                break;
            }
            let line_area = Rect::new(area.x + 1, line_y, area.width - 2, 1);
            let mark = if *checked { "[x]" } else { "[ ]" };
            let mark_style = if *checked {
                Style::default().fg(self.theme.success)
            } else {
                Style::default().fg(self.theme.text_muted)
            };
            let line = Line::from(vec![
                Span::styled(format!(" {mark} "), mark_style),
                Span::raw(label.clone()),
            ]);
            f.render_widget(Paragraph::new(line).style(self.row_style(*node, false)), line_area);
            hits.push(line_area, *node);
        }
    }
}

/// Rows of the settings panel: switches, extra toggles and the theme toggle.
#[must_use]
pub fn settings_rows(doc: &Document) -> Vec<(NodeId, String, bool)> {
    let Some(panel) = doc.element_by_id("menu-settings") else {
        return Vec::new();
    };
    doc.query_all(panel, |d, n| d.tag(n) == Some("input") && d.attr(n, "type") == Some("checkbox"))
        .into_iter()
        .map(|input| {
            let label = doc
                .closest(input, |d, n| d.tag(n) == Some("label"))
                .and_then(|l| doc.attr(l, "aria-label").or_else(|| doc.attr(l, "data-tooltip-content")))
                .or_else(|| doc.attr(input, "aria-label"))
                .unwrap_or_default()
                .to_string();
            (input, label, doc.has_attr(input, "checked"))
        })
        .collect()
}

fn scope_rows(doc: &Document) -> Vec<(NodeId, String, bool)> {
    let Some(form) = doc.element_by_id("searchScopeForm") else {
        return Vec::new();
    };
    doc.query_all(form, |d, n| d.attr(n, "name") == Some("searchScope"))
        .into_iter()
        .map(|radio| {
            let label = doc
                .parent(radio)
                .map(|l| doc.text_content(l).trim().to_string())
                .unwrap_or_default();
            (radio, label, doc.has_attr(radio, "checked"))
        })
        .collect()
}

/// Paints the bar into `area` (three rows) and every open popup below it.
pub fn render(f: &mut Frame, area: Rect, shell: &NavShell, theme: &Theme, hits: &mut HitMap) {
    let doc = shell.document();
    let painter = Painter {
        doc,
        theme,
        focused: shell.focused(),
        hovered: shell.hovered(),
        bounds: f.area(),
    };

    let bar = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", crate::constants::APP_NAME))
        .style(Style::default().fg(theme.primary).bg(theme.background));
    let inner = bar.inner(area);
    f.render_widget(bar, area);
    if inner.height == 0 {
        return;
    }

    let mut x = inner.x;
    let right = inner.x + inner.width;
    let mut anchors = Vec::new();
    for item in bar_items(doc) {
        let text = format!(" {} ", item.label);
        let width = width_of(&text).min(right.saturating_sub(x));
        if width == 0 {
            break;
        }
        let cell = Rect::new(x, inner.y, width, 1);
        let mut style = Style::default().fg(theme.text).bg(theme.background);
        if item.expanded || painter.hovered == Some(item.node) {
            style = style.bg(theme.highlight_bg);
        }
        if painter.focused == Some(item.node) {
            style = style.fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        f.render_widget(Paragraph::new(text).style(style), cell);
        hits.push(cell, item.node);
        anchors.push((item, cell));
        x += width + 1;
    }

    if let Some(search) = shell.search() {
        let input = search.input();
        let query = search.query(doc);
        let shown = if query.is_empty() {
            doc.attr(input, "placeholder").unwrap_or("Search")
        } else {
            query
        };
        let text = format!(" ⌕ {shown} ");
        let width = width_of(&text).max(16).min(right.saturating_sub(x));
        if width > 0 {
            let cell = Rect::new(x, inner.y, width, 1);
            let mut style = Style::default().fg(theme.text_muted).bg(theme.surface);
            if painter.focused == Some(input) {
                style = style.fg(theme.accent);
            }
            f.render_widget(Paragraph::new(text).style(style), cell);
            hits.push(cell, input);
            x += width + 1;
        }
        if let Some(trigger) = search.trigger() {
            let width = 7.min(right.saturating_sub(x));
            if width > 0 {
                let cell = Rect::new(x, inner.y, width, 1);
                f.render_widget(
                    Paragraph::new(" Scope ").style(Style::default().fg(theme.text).bg(theme.background)),
                    cell,
                );
                hits.push(cell, trigger);
                if doc.attr(trigger, "aria-expanded") == Some("true") {
                    painter.checklist(f, hits, "Scope", &scope_rows(doc), cell);
                }
            }
        }
    }

    for (item, cell) in &anchors {
        if let Some(index) = shell.hover().index_of(item.node) {
            if shell.hover().is_open(doc, index) {
                if let Some(menu) = shell.hover().menu_node(index) {
                    painter.list(f, hits, menu, cell.x, area.y + area.height, 0);
                }
            }
        } else if doc.attr(item.node, "id") == Some("settings-toggle") && item.expanded {
            painter.checklist(f, hits, "Settings", &settings_rows(doc), *cell);
        }
    }
}
