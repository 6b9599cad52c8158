//! Switch grid and summary table markup.

use super::toggles::{ToggleBus, ToggleItem};
use crate::dom::{Document, NodeId};

const DEFAULT_ON: &str = r#"<svg viewBox="0 0 24 24" width="24" height="24" aria-hidden="true"><path fill="currentColor" d="M21 12.79A9 9 0 1 1 11.21 3a7 7 0 0 0 9.79 9.79Z"/></svg>"#;
const DEFAULT_OFF: &str = r#"<svg viewBox="0 0 24 24" width="24" height="24" aria-hidden="true"><circle cx="12" cy="12" r="4" fill="currentColor"/></svg>"#;

fn icon_markup(item: &ToggleItem, on: bool) -> &str {
    let inline = if on { &item.on_svg } else { &item.off_svg };
    match inline.as_deref().map(str::trim) {
        Some(svg) if !svg.is_empty() => svg,
        _ if on => DEFAULT_ON,
        _ => DEFAULT_OFF,
    }
}

/// Appends one `.st_item` cell per switch to `group`.
pub fn render_grid(doc: &mut Document, group: NodeId, bus: &ToggleBus) {
    for item in bus.items() {
        let wrapper = doc.create_element_with_class("div", "st_item");

        let label = doc.create_element_with_class("label", "st_switch data-tooltip");
        doc.set_attr(label, "aria-label", &item.label);
        doc.set_attr(label, "data-tooltip-content", &item.tooltip);
        doc.set_attr(label, "data-key", &item.key);
        doc.set_attr(label, "data-name", &item.name);

        let input = doc.create_element_with_class("input", "st_input");
        doc.set_attr(input, "type", "checkbox");
        doc.set_attr(input, "id", &format!("st_{}", item.key));
        doc.set_attr(input, "name", &item.name);
        doc.set_attr(input, "data-key", &item.key);
        doc.toggle_attr(input, "checked", bus.get(&item.key).unwrap_or(item.value));

        let slider = doc.create_element_with_class("span", "st_slider");
        doc.set_attr(slider, "aria-hidden", "true");

        // `.On` is visible while unchecked, so it carries the off glyph.
        let on_el = doc.create_element_with_class("span", "On");
        doc.set_attr(on_el, "aria-hidden", "true");
        doc.set_markup(on_el, icon_markup(item, false));
        let off_el = doc.create_element_with_class("span", "Off");
        doc.set_attr(off_el, "aria-hidden", "true");
        doc.set_markup(off_el, icon_markup(item, true));

        for child in [input, slider, on_el, off_el] {
            doc.append_child(label, child);
        }
        doc.append_child(wrapper, label);
        doc.append_child(group, wrapper);
    }
}

/// The `.st_input` checkbox for a switch.
#[must_use]
pub fn switch_input(doc: &Document, key: &str) -> Option<NodeId> {
    doc.query(doc.root(), |d, n| {
        d.has_class(n, "st_input") && d.attr(n, "data-key") == Some(key)
    })
}

/// Reflects a value on the checkbox and sets the tooltip text.
pub fn sync_switch(doc: &mut Document, key: &str, value: bool, tooltip: &str) {
    let Some(input) = switch_input(doc, key) else {
        return;
    };
    doc.toggle_attr(input, "checked", value);
    if let Some(label) = doc.closest_class(input, "st_switch") {
        doc.set_attr(label, "data-tooltip-content", tooltip);
    }
}

/// Tooltip after a user flip: `"{label}: {value}"`.
#[must_use]
pub fn user_tooltip(item: &ToggleItem, value: bool) -> String {
    format!("{}: {value}", item.label)
}

/// Rebuilds the optional `#st_tbody` summary table.
pub fn render_table(doc: &mut Document, bus: &ToggleBus) {
    let Some(tbody) = doc.element_by_id("st_tbody") else {
        return;
    };
    doc.clear_children(tbody);
    for item in bus.items() {
        let on = bus.get(&item.key).unwrap_or(item.value);
        let tr = doc.create_element("tr");
        let td_key = doc.create_element("td");
        doc.set_text(td_key, &format!("{} ({})", item.label, item.name));
        let td_val = doc.create_element("td");
        let badge = doc.create_element_with_class("span", if on { "badge on" } else { "badge off" });
        doc.set_text(badge, if on { "true" } else { "false" });
        doc.append_child(td_val, badge);
        doc.append_child(tr, td_key);
        doc.append_child(tr, td_val);
        doc.append_child(tbody, tr);
    }
}
