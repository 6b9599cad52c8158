//! Builders for the rows and tables the review page rewrites.
//!
//! Inline handler strings are replaced by `data-action` plus `data-*`
//! arguments; [`super::ReviewAction::at`] decodes them.

use chrono::NaiveDate;
use serde::Deserialize;

use super::figures::{parse_float, to_fixed, Breakdown, RowFigures, UpdateColumn};
use super::reply::value_text;
use crate::dom::{Document, NodeId};

/// Inventory source offered for a row.
#[derive(Debug, Clone, Deserialize)]
pub struct InventorySource {
    /// Source name.
    pub source: String,
}

/// A purchase-order line from `po_array`.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(missing_docs)]
pub struct PoLine {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub sales_id: String,
    #[serde(default, deserialize_with = "text")]
    pub sku: String,
    #[serde(default, deserialize_with = "text")]
    pub description: String,
    #[serde(default, deserialize_with = "text")]
    pub cut_length: String,
    #[serde(default, deserialize_with = "text")]
    pub amount: String,
    #[serde(default, deserialize_with = "text")]
    pub unit_price: String,
    #[serde(default, deserialize_with = "text")]
    pub price: String,
    #[serde(default, deserialize_with = "text")]
    pub source: String,
}

fn text<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_text(&serde_json::Value::deserialize(d)?))
}

fn positive(text: &str) -> bool {
    parse_float(text).is_some_and(|n| n > 0.0)
}

/// Element helpers shared by the builders.
pub(crate) struct Build<'d> {
    pub(crate) doc: &'d mut Document,
}

impl Build<'_> {
    pub(crate) fn el(&mut self, parent: NodeId, tag: &str, class: &str) -> NodeId {
        let node = if class.is_empty() {
            self.doc.create_element(tag)
        } else {
            self.doc.create_element_with_class(tag, class)
        };
        self.doc.append_child(parent, node);
        node
    }

    pub(crate) fn text(&mut self, parent: NodeId, text: &str) {
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    pub(crate) fn attrs(&mut self, node: NodeId, attrs: &[(&str, &str)]) {
        for (k, v) in attrs {
            self.doc.set_attr(node, k, v);
        }
    }
}

/// Value of a form control: selected option for selects, text for
/// textareas, the `value` attribute otherwise.
#[must_use]
pub fn field_value(doc: &Document, node: NodeId) -> String {
    match doc.tag(node) {
        Some("textarea") => doc.text_content(node),
        Some("select") => {
            let options = doc.query_all(node, |d, n| d.tag(n) == Some("option"));
            options
                .iter()
                .copied()
                .find(|&o| doc.has_attr(o, "selected"))
                .or_else(|| options.first().copied())
                .map(|o| {
                    doc.attr(o, "value")
                        .map_or_else(|| doc.text_content(o), str::to_string)
                })
                .unwrap_or_default()
        }
        _ => doc.attr(node, "value").unwrap_or_default().to_string(),
    }
}

/// Sets a form control value; for selects the matching option becomes the
/// only selected one.
pub fn set_field_value(doc: &mut Document, node: NodeId, value: &str) {
    match doc.tag(node) {
        Some("textarea") => doc.set_text(node, value),
        Some("select") => {
            for option in doc.query_all(node, |d, n| d.tag(n) == Some("option")) {
                let matches = doc.attr(option, "value") == Some(value);
                doc.toggle_attr(option, "selected", matches);
            }
        }
        _ => doc.set_attr(node, "value", value),
    }
}

/// Writes a figure cell: inputs get a value, other elements text.
pub fn set_cell(doc: &mut Document, id: &str, text: &str) {
    let Some(node) = doc.element_by_id(id) else {
        return;
    };
    if doc.tag(node) == Some("input") {
        doc.set_attr(node, "value", text);
    } else {
        doc.set_text(node, text);
    }
}

/// Writes the figure cells of row `id`.
pub fn apply_figures(doc: &mut Document, id: &str, figures: &RowFigures) {
    set_cell(doc, &format!("qty_{id}"), &figures.qty);
    set_cell(doc, &format!("total_{id}"), &figures.total);
    if let Some(weight) = &figures.weight {
        set_cell(doc, &format!("weight_{id}"), weight);
    }
    set_cell(doc, &format!("price_{id}"), &figures.price);
}

/// Builds the row for a freshly split package. `None` for unknown package
/// kinds.
pub fn split_row(
    doc: &mut Document,
    package: &Breakdown,
    sources: &[InventorySource],
    count: &str,
) -> Option<NodeId> {
    let cells = package.split_cells()?;
    let id = package.id.as_str();
    let mut b = Build { doc };
    let tr = b.doc.create_element_with_class("tr", &format!("row_{id} warning"));

    let td = b.el(tr, "td", "");
    let hidden = b.el(td, "input", "");
    b.attrs(hidden, &[("type", "hidden"), ("id", &format!("id_{count}")), ("value", id)]);
    let production = b.el(td, "input", "review_fields");
    b.attrs(
        production,
        &[
            ("name", "SendProduction[]"),
            ("id", &format!("production_{count}")),
            ("type", "checkbox"),
            ("value", "1"),
            ("checked", ""),
            ("data-action", "send-to-production"),
            ("data-row", id),
            ("data-count", count),
        ],
    );

    let td = b.el(tr, "td", "");
    let box_number = b.el(td, "input", "boxNumber form-group input-group review_fields");
    b.attrs(
        box_number,
        &[
            ("type", "text"),
            ("name", "fitInBoxNumber[]"),
            ("id", &format!("box_number_{id}")),
            ("style", "width:50px; text-align:center; "),
            ("value", "0"),
            ("data-action", "box-number"),
            ("data-row", id),
        ],
    );

    let td = b.el(tr, "td", "");
    b.text(td, &package.sku);

    let td = b.el(tr, "td", "");
    let group = b.el(td, "div", "form-group input-group");
    b.attrs(group, &[("style", "margin-bottom: 0")]);
    let amount = b.el(group, "input", "form-control material_amount_field");
    let action = match cells.column {
        UpdateColumn::AmountUpdateParent => "change-amount",
        _ => "change-qty",
    };
    b.attrs(
        amount,
        &[
            ("id", &format!("qty_{id}")),
            ("type", "number"),
            ("value", &cells.value),
            ("data-action", action),
            ("data-row", id),
        ],
    );
    let addon = b.el(group, "span", "input-group-addon");
    b.text(addon, &cells.category);

    let td = b.el(tr, "td", "");
    let total = b.el(td, "span", "");
    b.attrs(total, &[("id", &format!("total_{id}"))]);
    b.text(total, &cells.total);
    b.text(td, &format!(" {}", cells.total_category));

    let td = b.el(tr, "td", "");
    b.text(td, "$");
    let price = b.el(td, "span", "");
    b.attrs(price, &[("id", &format!("price_{id}"))]);
    b.text(price, "0");

    let td = b.el(tr, "td", "");
    let weight = b.el(td, "span", "");
    b.attrs(weight, &[("id", &format!("weight_{id}"))]);
    b.text(weight, "0 lbs");

    let td = b.el(tr, "td", "");
    let select = b.el(td, "select", "form-control sourceCombo review_fields");
    b.attrs(
        select,
        &[
            ("id", &format!("inventory_source_{id}")),
            ("data-action", "inventory-source"),
            ("data-row", id),
        ],
    );
    let blank = b.el(select, "option", "");
    b.attrs(blank, &[("value", "")]);
    for source in sources {
        let option = b.el(select, "option", "");
        b.attrs(option, &[("value", &source.source)]);
        if package.source_name == source.source {
            b.attrs(option, &[("selected", "")]);
        }
        b.text(option, &source.source);
    }

    let td = b.el(tr, "td", "");
    let button = b.el(td, "button", "addNew btn btn-circle btn-warning");
    b.attrs(
        button,
        &[
            ("type", "button"),
            ("id", &format!("addNew_{id}")),
            ("data-action", "delete-row"),
            ("data-row", id),
        ],
    );
    b.el(button, "i", "fa fa-plus-circle");
    Some(tr)
}

/// Rebuilds `#poTable` from `lines` followed by a subtotal row. Returns the
/// subtotal.
pub fn rebuild_po_table(doc: &mut Document, lines: &[PoLine]) -> f64 {
    let Some(table) = doc.element_by_id("poTable") else {
        return 0.0;
    };
    doc.clear_children(table);
    let mut subtotal = 0.0;
    let mut b = Build { doc };
    for line in lines {
        subtotal += parse_float(&to_fixed(parse_float(&line.price).unwrap_or(f64::NAN), 2))
            .unwrap_or(f64::NAN);
        let tr = b.el(table, "tr", &format!("sales_id_{}", line.sales_id));
        b.attrs(tr, &[("id", &format!("line_{}", line.id))]);
        let sales = line.sales_id.as_str();

        let td = b.el(tr, "td", "");
        b.text(td, &line.sku);

        let td = b.el(tr, "td", "");
        let qty = b.el(td, "input", "form-control");
        b.attrs(
            qty,
            &[
                ("id", "quantity"),
                ("type", "text"),
                ("value", &line.amount),
                ("style", "width: 55%;"),
                ("data-action", "change-quantity"),
                ("data-sales", sales),
            ],
        );
        if positive(&line.amount) {
            b.attrs(qty, &[("data-locked", "")]);
        }

        let td = b.el(tr, "td", "");
        if line.sku.contains("WD-") {
            let area = b.el(td, "textarea", "");
            b.attrs(
                area,
                &[
                    ("name", "curtain"),
                    ("id", "curtain_description"),
                    ("rows", "5"),
                    ("style", "width: 100%;"),
                    ("data-action", "change-quantity"),
                    ("data-sales", sales),
                ],
            );
            b.text(area, &line.description);
        } else {
            let cut = b.el(td, "input", "form-control");
            b.attrs(
                cut,
                &[
                    ("id", "cut_length"),
                    ("type", "text"),
                    ("value", &line.cut_length),
                    ("style", "width: 55%;"),
                    ("data-action", "change-quantity"),
                    ("data-sales", sales),
                ],
            );
        }

        for (id, value) in [("unit_price", &line.unit_price), ("price", &line.price)] {
            let td = b.el(tr, "td", "");
            let input = b.el(td, "input", "form-control");
            b.attrs(
                input,
                &[
                    ("id", id),
                    ("type", "text"),
                    ("value", value),
                    ("data-action", "change-quantity"),
                    ("data-sales", sales),
                ],
            );
            if positive(value) {
                b.attrs(input, &[("readonly", "")]);
            }
        }

        let td = b.el(tr, "td", "");
        b.text(td, &line.source);

        let td = b.el(tr, "td", "");
        b.attrs(td, &[("style", "text-align:center")]);
        let delete = b.el(td, "button", "btn btn-info");
        b.attrs(
            delete,
            &[("data-action", "delete-cutting-charge"), ("data-sales", sales)],
        );
        b.el(delete, "i", "fa fa-times");
        b.text(delete, " Delete");
    }

    let tr = b.el(table, "tr", "");
    let td = b.el(tr, "td", "");
    let bold = b.el(td, "b", "");
    b.text(bold, "Subtotal:");
    let td = b.el(tr, "td", "");
    b.attrs(td, &[("colspan", "3")]);
    let td = b.el(tr, "td", "");
    b.attrs(td, &[("id", "total")]);
    let bold = b.el(td, "b", "");
    b.text(bold, &format!("${}", to_fixed(subtotal, 2)));
    b.el(tr, "td", "");
    b.el(tr, "td", "");
    subtotal
}

/// Rebuilds `#pdf_buttons` with one generate button per source.
pub fn rebuild_pdf_buttons(doc: &mut Document, sales_id: &str, sources: &[(String, String)]) {
    let Some(host) = doc.element_by_id("pdf_buttons") else {
        return;
    };
    doc.clear_children(host);
    let mut b = Build { doc };
    for (index, source) in sources {
        let button = b.el(host, "button", "btn btn-danger");
        b.attrs(
            button,
            &[
                ("id", &format!("generate_{index}")),
                ("style", "margin-right: 10px;"),
                ("data-action", "generate-pdf"),
                ("data-sales", sales_id),
                ("data-source", source),
            ],
        );
        b.text(button, &format!("Generate PDF for {source}"));
    }
}

/// Rebuilds every `.comments_table` with one editable row per PO comment.
pub fn rebuild_comments(doc: &mut Document, order_id: &str, comments: &[(String, String)]) {
    let tables = doc.elements_by_class("comments_table");
    let mut b = Build { doc };
    for table in tables {
        b.doc.clear_children(table);
        let body = b.el(table, "tbody", "");
        for (i, (index, value)) in comments.iter().enumerate() {
            let slot = (i + 1).to_string();
            let tr = b.el(body, "tr", "");
            let td = b.el(tr, "td", "");
            b.attrs(td, &[("width", "10%")]);
            b.text(td, index);
            let td = b.el(tr, "td", "");
            let area = b.el(td, "textarea", "");
            b.attrs(
                area,
                &[
                    ("id", &format!("po_comments_{slot}")),
                    ("style", "width:100%;height: 100px;resize: vertical;"),
                ],
            );
            b.text(area, value);
            let button = b.el(td, "button", "btn btn-primary");
            b.attrs(
                button,
                &[
                    ("id", &format!("ad_comments_{slot}")),
                    ("data-action", "add-comments"),
                    ("data-order", order_id),
                    ("data-index", index),
                    ("data-slot", &slot),
                ],
            );
            b.text(button, "Add Comments");
        }
    }
}

/// Rebuilds `#shipmentSourcesBody`: one comment row per selected source.
pub fn rebuild_shipment_sources(doc: &mut Document, rows: &[(String, String)]) {
    let Some(body) = doc.element_by_id("shipmentSourcesBody") else {
        return;
    };
    doc.clear_children(body);
    let mut b = Build { doc };
    for (key, comment) in rows {
        let tr = b.el(body, "tr", "gradeX shipmentSources_line");
        let hidden = b.el(tr, "input", "");
        b.attrs(hidden, &[("type", "hidden"), ("name", "shipmentId[]"), ("value", "")]);
        let td = b.el(tr, "td", "");
        b.text(td, &key.replace('_', " "));
        let td = b.el(tr, "td", "");
        let area = b.el(td, "textarea", "form-control");
        b.attrs(
            area,
            &[
                ("id", &format!("source_{key}")),
                ("rows", "3"),
                ("data-action", "shipment-comment"),
            ],
        );
        b.text(area, comment);
    }
}

/// Appends an empty note row authored by `author` on `date` to `#Notes`.
pub fn add_note_line(doc: &mut Document, author: &str, date: NaiveDate) -> Option<NodeId> {
    let notes = doc.element_by_id("Notes")?;
    let mut b = Build { doc };
    let tr = b.el(notes, "tr", "");
    let hidden = b.el(tr, "input", "");
    b.attrs(hidden, &[("type", "hidden"), ("name", "noteID[]"), ("value", "")]);
    let th = b.el(tr, "th", "");
    let area = b.el(th, "textarea", "form-control noteDescription");
    b.attrs(area, &[("name", "noteDescription[]"), ("rows", "3")]);
    let th = b.el(tr, "th", "");
    b.text(th, author);
    let th = b.el(tr, "th", "");
    b.text(th, &date.format("%Y-%m-%d").to_string());
    Some(tr)
}

/// Appends a shipment-source picker row to `#shipmentSources`.
pub fn add_shipment_source_line(doc: &mut Document, sources: &[String]) -> Option<NodeId> {
    let table = doc.element_by_id("shipmentSources")?;
    let n = doc.elements_by_class("shipmentSources_line").len() + 1;
    let mut b = Build { doc };
    let tr = b.el(table, "tr", "gradeX shipmentSources_line");
    b.attrs(tr, &[("id", &format!("source_{n}"))]);
    let hidden = b.el(tr, "input", "");
    b.attrs(hidden, &[("type", "hidden"), ("name", "shipmentId[]"), ("value", "")]);
    let td = b.el(tr, "td", "");
    let select = b.el(td, "select", "form-control shipmentSources_selectField");
    b.attrs(select, &[("name", "shipmentSource[]")]);
    let blank = b.el(select, "option", "");
    b.attrs(blank, &[("value", "")]);
    b.text(blank, "----");
    for source in sources {
        let option = b.el(select, "option", "");
        b.attrs(option, &[("value", source)]);
        b.text(option, source);
    }
    let td = b.el(tr, "td", "");
    let area = b.el(td, "textarea", "form-control");
    b.attrs(area, &[("rows", "3")]);
    Some(tr)
}

/// Appends a checked notification row for `email` to `#Notifications`.
pub fn add_notification_line(doc: &mut Document, email: &str) -> Option<NodeId> {
    let table = doc.element_by_id("Notifications")?;
    let n = doc.elements_by_class("Notifications_line").len() + 1;
    let position = n.to_string();
    let mut b = Build { doc };
    let tr = b.el(table, "tr", "gradeX Notifications_line");
    b.attrs(tr, &[("id", &format!("Notifications_line_{n}"))]);
    let td = b.el(tr, "td", "");
    let check = b.el(td, "input", "");
    b.attrs(
        check,
        &[("type", "checkbox"), ("name", "notification[]"), ("value", "1"), ("checked", "")],
    );
    let td = b.el(tr, "td", "");
    let input = b.el(td, "input", "form-control");
    b.attrs(
        input,
        &[("type", "text"), ("name", "notification_email[]"), ("value", email)],
    );
    let td = b.el(tr, "td", "");
    let button = b.el(td, "button", "btn btn-danger btn-circle");
    b.attrs(
        button,
        &[
            ("type", "button"),
            ("data-action", "remove-notification"),
            ("data-position", &position),
        ],
    );
    b.el(button, "i", "fa fa-times-circle");
    Some(tr)
}

/// Removes the `position`-th (1-based) notification row.
pub fn remove_notification_line(doc: &mut Document, position: usize) -> bool {
    let lines = doc.elements_by_class("Notifications_line");
    match position.checked_sub(1).and_then(|i| lines.get(i)) {
        Some(&line) => {
            doc.remove(line);
            true
        }
        None => false,
    }
}

/// Current notification addresses.
#[must_use]
pub fn notification_emails(doc: &Document) -> Vec<String> {
    doc.query_all(doc.root(), |d, n| {
        d.tag(n) == Some("input") && d.attr(n, "name") == Some("notification_email[]")
    })
    .into_iter()
    .map(|n| field_value(doc, n))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(doc: &mut Document, tag: &str, id: &str) -> NodeId {
        let node = doc.create_element(tag);
        doc.set_attr(node, "id", id);
        let body = doc.body();
        doc.append_child(body, node);
        node
    }

    #[test]
    fn test_select_values() {
        let mut doc = Document::new();
        let select = host(&mut doc, "select", "s");
        for v in ["", "Richmond Warehouse", "Vendor"] {
            let o = doc.create_element("option");
            doc.set_attr(o, "value", v);
            doc.append_child(select, o);
        }
        assert_eq!(field_value(&doc, select), "");
        set_field_value(&mut doc, select, "Vendor");
        assert_eq!(field_value(&doc, select), "Vendor");
        set_field_value(&mut doc, select, "Richmond Warehouse");
        assert_eq!(field_value(&doc, select), "Richmond Warehouse");
    }

    #[test]
    fn test_po_table_subtotal_and_readonly() {
        let mut doc = Document::new();
        let table = host(&mut doc, "table", "poTable");
        let lines = vec![
            PoLine {
                id: "1".into(),
                sales_id: "9".into(),
                sku: "WD-100".into(),
                description: "curtain".into(),
                price: "10.006".into(),
                unit_price: "0".into(),
                ..PoLine::default()
            },
            PoLine {
                id: "2".into(),
                sales_id: "9".into(),
                sku: "PVC".into(),
                price: "2.50".into(),
                ..PoLine::default()
            },
        ];
        let subtotal = rebuild_po_table(&mut doc, &lines);
        assert!((subtotal - 12.51).abs() < 1e-9);
        let html = doc.inner_html(table);
        assert!(html.contains("curtain_description"));
        assert!(html.contains("cut_length"));
        assert!(html.contains("<b>$12.51</b>"));
        let price_inputs = doc.query_all(table, |d, n| d.attr(n, "id") == Some("price"));
        assert!(price_inputs.iter().all(|&n| doc.has_attr(n, "readonly")));
        let unit_inputs = doc.query_all(table, |d, n| d.attr(n, "id") == Some("unit_price"));
        assert!(!doc.has_attr(unit_inputs[0], "readonly"));
    }

    #[test]
    fn test_notification_lines() {
        let mut doc = Document::new();
        host(&mut doc, "table", "Notifications");
        add_notification_line(&mut doc, "a@example.com").unwrap();
        add_notification_line(&mut doc, "b@example.com").unwrap();
        assert_eq!(notification_emails(&doc), ["a@example.com", "b@example.com"]);
        assert!(remove_notification_line(&mut doc, 1));
        assert_eq!(notification_emails(&doc), ["b@example.com"]);
        assert!(!remove_notification_line(&mut doc, 0));
        assert!(!remove_notification_line(&mut doc, 5));
    }

    #[test]
    fn test_note_line_date() {
        let mut doc = Document::new();
        let notes = host(&mut doc, "table", "Notes");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        add_note_line(&mut doc, "Sam", date).unwrap();
        assert!(doc.text_content(notes).ends_with("Sam2024-03-09"));
    }
}
