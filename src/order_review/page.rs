//! Review page controller: builds endpoint requests and patches replies into
//! the document.
//!
//! Every operation returns the [`Request`]s it wants sent. The host sends
//! them through a [`Transport`] and hands each body back to
//! [`OrderReview::on_reply`], in arrival order. A reply to a superseded
//! request is still applied.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::actions::ReviewAction;
use super::client::{Endpoint, FormData, Transport};
use super::figures::{Breakdown, ProductPart, UpdateColumn};
use super::form::{self, FieldProblem, ShippingFields, INVALID_FIELD_STYLE};
use super::reply::{value_text, Reply, ReviewError};
use super::rows::{self, InventorySource, PoLine};
use crate::dom::{Document, NodeId};

/// Source name that routes notifications to the warehouse contact.
pub const WAREHOUSE_SOURCE: &str = "Richmond Warehouse";

/// Delay before the page reloads after a SKU fix.
pub const RELOAD_DELAY: Duration = Duration::from_secs(3);

const SAVE_LABEL: &str = "Save Changes";
const VALIDATING_MARKUP: &str = "<i class='fa fa-eye'></i> Hold on... Validating data...";
const LABEL_CHECKING_MARKUP: &str = "<i class='fa fa-spinner fa-spin'></i> Checking Shipping Label";
const LABEL_PASSED: &str = "Success! The shipping label has passed the test.";
const RECHECK_BUTTON: &str =
    "<button type=\"button\" class=\"btn btn-default\" data-action=\"recheck-label\">Check Again</button>";

/// Identifier of an issued request, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request the host must send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Issue order.
    pub id: RequestId,
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Form fields (query parameters for GET endpoints).
    pub form: FormData,
}

/// What the host has to do after a reply was applied.
#[derive(Debug, Default)]
pub struct ReplyOutcome {
    /// Requests triggered by the reply.
    pub follow_ups: Vec<Request>,
    /// Submit the review form (`#reviewSale`).
    pub submit_form: bool,
    /// Reload the page after this delay.
    pub reload_after: Option<Duration>,
}

impl ReplyOutcome {
    fn absorb(&mut self, other: Self) {
        self.follow_ups.extend(other.follow_ups);
        self.submit_form |= other.submit_form;
        self.reload_after = self.reload_after.or(other.reload_after);
    }
}

/// Server-side facts about the order the page was rendered for.
#[derive(Debug, Clone, Default)]
pub struct OrderContext {
    /// Order id.
    pub sales_id: String,
    /// Parent customer id.
    pub parent_id: String,
    /// Billing first name.
    pub billing_firstname: String,
    /// Billing last name.
    pub billing_lastname: String,
    /// Billing company.
    pub billing_company: String,
    /// Shipment service name.
    pub shipment_type: String,
    /// Shipping address identifier.
    pub address_identifier: String,
    /// Box list sent with shipping-label checks.
    pub boxes: Value,
}

/// Addresses added by [`OrderReview::check_email_notifications`].
#[derive(Debug, Clone, Default)]
pub struct NotificationContacts {
    /// Contact for warehouse-sourced shipments.
    pub warehouse: String,
    /// Contact for every other source.
    pub third_party: String,
}

/// State of one review page.
#[derive(Debug)]
pub struct OrderReview {
    context: OrderContext,
    /// Shipment comments keyed by source (spaces as `_`), in first-seen order.
    sources: Vec<(String, String)>,
    next_id: u64,
}

fn value_by_id(doc: &Document, id: &str) -> String {
    doc.element_by_id(id)
        .map(|n| rows::field_value(doc, n))
        .unwrap_or_default()
}

fn with_id(doc: &mut Document, id: &str, f: impl FnOnce(&mut Document, NodeId)) {
    if let Some(node) = doc.element_by_id(id) {
        f(doc, node);
    }
}

fn set_style(doc: &mut Document, id: &str, style: &str) {
    with_id(doc, id, |d, n| d.set_attr(n, "style", style));
}

fn set_markup(doc: &mut Document, id: &str, markup: &str) {
    with_id(doc, id, |d, n| d.set_markup(n, markup));
}

fn set_text(doc: &mut Document, id: &str, text: &str) {
    with_id(doc, id, |d, n| d.set_text(n, text));
}

fn set_value(doc: &mut Document, id: &str, value: &str) {
    with_id(doc, id, |d, n| rows::set_field_value(d, n, value));
}

fn is_checked(doc: &Document, id: &str) -> bool {
    doc.element_by_id(id).is_some_and(|n| doc.has_attr(n, "checked"))
}

fn trailing_id(element_id: &str) -> &str {
    element_id.rsplit('_').next().unwrap_or(element_id)
}

impl OrderReview {
    /// Creates the controller for the order described by `context`.
    #[must_use]
    pub fn new(context: OrderContext) -> Self {
        Self {
            context,
            sources: Vec::new(),
            next_id: 0,
        }
    }

    /// Order facts.
    #[must_use]
    pub const fn context(&self) -> &OrderContext {
        &self.context
    }

    /// Shipment comments per source, in first-seen order.
    #[must_use]
    pub fn source_comments(&self) -> &[(String, String)] {
        &self.sources
    }

    fn request(&mut self, endpoint: Endpoint, form: FormData) -> Request {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        tracing::debug!("Queued {} for {}", id, endpoint);
        Request { id, endpoint, form }
    }

    fn sales_form(&self) -> FormData {
        FormData::new().with("sales_id", self.context.sales_id.clone())
    }

    // Validation

    /// Clears the error panel and asks the server to validate the review.
    pub fn validate(&mut self, doc: &mut Document) -> Request {
        set_style(doc, "printErrors", "display:none");
        set_markup(doc, "printErrors_show", " ");
        let form = self.sales_form();
        self.request(Endpoint::ValidateReview, form)
    }

    /// Confirms an already reviewed order.
    pub fn confirm(&mut self, doc: &mut Document, checked: bool) -> Request {
        set_style(doc, "printErrors", "display:none");
        set_markup(doc, "printErrors_show", " ");
        with_id(doc, "rereviewed", |d, n| d.set_attr(n, "value", "1"));
        let form = self
            .sales_form()
            .with("checked", checked.to_string())
            .with("reviewed", "reviewed");
        self.request(Endpoint::ValidateReview, form)
    }

    /// Hides the error panel.
    pub fn dismiss_errors(&self, doc: &mut Document) {
        set_style(doc, "printErrors", "display:none");
    }

    /// Shipping fields as currently entered.
    #[must_use]
    pub fn shipping_fields(doc: &Document) -> ShippingFields {
        ShippingFields {
            payment_method: value_by_id(doc, "checkpaymentmethod"),
            po_number: value_by_id(doc, "po_number"),
            first_name: value_by_id(doc, "shipping_firstname"),
            address1: value_by_id(doc, "shipping_address1"),
            city: value_by_id(doc, "shipping_city"),
            state: value_by_id(doc, "shipping_state"),
            pick_up: is_checked(doc, "pick_up"),
            shipment_type: value_by_id(doc, "shipment_type"),
            zipcode: value_by_id(doc, "shipping_zipcode"),
        }
    }

    /// Highlights invalid shipping fields and fills the error panel. Returns
    /// true when the form may be submitted.
    pub fn check_shipping_fields(doc: &mut Document) -> bool {
        let fields = Self::shipping_fields(doc);
        for problem in FieldProblem::ALL {
            match form::field_state(&fields, problem) {
                Some(true) => set_style(doc, problem.field_id(), INVALID_FIELD_STYLE),
                Some(false) => set_style(doc, problem.field_id(), ""),
                None => {}
            }
        }
        let problems = form::check_shipping(&fields);
        if problems.is_empty() {
            set_style(doc, "printErrors", "display:none");
            set_markup(doc, "printErrors_show", " ");
            set_markup(doc, "savechanges", VALIDATING_MARKUP);
            true
        } else {
            set_style(doc, "printErrors", "");
            set_markup(doc, "printErrors_show", &form::error_markup(&problems));
            set_text(doc, "savechanges", SAVE_LABEL);
            false
        }
    }

    fn apply_validation(&mut self, doc: &mut Document, reply: &Reply, outcome: &mut ReplyOutcome) {
        if reply.is_success() {
            let handling = reply.text("InputPartHandling").unwrap_or_default();
            set_value(doc, "inputPartHandling", &handling);
            outcome.follow_ups.push(self.source_comment());
            outcome.follow_ups.push(self.shipment_description());
            outcome.submit_form = Self::check_shipping_fields(doc);
        } else {
            set_style(doc, "printErrors", "");
            set_markup(doc, "printErrors_show", &reply.description());
            set_text(doc, "savechanges", SAVE_LABEL);
        }
    }

    // Packages and generated texts

    /// Removes a package from the order.
    pub fn remove_package(&mut self, package_id: &str) -> Request {
        let form = self.sales_form().with("package_id", package_id);
        self.request(Endpoint::RemovePackages, form)
    }

    /// Regenerates the source comment from the current shipment comments.
    pub fn source_comment(&mut self) -> Request {
        let map: Map<String, Value> = self
            .sources
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let form = self.sales_form().with("sourceArray", Value::Object(map).to_string());
        self.request(Endpoint::SourceComment, form)
    }

    /// Regenerates the shipment description.
    pub fn shipment_description(&mut self) -> Request {
        let form = self.sales_form();
        self.request(Endpoint::ShipmentDescription, form)
    }

    // Breakdown rows

    /// Splits a new row off `parent_id`.
    pub fn add_row(&mut self, parent_id: &str) -> Request {
        self.request(Endpoint::AddRow, FormData::new().with("id", parent_id))
    }

    /// Updates one column of row `id`.
    pub fn update_row(&mut self, id: &str, column: UpdateColumn, value: &str) -> Request {
        let form = FormData::new()
            .with("id", id)
            .with("columnName", column.as_str())
            .with("value", value);
        self.request(Endpoint::UpdateRow, form)
    }

    /// Sends the quantity of row `id`.
    pub fn change_qty(&mut self, doc: &Document, id: &str) -> Request {
        let value = value_by_id(doc, &format!("qty_{id}"));
        self.update_row(id, UpdateColumn::QtyUpdateParent, &value)
    }

    /// Sends the length of row `id`.
    pub fn change_amount(&mut self, doc: &Document, id: &str) -> Request {
        let value = value_by_id(doc, &format!("qty_{id}"));
        self.update_row(id, UpdateColumn::AmountUpdateParent, &value)
    }

    /// Sends the box number of row `id` and refreshes the order's boxes.
    pub fn update_box_number(&mut self, doc: &Document, id: &str) -> Vec<Request> {
        let value = value_by_id(doc, &format!("box_number_{id}"));
        let sales_id = self.context.sales_id.clone();
        vec![
            self.update_row(id, UpdateColumn::BoxNumber, &value),
            self.update_shipping_box(&sales_id),
        ]
    }

    /// Sends the production flag read from checkbox `production_{count}`.
    pub fn update_send_to_production(&mut self, doc: &Document, id: &str, count: &str) -> Request {
        let value = if is_checked(doc, &format!("production_{count}")) { "1" } else { "0" };
        self.update_row(id, UpdateColumn::SendToProduction, value)
    }

    /// Sends the inventory source of row `id`, then refreshes its split
    /// button and the shipment comment rows.
    pub fn update_inventory_source(&mut self, doc: &mut Document, id: &str) -> Request {
        let value = value_by_id(doc, &format!("inventory_source_{id}"));
        let request = self.update_row(id, UpdateColumn::SourceName, &value);
        Self::enable_button(doc, id);
        self.update_shipment_comments(doc);
        request
    }

    /// Applies the bulk source picker (`#inventorySources`) to every row.
    pub fn apply_source_to_all(&mut self, doc: &mut Document) -> Vec<Request> {
        let source = value_by_id(doc, "inventorySources");
        let mut requests = Vec::new();
        for combo in doc.elements_by_class("sourceCombo") {
            rows::set_field_value(doc, combo, &source);
            let value = rows::field_value(doc, combo);
            let id = trailing_id(doc.attr(combo, "id").unwrap_or_default()).to_string();
            requests.push(self.update_row(&id, UpdateColumn::SourceName, &value));
            Self::enable_button(doc, &id);
        }
        self.update_shipment_comments(doc);
        requests
    }

    /// Enables the split button of row `id` iff a source is selected.
    pub fn enable_button(doc: &mut Document, id: &str) {
        let empty = value_by_id(doc, &format!("inventory_source_{id}")).is_empty();
        with_id(doc, &format!("addNew_{id}"), |d, n| d.toggle_attr(n, "disabled", empty));
    }

    /// Records comments typed for each selected source and rebuilds the
    /// comment rows for the sources still selected.
    pub fn update_shipment_comments(&mut self, doc: &mut Document) {
        let mut selected = Vec::new();
        for combo in doc.elements_by_class("sourceCombo") {
            let key = rows::field_value(doc, combo).replace(' ', "_");
            if !key.is_empty() {
                let comment = value_by_id(doc, &format!("source_{key}"));
                match self.sources.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = comment,
                    None => self.sources.push((key.clone(), comment)),
                }
            }
            selected.push(key);
        }
        let visible: Vec<(String, String)> = self
            .sources
            .iter()
            .filter(|(k, _)| selected.contains(k))
            .cloned()
            .collect();
        rows::rebuild_shipment_sources(doc, &visible);
    }

    /// Deletes split row `id`.
    pub fn delete_row(&mut self, id: &str) -> Request {
        self.request(Endpoint::DeleteRow, FormData::new().with("id", id))
    }

    /// Refreshes the shipping boxes of order `sales_id`.
    pub fn update_shipping_box(&mut self, sales_id: &str) -> Request {
        self.request(Endpoint::UpdateShippingBox, FormData::new().with("id", sales_id))
    }

    /// Numbers every box input from one and sends each number.
    pub fn recount_boxes(&mut self, doc: &mut Document) -> Vec<Request> {
        let mut requests = Vec::new();
        for (i, input) in doc.elements_by_class("boxNumber").into_iter().enumerate() {
            doc.set_attr(input, "value", &(i + 1).to_string());
            let id = trailing_id(doc.attr(input, "id").unwrap_or_default()).to_string();
            requests.extend(self.update_box_number(doc, &id));
        }
        requests
    }

    // Item fixes and checks

    /// Submits the corrected SKU typed for `item_id`.
    pub fn fix_sku(&mut self, doc: &mut Document, item_id: &str) -> Request {
        let new_sku = value_by_id(doc, &format!("skufixedfield_{item_id}"));
        set_markup(doc, &format!("fixskubox_{item_id}"), "Updating, please wait...");
        let form = self
            .sales_form()
            .with("itemid", item_id)
            .with("new_sku", new_sku);
        self.request(Endpoint::FixSku, form)
    }

    /// Shows the label panel in its loading state and checks whether a
    /// shipping label can be produced.
    pub fn request_shipping_label(&mut self, doc: &mut Document) -> Request {
        set_style(doc, "shippingLabelCheck", "");
        set_markup(doc, "shippingLabelCheck_show", LABEL_CHECKING_MARKUP);
        let form = FormData::new()
            .with("oid", self.context.sales_id.clone())
            .with("service", self.context.shipment_type.clone())
            .with("addressidentifier", self.context.address_identifier.clone())
            .with("boxesarray", self.context.boxes.to_string());
        self.request(Endpoint::ShippingLabel, form)
    }

    /// Toggles the level-2 block and fetches its content.
    pub fn level2_info(&mut self, doc: &mut Document) -> Request {
        with_id(doc, "Level2-Info-Block", |d, n| {
            let hidden = d
                .attr(n, "style")
                .is_some_and(|s| s.replace(' ', "").contains("display:none"));
            d.set_attr(n, "style", if hidden { "" } else { "display:none" });
        });
        let ctx = &self.context;
        let form = FormData::new()
            .with("sales_id", ctx.sales_id.clone())
            .with("parent_id", ctx.parent_id.clone())
            .with("billing_firstname", ctx.billing_firstname.clone())
            .with("billing_lastname", ctx.billing_lastname.clone())
            .with("billing_company", ctx.billing_company.clone());
        self.request(Endpoint::Level2Info, form)
    }

    // Notes and notifications

    /// Appends an empty note row.
    pub fn add_note(doc: &mut Document, author: &str, date: NaiveDate) -> Option<NodeId> {
        rows::add_note_line(doc, author, date)
    }

    /// Adds the notification contact for every selected shipment source
    /// that is not already notified.
    pub fn check_email_notifications(doc: &mut Document, contacts: &NotificationContacts) {
        let selected: Vec<String> = doc
            .elements_by_class("shipmentSources_selectField")
            .into_iter()
            .map(|n| rows::field_value(doc, n))
            .filter(|v| !v.is_empty())
            .collect();
        for source in selected {
            let email = if source == WAREHOUSE_SOURCE {
                &contacts.warehouse
            } else {
                &contacts.third_party
            };
            if !rows::notification_emails(doc).contains(email) {
                rows::add_notification_line(doc, email);
            }
        }
    }

    /// Clears a zero amount when the field is clicked.
    pub fn clear_zero_amount(doc: &mut Document, input: NodeId) {
        let value = rows::field_value(doc, input);
        let value = value.trim();
        let zero = value
            .parse::<f64>()
            .map_or(value.is_empty(), |n| n.abs() < f64::EPSILON);
        if zero {
            doc.set_attr(input, "value", "");
        }
    }

    // Dispatch

    /// Runs an in-page action. External actions produce no requests; the
    /// embedding page handles them.
    pub fn dispatch(&mut self, doc: &mut Document, action: &ReviewAction) -> Vec<Request> {
        match action {
            ReviewAction::Validate => vec![self.validate(doc)],
            ReviewAction::DismissErrors => {
                self.dismiss_errors(doc);
                Vec::new()
            }
            ReviewAction::SendToProduction { row, count } => {
                vec![self.update_send_to_production(doc, row, count)]
            }
            ReviewAction::BoxNumber { row } => self.update_box_number(doc, row),
            ReviewAction::ChangeQty { row } => vec![self.change_qty(doc, row)],
            ReviewAction::ChangeAmount { row } => vec![self.change_amount(doc, row)],
            ReviewAction::InventorySource { row } => vec![self.update_inventory_source(doc, row)],
            ReviewAction::AddRow { row } => vec![self.add_row(row)],
            ReviewAction::DeleteRow { row } => vec![self.delete_row(row)],
            ReviewAction::RemovePackage { package } => vec![self.remove_package(package)],
            ReviewAction::FixSku { item } => vec![self.fix_sku(doc, item)],
            ReviewAction::RecountBoxes => self.recount_boxes(doc),
            ReviewAction::ApplySourceToAll => self.apply_source_to_all(doc),
            ReviewAction::ShipmentComment => {
                self.update_shipment_comments(doc);
                Vec::new()
            }
            ReviewAction::RemoveNotification { position } => {
                rows::remove_notification_line(doc, *position);
                Vec::new()
            }
            ReviewAction::RecheckLabel => vec![self.request_shipping_label(doc)],
            ReviewAction::Level2Info => vec![self.level2_info(doc)],
            ReviewAction::GeneratePdf { .. }
            | ReviewAction::AddComments { .. }
            | ReviewAction::DeleteCuttingCharge { .. }
            | ReviewAction::ChangeQuantity { .. } => {
                tracing::debug!("Leaving {:?} to the page", action);
                Vec::new()
            }
        }
    }

    // Replies

    /// Applies the reply `body` to `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Malformed`] when the body is not a reply
    /// object. The document is left untouched in that case.
    pub fn on_reply(
        &mut self,
        doc: &mut Document,
        request: &Request,
        body: &str,
    ) -> Result<ReplyOutcome, ReviewError> {
        let mut outcome = ReplyOutcome::default();
        if request.endpoint == Endpoint::UpdateShippingBox {
            return Ok(outcome);
        }
        let reply = Reply::parse(body)?;
        tracing::debug!(
            "Reply {} from {}: {:?}",
            request.id,
            request.endpoint,
            reply.kind
        );
        let form_field = |name: &str| request.form.get(name).unwrap_or_default().to_string();

        match request.endpoint {
            Endpoint::ValidateReview => self.apply_validation(doc, &reply, &mut outcome),
            Endpoint::RemovePackages => {
                if reply.is_error() {
                    let markup = format!(
                        "<span style=\"color:#CC0000; font-weight:bold;\">ERROR: {}</span>",
                        reply.description()
                    );
                    set_markup(doc, "errorMSGPackages", &markup);
                } else if reply.is_success() {
                    with_id(doc, &format!("packageline-{}", form_field("package_id")), |d, n| {
                        d.remove(n);
                    });
                }
            }
            Endpoint::SourceComment if reply.is_success() => {
                let text = reply.text("inputSourceComment").unwrap_or_default();
                set_value(doc, "inputSourceComment", &text);
            }
            Endpoint::ShipmentDescription if reply.is_success() => {
                let text = reply.text("shipmentDescription").unwrap_or_default();
                set_value(doc, "shipmentDescription", &text);
            }
            Endpoint::AddRow if reply.is_success() => {
                self.apply_added_row(doc, &reply, &form_field("id"));
            }
            Endpoint::UpdateRow if reply.is_success() => self.apply_updated_row(doc, &reply),
            Endpoint::DeleteRow if reply.is_success() => {
                self.apply_deleted_row(doc, &reply, &form_field("id"));
            }
            Endpoint::FixSku => {
                set_markup(doc, &format!("fixskubox_{}", form_field("itemid")), &reply.description());
                if !reply.is_error() {
                    outcome.reload_after = Some(RELOAD_DELAY);
                }
            }
            Endpoint::ShippingLabel => {
                if reply.is_error() {
                    with_id(doc, "shippingLabelCheck_color", |d, n| {
                        d.set_attr(n, "class", "panel panel-red");
                    });
                    let message = reply.text("message").unwrap_or_default();
                    set_markup(doc, "shippingLabelCheck_show", &format!("{message} {RECHECK_BUTTON}"));
                } else {
                    with_id(doc, "shippingLabelCheck_color", |d, n| {
                        d.set_attr(n, "class", "panel panel-green");
                    });
                    set_markup(doc, "shippingLabelCheck_show", LABEL_PASSED);
                }
            }
            Endpoint::Level2Info if !reply.is_error() => {
                let html = reply.text("html").unwrap_or_default();
                set_markup(doc, "level2content", &html);
            }
            _ => {}
        }
        Ok(outcome)
    }

    fn set_box_count(doc: &mut Document, reply: &Reply) {
        if let Some(count) = reply.text("boxCount") {
            set_text(doc, "totalBoxes", &count);
        }
    }

    fn apply_added_row(&mut self, doc: &mut Document, reply: &Reply, parent_id: &str) {
        Self::set_box_count(doc, reply);
        let Some(package) = reply.field::<Breakdown>("splitPackage") else {
            return;
        };
        let sources: Vec<InventorySource> = reply.field("inventorySource").unwrap_or_default();
        let count = reply.text("count").unwrap_or_default();
        let Some(anchor) = doc.elements_by_class(&format!("row_{parent_id}")).last().copied() else {
            tracing::debug!("No row {} to insert the split after", parent_id);
            return;
        };
        if let Some(row) = rows::split_row(doc, &package, &sources, &count) {
            doc.insert_after(anchor, row);
        }
    }

    fn apply_updated_row(&mut self, doc: &mut Document, reply: &Reply) {
        Self::set_box_count(doc, reply);
        let part: ProductPart = reply.field("productPart").unwrap_or_default();
        let breakdown: Option<Breakdown> = reply.field("breakdown");
        let parent: Option<Breakdown> = reply.field("parentBreakdown");

        if let Some(child) = &breakdown {
            if let Some(figures) = child.figures(&part) {
                rows::apply_figures(doc, &child.id, &figures);
            }
            if let Some(mut parent) = parent {
                // Parent cells follow the kind of the edited row.
                parent.kind = child.kind;
                if let Some(figures) = parent.figures(&part) {
                    rows::apply_figures(doc, &parent.id, &figures);
                }
            }
        }

        if let Some(lines) = reply.field::<Vec<PoLine>>("po_array") {
            rows::rebuild_po_table(doc, &lines);
            if reply.raw("source_list").is_some() {
                let sales_id = breakdown
                    .as_ref()
                    .map_or_else(|| self.context.sales_id.clone(), |b| b.sales_id.clone());
                let sources: Vec<(String, String)> = reply
                    .entries("source_list")
                    .into_iter()
                    .map(|(k, v)| (k, value_text(&v)))
                    .collect();
                rows::rebuild_pdf_buttons(doc, &sales_id, &sources);
            }
        }

        let order_id = reply.text("sales_id").unwrap_or_default();
        let comments: Vec<(String, String)> = reply
            .entries("po_comments")
            .into_iter()
            .map(|(k, v)| (k, value_text(&v)))
            .collect();
        rows::rebuild_comments(doc, &order_id, &comments);
    }

    fn apply_deleted_row(&mut self, doc: &mut Document, reply: &Reply, id: &str) {
        for row in doc.elements_by_class(&format!("row_{id}")) {
            doc.remove(row);
        }
        Self::set_box_count(doc, reply);
        if let Some(parent) = reply.field::<Breakdown>("parentPackage") {
            let part: ProductPart = reply.field("productPart").unwrap_or_default();
            rows::apply_figures(doc, &parent.id, &parent.parent_figures(&part));
        }
        self.update_shipment_comments(doc);
    }

    /// Sends `requests` and every follow-up in FIFO order, applying each
    /// reply as it arrives. Stops at the first transport or decoding failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReviewError`] raised by the transport or by
    /// [`Self::on_reply`].
    pub fn run<T: Transport + ?Sized>(
        &mut self,
        doc: &mut Document,
        transport: &mut T,
        requests: Vec<Request>,
    ) -> Result<ReplyOutcome, ReviewError> {
        let mut queue: VecDeque<Request> = requests.into();
        let mut outcome = ReplyOutcome::default();
        while let Some(request) = queue.pop_front() {
            let body = transport.send(request.endpoint, &request.form)?;
            let mut step = self.on_reply(doc, &request, &body)?;
            queue.extend(step.follow_ups.drain(..));
            outcome.absorb(step);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> OrderReview {
        OrderReview::new(OrderContext {
            sales_id: "500".into(),
            ..OrderContext::default()
        })
    }

    fn element(doc: &mut Document, tag: &str, id: &str) -> NodeId {
        let node = doc.create_element(tag);
        doc.set_attr(node, "id", id);
        let body = doc.body();
        doc.append_child(body, node);
        node
    }

    #[test]
    fn test_request_ids_increase() {
        let mut page = review();
        let a = page.shipment_description();
        let b = page.remove_package("3");
        assert!(a.id < b.id);
        assert_eq!(b.form.get("sales_id"), Some("500"));
        assert_eq!(b.form.get("package_id"), Some("3"));
    }

    #[test]
    fn test_validation_error_shows_description() {
        let mut doc = Document::new();
        let panel = element(&mut doc, "div", "printErrors");
        let show = element(&mut doc, "div", "printErrors_show");
        let save = element(&mut doc, "button", "savechanges");
        let mut page = review();
        let request = page.validate(&mut doc);
        assert_eq!(doc.attr(panel, "style"), Some("display:none"));

        let outcome = page
            .on_reply(&mut doc, &request, r#"{"type":"error","description":"Boxes missing"}"#)
            .unwrap();
        assert!(!outcome.submit_form);
        assert!(outcome.follow_ups.is_empty());
        assert_eq!(doc.attr(panel, "style"), Some(""));
        assert_eq!(doc.inner_html(show), "Boxes missing");
        assert_eq!(doc.text_content(save), "Save Changes");
    }

    #[test]
    fn test_validation_success_follows_up_and_checks_fields() {
        let mut doc = Document::new();
        element(&mut doc, "div", "printErrors");
        let show = element(&mut doc, "div", "printErrors_show");
        element(&mut doc, "button", "savechanges");
        let handling = element(&mut doc, "input", "inputPartHandling");
        let first = element(&mut doc, "input", "shipping_firstname");
        let mut page = review();
        let request = page.validate(&mut doc);

        let outcome = page
            .on_reply(&mut doc, &request, r#"{"type":"success","InputPartHandling":"[1]"}"#)
            .unwrap();
        assert_eq!(doc.attr(handling, "value"), Some("[1]"));
        let endpoints: Vec<_> = outcome.follow_ups.iter().map(|r| r.endpoint).collect();
        assert_eq!(endpoints, [Endpoint::SourceComment, Endpoint::ShipmentDescription]);
        assert!(!outcome.submit_form);
        assert_eq!(doc.attr(first, "style"), Some(INVALID_FIELD_STYLE));
        assert!(doc.inner_html(show).contains("Shipping first name is empty"));
    }

    #[test]
    fn test_remove_package_paths() {
        let mut doc = Document::new();
        let line = element(&mut doc, "tr", "packageline-9");
        let msg = element(&mut doc, "div", "errorMSGPackages");
        let mut page = review();

        let request = page.remove_package("9");
        page.on_reply(&mut doc, &request, r#"{"type":"error","description":"locked"}"#)
            .unwrap();
        assert!(doc.inner_html(msg).contains("ERROR: locked"));
        assert!(doc.is_attached(line));

        page.on_reply(&mut doc, &request, r#"{"type":"success"}"#).unwrap();
        assert!(!doc.is_attached(line));
    }

    #[test]
    fn test_malformed_reply_is_an_error() {
        let mut doc = Document::new();
        let mut page = review();
        let request = page.shipment_description();
        assert!(matches!(
            page.on_reply(&mut doc, &request, "<html>"),
            Err(ReviewError::Malformed(_))
        ));
    }

    #[test]
    fn test_shipping_box_reply_ignored() {
        let mut doc = Document::new();
        let mut page = review();
        let request = page.update_shipping_box("500");
        let outcome = page.on_reply(&mut doc, &request, "not json").unwrap();
        assert!(outcome.follow_ups.is_empty());
    }

    #[test]
    fn test_fix_sku_reloads_on_success() {
        let mut doc = Document::new();
        let field = element(&mut doc, "input", "skufixedfield_4");
        doc.set_attr(field, "value", "PVC-9");
        let box_ = element(&mut doc, "div", "fixskubox_4");
        let mut page = review();
        let request = page.fix_sku(&mut doc, "4");
        assert_eq!(request.form.get("new_sku"), Some("PVC-9"));
        assert_eq!(doc.inner_html(box_), "Updating, please wait...");

        let outcome = page
            .on_reply(&mut doc, &request, r#"{"type":"success","description":"Done"}"#)
            .unwrap();
        assert_eq!(outcome.reload_after, Some(RELOAD_DELAY));
        assert_eq!(doc.inner_html(box_), "Done");

        let outcome = page
            .on_reply(&mut doc, &request, r#"{"type":"error","description":"Bad SKU"}"#)
            .unwrap();
        assert_eq!(outcome.reload_after, None);
    }

    #[test]
    fn test_shipping_label_error_offers_recheck() {
        let mut doc = Document::new();
        element(&mut doc, "div", "shippingLabelCheck");
        let color = element(&mut doc, "div", "shippingLabelCheck_color");
        let show = element(&mut doc, "div", "shippingLabelCheck_show");
        let mut page = review();
        let request = page.request_shipping_label(&mut doc);
        assert!(doc.inner_html(show).contains("Checking Shipping Label"));

        page.on_reply(&mut doc, &request, r#"{"type":"error","message":"No account"}"#)
            .unwrap();
        assert_eq!(doc.attr(color, "class"), Some("panel panel-red"));
        assert!(doc.inner_html(show).starts_with("No account "));
        assert!(doc.inner_html(show).contains("data-action=\"recheck-label\""));

        page.on_reply(&mut doc, &request, r#"{"type":"success"}"#).unwrap();
        assert_eq!(doc.attr(color, "class"), Some("panel panel-green"));
        assert_eq!(doc.inner_html(show), LABEL_PASSED);
    }

    #[test]
    fn test_enable_button_tracks_source() {
        let mut doc = Document::new();
        let select = element(&mut doc, "select", "inventory_source_7");
        let blank = doc.create_element("option");
        doc.set_attr(blank, "value", "");
        doc.append_child(select, blank);
        let button = element(&mut doc, "button", "addNew_7");

        OrderReview::enable_button(&mut doc, "7");
        assert!(doc.has_attr(button, "disabled"));

        let option = doc.create_element("option");
        doc.set_attr(option, "value", "Vendor");
        doc.append_child(select, option);
        rows::set_field_value(&mut doc, select, "Vendor");
        OrderReview::enable_button(&mut doc, "7");
        assert!(!doc.has_attr(button, "disabled"));
    }

    #[test]
    fn test_level2_toggles_block() {
        let mut doc = Document::new();
        let block = element(&mut doc, "div", "Level2-Info-Block");
        doc.set_attr(block, "style", "display: none");
        let content = element(&mut doc, "div", "level2content");
        let mut page = review();
        let request = page.level2_info(&mut doc);
        assert_eq!(doc.attr(block, "style"), Some(""));
        page.on_reply(&mut doc, &request, r#"{"type":"success","html":"<b>L2</b>"}"#)
            .unwrap();
        assert_eq!(doc.inner_html(content), "<b>L2</b>");
        page.level2_info(&mut doc);
        assert_eq!(doc.attr(block, "style"), Some("display:none"));
    }

    #[test]
    fn test_clear_zero_amount() {
        let mut doc = Document::new();
        let input = element(&mut doc, "input", "qty_1");
        doc.set_attr(input, "value", "0");
        OrderReview::clear_zero_amount(&mut doc, input);
        assert_eq!(doc.attr(input, "value"), Some(""));
        doc.set_attr(input, "value", "3");
        OrderReview::clear_zero_amount(&mut doc, input);
        assert_eq!(doc.attr(input, "value"), Some("3"));
    }
}
