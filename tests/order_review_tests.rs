//! Order review flows driven end to end through a scripted transport.

use std::collections::VecDeque;

use navux::dom::{Document, NodeId};
use navux::order_review::{Endpoint, FormData, OrderContext, OrderReview, ReviewError, Transport};

/// Replays canned bodies and records what was sent.
#[derive(Default)]
struct ScriptedTransport {
    replies: VecDeque<Result<String, ReviewError>>,
    sent: Vec<(Endpoint, FormData)>,
}

impl ScriptedTransport {
    fn reply(mut self, body: &str) -> Self {
        self.replies.push_back(Ok(body.to_string()));
        self
    }

    fn fail(mut self, message: &str) -> Self {
        self.replies.push_back(Err(ReviewError::Transport(message.to_string())));
        self
    }

    fn endpoints(&self) -> Vec<Endpoint> {
        self.sent.iter().map(|(e, _)| *e).collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, endpoint: Endpoint, form: &FormData) -> Result<String, ReviewError> {
        self.sent.push((endpoint, form.clone()));
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(ReviewError::Transport("no scripted reply".to_string())))
    }
}

fn element(doc: &mut Document, tag: &str, id: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.set_attr(node, "id", id);
    let body = doc.body();
    doc.append_child(body, node);
    node
}

fn input(doc: &mut Document, id: &str, value: &str) -> NodeId {
    let node = element(doc, "input", id);
    doc.set_attr(node, "value", value);
    node
}

fn review_page() -> Document {
    let mut doc = Document::new();
    element(&mut doc, "div", "printErrors");
    element(&mut doc, "div", "printErrors_show");
    element(&mut doc, "button", "savechanges");
    input(&mut doc, "inputPartHandling", "");
    element(&mut doc, "textarea", "inputSourceComment");
    element(&mut doc, "textarea", "shipmentDescription");
    input(&mut doc, "checkpaymentmethod", "credit_card");
    input(&mut doc, "po_number", "");
    input(&mut doc, "shipping_firstname", "Ada");
    input(&mut doc, "shipping_address1", "1 Main St");
    input(&mut doc, "shipping_city", "Richmond");
    input(&mut doc, "shipping_state", "VA");
    input(&mut doc, "shipment_type", "Ground");
    input(&mut doc, "shipping_zipcode", "23220");
    doc
}

fn review() -> OrderReview {
    OrderReview::new(OrderContext {
        sales_id: "500".into(),
        ..OrderContext::default()
    })
}

#[test]
fn test_validation_flow_submits_when_fields_are_complete() {
    let mut doc = review_page();
    let mut page = review();
    let mut transport = ScriptedTransport::default()
        .reply(r#"{"type":"success","InputPartHandling":"[2]"}"#)
        .reply(r#"{"type":"success","inputSourceComment":"From warehouse"}"#)
        .reply(r#"{"type":"success","shipmentDescription":"2 boxes"}"#);

    let first = page.validate(&mut doc);
    let outcome = page.run(&mut doc, &mut transport, vec![first]).unwrap();

    assert!(outcome.submit_form);
    assert_eq!(
        transport.endpoints(),
        [
            Endpoint::ValidateReview,
            Endpoint::SourceComment,
            Endpoint::ShipmentDescription
        ]
    );
    assert!(transport.sent.iter().all(|(_, form)| form.get("sales_id") == Some("500")));

    let source = doc.element_by_id("inputSourceComment").unwrap();
    assert_eq!(doc.text_content(source), "From warehouse");
    let description = doc.element_by_id("shipmentDescription").unwrap();
    assert_eq!(doc.text_content(description), "2 boxes");
    let handling = doc.element_by_id("inputPartHandling").unwrap();
    assert_eq!(doc.attr(handling, "value"), Some("[2]"));
}

#[test]
fn test_missing_fields_block_submission() {
    let mut doc = review_page();
    let city = doc.element_by_id("shipping_city").unwrap();
    doc.set_attr(city, "value", "");
    let mut page = review();
    let mut transport = ScriptedTransport::default()
        .reply(r#"{"type":"success"}"#)
        .reply(r#"{"type":"success"}"#)
        .reply(r#"{"type":"success"}"#);

    let first = page.validate(&mut doc);
    let outcome = page.run(&mut doc, &mut transport, vec![first]).unwrap();

    assert!(!outcome.submit_form);
    let panel = doc.element_by_id("printErrors_show").unwrap();
    assert!(doc.inner_html(panel).contains("Shipping city is empty"));
    assert!(doc.attr(city, "style").is_some_and(|s| s.contains("#FF0033")));
}

#[test]
fn test_server_rejection_shows_description() {
    let mut doc = review_page();
    let mut page = review();
    let mut transport =
        ScriptedTransport::default().reply(r#"{"type":"error","description":"Missing weights"}"#);

    let first = page.validate(&mut doc);
    let outcome = page.run(&mut doc, &mut transport, vec![first]).unwrap();

    assert!(!outcome.submit_form);
    assert_eq!(transport.endpoints(), [Endpoint::ValidateReview]);
    let panel = doc.element_by_id("printErrors_show").unwrap();
    assert!(doc.inner_html(panel).contains("Missing weights"));
}

#[test]
fn test_transport_failure_stops_the_run() {
    let mut doc = review_page();
    let mut page = review();
    let mut transport = ScriptedTransport::default()
        .reply(r#"{"type":"success"}"#)
        .fail("connection reset");

    let first = page.validate(&mut doc);
    let err = page.run(&mut doc, &mut transport, vec![first]).unwrap_err();

    assert_eq!(err, ReviewError::Transport("connection reset".to_string()));
    assert_eq!(
        transport.endpoints(),
        [Endpoint::ValidateReview, Endpoint::SourceComment]
    );
}

#[test]
fn test_recount_boxes_numbers_and_sends_each() {
    let mut doc = Document::new();
    for id in ["box_number_11", "box_number_12"] {
        let node = input(&mut doc, id, "9");
        doc.add_class(node, "boxNumber");
    }
    let mut page = review();

    let requests = page.recount_boxes(&mut doc);
    let mut transport = ScriptedTransport::default()
        .reply(r#"{"type":"success"}"#)
        .reply("ignored")
        .reply(r#"{"type":"success"}"#)
        .reply("ignored");
    page.run(&mut doc, &mut transport, requests).unwrap();

    let values: Vec<(&str, &str)> = transport
        .sent
        .iter()
        .filter(|(e, _)| *e == Endpoint::UpdateRow)
        .map(|(_, f)| (f.get("id").unwrap(), f.get("value").unwrap()))
        .collect();
    assert_eq!(values, [("11", "1"), ("12", "2")]);
    let boxes: Vec<_> = transport
        .sent
        .iter()
        .filter(|(e, _)| *e == Endpoint::UpdateShippingBox)
        .map(|(_, f)| f.get("id").unwrap())
        .collect();
    assert_eq!(boxes, ["500", "500"]);
}
