//! Typed decoding of `data-action` targets on the review page.

use crate::dom::{Document, NodeId};

/// An action attached to a page element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ReviewAction {
    /// Run the review validation.
    Validate,
    /// Hide the error panel.
    DismissErrors,
    /// Production checkbox of a split row changed.
    SendToProduction { row: String, count: String },
    /// Box number input of a row changed.
    BoxNumber { row: String },
    /// Quantity of a unit or strip row changed.
    ChangeQty { row: String },
    /// Length of a linear-foot row changed.
    ChangeAmount { row: String },
    /// Inventory source picker of a row changed.
    InventorySource { row: String },
    /// Split a new row off `row`.
    AddRow { row: String },
    /// Delete split row `row`.
    DeleteRow { row: String },
    /// Remove package `package`.
    RemovePackage { package: String },
    /// Submit the corrected SKU of an item.
    FixSku { item: String },
    /// Number every box input from one.
    RecountBoxes,
    /// Copy the bulk source picker into every row.
    ApplySourceToAll,
    /// A shipment comment lost focus.
    ShipmentComment,
    /// Remove the notification row at `position` (1-based).
    RemoveNotification { position: usize },
    /// Re-run the shipping label check.
    RecheckLabel,
    /// Toggle the level-2 info block.
    Level2Info,
    /// PDF generation, handled by the embedding page.
    GeneratePdf { sales_id: String, source: String },
    /// PO comment save, handled by the embedding page.
    AddComments { order_id: String, index: String, slot: String },
    /// Cutting-charge deletion, handled by the embedding page.
    DeleteCuttingCharge { sales_id: String },
    /// PO line edit, handled by the embedding page.
    ChangeQuantity { sales_id: String },
}

impl ReviewAction {
    /// Decodes the action of the nearest element at or above `target`.
    #[must_use]
    pub fn at(doc: &Document, target: NodeId) -> Option<Self> {
        let node = doc.closest(target, |d, n| d.has_attr(n, "data-action"))?;
        let data = |name: &str| doc.attr(node, &format!("data-{name}")).unwrap_or_default().to_string();
        let action = match doc.attr(node, "data-action")? {
            "validate" => Self::Validate,
            "dismiss-errors" => Self::DismissErrors,
            "send-to-production" => Self::SendToProduction { row: data("row"), count: data("count") },
            "box-number" => Self::BoxNumber { row: data("row") },
            "change-qty" => Self::ChangeQty { row: data("row") },
            "change-amount" => Self::ChangeAmount { row: data("row") },
            "inventory-source" => Self::InventorySource { row: data("row") },
            "add-row" => Self::AddRow { row: data("row") },
            "delete-row" => Self::DeleteRow { row: data("row") },
            "remove-package" => Self::RemovePackage { package: data("package") },
            "fix-sku" => Self::FixSku { item: data("item") },
            "recount-boxes" => Self::RecountBoxes,
            "apply-source-to-all" => Self::ApplySourceToAll,
            "shipment-comment" => Self::ShipmentComment,
            "remove-notification" => Self::RemoveNotification {
                position: data("position").parse().ok()?,
            },
            "recheck-label" => Self::RecheckLabel,
            "level2-info" => Self::Level2Info,
            "generate-pdf" => Self::GeneratePdf { sales_id: data("sales"), source: data("source") },
            "add-comments" => Self::AddComments {
                order_id: data("order"),
                index: data("index"),
                slot: data("slot"),
            },
            "delete-cutting-charge" => Self::DeleteCuttingCharge { sales_id: data("sales") },
            "change-quantity" => Self::ChangeQuantity { sales_id: data("sales") },
            other => {
                tracing::debug!("Unknown review action '{other}'");
                return None;
            }
        };
        Some(action)
    }

    /// True for actions whose behavior lives outside this module.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(
            self,
            Self::GeneratePdf { .. }
                | Self::AddComments { .. }
                | Self::DeleteCuttingCharge { .. }
                | Self::ChangeQuantity { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_from_descendant() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.set_attr(button, "data-action", "delete-row");
        doc.set_attr(button, "data-row", "17");
        let icon = doc.create_element("i");
        doc.append_child(button, icon);
        let body = doc.body();
        doc.append_child(body, button);

        assert_eq!(
            ReviewAction::at(&doc, icon),
            Some(ReviewAction::DeleteRow { row: "17".into() })
        );
    }

    #[test]
    fn test_unknown_and_bad_position() {
        let mut doc = Document::new();
        let a = doc.create_element("button");
        doc.set_attr(a, "data-action", "launch");
        let b = doc.create_element("button");
        doc.set_attr(b, "data-action", "remove-notification");
        doc.set_attr(b, "data-position", "x");
        let body = doc.body();
        doc.append_child(body, a);
        doc.append_child(body, b);
        assert_eq!(ReviewAction::at(&doc, a), None);
        assert_eq!(ReviewAction::at(&doc, b), None);
    }

    #[test]
    fn test_external_actions() {
        let pdf = ReviewAction::GeneratePdf { sales_id: "1".into(), source: "X".into() };
        assert!(pdf.is_external());
        assert!(!ReviewAction::RecheckLabel.is_external());
    }
}
