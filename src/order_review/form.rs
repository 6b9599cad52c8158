//! Client-side checks run before the review form is submitted.

/// Inline style marking an invalid field.
pub const INVALID_FIELD_STYLE: &str = "border:1px solid #FF0033 !important; background:#FFFF99;";

/// A shipping field that blocks submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    /// On-account orders need a PO number.
    PoNumber,
    /// Shipping first name.
    FirstName,
    /// Shipping address line 1.
    Address,
    /// Shipping city.
    City,
    /// Shipping state.
    State,
    /// Shipment type (unless picked up).
    ShipmentType,
    /// Shipping zip code.
    ZipCode,
}

impl FieldProblem {
    /// Every checked field, in check order.
    pub const ALL: [Self; 7] = [
        Self::PoNumber,
        Self::FirstName,
        Self::Address,
        Self::City,
        Self::State,
        Self::ShipmentType,
        Self::ZipCode,
    ];

    /// Element id of the offending input.
    #[must_use]
    pub const fn field_id(self) -> &'static str {
        match self {
            Self::PoNumber => "po_number",
            Self::FirstName => "shipping_firstname",
            Self::Address => "shipping_address1",
            Self::City => "shipping_city",
            Self::State => "shipping_state",
            Self::ShipmentType => "shipment_type",
            Self::ZipCode => "shipping_zipcode",
        }
    }

    /// Line shown in the error panel.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PoNumber => "- PO # must be filled when order is On Account;<br />",
            Self::FirstName => "- Shipping first name is empty;<br />",
            Self::Address => "- Shipping address is empty;<br />",
            Self::City => "- Shipping city is empty;<br />",
            Self::State => "- Shipping state is empty;<br />",
            Self::ShipmentType => "- You must select a shipment type;<br />",
            Self::ZipCode => "- Shipping zip code is empty;<br />",
        }
    }
}

/// Values read from the review form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ShippingFields {
    pub payment_method: String,
    pub po_number: String,
    pub first_name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub pick_up: bool,
    pub shipment_type: String,
    pub zipcode: String,
}

/// Result of checking one field: `Some(true)` invalid, `Some(false)` valid,
/// `None` not checked (shipment type on pick-up orders).
#[must_use]
pub fn field_state(fields: &ShippingFields, problem: FieldProblem) -> Option<bool> {
    let invalid = match problem {
        FieldProblem::PoNumber => fields.payment_method == "on_account" && fields.po_number.is_empty(),
        FieldProblem::FirstName => fields.first_name.is_empty(),
        FieldProblem::Address => fields.address1.is_empty(),
        FieldProblem::City => fields.city.is_empty(),
        FieldProblem::State => fields.state.is_empty(),
        FieldProblem::ShipmentType if fields.pick_up => return None,
        FieldProblem::ShipmentType => fields.shipment_type.is_empty(),
        FieldProblem::ZipCode => fields.zipcode.is_empty(),
    };
    Some(invalid)
}

/// Every failing field, in check order.
#[must_use]
pub fn check_shipping(fields: &ShippingFields) -> Vec<FieldProblem> {
    FieldProblem::ALL
        .into_iter()
        .filter(|&p| field_state(fields, p) == Some(true))
        .collect()
}

/// Concatenated panel markup for `problems`.
#[must_use]
pub fn error_markup(problems: &[FieldProblem]) -> String {
    problems.iter().map(|p| p.message()).collect()
}

/// Key filter of the amount inputs (legacy `keyCode` values): editing and
/// navigation keys, Ctrl/Cmd+A/C/X and unshifted digits pass.
#[must_use]
pub fn amount_key_allowed(key_code: u32, shift: bool, command: bool) -> bool {
    const EDITING: [u32; 7] = [46, 8, 9, 27, 13, 110, 190];
    if EDITING.contains(&key_code)
        || (command && matches!(key_code, 65 | 67 | 88))
        || (35..=39).contains(&key_code)
    {
        return true;
    }
    let top_row = (48..=57).contains(&key_code) && !shift;
    let keypad = (96..=105).contains(&key_code);
    top_row || keypad
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ShippingFields {
        ShippingFields {
            payment_method: "card".into(),
            po_number: String::new(),
            first_name: "Ana".into(),
            address1: "1 Main".into(),
            city: "Town".into(),
            state: "ON".into(),
            pick_up: false,
            shipment_type: "Ground".into(),
            zipcode: "A1A".into(),
        }
    }

    #[test]
    fn test_complete_form_passes() {
        assert!(check_shipping(&complete()).is_empty());
    }

    #[test]
    fn test_on_account_needs_po() {
        let fields = ShippingFields {
            payment_method: "on_account".into(),
            ..complete()
        };
        let problems = check_shipping(&fields);
        assert_eq!(problems, [FieldProblem::PoNumber]);
        assert_eq!(
            error_markup(&problems),
            "- PO # must be filled when order is On Account;<br />"
        );
    }

    #[test]
    fn test_pick_up_skips_shipment_type() {
        let fields = ShippingFields {
            pick_up: true,
            shipment_type: String::new(),
            city: String::new(),
            ..complete()
        };
        assert_eq!(check_shipping(&fields), [FieldProblem::City]);
        assert_eq!(field_state(&fields, FieldProblem::ShipmentType), None);
    }

    #[test]
    fn test_amount_key_filter() {
        assert!(amount_key_allowed(8, false, false));
        assert!(amount_key_allowed(50, false, false));
        assert!(!amount_key_allowed(50, true, false));
        assert!(amount_key_allowed(100, true, false));
        assert!(amount_key_allowed(67, false, true));
        assert!(!amount_key_allowed(67, false, false));
    }
}
