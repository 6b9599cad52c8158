//! Endpoints, form payloads and the transport seam.

use std::fmt;

use super::reply::ReviewError;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Query-string request.
    Get,
    /// Multipart form post.
    Post,
}

/// Server endpoints the review page talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Review validation and confirmation.
    ValidateReview,
    /// Package removal.
    RemovePackages,
    /// Source comment generation.
    SourceComment,
    /// Shipment description generation.
    ShipmentDescription,
    /// Split-row creation.
    AddRow,
    /// Single column update of a breakdown row.
    UpdateRow,
    /// Breakdown row deletion.
    DeleteRow,
    /// Shipping box refresh.
    UpdateShippingBox,
    /// SKU correction.
    FixSku,
    /// Shipping label dry run.
    ShippingLabel,
    /// Level-2 customer info.
    Level2Info,
}

impl Endpoint {
    /// Path relative to the application root.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ValidateReview => "ajax/sales/validate_review_breakdown.php",
            Self::RemovePackages => "ajax/sales/removePackages.php",
            Self::SourceComment => "ajax/sales/generate_source_comment.php",
            Self::ShipmentDescription => "ajax/sales/generate_shipment_description.php",
            Self::AddRow => "ajax/sales/review_add_new_row.php",
            Self::UpdateRow => "ajax/sales/update_review_breakdown.php",
            Self::DeleteRow => "ajax/sales/delete_review_breakdown.php",
            Self::UpdateShippingBox => "ajax/box/update_shipping_box.php",
            Self::FixSku => "ajax/sales/fix_item_sku.php",
            Self::ShippingLabel => "ajax/request_UPS_Label.php",
            Self::Level2Info => "ajax/sales/getLevel2Info.php",
        }
    }

    /// Method used for this endpoint.
    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::ShippingLabel => Method::Get,
            _ => Method::Post,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Ordered form fields, duplicates allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    /// Empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0.push((name.to_string(), value.into()));
    }

    /// Builder form of [`FormData::append`].
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// First value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no fields were appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sends one request and returns the raw response body.
///
/// Implementations decide how to reach the server; the review page only
/// needs the body text.
pub trait Transport {
    /// Performs the request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Transport`] when the server cannot be reached.
    fn send(&mut self, endpoint: Endpoint, form: &FormData) -> Result<String, ReviewError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_methods() {
        assert_eq!(Endpoint::ShippingLabel.method(), Method::Get);
        assert_eq!(Endpoint::UpdateRow.method(), Method::Post);
        assert_eq!(
            Endpoint::UpdateShippingBox.to_string(),
            "ajax/box/update_shipping_box.php"
        );
    }

    #[test]
    fn test_form_data_order() {
        let form = FormData::new().with("id", "7").with("columnName", "qty").with("id", "8");
        assert_eq!(form.get("id"), Some("7"));
        let names: Vec<_> = form.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["id", "columnName", "id"]);
    }
}
