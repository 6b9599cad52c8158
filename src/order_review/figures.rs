//! Breakdown rows and the figures shown for them.
//!
//! Numbers arrive from PHP either as JSON numbers or numeric strings, so
//! every numeric field is read leniently: the leading numeric prefix counts,
//! anything else is zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::reply::value_text;

/// How a package is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PackageType {
    /// Sold by the linear foot.
    #[serde(rename = "Linear_FT")]
    LinearFt,
    /// Strips of a fixed length.
    #[serde(rename = "Strip_Qty")]
    StripQty,
    /// Plain units.
    #[serde(rename = "Qty")]
    Qty,
    /// Any other tag.
    #[serde(other)]
    Other,
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number_of(&Value::deserialize(d)?))
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_text(&Value::deserialize(d)?))
}

/// Numeric value of a JSON scalar; unparseable input is zero.
#[must_use]
pub fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_float(s).unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

/// Leading decimal prefix of `text` (`"12.5 ft"` → 12.5).
#[must_use]
pub fn parse_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// `Number.prototype.toFixed` semantics: exact decimal expansion, ties
/// rounded away from zero.
#[must_use]
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let exact = format!("{:.*}", digits + 40, value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .map(|b| b - b'0')
        .collect();
    let round_up = frac_part.as_bytes().get(digits).is_some_and(|&b| b >= b'5');
    if round_up {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, 1);
                break;
            }
            i -= 1;
            if kept[i] == 9 {
                kept[i] = 0;
            } else {
                kept[i] += 1;
                break;
            }
        }
    }
    let split = kept.len() - digits;
    let digits_str: String = kept.iter().map(|d| char::from(b'0' + d)).collect();
    let body = if digits == 0 {
        digits_str
    } else {
        format!("{}.{}", &digits_str[..split], &digits_str[split..])
    };
    if value < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// Plain number text the way a browser prints it (`2`, `1.5`).
#[must_use]
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

/// One breakdown (package) row.
#[derive(Debug, Clone, Deserialize)]
pub struct Breakdown {
    /// Row id.
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    /// Measurement kind.
    #[serde(rename = "type")]
    pub kind: PackageType,
    /// Ordered quantity.
    #[serde(default, deserialize_with = "lenient_number")]
    pub qty: f64,
    /// Total length or count.
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: f64,
    /// Length per strip.
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: f64,
    /// Unit of `amount`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub unit: String,
    /// Owning order.
    #[serde(default, deserialize_with = "lenient_text")]
    pub sales_id: String,
    /// Product SKU.
    #[serde(default, deserialize_with = "lenient_text")]
    pub sku: String,
    /// Inventory source currently selected.
    #[serde(default, deserialize_with = "lenient_text")]
    pub source_name: String,
}

/// Pricing data of the product behind a row.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProductPart {
    /// Weight per unit in pounds.
    #[serde(default, deserialize_with = "lenient_number")]
    pub lb_per_unit: f64,
    /// Unit price.
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
}

/// Cell texts of a breakdown row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFigures {
    /// Quantity cell.
    pub qty: String,
    /// Total cell.
    pub total: String,
    /// Weight cell, when the reply allows computing it.
    pub weight: Option<String>,
    /// Price cell.
    pub price: String,
}

fn strip_total(total: f64) -> String {
    format!("{} ft ({} in.)", to_fixed(total, 2), to_fixed(total * 12.0, 2))
}

impl Breakdown {
    /// Figures after an update: weight included. `Other` rows yield `None`.
    #[must_use]
    pub fn figures(&self, part: &ProductPart) -> Option<RowFigures> {
        let weight = Some(format!(
            "{} lbs/ea ({} lbs)",
            js_number(part.lb_per_unit),
            to_fixed(self.total * part.lb_per_unit, 2)
        ));
        let figures = match self.kind {
            PackageType::LinearFt => RowFigures {
                qty: to_fixed(self.total, 2),
                total: to_fixed(self.total, 2),
                weight,
                price: to_fixed(self.total * part.price, 2),
            },
            PackageType::StripQty => RowFigures {
                qty: to_fixed(self.qty, 2),
                total: strip_total(self.total),
                weight,
                price: to_fixed(self.total * part.price, 2),
            },
            PackageType::Qty => RowFigures {
                qty: to_fixed(self.qty, 2),
                total: to_fixed(self.qty, 2),
                weight,
                price: to_fixed(self.qty * part.price, 2),
            },
            PackageType::Other => return None,
        };
        Some(figures)
    }

    /// Figures of a parent row after one of its splits is deleted: no
    /// weight, and unknown kinds count as plain units.
    #[must_use]
    pub fn parent_figures(&self, part: &ProductPart) -> RowFigures {
        match self.kind {
            PackageType::LinearFt | PackageType::StripQty => {
                let mut figures = self.figures(part).unwrap_or_else(|| self.unit_figures(part));
                figures.weight = None;
                figures
            }
            PackageType::Qty | PackageType::Other => self.unit_figures(part),
        }
    }

    fn unit_figures(&self, part: &ProductPart) -> RowFigures {
        RowFigures {
            qty: to_fixed(self.qty, 2),
            total: to_fixed(self.qty, 2),
            weight: None,
            price: to_fixed(self.qty * part.price, 2),
        }
    }

    /// Cells of a freshly split row: the editable value, the total text, the
    /// unit label next to the input and the unit label after the total.
    #[must_use]
    pub fn split_cells(&self) -> Option<SplitCells> {
        let cells = match self.kind {
            PackageType::LinearFt => SplitCells {
                value: js_number(self.total),
                total: to_fixed(self.total, 2),
                category: "ft".to_string(),
                total_category: "ft".to_string(),
                column: UpdateColumn::AmountUpdateParent,
            },
            PackageType::StripQty => {
                let rounded: f64 = to_fixed(self.total, 2).parse().unwrap_or(0.0);
                SplitCells {
                    value: js_number(self.qty),
                    total: format!(
                        "{} ft ({} in.)",
                        to_fixed(self.total, 2),
                        js_number(rounded * 12.0)
                    ),
                    category: format!(
                        "strips @ {}{} ({} in.)",
                        to_fixed(self.amount, 2),
                        self.unit,
                        to_fixed(self.amount * 12.0, 2)
                    ),
                    total_category: String::new(),
                    column: UpdateColumn::QtyUpdateParent,
                }
            }
            PackageType::Qty => SplitCells {
                value: js_number(self.qty),
                total: to_fixed(self.qty, 2),
                category: "unit".to_string(),
                total_category: "unit".to_string(),
                column: UpdateColumn::QtyUpdateParent,
            },
            PackageType::Other => return None,
        };
        Some(cells)
    }
}

/// Column names accepted by the row-update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateColumn {
    /// Box number of the row.
    BoxNumber,
    /// Quantity, propagated to the parent.
    QtyUpdateParent,
    /// Length, propagated to the parent.
    AmountUpdateParent,
    /// Production flag.
    SendToProduction,
    /// Inventory source.
    SourceName,
}

impl UpdateColumn {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoxNumber => "boxnumber",
            Self::QtyUpdateParent => "qty_update_parent",
            Self::AmountUpdateParent => "amount_update_parent",
            Self::SendToProduction => "send_to_production",
            Self::SourceName => "source_name",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        [
            Self::BoxNumber,
            Self::QtyUpdateParent,
            Self::AmountUpdateParent,
            Self::SendToProduction,
            Self::SourceName,
        ]
        .into_iter()
        .find(|c| c.as_str() == name)
    }
}

/// Cell texts for a new split row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCells {
    /// Initial value of the amount input.
    pub value: String,
    /// Total text.
    pub total: String,
    /// Unit label beside the input.
    pub category: String,
    /// Unit label after the total.
    pub total_category: String,
    /// Column the amount input updates.
    pub column: UpdateColumn,
}

/// Quantity text of a breakdown, with the inch conversion for foot units
/// (suppressed for PVC rolls).
#[must_use]
pub fn get_total(breakdown: &Breakdown, is_pvc_roll: bool) -> String {
    let mut amount = breakdown.qty;
    let mut info = String::new();
    if breakdown.unit == "ft" {
        amount *= breakdown.amount;
        if !is_pvc_roll {
            info = format!(
                " {} ({}in.)",
                breakdown.unit,
                to_fixed(breakdown.amount * breakdown.qty * 12.0, 2)
            );
        }
    }
    if amount.is_nan() {
        amount = 0.0;
    }
    format!("{}{info}", to_fixed(amount, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(json: &str) -> Breakdown {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_fixed_matches_browser_rounding() {
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(9.999, 2), "10.00");
        assert_eq!(to_fixed(-1.5, 2), "-1.50");
        assert_eq!(to_fixed(-0.001, 2), "-0.00");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(12.0, 2), "12.00");
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float("12.5 ft"), Some(12.5));
        assert_eq!(parse_float("  -3"), Some(-3.0));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("."), None);
    }

    #[test]
    fn test_lenient_fields() {
        let b = breakdown(r#"{"id": 41, "type": "Strip_Qty", "qty": "4", "total": 10, "amount": "2.5", "unit": "ft"}"#);
        assert_eq!(b.id, "41");
        assert_eq!(b.qty, 4.0);
        assert_eq!(b.amount, 2.5);
        assert_eq!(b.sales_id, "");
    }

    #[test]
    fn test_strip_figures() {
        let b = breakdown(r#"{"id": 1, "type": "Strip_Qty", "qty": 4, "total": 10}"#);
        let part = ProductPart {
            lb_per_unit: 1.5,
            price: 2.0,
        };
        let figures = b.figures(&part).unwrap();
        assert_eq!(figures.qty, "4.00");
        assert_eq!(figures.total, "10.00 ft (120.00 in.)");
        assert_eq!(figures.weight.as_deref(), Some("1.5 lbs/ea (15.00 lbs)"));
        assert_eq!(figures.price, "20.00");
    }

    #[test]
    fn test_other_kind() {
        let b = breakdown(r#"{"id": 1, "type": "Bundle", "qty": 3, "total": 10}"#);
        let part = ProductPart {
            lb_per_unit: 0.0,
            price: 1.0,
        };
        assert!(b.figures(&part).is_none());
        let parent = b.parent_figures(&part);
        assert_eq!(parent.total, "3.00");
        assert_eq!(parent.price, "3.00");
    }

    #[test]
    fn test_split_cells() {
        let strip = breakdown(r#"{"id": 5, "type": "Strip_Qty", "qty": 2, "total": 5.5, "amount": 2.75, "unit": "ft"}"#);
        let cells = strip.split_cells().unwrap();
        assert_eq!(cells.value, "2");
        assert_eq!(cells.total, "5.50 ft (66 in.)");
        assert_eq!(cells.category, "strips @ 2.75ft (33.00 in.)");
        assert_eq!(cells.column, UpdateColumn::QtyUpdateParent);
        let linear = breakdown(r#"{"id": 6, "type": "Linear_FT", "total": 12}"#);
        assert_eq!(linear.split_cells().unwrap().column, UpdateColumn::AmountUpdateParent);
    }

    #[test]
    fn test_get_total() {
        let b = breakdown(r#"{"id": 1, "type": "Strip_Qty", "qty": 3, "amount": 2, "unit": "ft"}"#);
        assert_eq!(get_total(&b, false), "6.00 ft (72.00in.)");
        assert_eq!(get_total(&b, true), "6.00");
        let units = breakdown(r#"{"id": 2, "type": "Qty", "qty": 7, "unit": "ea"}"#);
        assert_eq!(get_total(&units, false), "7.00");
    }

    #[test]
    fn test_update_column_names() {
        assert_eq!(UpdateColumn::parse("boxnumber"), Some(UpdateColumn::BoxNumber));
        assert_eq!(UpdateColumn::parse("nope"), None);
    }
}
