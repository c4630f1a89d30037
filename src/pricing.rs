//! Money arithmetic shared by the API and the storefront client.
//!
//! All amounts are integer paise. Both halves of the system call into this
//! module so a cart shows the same totals in the client and at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::UserType;

/// Flat GST rate applied to every order.
pub const GST_RATE_PERCENT: i64 = 18;

pub const CURRENCY: &str = "INR";

pub fn line_total(unit_price: i64, quantity: i32) -> i64 {
    unit_price * i64::from(quantity)
}

pub fn subtotal<I>(lines: I) -> i64
where
    I: IntoIterator<Item = (i64, i32)>,
{
    lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum()
}

/// 18% of `subtotal`, rounded half up to the nearest paisa.
pub fn gst(subtotal: i64) -> i64 {
    (subtotal * GST_RATE_PERCENT + 50).div_euclid(100)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartTotals {
    pub item_count: i64,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_amount: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
}

impl CartTotals {
    /// Totals for `(unit_price, quantity)` lines. Shipping is free and no
    /// discount is applied.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (i64, i32)>,
    {
        let mut item_count = 0_i64;
        let mut sub = 0_i64;
        for (price, qty) in lines {
            item_count += i64::from(qty);
            sub += line_total(price, qty);
        }
        Self::with_adjustments(item_count, sub, 0, 0)
    }

    pub fn with_adjustments(item_count: i64, subtotal: i64, discount: i64, shipping: i64) -> Self {
        let tax_amount = gst(subtotal);
        Self {
            item_count,
            subtotal,
            discount_amount: discount,
            shipping_amount: shipping,
            tax_amount,
            total_amount: subtotal - discount + shipping + tax_amount,
        }
    }
}

/// Unit price a buyer pays. B2B accounts get the trade price when one is set.
pub fn unit_price_for(user_type: UserType, selling_price: i64, b2b_price: Option<i64>) -> i64 {
    match (user_type, b2b_price) {
        (UserType::B2B, Some(b2b)) => b2b,
        _ => selling_price,
    }
}

pub fn discount_percentage(mrp: i64, selling_price: i64) -> i64 {
    if mrp <= 0 {
        return 0;
    }
    let pct = (mrp - selling_price) as f64 / mrp as f64 * 100.0;
    (pct + 0.5).floor() as i64
}

pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.to_lowercase().chars() {
        let mapped = if ch.is_whitespace() || ch == '-' {
            Some('-')
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            Some(ch)
        } else {
            None
        };
        match mapped {
            Some('-') => {
                if !last_dash {
                    out.push('-');
                    last_dash = true;
                }
            }
            Some(c) => {
                out.push(c);
                last_dash = false;
            }
            None => {}
        }
    }
    out.trim_matches('-').to_string()
}

/// `PRJ-YYYYMMDD-XXXXXXXX` with eight random upper-case hex digits.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let random: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!("PRJ-{}-{}", now.format("%Y%m%d"), random.to_uppercase())
}

/// Formats paise as rupees with Indian digit grouping, e.g. `₹1,23,456.50`.
pub fn format_inr(paise: i64) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.unsigned_abs();
    let rupees = (abs / 100).to_string();
    let fraction = abs % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (left, right) = rest.split_at(rest.len() - 2);
            parts.push(right);
            rest = left;
        }
        if !rest.is_empty() {
            parts.push(rest);
        }
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    format!("{sign}₹{grouped}.{fraction:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gst_is_eighteen_percent_rounded_half_up() {
        assert_eq!(gst(100_00), 18_00);
        assert_eq!(gst(0), 0);
        // 4.5 paise rounds up
        assert_eq!(gst(25), 5);
        assert_eq!(gst(24), 4);
    }

    #[test]
    fn totals_add_tax_to_subtotal() {
        let totals = CartTotals::from_lines([(449_00, 2), (699_00, 1)]);
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, 1597_00);
        assert_eq!(totals.tax_amount, 287_46);
        assert_eq!(totals.total_amount, totals.subtotal + totals.tax_amount);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        assert_eq!(CartTotals::from_lines(Vec::new()), CartTotals::default());
    }

    #[test]
    fn adjustments_flow_into_total() {
        let totals = CartTotals::with_adjustments(1, 1000_00, 100_00, 50_00);
        assert_eq!(totals.tax_amount, 180_00);
        assert_eq!(totals.total_amount, 1000_00 - 100_00 + 50_00 + 180_00);
    }

    #[test]
    fn b2b_price_only_for_business_accounts() {
        assert_eq!(unit_price_for(UserType::B2B, 449_00, Some(320_00)), 320_00);
        assert_eq!(unit_price_for(UserType::B2B, 449_00, None), 449_00);
        assert_eq!(unit_price_for(UserType::B2C, 449_00, Some(320_00)), 449_00);
    }

    #[test]
    fn discount_percentage_rounds() {
        assert_eq!(discount_percentage(599, 449), 25);
        assert_eq!(discount_percentage(0, 449), 0);
        assert_eq!(discount_percentage(899, 699), 22);
    }

    #[test]
    fn slugify_normalizes_text() {
        assert_eq!(slugify("Matte Velvet Lipstick - Ruby Red"), "matte-velvet-lipstick-ruby-red");
        assert_eq!(slugify("  HD Foundation!!  "), "hd-foundation");
        assert_eq!(slugify("Eye -- Makeup"), "eye-makeup");
    }

    #[test]
    fn order_number_has_date_and_hex_suffix() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("PRJ-20250309-"));
        let suffix = &number["PRJ-20250309-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn inr_uses_indian_grouping() {
        assert_eq!(format_inr(449_00), "₹449.00");
        assert_eq!(format_inr(1234_50), "₹1,234.50");
        assert_eq!(format_inr(123456_05), "₹1,23,456.05");
        assert_eq!(format_inr(12345678_00), "₹1,23,45,678.00");
    }
}
