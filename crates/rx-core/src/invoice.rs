//! # Invoice Numbering
//!
//! Formatting for the date-scoped sequential invoice number assigned to
//! every committed sale.
//!
//! ## Format
//! ```text
//! INV 20260115 0001
//! └┬┘ └──┬───┘ └┬─┘
//!  │     │      └── 4-digit, 1-based sequence within the date
//!  │     └───────── calendar date (UTC)
//!  └─────────────── fixed prefix
//! ```
//!
//! The sequence itself is computed by the coordinator inside the same
//! transaction that posts the sale, so two concurrent sales cannot both
//! claim the same number; the `UNIQUE` constraint on the column backstops
//! the rare race. This module only knows how to format.

use chrono::NaiveDate;

/// Fixed prefix of every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// Formats an invoice number for the given date and 1-based sequence.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use rx_core::invoice::invoice_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// assert_eq!(invoice_number(date, 1), "INV202601150001");
/// assert_eq!(invoice_number(date, 42), "INV202601150042");
/// ```
pub fn invoice_number(date: NaiveDate, sequence: u32) -> String {
    format!("{}{}{:04}", INVOICE_PREFIX, date.format("%Y%m%d"), sequence)
}
