//! Card data holders.
//!
//! These types only carry data. They are serialized to camelCase JSON and
//! then encrypted by [`crypto::encrypt_card_data`](crate::crypto::encrypt_card_data);
//! they never leave the SDK in cleartext.
//!
//! # Security
//!
//! - `Debug` output masks the card number and omits the security code
//! - The card number and security code are zeroized on drop

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Card to be registered with the platform.
///
/// # Examples
///
/// ```
/// use cardlink_sdk::card::CardData;
///
/// let card = CardData::new("4111111111111111", "12", "2030", "123", "Jane Doe");
/// assert_eq!(card.last_four(), "1111");
/// assert!(!format!("{card:?}").contains("4111111111111111"));
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    /// Primary account number.
    pub account_number: String,
    /// Expiry month (`01`-`12`).
    pub expiry_month: String,
    /// Expiry year, two or four digits.
    pub expiry_year: String,
    /// Card verification code.
    pub security_code: String,
    /// Cardholder name as printed on the card.
    pub cardholder_name: String,
    /// Billing address, when the issuer supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
}

impl CardData {
    /// Creates card data without a billing address.
    #[must_use]
    pub fn new(
        account_number: impl Into<String>,
        expiry_month: impl Into<String>,
        expiry_year: impl Into<String>,
        security_code: impl Into<String>,
        cardholder_name: impl Into<String>,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            expiry_month: expiry_month.into(),
            expiry_year: expiry_year.into(),
            security_code: security_code.into(),
            cardholder_name: cardholder_name.into(),
            billing_address: None,
        }
    }

    /// Attaches a billing address.
    #[must_use]
    pub fn with_billing_address(mut self, address: Address) -> Self {
        self.billing_address = Some(address);
        self
    }

    /// Returns the last four digits of the card number for display.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.account_number.len().saturating_sub(4);
        self.account_number.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for CardData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardData")
            .field("account_number", &format_args!("****{}", self.last_four()))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cardholder_name", &self.cardholder_name)
            .field("billing_address", &self.billing_address)
            .finish_non_exhaustive()
    }
}

impl Drop for CardData {
    fn drop(&mut self) {
        self.account_number.zeroize();
        self.security_code.zeroize();
    }
}

/// Postal address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// First street line.
    pub line1: String,
    /// Second street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    /// City or locality.
    pub city: String,
    /// State, province or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
}
