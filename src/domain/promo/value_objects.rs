use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Promo Code Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    /// Stored upper-case; lookups are case-insensitive
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_amount: Decimal,
    /// 0 means unlimited
    #[serde(default)]
    pub usage_limit: u32,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl PromoCode {
    pub fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }

    pub fn has_remaining_uses(&self) -> bool {
        self.usage_limit == 0 || self.usage_count < self.usage_limit
    }

    /// Active, not expired, and below its usage limit
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired(now) && self.has_remaining_uses()
    }

    /// Discount this code grants on `subtotal`, zero below the minimum spend
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal < self.min_order_amount {
            return Decimal::ZERO;
        }

        match self.discount_type {
            DiscountType::Percentage => {
                (subtotal * self.discount_value / Decimal::ONE_HUNDRED).round_dp(2)
            }
            DiscountType::Fixed => self.discount_value.min(subtotal),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    pub(crate) fn promo(code: &str, limit: u32, count: u32) -> PromoCode {
        PromoCode {
            code: PromoCode::normalize(code),
            discount_type: DiscountType::Percentage,
            discount_value: dec!(20),
            min_order_amount: dec!(50),
            usage_limit: limit,
            usage_count: count,
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn test_exhausted_code_is_not_usable() {
        let summer = promo("SUMMER20", 100, 100);
        assert!(summer.active);
        assert!(!summer.is_usable(Utc::now()));
    }

    #[test]
    fn test_unlimited_code_is_usable() {
        let code = promo("forever", 0, 10_000);
        assert!(code.is_usable(Utc::now()));
    }

    #[test]
    fn test_expired_or_inactive_code_is_not_usable() {
        let now = Utc::now();
        let mut expired = promo("OLD", 0, 0);
        expired.expires_at = Some(now - Duration::days(1));
        assert!(!expired.is_usable(now));

        let mut inactive = promo("OFF", 0, 0);
        inactive.active = false;
        assert!(!inactive.is_usable(now));
    }

    #[test]
    fn test_discount_amounts() {
        let pct = promo("SUMMER20", 100, 0);
        assert_eq!(pct.discount_for(dec!(149.00)), dec!(29.80));
        assert_eq!(pct.discount_for(dec!(40.00)), dec!(0));

        let mut fixed = promo("FIVE", 0, 0);
        fixed.discount_type = DiscountType::Fixed;
        fixed.discount_value = dec!(5);
        fixed.min_order_amount = dec!(0);
        assert_eq!(fixed.discount_for(dec!(149.00)), dec!(5));
        assert_eq!(fixed.discount_for(dec!(3.00)), dec!(3.00));
    }
}
