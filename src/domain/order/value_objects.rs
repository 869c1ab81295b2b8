use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Human-readable order code (e.g. `DB-1001`), distinct from the storage id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generate a fresh code such as `DB-4F0A9C21`
    pub fn generate(prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        Self(format!("{}-{}", prefix, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Line item with name and price snapshotted at checkout
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Single-line rendering used in emails and CSV exports
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        format!(
            "{}, {} {} {}, {}",
            parts.join(", "),
            self.city,
            self.state,
            self.postal_code,
            self.country
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether an order in `self` may be moved to `next`.
    ///
    /// Re-applying the current status is always allowed so the console can
    /// resend the matching notification.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return true;
        }

        match (self, next) {
            (Pending, Processing) | (Pending, Shipped) | (Processing, Shipped) => true,
            // delivered only follows shipped so shipping metadata is always present
            (Shipped, Delivered) => true,
            (Pending | Processing | Shipped, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Shipping carriers offered in the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Carrier {
    AustraliaPost,
    Startrack,
    Sendle,
    Aramex,
    Dhl,
    CouriersPlease,
    Other,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::AustraliaPost => "australia-post",
            Carrier::Startrack => "startrack",
            Carrier::Sendle => "sendle",
            Carrier::Aramex => "aramex",
            Carrier::Dhl => "dhl",
            Carrier::CouriersPlease => "couriers-please",
            Carrier::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Carrier::AustraliaPost => "Australia Post",
            Carrier::Startrack => "StarTrack",
            Carrier::Sendle => "Sendle",
            Carrier::Aramex => "Aramex",
            Carrier::Dhl => "DHL Express",
            Carrier::CouriersPlease => "CouriersPlease",
            Carrier::Other => "Other",
        }
    }

    /// Base URL the tracking number is appended to; `None` for `other`
    pub fn tracking_base_url(&self) -> Option<&'static str> {
        match self {
            Carrier::AustraliaPost => Some("https://auspost.com.au/mypost/track/#/details/"),
            Carrier::Startrack => Some("https://startrack.com.au/track/details/"),
            Carrier::Sendle => Some("https://track.sendle.com/tracking?ref="),
            Carrier::Aramex => Some("https://www.aramex.com.au/tools/track?l="),
            Carrier::Dhl => Some(
                "https://www.dhl.com/au-en/home/tracking/tracking-express.html?submit=1&tracking-id=",
            ),
            Carrier::CouriersPlease => Some("https://www.couriersplease.com.au/tool-track?no="),
            Carrier::Other => None,
        }
    }
}

impl FromStr for Carrier {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| OrderError::UnknownCarrier(s.to_string()))
    }
}

/// Shipping details entered by the operator when marking an order shipped
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingData {
    #[serde(default)]
    pub tracking_number: String,
    pub carrier: Carrier,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub delivery_days: Option<String>,
}

/// Shipping metadata persisted on the order
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub tracking_number: String,
    pub courier: Carrier,
    /// Empty when the carrier is `other` and no URL was supplied
    pub tracking_url: String,
    #[serde(default)]
    pub delivery_days: Option<String>,
}

impl ShippingInfo {
    /// Validate operator input and resolve the tracking URL.
    ///
    /// An explicit URL wins; otherwise a known carrier's base URL is joined
    /// with the tracking number.
    pub fn resolve(data: &ShippingData) -> Result<Self, OrderError> {
        let tracking_number = data.tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(OrderError::MissingTrackingNumber);
        }

        let explicit_url = data
            .tracking_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let tracking_url = match (explicit_url, data.carrier.tracking_base_url()) {
            (Some(url), _) => url.to_string(),
            (None, Some(base)) => format!("{}{}", base, tracking_number),
            (None, None) => String::new(),
        };

        Ok(Self {
            tracking_number: tracking_number.to_string(),
            courier: data.carrier,
            tracking_url,
            delivery_days: data
                .delivery_days
                .as_deref()
                .map(str::trim)
                .filter(|days| !days.is_empty())
                .map(str::to_string),
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping(carrier: Carrier, url: Option<&str>) -> ShippingData {
        ShippingData {
            tracking_number: "AP123456789".to_string(),
            carrier,
            tracking_url: url.map(str::to_string),
            delivery_days: Some("3-5".to_string()),
        }
    }

    #[test]
    fn test_australia_post_tracking_url() {
        let info = ShippingInfo::resolve(&shipping(Carrier::AustraliaPost, None)).unwrap();
        assert_eq!(
            info.tracking_url,
            "https://auspost.com.au/mypost/track/#/details/AP123456789"
        );
        assert_eq!(info.delivery_days.as_deref(), Some("3-5"));
    }

    #[test]
    fn test_explicit_tracking_url_wins() {
        let info =
            ShippingInfo::resolve(&shipping(Carrier::Sendle, Some("https://example.com/t/1")))
                .unwrap();
        assert_eq!(info.tracking_url, "https://example.com/t/1");
    }

    #[test]
    fn test_other_carrier_without_url_is_blank() {
        let info = ShippingInfo::resolve(&shipping(Carrier::Other, None)).unwrap();
        assert_eq!(info.tracking_url, "");
        assert_eq!(info.courier, Carrier::Other);
    }

    #[test]
    fn test_blank_tracking_number_rejected() {
        let mut data = shipping(Carrier::AustraliaPost, None);
        data.tracking_number = "   ".to_string();
        assert!(matches!(
            ShippingInfo::resolve(&data),
            Err(OrderError::MissingTrackingNumber)
        ));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!(matches!(
            "returned".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_carrier_parsing() {
        assert_eq!("australia-post".parse::<Carrier>().unwrap(), Carrier::AustraliaPost);
        assert!("pigeon".parse::<Carrier>().is_err());
    }

    #[test]
    fn test_forward_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_same_status_is_allowed_for_every_status() {
        for status in OrderStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
