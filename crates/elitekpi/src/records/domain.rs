use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the agent whose records are being scored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Listed,
    ActiveUnderContract,
    Pending,
    Closed,
    Withdrawn,
    Expired,
    Terminated,
    LostDeal,
    /// Any CRM status this service does not track; counted as an open listing.
    #[serde(other)]
    Other,
}

impl PropertyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Listed => "Listed",
            Self::ActiveUnderContract => "Active Under Contract",
            Self::Pending => "Pending",
            Self::Closed => "Closed",
            Self::Withdrawn => "Withdrawn",
            Self::Expired => "Expired",
            Self::Terminated => "Terminated",
            Self::LostDeal => "Lost Deal",
            Self::Other => "Other",
        }
    }

    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    pub status: PropertyStatus,
    #[serde(default)]
    pub listing_date: Option<NaiveDate>,
    #[serde(default)]
    pub sold_date: Option<NaiveDate>,
    #[serde(default)]
    pub listing_price: Option<f64>,
    #[serde(default)]
    pub sold_price: Option<f64>,
    #[serde(default)]
    pub accepted_price: Option<f64>,
}

impl Property {
    /// Checks that closing fields are present exactly when the property is closed.
    pub fn validate(&self) -> Result<(), RecordError> {
        let closed = self.status.is_closed();
        let has_closing = self.sold_date.is_some() && self.sold_price.is_some();
        let has_any_closing = self.sold_date.is_some() || self.sold_price.is_some();

        if closed && !has_closing {
            return Err(RecordError::MissingClosingDetails { property_id: self.id });
        }
        if !closed && has_any_closing {
            return Err(RecordError::UnexpectedClosingDetails {
                property_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Days on market for closed properties that carry both dates.
    pub fn days_to_close(&self) -> Option<i64> {
        if !self.status.is_closed() {
            return None;
        }
        match (self.listing_date, self.sold_date) {
            (Some(listed), Some(sold)) => Some((sold - listed).num_days()),
            _ => None,
        }
    }
}

/// Realized revenue. Referral commissions carry no property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: u64,
    #[serde(default)]
    pub property_id: Option<u64>,
    pub amount: f64,
    pub date_earned: NaiveDate,
}

impl Commission {
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.amount < 0.0 || !self.amount.is_finite() {
            return Err(RecordError::InvalidAmount {
                record: "commission",
                id: self.id,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    #[serde(default)]
    pub property_id: Option<u64>,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(default)]
    pub property_id: Option<u64>,
    pub hours: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Call,
    Email,
    Showing,
    Appointment,
    OpenHouse,
    Offer,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub property_id: Option<u64>,
    pub kind: ActivityKind,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Daily tally of an agent's activities; unique per user and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityActual {
    pub id: u64,
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(default)]
    pub calls: u32,
    #[serde(default)]
    pub appointments: u32,
    #[serde(default)]
    pub cmas_completed: u32,
    #[serde(default)]
    pub hours_worked: f64,
    #[serde(default)]
    pub offers_written: u32,
    #[serde(default)]
    pub showings: u32,
}

/// Record shape violations caught at the fetch or import boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("closed property {property_id} is missing its sold date or sold price")]
    MissingClosingDetails { property_id: u64 },
    #[error("property {property_id} is {} but carries closing details", .status.label())]
    UnexpectedClosingDetails {
        property_id: u64,
        status: PropertyStatus,
    },
    #[error("{record} {id} has a negative or non-finite amount")]
    InvalidAmount { record: &'static str, id: u64 },
}
