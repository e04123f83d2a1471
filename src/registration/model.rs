//! Student record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The transmission a student prefers to learn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Automatic,
    Manual,
}

impl Default for Transmission {
    fn default() -> Self {
        Self::Automatic
    }
}

impl std::fmt::Display for Transmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl Transmission {
    /// Parse a user-supplied value, falling back to the default for
    /// anything that isn't recognizably "manual".
    pub fn parse_or_default(value: &str) -> Self {
        if value.eq_ignore_ascii_case("manual") {
            Self::Manual
        } else {
            Self::Automatic
        }
    }
}

/// Candidate registration record, assembled from a completed session's
/// fields at finalization time. Ownership transfers to the store on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub has_license: bool,
    pub license_number: String,
    pub preferred_transmission: Transmission,
}

impl Student {
    /// Build a candidate record from accumulated session fields,
    /// substituting defaults for anything missing: empty strings, `false`
    /// for `has_license`, automatic transmission.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| -> String {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            first_name: text("first_name"),
            last_name: text("last_name"),
            email: text("email"),
            phone: text("phone"),
            date_of_birth: text("date_of_birth"),
            address: text("address"),
            has_license: fields
                .get("has_license")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            license_number: text("license_number"),
            preferred_transmission: fields
                .get("preferred_transmission")
                .and_then(Value::as_str)
                .map(Transmission::parse_or_default)
                .unwrap_or_default(),
        }
    }
}

/// A student as returned by storage after a successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredStudent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub student: Student,
}
