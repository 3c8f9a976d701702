//! Ride-request domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Type tag written on every ledger record.
pub const RIDE_REQUEST_TYPE: &str = "Ride Request";

/// A point picked on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and within ±90° latitude, ±180° longitude.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Signing credential supplied by the profile.
///
/// The private key is optional; without one the workflow prompts for it.
/// `Debug` never prints the private key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub public_key: String,
    pub private_key: Option<String>,
}

impl Credential {
    pub fn new(public_key: impl Into<String>, private_key: Option<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key,
        }
    }

    /// Whether a submission may be attempted with this credential.
    pub fn has_public_key(&self) -> bool {
        !self.public_key.trim().is_empty()
    }

    /// The stored private key, ignoring empty strings.
    pub fn private_key(&self) -> Option<&str> {
        self.private_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Public key shortened for display: first 10 and last 10 characters.
    pub fn masked_public_key(&self) -> String {
        mask_key(&self.public_key)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("public_key", &self.masked_public_key())
            .field(
                "private_key",
                &self.private_key().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Shorten a key to `first10...last10`; keys of 20 characters or fewer are
/// returned whole.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 20 {
        return key.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Ride request as assembled from the location selector and fare input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RideRequestDraft {
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
    pub fare: f64,
}

impl RideRequestDraft {
    pub fn new(pickup: GeoPoint, dropoff: GeoPoint, fare: f64) -> Self {
        Self {
            pickup: Some(pickup),
            dropoff: Some(dropoff),
            fare,
        }
    }

    /// Check every submission precondition against `credential`.
    ///
    /// Returns `None` when pickup, dropoff or public key is missing, when either
    /// point is off the globe, or when the fare is negative or not a number.
    pub fn validate(&self, credential: &Credential) -> Option<RideRequest> {
        let pickup = self.pickup.filter(GeoPoint::is_valid)?;
        let dropoff = self.dropoff.filter(GeoPoint::is_valid)?;
        if !credential.has_public_key() || !self.fare.is_finite() || self.fare < 0.0 {
            return None;
        }
        Some(RideRequest {
            pickup,
            dropoff,
            fare: self.fare,
            rider: credential.public_key.clone(),
        })
    }
}

/// A validated draft, as handed to the transaction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequest {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub fare: f64,
    /// Public key of the requesting rider.
    pub rider: String,
}

/// Terminal outcome stored in a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => f.write_str("Success"),
            RecordStatus::Failed => f.write_str("Failed"),
        }
    }
}

fn default_record_type() -> String {
    RIDE_REQUEST_TYPE.to_string()
}

/// One submission outcome as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "type", default = "default_record_type")]
    pub kind: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: u64,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub fare: f64,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionRecord {
    /// Record for an acknowledged submission.
    pub fn success(request: &RideRequest, tx_hash: String) -> Self {
        Self::build(request, RecordStatus::Success, Some(tx_hash), None)
    }

    /// Record for a submission that failed at any remote stage.
    pub fn failure(request: &RideRequest, error: String) -> Self {
        Self::build(request, RecordStatus::Failed, None, Some(error))
    }

    fn build(
        request: &RideRequest,
        status: RecordStatus,
        tx_hash: Option<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            kind: default_record_type(),
            timestamp: now_millis(),
            pickup: request.pickup,
            dropoff: request.dropoff,
            fare: request.fare,
            status,
            tx_hash,
            error,
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
