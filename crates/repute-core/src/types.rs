//! Protocol constants and the reputation result type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default value of the `{scheme}` template parameter
pub const DEFAULT_SCHEME: &str = "http";

/// Default value of the `{application}` template parameter
pub const DEFAULT_APPLICATION: &str = "repute";

/// Well-known location of a service's query template
pub const DISCOVERY_TEMPLATE: &str = "{scheme}://{service}/.well-known/{application}-template";

/// Assertion requested in every query and required in a matching reputon
pub const ASSERTION_SENDING_SPAM: &str = "sending-spam";

/// Extension identifier required in a matching reputon
pub const EXTENSION_DKIM: &str = "dkim";

/// Root element of a REPUTE response document
pub const ELEMENT_REPUTATION: &str = "reputation";

/// Record element inside the root
pub const ELEMENT_REPUTON: &str = "reputon";

/// Spam reputation of a domain as reported by a REPUTE server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    /// Reputation score in `[-1, 1]`
    pub rating: f32,

    /// Rater-authenticity confidence in `[0, 1]`
    pub confidence: f32,

    /// Number of observations behind the rating
    pub sample_size: u64,

    /// Last update, seconds since the Unix epoch
    pub updated: u64,
}

impl Reputation {
    /// Last update as a UTC timestamp.
    ///
    /// Returns `None` when the server reported a value too large to
    /// represent.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.updated).ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Returns true if the domain leans towards sending spam
    #[must_use]
    pub fn is_spammy(&self) -> bool {
        self.rating > 0.0
    }
}
