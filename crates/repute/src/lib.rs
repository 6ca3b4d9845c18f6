//! Rust client for REPUTE sender-reputation services.
//!
//! Given a domain, a REPUTE server reports whether mail signed by that
//! domain (DKIM) tends to be spam: a rating, the rater's confidence, the
//! sample size and when the data was last updated.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use repute::ReputeClient;
//!
//! #[tokio::main]
//! async fn main() -> repute::Result<()> {
//!     let client = ReputeClient::new("rep.example.org")?;
//!
//!     match client.query("example.com").await? {
//!         Some(rep) => println!(
//!             "rating {} (confidence {}, {} samples)",
//!             rep.rating, rep.confidence, rep.sample_size
//!         ),
//!         None => println!("no DKIM spam reputation on record"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/repute/0.1.0")]

// Re-export core types
pub use repute_core::*;

// Re-export client
pub use repute_client::{
    ClientConfig, PoolStats, ReputeClient, ReputeClientBuilder, ResponseBuffer, BUFFER_BASE,
};

// Re-export runtime for convenience
pub use serde;
pub use tokio;
