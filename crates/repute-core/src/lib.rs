//! Core types for the REPUTE sender-reputation protocol.
//!
//! This crate provides the networking-free half of the library:
//!
//! - **Types**: the [`Reputation`] result and the protocol constants
//! - **Errors**: [`ReputeError`] and its [`ErrorKind`] status classes
//! - **Parsing**: [`parse_response`], which turns a raw REPUTE reply into a
//!   [`Reputation`]
//!
//! # Example
//!
//! ```rust
//! use repute_core::parse_response;
//!
//! let body = b"<reputation><reputon>\
//!     <extension>dkim</extension>\
//!     <assertion>sending-spam</assertion>\
//!     <rating>0.7</rating>\
//!     </reputon></reputation>";
//!
//! let rep = parse_response(body).unwrap().expect("matching reputon");
//! assert!(rep.is_spammy());
//! ```

#![doc(html_root_url = "https://docs.rs/repute-core/0.1.0")]

mod error;
pub mod parser;
pub mod types;

pub use error::{ErrorKind, Result, ReputeError};
pub use parser::{parse_response, strip_headers};
pub use types::*;
