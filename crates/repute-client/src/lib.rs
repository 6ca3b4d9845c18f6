//! HTTP client for REPUTE sender-reputation services.
//!
//! This crate provides the main [`ReputeClient`], which discovers a
//! service's query template, keeps a pool of reusable transports and turns
//! each answer into a [`Reputation`].

#![doc(html_root_url = "https://docs.rs/repute-client/0.1.0")]

mod buffer;
mod client;
mod config;
mod executor;
mod pool;
mod template;

pub use buffer::{ResponseBuffer, BUFFER_BASE};
pub use client::{ReputeClient, ReputeClientBuilder};
pub use config::ClientConfig;
pub use pool::PoolStats;
pub use repute_core::{ErrorKind, Reputation, Result, ReputeError};
