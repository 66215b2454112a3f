//! Exoscale v2 API surface
//!
//! This crate exposes the typed API the provider's resource handlers consume:
//!
//! - [`ExoscaleApi`]: one async method per remote verb, each taking a [`Context`]
//! - [`types`]: the wire records, kebab-case JSON with optional fields as `Option`
//! - [`Client`]: the reqwest implementation, signing each call with EXO2-HMAC-SHA256
//!
//! # Example
//!
//! ```ignore
//! use exoscale_api::{Client, ClientConfig, Context, ExoscaleApi};
//!
//! let client = Client::new(ClientConfig::new(key, secret))?;
//! let ctx = Context::background().with_zone("ch-gva-2");
//! let instance = client.get_instance(&ctx, "6a4f...").await?;
//! ```

pub mod api;
pub mod client;
pub mod context;
pub mod error;
pub mod signature;
pub mod types;

pub use api::ExoscaleApi;
pub use client::{Client, ClientConfig};
pub use context::Context;
pub use error::{ApiError, Result};
pub use signature::Credentials;
