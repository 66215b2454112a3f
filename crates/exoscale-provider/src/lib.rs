//! Exoscale infrastructure provider
//!
//! Resource handlers for Exoscale compute, networking, Kubernetes (SKS),
//! managed databases, DNS and IAM, registered in a [`Provider`] that the
//! host drives through plan / apply or the individual CRUD operations.
//!
//! # Example
//!
//! ```ignore
//! use exoscale_provider::{Provider, init_logging};
//! use exoscale_provider_config::ProviderConfig;
//!
//! init_logging();
//! let provider = Provider::from_config(&ProviderConfig::load()?)?;
//! let plan = provider.plan(&Context::background(), requests).await?;
//! let result = provider.apply(&Context::background(), &plan).await;
//! ```

pub mod error;
pub mod kubeconfig;
pub mod logging;
pub mod provider;
pub mod resources;

pub use error::InitError;
pub use kubeconfig::KubeconfigDocument;
pub use logging::{init_logging, try_init_logging};
pub use provider::Provider;
