//! Exoscale provider core
//!
//! Resource model shared by every handler of the Exoscale provider.
//!
//! # Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               Host (plan / apply)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │ attribute bags
//! ┌─────────────────▼───────────────────────────────┐
//! │             exoscale-provider-core              │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ResourceHandler { ... }           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │ Schema/Data│ │    Diff    │ │   Waiter   │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ typed records
//! ┌─────────────────▼───────────────────────────────┐
//! │           exoscale-api (ExoscaleApi)            │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod data;
pub mod diff;
pub mod error;
pub mod plan;
pub mod resource;
pub mod schema;
pub mod state;
pub mod upgrade;
pub mod validation;
pub mod value;
pub mod waiter;

// Re-exports
pub use data::{OpKind, ResourceData};
pub use diff::{AttributeDiff, DiffKind, Phase, PhasePlan, ResourceDiff, compute_diff};
pub use error::{Diagnostic, ErrorKind, ProviderError, Result, Severity, found};
pub use plan::{ActionResult, ActionType, ApplyResult, Plan, PlanAction, PlanSummary, ResourceRequest};
pub use resource::{Clock, ImportId, ProviderMeta, ResourceHandler, SystemClock};
pub use schema::{AttrType, Attribute, Schema};
pub use state::PersistedState;
pub use upgrade::{StateUpgrader, UpgradeState, upgrade_chain};
pub use value::Value;
pub use waiter::{WaitConfig, wait_for_operation, wait_until};
