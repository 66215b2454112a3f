//! Wire records for the Exoscale v2 API
//!
//! Field names follow the API's kebab-case JSON. Optional fields are
//! `Option<_>` so that "absent" stays distinguishable from "zero".

mod compute;
mod dbaas;
mod dns;
mod iam;
mod network;
mod operation;
mod sks;

pub use compute::*;
pub use dbaas::*;
pub use dns::*;
pub use iam::*;
pub use network::*;
pub use operation::*;
pub use sks::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form `key=value` labels.
pub type Labels = BTreeMap<String, String>;

/// Reference to another API object by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Collect the ids out of an optional reference list.
pub fn reference_ids(refs: &Option<Vec<Reference>>) -> Vec<String> {
    refs.as_ref()
        .map(|r| r.iter().map(|r| r.id.clone()).collect())
        .unwrap_or_default()
}

/// Build an optional reference list, `None` when empty.
pub fn references(ids: &[String]) -> Option<Vec<Reference>> {
    if ids.is_empty() {
        None
    } else {
        Some(ids.iter().map(Reference::new).collect())
    }
}

/// Public IP assignment mode for instances and nodepools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicIpAssignment {
    Inet4,
    Dual,
    None,
}

impl PublicIpAssignment {
    pub fn from_ipv6(enabled: bool) -> Self {
        if enabled { Self::Dual } else { Self::Inet4 }
    }

    pub fn ipv6_enabled(self) -> bool {
        self == Self::Dual
    }
}

/// Serialize a `Duration` as whole seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
