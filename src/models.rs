//! Data models for the instance watcher.
//!
//! This module contains the structures produced by a registry fetch and
//! the per-tick summaries derived from them.

use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// One registered endpoint of a service, as reported by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Host address of the instance.
    pub ip: String,
    /// Port the instance listens on (0 if the registry omits it).
    #[serde(default)]
    pub port: u32,
    /// Registry-reported liveness.
    pub healthy: bool,
    /// Registry-reported traffic eligibility.
    pub enabled: bool,
    /// Traffic-routing weight.
    pub weight: f64,
}

impl Instance {
    /// Returns the identifier shown in weight groups (`ip:port`, or the bare ip).
    pub fn address(&self) -> String {
        if self.port > 0 {
            format!("{}:{}", self.ip, self.port)
        } else {
            self.ip.clone()
        }
    }
}

/// Outcome of one successful instance-list fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceListResult {
    pub service_name: String,
    /// Instances in the order the registry returned them.
    pub instances: Vec<Instance>,
    /// Count reported by the registry (may exceed `instances.len()` if paginated).
    pub total_count: usize,
}

/// A weight value usable as an ordered map key.
///
/// Keys compare by exact numeric value; `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, Copy)]
pub struct WeightKey(f64);

impl WeightKey {
    pub fn new(weight: f64) -> Self {
        if weight == 0.0 {
            Self(0.0)
        } else {
            Self(weight)
        }
    }

    /// True for zero and negative weights, which receive no traffic.
    pub fn is_non_positive(self) -> bool {
        self.0 <= 0.0
    }
}

impl PartialEq for WeightKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WeightKey {}

impl PartialOrd for WeightKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for WeightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps one fractional digit for integral values (1.0, not 1).
        write!(f, "{:?}", self.0)
    }
}

/// Instance addresses grouped by weight, keys in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightGroups(BTreeMap<WeightKey, Vec<String>>);

impl WeightGroups {
    pub fn insert(&mut self, weight: f64, address: String) {
        self.0.entry(WeightKey::new(weight)).or_default().push(address);
    }

    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, weight: f64) -> Option<&Vec<String>> {
        self.0.get(&WeightKey::new(weight))
    }

    pub fn keys(&self) -> impl Iterator<Item = WeightKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WeightKey, &Vec<String>)> + '_ {
        self.0.iter().map(|(weight, addresses)| (*weight, addresses))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WeightGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "{{}}");
        }

        let groups: Vec<String> = self
            .iter()
            .map(|(weight, addresses)| format!("{}: [{}]", weight, addresses.join(", ")))
            .collect();

        write!(f, "{{ {} }}", groups.join(", "))
    }
}

impl Serialize for WeightGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (weight, addresses) in self.iter() {
            map.serialize_entry(&weight.to_string(), addresses)?;
        }
        map.end()
    }
}

/// Statistics for one service, computed fresh every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceStatSummary {
    /// Count reported by the registry.
    pub total_count: usize,
    /// Number of instances actually returned.
    pub instance_count: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub weight_groups: WeightGroups,
}

/// Per-service entry of a tick report.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub service_name: String,
    /// `None` when the registry returned no usable data.
    pub summary: Option<ServiceStatSummary>,
    pub flagged: bool,
    /// Rendered single-line summary.
    pub line: String,
}

/// Result of one polling cycle across all configured services.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub timestamp: DateTime<Local>,
    /// One entry per requested service, in request order.
    pub services: Vec<ServiceReport>,
    /// Set when the registry rejected the access token for any service.
    #[serde(skip)]
    pub token_rejected: bool,
}

impl TickReport {
    /// Splits the rendered lines into (normal, flagged), keeping request order.
    pub fn partition(&self) -> (Vec<String>, Vec<String>) {
        let (flagged, normal): (Vec<&ServiceReport>, Vec<&ServiceReport>) =
            self.services.iter().partition(|s| s.flagged);

        (
            normal.into_iter().map(|s| s.line.clone()).collect(),
            flagged.into_iter().map(|s| s.line.clone()).collect(),
        )
    }

    pub fn flagged_count(&self) -> usize {
        self.services.iter().filter(|s| s.flagged).count()
    }
}
