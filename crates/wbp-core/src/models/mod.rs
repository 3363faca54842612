//! Data models for extraction results, summaries and configuration.

pub mod config;
pub mod ffr;
pub mod report;
pub mod summary;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Serializes a decimal as a JSON number, as the downstream page generators
/// expect numbers rather than strings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Float(pub Decimal);

impl Serialize for Float {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

pub(crate) fn serialize_float_map<K, S>(map: &BTreeMap<K, Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    K: Serialize,
    S: Serializer,
{
    serializer.collect_map(map.iter().map(|(k, v)| (k, Float(*v))))
}
