//! Witness encoding.
//!
//! Maps a proof type and its loosely structured JSON payload into the flat
//! integer witness consumed by the proving backend. Payloads are decoded into
//! typed structs with every field optional, so encoding is total: missing or
//! malformed fields fall back to `0` or an empty list.

use crate::error::Result;
use crate::types::ProofType;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Payment {
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SettlementPayload {
    #[serde(deserialize_with = "lenient::payments")]
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RiskPayload {
    #[serde(rename = "portfolioValue", deserialize_with = "lenient::int")]
    pub portfolio_value: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub volatility: Option<i64>,
    #[serde(rename = "valueAtRisk", deserialize_with = "lenient::int")]
    pub value_at_risk: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RebalancePayload {
    #[serde(rename = "oldAllocations", deserialize_with = "lenient::ints")]
    pub old_allocations: Vec<i64>,
    #[serde(rename = "newAllocations", deserialize_with = "lenient::ints")]
    pub new_allocations: Vec<i64>,
}

/// Typed payload, one variant per proof type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofPayload {
    Settlement(SettlementPayload),
    Risk(RiskPayload),
    Rebalance(RebalancePayload),
}

impl ProofPayload {
    /// Decodes `data` for the given proof type. Never fails; a payload that
    /// is not a JSON object decodes to the all-default variant.
    pub fn from_json(proof_type: ProofType, data: &Value) -> Self {
        match proof_type {
            ProofType::Settlement => ProofPayload::Settlement(decode_or_default(proof_type, data)),
            ProofType::Risk => ProofPayload::Risk(decode_or_default(proof_type, data)),
            ProofType::Rebalance => ProofPayload::Rebalance(decode_or_default(proof_type, data)),
        }
    }

    pub fn proof_type(&self) -> ProofType {
        match self {
            ProofPayload::Settlement(_) => ProofType::Settlement,
            ProofPayload::Risk(_) => ProofType::Risk,
            ProofPayload::Rebalance(_) => ProofType::Rebalance,
        }
    }

    /// Flattens the payload into the witness sequence.
    pub fn encode(&self) -> Vec<i64> {
        match self {
            ProofPayload::Settlement(p) => {
                let amounts: Vec<i64> = p.payments.iter().map(|pay| pay.amount.unwrap_or(0)).collect();
                let total = amounts.iter().fold(0i64, |acc, a| acc.saturating_add(*a));
                let mut witness = Vec::with_capacity(amounts.len() + 2);
                witness.push(total);
                witness.push(amounts.len() as i64);
                witness.extend(amounts);
                witness
            }
            ProofPayload::Risk(p) => vec![
                p.portfolio_value.unwrap_or(0),
                p.volatility.unwrap_or(0),
                p.value_at_risk.unwrap_or(0),
            ],
            // Old and new lengths may differ.
            ProofPayload::Rebalance(p) => p
                .old_allocations
                .iter()
                .chain(p.new_allocations.iter())
                .copied()
                .collect(),
        }
    }
}

/// Encodes a witness from a raw proof type tag.
///
/// Fails only with `UnsupportedProofType`; the payload itself cannot make
/// encoding fail.
pub fn encode_witness(proof_type: &str, data: &Value) -> Result<Vec<i64>> {
    let proof_type: ProofType = proof_type.parse()?;
    Ok(ProofPayload::from_json(proof_type, data).encode())
}

fn decode_or_default<T>(proof_type: ProofType, data: &Value) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(object) = data.as_object() else {
        return T::default();
    };
    T::deserialize(Value::Object(camel_case_keys(object))).unwrap_or_else(|e| {
        debug!(%proof_type, error = %e, "Payload did not decode, using defaults");
        T::default()
    })
}

/// Rewrites top-level snake_case keys to camelCase. When both spellings of a
/// field are present the camelCase value wins.
fn camel_case_keys(object: &Map<String, Value>) -> Map<String, Value> {
    let mut out: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !key.contains('_'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, value) in object.iter().filter(|(key, _)| key.contains('_')) {
        out.entry(to_camel_case(key)).or_insert_with(|| value.clone());
    }
    out
}

fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

mod lenient {
    use super::{Payment, coerce_int};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(coerce_int(&Value::deserialize(d)?))
    }

    pub(super) fn ints<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.iter().map(|v| coerce_int(v).unwrap_or(0)).collect(),
            _ => Vec::new(),
        })
    }

    pub(super) fn payments<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Payment>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .iter()
                .map(|item| Payment {
                    amount: item.get("amount").and_then(coerce_int),
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}
