//! Wallet key info blobs (§3 "Wallet material", §4.3 steps 7-10). An
//! `EdgeWalletInfo` is an opaque-to-this-crate JSON document plus a `type`
//! and an `id` used for deduplication; this crate never interprets the
//! plugin-specific `keys` payload.

use serde_json::{Map, Value};
use std::iter::FromIterator;

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeWalletInfo {
    pub id: String,
    pub wallet_type: String,
    pub keys: Map<String, Value>,
}

impl EdgeWalletInfo {
    pub fn new(id: impl Into<String>, wallet_type: impl Into<String>) -> Self {
        EdgeWalletInfo {
            id: id.into(),
            wallet_type: wallet_type.into(),
            keys: Map::new(),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_str()?.to_string();
        let wallet_type = obj.get("type")?.as_str()?.to_string();
        let keys = obj
            .get("keys")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(EdgeWalletInfo {
            id,
            wallet_type,
            keys,
        })
    }

    pub fn to_json(&self) -> Value {
        Value::Object(Map::from_iter([
            ("id".to_string(), Value::String(self.id.clone())),
            ("type".to_string(), Value::String(self.wallet_type.clone())),
            ("keys".to_string(), Value::Object(self.keys.clone())),
        ]))
    }
}

/// §3 invariant 6: the canonical id used to deduplicate a node's keyInfos.
/// Derived from the wallet type plus any key fields that look like public
/// identifiers (ending in `Key` or `Address`), sorted for determinism.
pub fn canonical_wallet_id(info: &EdgeWalletInfo) -> String {
    if !info.id.is_empty() {
        return info.id.clone();
    }
    let mut fields: Vec<(String, String)> = info
        .keys
        .iter()
        .filter(|(k, _)| k.ends_with("Key") || k.ends_with("Address"))
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect();
    fields.sort();
    let joined = fields
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("|");
    format!("{}:{}", info.wallet_type, joined)
}

/// §4.3 step 10: merge two `keyInfos` lists, deduplicating by canonical id
/// and unioning the `keys` map of each duplicate, preferring the field
/// already present on `existing` when both sides set it.
pub fn merge_wallet_infos(existing: &[EdgeWalletInfo], incoming: &[EdgeWalletInfo]) -> Vec<EdgeWalletInfo> {
    let mut out: Vec<EdgeWalletInfo> = Vec::with_capacity(existing.len() + incoming.len());
    let mut index_by_id: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for info in existing.iter().chain(incoming.iter()) {
        let id = canonical_wallet_id(info);
        if let Some(&idx) = index_by_id.get(&id) {
            let slot: &mut EdgeWalletInfo = &mut out[idx];
            for (k, v) in &info.keys {
                slot.keys.entry(k.clone()).or_insert_with(|| v.clone());
            }
        } else {
            index_by_id.insert(id, out.len());
            out.push(fix_wallet_info(info.clone()));
        }
    }
    out
}

/// §4.3 step 10 / §9: `fixWalletInfo` is left external by the distilled
/// spec. This crate implements the conservative normalization every wallet
/// info should already satisfy: empty-string/empty-object top-level `keys`
/// fields are dropped, and `keys` defaults to an empty object rather than
/// being absent.
pub fn fix_wallet_info(mut info: EdgeWalletInfo) -> EdgeWalletInfo {
    info.keys.retain(|_, v| match v {
        Value::String(s) => !s.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
        _ => true,
    });
    info
}
