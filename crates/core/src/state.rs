//! The working document: typed members plus open field bags.
//!
//! Decoding preserves arbitrary input: any top-level key outside the known
//! set lands in `state.fields`, and any unknown item key lands in
//! `item.fields`, so an arbitrary JSON document round-trips through the
//! engine without losing data. Existing `fields` entries win over spillover
//! at the top level.

use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The document a rule pack operates on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(skip_serializing_if = "Totals::is_zero")]
    pub totals: Totals,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// One entry of the document's item collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub amount: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

/// Computed document totals. Every field is double-precision; rules may
/// write numbers or numeric strings to them, nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Totals {
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    pub fn is_zero(&self) -> bool {
        *self == Totals::default()
    }
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut state = State::default();

        if let Some(v) = raw.remove("id") {
            state.id = expect_string(v, "id")?;
        }
        if let Some(v) = raw.remove("tenantId") {
            state.tenant_id = expect_string(v, "tenantId")?;
        }
        if let Some(v) = raw.remove("items") {
            if !v.is_null() {
                state.items = serde_json::from_value(v).map_err(DeError::custom)?;
            }
        }
        if let Some(v) = raw.remove("totals") {
            if !v.is_null() {
                state.totals = serde_json::from_value(v).map_err(DeError::custom)?;
            }
        }
        if let Some(v) = raw.remove("fields") {
            state.fields = expect_object(v, "fields")?;
        }
        if let Some(v) = raw.remove("meta") {
            state.meta = expect_object(v, "meta")?;
        }

        // Spill every remaining key into fields without overwriting.
        for (key, value) in raw {
            if key.is_empty() {
                continue;
            }
            state.fields.entry(key).or_insert(value);
        }

        Ok(state)
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut item = Item::default();
        let mut fields = Map::new();

        if let Some(Value::Object(m)) = raw.remove("fields") {
            for (k, v) in m {
                if !k.is_empty() {
                    fields.insert(k, v);
                }
            }
        }
        if let Some(Value::String(s)) = raw.remove("id") {
            item.id = s;
        }

        // "quantity" is an alias for "amount" only when amount is absent;
        // it never spills into fields.
        let quantity = raw.remove("quantity");
        match raw.remove("amount") {
            Some(v) => {
                if let Some(f) = v.as_f64() {
                    item.amount = f;
                }
            }
            None => {
                if let Some(f) = quantity.as_ref().and_then(Value::as_f64) {
                    item.amount = f;
                }
            }
        }

        for (k, v) in raw {
            if !k.is_empty() {
                fields.insert(k, v);
            }
        }

        item.fields = fields;
        Ok(item)
    }
}

fn expect_string<E: DeError>(v: Value, key: &str) -> Result<String, E> {
    match v {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Err(E::custom(format!(
            "state.{key} must be a string, got {other}"
        ))),
    }
}

fn expect_object<E: DeError>(v: Value, key: &str) -> Result<Map<String, Value>, E> {
    match v {
        Value::Object(m) => Ok(m),
        Value::Null => Ok(Map::new()),
        other => Err(E::custom(format!(
            "state.{key} must be an object, got {other}"
        ))),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_top_level_keys_spill_into_fields() {
        let state: State = serde_json::from_value(json!({
            "id": "ord-1",
            "tenantId": "t-1",
            "paymentTermDays": 30,
            "customer": { "name": "Ada" }
        }))
        .unwrap();

        assert_eq!(state.id, "ord-1");
        assert_eq!(state.fields["paymentTermDays"], json!(30));
        assert_eq!(state.fields["customer"]["name"], json!("Ada"));
    }

    #[test]
    fn existing_fields_entries_win_over_spillover() {
        let state: State = serde_json::from_value(json!({
            "fields": { "region": "declared" },
            "region": "spilled"
        }))
        .unwrap();

        assert_eq!(state.fields["region"], json!("declared"));
    }

    #[test]
    fn empty_keys_are_dropped() {
        let state: State = serde_json::from_value(json!({ "": 1, "kept": 2 })).unwrap();
        assert!(!state.fields.contains_key(""));
        assert_eq!(state.fields["kept"], json!(2));
    }

    #[test]
    fn item_quantity_aliases_amount_when_absent() {
        let item: Item = serde_json::from_value(json!({ "id": "i1", "quantity": 4 })).unwrap();
        assert_eq!(item.amount, 4.0);
        assert!(!item.fields.contains_key("quantity"));

        let item: Item =
            serde_json::from_value(json!({ "amount": 2, "quantity": 9 })).unwrap();
        assert_eq!(item.amount, 2.0);
        assert!(!item.fields.contains_key("quantity"));
    }

    #[test]
    fn unknown_item_keys_spill_into_item_fields() {
        let item: Item = serde_json::from_value(json!({
            "id": "i1",
            "amount": 2,
            "basePrice": 100,
            "fields": { "color": "red" }
        }))
        .unwrap();

        assert_eq!(item.fields["basePrice"], json!(100));
        assert_eq!(item.fields["color"], json!("red"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let input = json!({
            "id": "ord-1",
            "items": [{ "id": "i1", "amount": 2, "basePrice": 100 }],
            "totals": { "subtotal": 10.0 },
            "looseKey": "kept"
        });

        let state: State = serde_json::from_value(input).unwrap();
        let encoded = serde_json::to_value(&state).unwrap();

        assert_eq!(encoded["id"], json!("ord-1"));
        assert_eq!(encoded["fields"]["looseKey"], json!("kept"));
        assert_eq!(encoded["items"][0]["fields"]["basePrice"], json!(100));
        assert_eq!(encoded["totals"]["subtotal"], json!(10.0));

        let again: State = serde_json::from_value(encoded).unwrap();
        assert_eq!(again, state);
    }

    #[test]
    fn totals_rejects_unknown_shape_gracefully() {
        let state: State = serde_json::from_value(json!({
            "totals": { "subtotal": 5, "unknown": 1 }
        }))
        .unwrap();
        assert_eq!(state.totals.subtotal, 5.0);
    }
}
