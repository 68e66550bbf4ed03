//! Document navigation: read, write and iterate target paths.
//!
//! The document mixes three value domains: the strongly-typed `State` /
//! `Item` / `Totals` members, the typed `items` array, and the open
//! `fields` bags holding arbitrary JSON. Navigation pattern-matches on the
//! current node's tag so actions see one uniform read/write/iterate
//! contract across all three.
//!
//! Write policy: non-wildcard descents create missing intermediate
//! containers (a map, or an array when the following step is indexed);
//! wildcard steps are observational and never create elements. Indexed
//! writes may expand an open array with null fill but never the typed
//! `items` array, where any out-of-range index is an error. Unknown keys on
//! `State` and `Item` resolve through their `fields` bags, which makes
//! `items[*].fields.x` and `items[*].x` the same path.

use reckon_core::num::coerce_f64;
use reckon_core::{EngineError, Item, State, Totals};
use serde_json::{Map, Number, Value};

use crate::path::{has_wildcard, parse_path, PathStep, Subscript};

// ──────────────────────────────────────────────
// Public API
// ──────────────────────────────────────────────

/// Reads the value at `target`. Non-wildcard paths yield the leaf value (or
/// `None` when an intermediate is missing); wildcard paths always yield an
/// array with one entry per match.
pub fn get_value(state: &State, target: &str) -> Result<Option<Value>, EngineError> {
    let steps = parse_path(target)?;
    if steps.is_empty() {
        return Err(invalid_target(target));
    }
    let mut out = Vec::new();
    read_at(NodeRef::State(state), &steps, &mut out)?;
    if has_wildcard(&steps) {
        Ok(Some(Value::Array(out)))
    } else {
        Ok(out.into_iter().next())
    }
}

/// Writes `value` at every position matched by `target`. A wildcard target
/// matching nothing is a silent no-op.
pub fn set_value(state: &mut State, target: &str, value: &Value) -> Result<(), EngineError> {
    let steps = parse_path(target)?;
    if steps.is_empty() {
        return Err(invalid_target(target));
    }
    write_at(NodeMut::State(state), &steps, value)?;
    Ok(())
}

/// One matched position of a wildcard path: the concrete index for each
/// wildcard step, plus the observable fields of every container selected on
/// the way down (outermost first).
#[derive(Debug, Clone)]
pub struct Visit {
    pub indices: Vec<usize>,
    pub overlays: Vec<Map<String, Value>>,
}

/// Enumerates every position matched by `steps`, in nested cartesian order
/// (outermost wildcard first). Never creates elements.
pub fn collect_visits(state: &State, steps: &[PathStep]) -> Result<Vec<Visit>, EngineError> {
    let mut visits = Vec::new();
    if steps.is_empty() {
        return Ok(visits);
    }
    let mut indices = Vec::new();
    let mut overlays = Vec::new();
    visit_at(
        NodeRef::State(state),
        steps,
        &mut indices,
        &mut overlays,
        &mut visits,
    )?;
    Ok(visits)
}

/// Writes `value` at one specific index combination of a wildcard path, as
/// produced by [`collect_visits`].
pub fn set_at_indices(
    state: &mut State,
    steps: &[PathStep],
    indices: &[usize],
    value: &Value,
) -> Result<(), EngineError> {
    if steps.is_empty() {
        return Ok(());
    }
    set_indices_at(NodeMut::State(state), steps, indices, 0, value)
}

/// The evaluation-data shape of one item: `id`, `amount`, and the item's
/// fields hoisted to the top level.
pub(crate) fn item_overlay(item: &Item) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("id".to_string(), Value::String(item.id.clone()));
    m.insert("amount".to_string(), num_value(item.amount));
    for (k, v) in &item.fields {
        m.insert(k.clone(), v.clone());
    }
    m
}

// ──────────────────────────────────────────────
// Read walk
// ──────────────────────────────────────────────

#[derive(Clone, Copy)]
enum NodeRef<'a> {
    State(&'a State),
    Item(&'a Item),
    Totals(&'a Totals),
    Items(&'a [Item]),
    Map(&'a Map<String, Value>),
    Value(&'a Value),
}

enum ReadChild<'a> {
    Absent,
    Node(NodeRef<'a>),
    Leaf(Value),
}

fn value_ref(v: &Value) -> NodeRef<'_> {
    match v {
        Value::Object(m) => NodeRef::Map(m),
        other => NodeRef::Value(other),
    }
}

fn read_child<'a>(node: NodeRef<'a>, key: &str) -> ReadChild<'a> {
    match node {
        NodeRef::State(s) => match key {
            "id" => ReadChild::Leaf(Value::String(s.id.clone())),
            "tenantId" => ReadChild::Leaf(Value::String(s.tenant_id.clone())),
            "items" => ReadChild::Node(NodeRef::Items(&s.items)),
            "totals" => ReadChild::Node(NodeRef::Totals(&s.totals)),
            "fields" => ReadChild::Node(NodeRef::Map(&s.fields)),
            "meta" => ReadChild::Node(NodeRef::Map(&s.meta)),
            _ => map_read_child(&s.fields, key),
        },
        NodeRef::Item(item) => match key {
            "id" => ReadChild::Leaf(Value::String(item.id.clone())),
            "amount" => ReadChild::Leaf(num_value(item.amount)),
            "fields" => ReadChild::Node(NodeRef::Map(&item.fields)),
            _ => map_read_child(&item.fields, key),
        },
        NodeRef::Totals(t) => match key {
            "subtotal" => ReadChild::Leaf(num_value(t.subtotal)),
            "discount" => ReadChild::Leaf(num_value(t.discount)),
            "tax" => ReadChild::Leaf(num_value(t.tax)),
            "total" => ReadChild::Leaf(num_value(t.total)),
            _ => ReadChild::Absent,
        },
        NodeRef::Map(m) => map_read_child(m, key),
        NodeRef::Items(_) | NodeRef::Value(_) => ReadChild::Absent,
    }
}

fn map_read_child<'a>(m: &'a Map<String, Value>, key: &str) -> ReadChild<'a> {
    match m.get(key) {
        Some(v) => ReadChild::Node(value_ref(v)),
        None => ReadChild::Absent,
    }
}

fn read_at(node: NodeRef<'_>, steps: &[PathStep], out: &mut Vec<Value>) -> Result<(), EngineError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        read_leaf(node, step, out);
        return Ok(());
    }

    let child = read_child(node, &step.key);
    match step.sub {
        Subscript::None => {
            if let ReadChild::Node(n) = child {
                read_at(n, rest, out)?;
            }
        }
        Subscript::Index(i) => match child {
            ReadChild::Node(NodeRef::Items(items)) => {
                let item = items
                    .get(i)
                    .ok_or(EngineError::IndexOutOfRange { index: i })?;
                read_at(NodeRef::Item(item), rest, out)?;
            }
            ReadChild::Node(NodeRef::Value(Value::Array(arr))) => {
                if let Some(elem) = arr.get(i) {
                    read_at(value_ref(elem), rest, out)?;
                }
            }
            _ => {}
        },
        Subscript::Wildcard => match child {
            ReadChild::Node(NodeRef::Items(items)) => {
                for item in items {
                    read_at(NodeRef::Item(item), rest, out)?;
                }
            }
            ReadChild::Node(NodeRef::Value(Value::Array(arr))) => {
                for elem in arr {
                    read_at(value_ref(elem), rest, out)?;
                }
            }
            _ => {}
        },
    }
    Ok(())
}

fn read_leaf(node: NodeRef<'_>, step: &PathStep, out: &mut Vec<Value>) {
    if step.sub == Subscript::None {
        let v = match read_child(node, &step.key) {
            ReadChild::Leaf(v) => v,
            ReadChild::Node(n) => snapshot(n),
            ReadChild::Absent => Value::Null,
        };
        out.push(v);
        return;
    }

    // Subscripted leaves only resolve through open arrays.
    let ReadChild::Node(NodeRef::Value(Value::Array(arr))) = read_child(node, &step.key) else {
        out.push(Value::Null);
        return;
    };
    match step.sub {
        Subscript::Wildcard => out.push(Value::Array(arr.clone())),
        Subscript::Index(i) => out.push(arr.get(i).cloned().unwrap_or(Value::Null)),
        Subscript::None => {}
    }
}

fn snapshot(node: NodeRef<'_>) -> Value {
    match node {
        NodeRef::State(s) => serde_json::to_value(s).unwrap_or(Value::Null),
        NodeRef::Item(item) => serde_json::to_value(item).unwrap_or(Value::Null),
        NodeRef::Items(items) => serde_json::to_value(items).unwrap_or(Value::Null),
        NodeRef::Totals(t) => totals_value(t),
        NodeRef::Map(m) => Value::Object(m.clone()),
        NodeRef::Value(v) => v.clone(),
    }
}

/// Totals as the four-key object expressions see under `totals`.
pub(crate) fn totals_value(t: &Totals) -> Value {
    let mut m = Map::new();
    m.insert("subtotal".to_string(), num_value(t.subtotal));
    m.insert("discount".to_string(), num_value(t.discount));
    m.insert("tax".to_string(), num_value(t.tax));
    m.insert("total".to_string(), num_value(t.total));
    Value::Object(m)
}

pub(crate) fn num_value(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

// ──────────────────────────────────────────────
// Visit collection
// ──────────────────────────────────────────────

fn visit_at(
    node: NodeRef<'_>,
    steps: &[PathStep],
    indices: &mut Vec<usize>,
    overlays: &mut Vec<Map<String, Value>>,
    visits: &mut Vec<Visit>,
) -> Result<(), EngineError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        visits.push(Visit {
            indices: indices.clone(),
            overlays: overlays.clone(),
        });
        return Ok(());
    }

    let child = read_child(node, &step.key);
    match step.sub {
        Subscript::None => {
            if let ReadChild::Node(n) = child {
                visit_at(n, rest, indices, overlays, visits)?;
            }
        }
        Subscript::Index(i) => match child {
            ReadChild::Node(NodeRef::Items(items)) => {
                let item = items
                    .get(i)
                    .ok_or(EngineError::IndexOutOfRange { index: i })?;
                overlays.push(item_overlay(item));
                visit_at(NodeRef::Item(item), rest, indices, overlays, visits)?;
                overlays.pop();
            }
            ReadChild::Node(NodeRef::Value(Value::Array(arr))) => {
                if let Some(elem) = arr.get(i) {
                    overlays.push(value_overlay(elem));
                    visit_at(value_ref(elem), rest, indices, overlays, visits)?;
                    overlays.pop();
                }
            }
            _ => {}
        },
        Subscript::Wildcard => match child {
            ReadChild::Node(NodeRef::Items(items)) => {
                for (i, item) in items.iter().enumerate() {
                    indices.push(i);
                    overlays.push(item_overlay(item));
                    visit_at(NodeRef::Item(item), rest, indices, overlays, visits)?;
                    overlays.pop();
                    indices.pop();
                }
            }
            ReadChild::Node(NodeRef::Value(Value::Array(arr))) => {
                for (i, elem) in arr.iter().enumerate() {
                    indices.push(i);
                    overlays.push(value_overlay(elem));
                    visit_at(value_ref(elem), rest, indices, overlays, visits)?;
                    overlays.pop();
                    indices.pop();
                }
            }
            _ => {}
        },
    }
    Ok(())
}

fn value_overlay(v: &Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m.clone(),
        _ => Map::new(),
    }
}

// ──────────────────────────────────────────────
// Write walk
// ──────────────────────────────────────────────

enum NodeMut<'a> {
    State(&'a mut State),
    Item(&'a mut Item),
    Totals(&'a mut Totals),
    Items(&'a mut Vec<Item>),
    Map(&'a mut Map<String, Value>),
    Value(&'a mut Value),
}

fn value_mut(v: &mut Value) -> NodeMut<'_> {
    match v {
        Value::Object(m) => NodeMut::Map(m),
        other => NodeMut::Value(other),
    }
}

fn write_at(node: NodeMut<'_>, steps: &[PathStep], value: &Value) -> Result<usize, EngineError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(0);
    };
    if rest.is_empty() {
        return write_leaf(node, step, value);
    }

    let next = rest.first();
    let Some(child) = child_slot_mut(node, step, next) else {
        return Ok(0);
    };
    match step.sub {
        Subscript::None => write_at(child, rest, value),
        Subscript::Index(i) => match child {
            NodeMut::Items(items) => {
                let item = items
                    .get_mut(i)
                    .ok_or(EngineError::IndexOutOfRange { index: i })?;
                write_at(NodeMut::Item(item), rest, value)
            }
            NodeMut::Value(v) => {
                let Value::Array(arr) = v else { return Ok(0) };
                if i >= arr.len() {
                    arr.resize(i + 1, Value::Null);
                }
                if arr[i].is_null() {
                    arr[i] = container_for(next);
                }
                write_at(value_mut(&mut arr[i]), rest, value)
            }
            _ => Ok(0),
        },
        Subscript::Wildcard => match child {
            NodeMut::Items(items) => {
                let mut written = 0;
                for item in items.iter_mut() {
                    written += write_at(NodeMut::Item(item), rest, value)?;
                }
                Ok(written)
            }
            NodeMut::Value(v) => {
                let Value::Array(arr) = v else { return Ok(0) };
                let mut written = 0;
                for elem in arr.iter_mut() {
                    if elem.is_null() {
                        *elem = container_for(next);
                    }
                    written += write_at(value_mut(elem), rest, value)?;
                }
                Ok(written)
            }
            _ => Ok(0),
        },
    }
}

fn set_indices_at(
    node: NodeMut<'_>,
    steps: &[PathStep],
    indices: &[usize],
    wild: usize,
    value: &Value,
) -> Result<(), EngineError> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        write_leaf(node, step, value)?;
        return Ok(());
    }

    let next = rest.first();
    // A wildcard step navigates to the concrete index recorded for this
    // visit; an indexed step uses its own.
    let concrete = match step.sub {
        Subscript::Wildcard => {
            let i = indices
                .get(wild)
                .copied()
                .ok_or(EngineError::MissingWildcardIndex { position: wild })?;
            Some((i, wild + 1))
        }
        Subscript::Index(i) => Some((i, wild)),
        Subscript::None => None,
    };

    let lookup = match concrete {
        Some((i, _)) => PathStep {
            key: step.key.clone(),
            sub: Subscript::Index(i),
        },
        None => step.clone(),
    };
    let Some(child) = child_slot_mut(node, &lookup, next) else {
        return Ok(());
    };

    match concrete {
        None => set_indices_at(child, rest, indices, wild, value),
        Some((i, next_wild)) => match child {
            NodeMut::Items(items) => {
                let item = items
                    .get_mut(i)
                    .ok_or(EngineError::IndexOutOfRange { index: i })?;
                set_indices_at(NodeMut::Item(item), rest, indices, next_wild, value)
            }
            NodeMut::Value(v) => {
                let Value::Array(arr) = v else { return Ok(()) };
                if i >= arr.len() {
                    arr.resize(i + 1, Value::Null);
                }
                if arr[i].is_null() {
                    arr[i] = container_for(next);
                }
                set_indices_at(value_mut(&mut arr[i]), rest, indices, next_wild, value)
            }
            _ => Ok(()),
        },
    }
}

/// Resolves the child slot for a step's key, applying the creation policy:
/// plain steps create a container shaped for the following step, indexed
/// steps create a null-filled array, wildcard steps never create.
fn child_slot_mut<'a>(
    node: NodeMut<'a>,
    step: &PathStep,
    next: Option<&PathStep>,
) -> Option<NodeMut<'a>> {
    match node {
        NodeMut::State(s) => match step.key.as_str() {
            "items" => Some(NodeMut::Items(&mut s.items)),
            "totals" => Some(NodeMut::Totals(&mut s.totals)),
            "fields" => Some(NodeMut::Map(&mut s.fields)),
            "meta" => Some(NodeMut::Map(&mut s.meta)),
            "id" | "tenantId" => None,
            _ => map_slot_mut(&mut s.fields, step, next),
        },
        NodeMut::Item(item) => match step.key.as_str() {
            "fields" => Some(NodeMut::Map(&mut item.fields)),
            "id" | "amount" => None,
            _ => map_slot_mut(&mut item.fields, step, next),
        },
        NodeMut::Map(m) => map_slot_mut(m, step, next),
        NodeMut::Totals(_) | NodeMut::Items(_) | NodeMut::Value(_) => None,
    }
}

fn map_slot_mut<'a>(
    m: &'a mut Map<String, Value>,
    step: &PathStep,
    next: Option<&PathStep>,
) -> Option<NodeMut<'a>> {
    match step.sub {
        Subscript::Wildcard => match m.get_mut(&step.key) {
            Some(v) if !v.is_null() => Some(value_mut(v)),
            _ => None,
        },
        Subscript::Index(i) => {
            let entry = m
                .entry(step.key.clone())
                .or_insert_with(|| Value::Array(vec![Value::Null; i + 1]));
            if entry.is_null() {
                *entry = Value::Array(vec![Value::Null; i + 1]);
            }
            Some(value_mut(entry))
        }
        Subscript::None => {
            let entry = m
                .entry(step.key.clone())
                .or_insert_with(|| container_for(next));
            if entry.is_null() {
                *entry = container_for(next);
            }
            Some(value_mut(entry))
        }
    }
}

fn container_for(next: Option<&PathStep>) -> Value {
    match next.map(|s| s.sub) {
        Some(Subscript::Index(i)) => Value::Array(vec![Value::Null; i + 1]),
        Some(Subscript::Wildcard) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

fn write_leaf(node: NodeMut<'_>, step: &PathStep, value: &Value) -> Result<usize, EngineError> {
    if step.sub == Subscript::None {
        return write_named_leaf(node, &step.key, value);
    }

    let Some(child) = child_slot_mut(node, step, None) else {
        return Ok(0);
    };
    let NodeMut::Value(Value::Array(arr)) = child else {
        return Ok(0);
    };
    match step.sub {
        Subscript::Wildcard => {
            for elem in arr.iter_mut() {
                *elem = value.clone();
            }
            Ok(arr.len())
        }
        Subscript::Index(i) => {
            if i >= arr.len() {
                arr.resize(i + 1, Value::Null);
            }
            arr[i] = value.clone();
            Ok(1)
        }
        Subscript::None => Ok(0),
    }
}

fn write_named_leaf(node: NodeMut<'_>, key: &str, value: &Value) -> Result<usize, EngineError> {
    match node {
        NodeMut::State(s) => match key {
            "id" => {
                s.id = expect_string(value, "state.id")?;
                Ok(1)
            }
            "tenantId" => {
                s.tenant_id = expect_string(value, "state.tenantId")?;
                Ok(1)
            }
            "items" => Err(mismatch("state.items", "an items array")),
            "totals" => Err(mismatch("state.totals", "a totals record")),
            "fields" => {
                s.fields = expect_object(value, "state.fields")?;
                Ok(1)
            }
            "meta" => {
                s.meta = expect_object(value, "state.meta")?;
                Ok(1)
            }
            _ => {
                s.fields.insert(key.to_string(), value.clone());
                Ok(1)
            }
        },
        NodeMut::Item(item) => match key {
            "id" => {
                item.id = expect_string(value, "item.id")?;
                Ok(1)
            }
            "amount" => {
                item.amount = coerce_f64(value)?;
                Ok(1)
            }
            "fields" => {
                item.fields = expect_object(value, "item.fields")?;
                Ok(1)
            }
            _ => {
                item.fields.insert(key.to_string(), value.clone());
                Ok(1)
            }
        },
        NodeMut::Totals(t) => {
            let slot = match key {
                "subtotal" => &mut t.subtotal,
                "discount" => &mut t.discount,
                "tax" => &mut t.tax,
                "total" => &mut t.total,
                _ => return Ok(0),
            };
            *slot = coerce_f64(value)?;
            Ok(1)
        }
        NodeMut::Map(m) => {
            m.insert(key.to_string(), value.clone());
            Ok(1)
        }
        NodeMut::Items(_) | NodeMut::Value(_) => Ok(0),
    }
}

fn expect_string(value: &Value, slot: &str) -> Result<String, EngineError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(mismatch(slot, "a string")),
    }
}

fn expect_object(value: &Value, slot: &str) -> Result<Map<String, Value>, EngineError> {
    match value {
        Value::Object(m) => Ok(m.clone()),
        _ => Err(mismatch(slot, "an object")),
    }
}

fn mismatch(slot: &str, expected: &'static str) -> EngineError {
    EngineError::TypeMismatch {
        slot: slot.to_string(),
        expected,
    }
}

fn invalid_target(target: &str) -> EngineError {
    EngineError::InvalidTarget {
        target: target.to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
