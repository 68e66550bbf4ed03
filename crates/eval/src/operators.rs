//! Operator registry and implementations.
//!
//! The registry is an explicit table built once behind a `OnceLock` and
//! read-only afterwards; invocations never register operators. Standard
//! JsonLogic operators and the domain extensions (`sum`, `round`, `round2`,
//! lazy `if`, `foreach`, `allocate`) live in the same table.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use reckon_core::num::{is_truthy, lenient_f64, number};
use reckon_core::EngineError;
use serde_json::{Map, Value};

use crate::logic::eval_node;

pub(crate) type OperatorFn = fn(&Value, &Map<String, Value>) -> Result<Value, EngineError>;

pub struct OperatorRegistry {
    ops: BTreeMap<&'static str, OperatorFn>,
}

impl OperatorRegistry {
    pub fn with_builtins() -> Self {
        let mut ops: BTreeMap<&'static str, OperatorFn> = BTreeMap::new();
        ops.insert("var", op_var);
        ops.insert("missing", op_missing);
        ops.insert("==", op_eq);
        ops.insert("!=", op_ne);
        ops.insert("<", op_lt);
        ops.insert("<=", op_le);
        ops.insert(">", op_gt);
        ops.insert(">=", op_ge);
        ops.insert("and", op_and);
        ops.insert("or", op_or);
        ops.insert("!", op_not);
        ops.insert("+", op_add);
        ops.insert("-", op_sub);
        ops.insert("*", op_mul);
        ops.insert("/", op_div);
        ops.insert("%", op_mod);
        ops.insert("if", op_if);
        ops.insert("sum", op_sum);
        ops.insert("round", op_round);
        ops.insert("round2", op_round2);
        ops.insert("foreach", op_foreach);
        ops.insert("allocate", op_allocate);
        OperatorRegistry { ops }
    }

    pub(crate) fn get(&self, op: &str) -> Option<OperatorFn> {
        self.ops.get(op).copied()
    }
}

/// The process-wide registry, initialized on first use.
pub fn registry() -> &'static OperatorRegistry {
    static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(OperatorRegistry::with_builtins)
}

// ──────────────────────────────────────────────
// Argument plumbing
// ──────────────────────────────────────────────

/// Normalizes an argument list: arrays yield their elements, a bare value
/// is a single argument.
fn args_of(args: &Value) -> Vec<&Value> {
    match args {
        Value::Array(a) => a.iter().collect(),
        other => vec![other],
    }
}

fn eval_args(args: &Value, data: &Map<String, Value>) -> Result<Vec<Value>, EngineError> {
    args_of(args)
        .into_iter()
        .map(|a| eval_node(a, data))
        .collect()
}

/// Numeric coercion for arithmetic and comparisons: numbers, numeric
/// strings, booleans (0/1) and null (0). Anything else is an evaluation
/// error.
fn to_num(v: &Value) -> Result<f64, EngineError> {
    coerce_num(v).ok_or_else(|| EngineError::logic(format!("non-numeric operand: {v}")))
}

fn coerce_num(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(_), _) | (_, Value::Array(_)) => a == b,
        (Value::Object(_), _) | (_, Value::Object(_)) => a == b,
        _ => match (coerce_num(a), coerce_num(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

// ──────────────────────────────────────────────
// Standard operators
// ──────────────────────────────────────────────

fn op_var(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let raw = args_of(args);
    let accessor = match raw.first() {
        Some(a) => eval_node(a, data)?,
        None => Value::Null,
    };

    let path = match &accessor {
        Value::Null => return Ok(Value::Object(data.clone())),
        Value::String(s) if s.is_empty() => return Ok(Value::Object(data.clone())),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(EngineError::logic(format!(
                "var accessor must be a string, got {other}"
            )))
        }
    };

    match lookup_path(data, &path) {
        Some(v) => Ok(v),
        None => match raw.get(1) {
            Some(default) => eval_node(default, data),
            None => Ok(Value::Null),
        },
    }
}

fn lookup_path(data: &Map<String, Value>, path: &str) -> Option<Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;
    for seg in segments {
        current = match current {
            Value::Object(m) => m.get(seg)?,
            Value::Array(a) => a.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

fn op_missing(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let evaluated = eval_args(args, data)?;
    let keys: Vec<Value> = match evaluated.first() {
        Some(Value::Array(a)) => a.clone(),
        _ => evaluated,
    };
    let mut missing = Vec::new();
    for key in keys {
        if let Value::String(k) = key {
            if lookup_path(data, &k).is_none() {
                missing.push(Value::String(k));
            }
        }
    }
    Ok(Value::Array(missing))
}

fn op_eq(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let (a, b) = pair(&v)?;
    Ok(Value::Bool(loose_eq(a, b)))
}

fn op_ne(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let (a, b) = pair(&v)?;
    Ok(Value::Bool(!loose_eq(a, b)))
}

fn pair(v: &[Value]) -> Result<(&Value, &Value), EngineError> {
    match v {
        [a, b, ..] => Ok((a, b)),
        _ => Err(EngineError::logic("comparison requires two operands")),
    }
}

fn op_lt(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    chained_compare(args, data, |a, b| a < b)
}

fn op_le(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    chained_compare(args, data, |a, b| a <= b)
}

fn op_gt(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    chained_compare(args, data, |a, b| a > b)
}

fn op_ge(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    chained_compare(args, data, |a, b| a >= b)
}

/// Compares consecutive operands, so `{"<": [1, x, 10]}` expresses a
/// between test the way JsonLogic does.
fn chained_compare(
    args: &Value,
    data: &Map<String, Value>,
    cmp: fn(f64, f64) -> bool,
) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    if v.len() < 2 {
        return Err(EngineError::logic("comparison requires two operands"));
    }
    let nums = v.iter().map(to_num).collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Bool(nums.windows(2).all(|w| cmp(w[0], w[1]))))
}

fn op_and(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let mut last = Value::Bool(true);
    for arg in args_of(args) {
        last = eval_node(arg, data)?;
        if !is_truthy(&last) {
            return Ok(last);
        }
    }
    Ok(last)
}

fn op_or(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let mut last = Value::Bool(false);
    for arg in args_of(args) {
        last = eval_node(arg, data)?;
        if is_truthy(&last) {
            return Ok(last);
        }
    }
    Ok(last)
}

fn op_not(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let first = v.first().unwrap_or(&Value::Null);
    Ok(Value::Bool(!is_truthy(first)))
}

fn op_add(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let mut acc = 0.0;
    for x in &v {
        acc += to_num(x)?;
    }
    number(acc)
}

fn op_sub(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    match v.as_slice() {
        [a] => number(-to_num(a)?),
        [a, b, ..] => number(to_num(a)? - to_num(b)?),
        _ => Err(EngineError::logic("subtraction requires an operand")),
    }
}

fn op_mul(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    if v.is_empty() {
        return Err(EngineError::logic("multiplication requires an operand"));
    }
    let mut acc = 1.0;
    for x in &v {
        acc *= to_num(x)?;
    }
    number(acc)
}

fn op_div(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let (a, b) = pair(&v)?;
    let divisor = to_num(b)?;
    if divisor == 0.0 {
        return Err(EngineError::logic("division by zero"));
    }
    number(to_num(a)? / divisor)
}

fn op_mod(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let (a, b) = pair(&v)?;
    let divisor = to_num(b)?;
    if divisor == 0.0 {
        return Err(EngineError::logic("modulo by zero"));
    }
    number(to_num(a)? % divisor)
}

// ──────────────────────────────────────────────
// Domain extensions
// ──────────────────────────────────────────────

/// `{"if": [cond, then, else]}` — lazy: only the taken branch is evaluated.
fn op_if(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let raw = args_of(args);
    let cond = match raw.first() {
        Some(c) => eval_node(c, data)?,
        None => return Ok(Value::Null),
    };
    let branch = if is_truthy(&cond) {
        raw.get(1)
    } else {
        raw.get(2)
    };
    match branch {
        Some(b) => eval_node(b, data),
        None => Ok(Value::Null),
    }
}

/// `{"sum": [array]}` — numeric sum of an array, or of the arguments
/// themselves when the first is not an array. Non-numeric entries read as
/// zero.
fn op_sum(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let evaluated = eval_args(args, data)?;
    let values: &[Value] = match evaluated.first() {
        Some(Value::Array(a)) => a,
        _ => &evaluated,
    };
    number(values.iter().map(lenient_f64).sum())
}

/// `{"round": [value, decimals]}` — round half away from zero.
fn op_round(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let value = v.first().map(lenient_f64).unwrap_or(0.0);
    let decimals = v.get(1).map(lenient_f64).unwrap_or(0.0);
    let multiplier = 10f64.powi(decimals as i32);
    number((value * multiplier).round() / multiplier)
}

/// `{"round2": value}` — nearest-cent rounding.
fn op_round2(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let v = eval_args(args, data)?;
    let value = v.first().map(lenient_f64).unwrap_or(0.0);
    number((value * 100.0).round() / 100.0)
}

/// `{"foreach": [array, logic]}` — evaluates `logic` once per element with
/// `item` and `index` bound in a child data map. An element whose
/// evaluation fails is kept unchanged.
fn op_foreach(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let raw = args_of(args);
    if raw.len() < 2 {
        return Ok(Value::Array(Vec::new()));
    }
    let Value::Array(items) = eval_node(raw[0], data)? else {
        return Ok(Value::Array(Vec::new()));
    };
    let logic = raw[1];
    if !matches!(logic, Value::Object(_)) {
        return Ok(Value::Array(Vec::new()));
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let mut child = data.clone();
        child.insert("item".to_string(), item.clone());
        child.insert("index".to_string(), Value::from(i as u64));
        match eval_node(logic, &child) {
            Ok(v) => out.push(v),
            Err(_) => out.push(item),
        }
    }
    Ok(Value::Array(out))
}

/// `{"allocate": [total, weights]}` — proportional distribution. The last
/// slot absorbs the residual so the output sums exactly to `total`; a zero
/// weight sum distributes equally.
fn op_allocate(args: &Value, data: &Map<String, Value>) -> Result<Value, EngineError> {
    let evaluated = eval_args(args, data)?;
    if evaluated.len() < 2 {
        return Ok(Value::Array(Vec::new()));
    }
    let total = lenient_f64(&evaluated[0]);
    let Value::Array(weights) = &evaluated[1] else {
        return Ok(Value::Array(Vec::new()));
    };
    if weights.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }

    let weight_values: Vec<f64> = weights.iter().map(lenient_f64).collect();
    let weight_sum: f64 = weight_values.iter().sum();

    if weight_sum == 0.0 {
        let equal = total / weight_values.len() as f64;
        let shares = weight_values
            .iter()
            .map(|_| number(equal))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Array(shares));
    }

    let mut shares = Vec::with_capacity(weight_values.len());
    let mut allocated = 0.0;
    for (i, weight) in weight_values.iter().enumerate() {
        let share = if i == weight_values.len() - 1 {
            total - allocated
        } else {
            let s = total * weight / weight_sum;
            allocated += s;
            s
        };
        shares.push(number(share)?);
    }
    Ok(Value::Array(shares))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
