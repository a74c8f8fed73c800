//! Document store seam for the reporting layer.
//!
//! The corpus lives in an external document store; the queries in this
//! crate only assume the small operator vocabulary below. [`MemoryStore`]
//! implements exactly that vocabulary over an in-process vector, which is
//! enough to run the full report battery offline and under test. A real
//! client would implement [`DocumentStore`] against the server instead.
//!
//! Supported filters: field equality, `$exists`, `$in`, and top-level `$or`.
//! Supported pipeline stages: `$match`, `$group` (with `$sum`), `$sort`,
//! `$limit`, and `$project` (with `$arrayElemAt`).

use anyhow::{bail, Context, Result};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::io::BufRead;

/// Read/write surface the reporting layer needs from the corpus.
pub trait DocumentStore {
    fn insert_many(&mut self, docs: Vec<Value>) -> Result<()>;

    fn count(&self, filter: &Value) -> Result<u64>;

    fn find(&self, filter: &Value) -> Result<Vec<Value>>;

    /// Distinct non-null values at a dotted field path, in first-seen order.
    fn distinct(&self, field: &str) -> Result<Vec<Value>>;

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>>;

    /// Replace the stored document with the same `id`, or insert it.
    fn save(&mut self, doc: Value) -> Result<()>;
}

/// In-process corpus holding one JSON document per shaped record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Vec<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Load a corpus from newline-delimited JSON.
    pub fn from_ndjson<R: BufRead>(reader: R) -> Result<Self> {
        let mut store = MemoryStore::new();
        for line in reader.lines() {
            let line = line.context("Failed to read corpus line")?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: Value =
                serde_json::from_str(&line).context("Failed to parse corpus document")?;
            store.docs.push(doc);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn insert_many(&mut self, mut docs: Vec<Value>) -> Result<()> {
        self.docs.append(&mut docs);
        Ok(())
    }

    fn count(&self, filter: &Value) -> Result<u64> {
        Ok(self.find(filter)?.len() as u64)
    }

    fn find(&self, filter: &Value) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for doc in &self.docs {
            if matches_filter(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    fn distinct(&self, field: &str) -> Result<Vec<Value>> {
        let mut seen = Vec::new();
        for doc in &self.docs {
            if let Some(value) = lookup_path(doc, field) {
                if !value.is_null() && !seen.contains(value) {
                    seen.push(value.clone());
                }
            }
        }
        Ok(seen)
    }

    fn aggregate(&self, pipeline: &[Value]) -> Result<Vec<Value>> {
        let mut rows = self.docs.clone();
        for stage in pipeline {
            let stage = stage.as_object().context("pipeline stage must be an object")?;
            let (name, spec) = stage.iter().next().context("empty pipeline stage")?;
            rows = match name.as_str() {
                "$match" => {
                    let mut kept = Vec::new();
                    for row in rows {
                        if matches_filter(&row, spec)? {
                            kept.push(row);
                        }
                    }
                    kept
                }
                "$group" => apply_group(&rows, spec)?,
                "$sort" => apply_sort(rows, spec)?,
                "$limit" => {
                    let n = spec.as_u64().context("$limit takes a number")? as usize;
                    rows.truncate(n);
                    rows
                }
                "$project" => apply_project(&rows, spec)?,
                other => bail!("unsupported pipeline stage: {other}"),
            };
        }
        Ok(rows)
    }

    fn save(&mut self, doc: Value) -> Result<()> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .context("document to save has no id")?
            .to_string();

        match self
            .docs
            .iter_mut()
            .find(|d| d.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            Some(slot) => *slot = doc,
            None => self.docs.push(doc),
        }
        Ok(())
    }
}

/// Value at a dotted path like `address.city`.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn matches_filter(doc: &Value, filter: &Value) -> Result<bool> {
    let filter = filter.as_object().context("filter must be an object")?;
    for (key, cond) in filter {
        if key == "$or" {
            let arms = cond.as_array().context("$or takes an array of filters")?;
            let mut any = false;
            for arm in arms {
                if matches_filter(doc, arm)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
        } else if !matches_condition(lookup_path(doc, key), cond)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_condition(value: Option<&Value>, cond: &Value) -> Result<bool> {
    if let Some(ops) = cond.as_object() {
        if ops.keys().any(|k| k.starts_with('$')) {
            for (op, operand) in ops {
                let ok = match op.as_str() {
                    "$exists" => value.is_some() == is_truthy(operand),
                    "$in" => {
                        let choices = operand.as_array().context("$in takes an array")?;
                        value.map_or(false, |v| choices.contains(v))
                    }
                    other => bail!("unsupported filter operator: {other}"),
                };
                if !ok {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
    }
    Ok(value == Some(cond))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::Null => false,
        _ => true,
    }
}

fn apply_group(rows: &[Value], spec: &Value) -> Result<Vec<Value>> {
    let spec = spec.as_object().context("$group takes an object")?;
    let id_expr = spec.get("_id").context("$group requires an _id expression")?;

    // Group order follows first appearance; a later $sort decides the final
    // order, as in the server.
    let mut groups: Vec<(Value, Map<String, Value>)> = Vec::new();

    for row in rows {
        let key = eval_expr(row, id_expr);
        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                groups.push((key, Map::new()));
                groups.len() - 1
            }
        };
        let accumulators = &mut groups[index].1;

        for (field, accumulator) in spec.iter().filter(|(f, _)| *f != "_id") {
            let accumulator = accumulator
                .as_object()
                .context("accumulator must be an object")?;
            let (op, operand) = accumulator
                .iter()
                .next()
                .context("empty accumulator")?;
            match op.as_str() {
                "$sum" => {
                    let increment = match eval_expr(row, operand) {
                        Value::Number(n) => n.as_f64().unwrap_or(0.0),
                        _ => 0.0,
                    };
                    let current = accumulators
                        .get(field)
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0);
                    accumulators.insert(field.clone(), number(current + increment));
                }
                other => bail!("unsupported accumulator: {other}"),
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accumulators)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key);
            out.extend(accumulators);
            Value::Object(out)
        })
        .collect())
}

fn apply_sort(mut rows: Vec<Value>, spec: &Value) -> Result<Vec<Value>> {
    // Key order follows the spec map's iteration order, which for JSON
    // objects is alphabetical; the report battery only issues single-key
    // sorts, where this cannot matter.
    let keys: Vec<(String, i64)> = spec
        .as_object()
        .context("$sort takes an object")?
        .iter()
        .map(|(field, dir)| (field.clone(), dir.as_i64().unwrap_or(1)))
        .collect();

    rows.sort_by(|a, b| {
        for (field, direction) in &keys {
            let mut ord = compare_values(lookup_path(a, field), lookup_path(b, field));
            if *direction < 0 {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(rows)
}

fn apply_project(rows: &[Value], spec: &Value) -> Result<Vec<Value>> {
    let spec = spec.as_object().context("$project takes an object")?;
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let mut projected = Map::new();

        let keep_id = spec.get("_id").map_or(true, is_truthy);
        if keep_id {
            if let Some(id) = row.get("_id") {
                projected.insert("_id".to_string(), id.clone());
            }
        }

        for (field, rule) in spec.iter().filter(|(f, _)| *f != "_id") {
            match rule {
                Value::Number(_) | Value::Bool(_) => {
                    if is_truthy(rule) {
                        if let Some(value) = lookup_path(row, field) {
                            projected.insert(field.clone(), value.clone());
                        }
                    }
                }
                expr => {
                    projected.insert(field.clone(), eval_expr(row, expr));
                }
            }
        }
        out.push(Value::Object(projected));
    }
    Ok(out)
}

/// Evaluate a pipeline expression against one document: `"$path"` field
/// references, `$arrayElemAt`, and literals.
fn eval_expr(row: &Value, expr: &Value) -> Value {
    match expr {
        Value::String(s) if s.starts_with('$') => {
            lookup_path(row, &s[1..]).cloned().unwrap_or(Value::Null)
        }
        Value::Object(m) => {
            if let Some(args) = m.get("$arrayElemAt") {
                let args = match args.as_array() {
                    Some(a) if a.len() == 2 => a,
                    _ => return Value::Null,
                };
                let array = eval_expr(row, &args[0]);
                let index = args[1].as_i64().unwrap_or(0);
                match array.as_array() {
                    Some(items) => {
                        let i = if index < 0 {
                            items.len() as i64 + index
                        } else {
                            index
                        };
                        usize::try_from(i)
                            .ok()
                            .and_then(|i| items.get(i))
                            .cloned()
                            .unwrap_or(Value::Null)
                    }
                    None => Value::Null,
                }
            } else {
                expr.clone()
            }
        }
        other => other.clone(),
    }
}

/// Emit whole numbers as JSON integers so counts serialize without a
/// fractional part.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(_) => 4,
        }
    }

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
            _ => Ordering::Equal,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_many(vec![
                json!({"id": "1", "type": "node", "address": {"city": "Centennial"}, "pos": [39.58, -104.88]}),
                json!({"id": "2", "type": "node", "address": {"city": "Centenn"}, "pos": [39.60, -104.90]}),
                json!({"id": "3", "type": "way", "highway": "cycleway"}),
                json!({"id": "4", "type": "way", "bicycle": "yes"}),
                json!({"id": "5", "type": "way"}),
                json!({"type": "bounds", "minlat": 39.5, "minlon": -105.0, "maxlat": 39.7, "maxlon": -104.8}),
            ])
            .unwrap();
        store
    }

    #[test]
    fn equality_and_exists_filters() {
        let s = store();
        assert_eq!(s.count(&json!({})).unwrap(), 6);
        assert_eq!(s.count(&json!({"type": "node"})).unwrap(), 2);
        assert_eq!(
            s.count(&json!({"address.city": {"$exists": true}})).unwrap(),
            2
        );
        assert_eq!(
            s.count(&json!({"type": "way", "bicycle": {"$exists": false}}))
                .unwrap(),
            2
        );
    }

    #[test]
    fn or_and_in_filters() {
        let s = store();
        let filter = json!({"type": "way", "$or": [
            {"highway": "cycleway"},
            {"bicycle": {"$in": ["yes", "designated", "permissive", "allowed"]}}
        ]});
        assert_eq!(s.count(&filter).unwrap(), 2);
    }

    #[test]
    fn group_sum_sort_limit() {
        let s = store();
        let rows = s
            .aggregate(&[
                json!({"$match": {"type": {"$exists": true}}}),
                json!({"$group": {"_id": "$type", "count": {"$sum": 1}}}),
                json!({"$sort": {"count": -1}}),
                json!({"$limit": 2}),
            ])
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"_id": "way", "count": 3}));
        assert_eq!(rows[1], json!({"_id": "node", "count": 2}));
    }

    #[test]
    fn group_by_missing_field_buckets_under_null() {
        let s = store();
        let rows = s
            .aggregate(&[
                json!({"$match": {"type": "way"}}),
                json!({"$group": {"_id": "$bicycle", "count": {"$sum": 1}}}),
                json!({"$sort": {"count": -1}}),
            ])
            .unwrap();

        // Two ways have no bicycle tag, one has "yes".
        assert_eq!(rows[0], json!({"_id": null, "count": 2}));
        assert_eq!(rows[1], json!({"_id": "yes", "count": 1}));
    }

    #[test]
    fn project_with_array_elem_at() {
        let s = store();
        let rows = s
            .aggregate(&[
                json!({"$match": {"pos": {"$exists": 1}}}),
                json!({"$project": {"_id": 0, "lat": {"$arrayElemAt": ["$pos", 0]}}}),
                json!({"$sort": {"lat": 1}}),
                json!({"$limit": 1}),
            ])
            .unwrap();

        assert_eq!(rows, vec![json!({"lat": 39.58})]);
    }

    #[test]
    fn distinct_skips_missing_values() {
        let s = store();
        let cities = s.distinct("address.city").unwrap();
        assert_eq!(cities, vec![json!("Centennial"), json!("Centenn")]);
    }

    #[test]
    fn save_replaces_by_id() {
        let mut s = store();
        s.save(json!({"id": "2", "type": "node", "address": {"city": "Centennial"}}))
            .unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.count(&json!({"address.city": "Centenn"})).unwrap(), 0);
        assert_eq!(s.count(&json!({"address.city": "Centennial"})).unwrap(), 2);
    }

    #[test]
    fn unsupported_operator_is_an_error() {
        let s = store();
        assert!(s.count(&json!({"pos": {"$size": 2}})).is_err());
    }

    #[test]
    fn loads_ndjson() {
        let ndjson = "{\"id\":\"1\",\"type\":\"node\"}\n\n{\"id\":\"2\",\"type\":\"way\"}\n";
        let s = MemoryStore::from_ndjson(ndjson.as_bytes()).unwrap();
        assert_eq!(s.len(), 2);
    }
}
