// Structural diff of before/after entity snapshots

use serde_json::{Map, Value};

/// Nested string-keyed document
pub type Document = Map<String, Value>;

/// Minimal before/after pair; both empty means nothing changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditDelta {
    pub before: Document,
    pub after: Document,
}

impl AuditDelta {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// One level of the walk: its delta and where it hangs in the parent
struct Frame<'a> {
    parent: Option<(usize, &'a str)>,
    delta: AuditDelta,
}

/// Reduce two snapshots to the keys that differ
///
/// Nested documents are compared key by key and contribute only their
/// changed sub-keys. Arrays and scalars are compared as whole values, with
/// numbers equal when their `f64` values are (`10` and `10.0` match).
///
/// The walk keeps its own stack on the heap, so nesting depth is bounded
/// only by memory.
pub fn diff(before: &Document, after: &Document) -> AuditDelta {
    let mut frames: Vec<Frame<'_>> = Vec::new();
    let mut pending = vec![(None, before, after)];

    while let Some((parent, before, after)) = pending.pop() {
        let index = frames.len();
        let mut delta = AuditDelta::default();

        for (key, old) in before {
            match (old, after.get(key)) {
                (_, None) => {
                    delta.before.insert(key.clone(), old.clone());
                }
                (Value::Object(old_doc), Some(Value::Object(new_doc))) => {
                    pending.push((Some((index, key.as_str())), old_doc, new_doc));
                }
                (_, Some(new)) if !same_value(old, new) => {
                    delta.before.insert(key.clone(), old.clone());
                    delta.after.insert(key.clone(), new.clone());
                }
                (_, Some(_)) => {}
            }
        }

        for (key, new) in after {
            if !before.contains_key(key) {
                delta.after.insert(key.clone(), new.clone());
            }
        }

        frames.push(Frame { parent, delta });
    }

    // Children always sit above their parent, so folding from the top
    // completes every nested delta before it is attached.
    while frames.len() > 1 {
        let Some(Frame {
            parent: Some((index, key)),
            delta,
        }) = frames.pop()
        else {
            break;
        };
        let parent = &mut frames[index].delta;
        if !delta.before.is_empty() {
            parent.before.insert(key.to_string(), Value::Object(delta.before));
        }
        if !delta.after.is_empty() {
            parent.after.insert(key.to_string(), Value::Object(delta.after));
        }
    }

    frames.pop().map(|frame| frame.delta).unwrap_or_default()
}

/// Deep equality where numbers compare by their `f64` value
fn same_value(a: &Value, b: &Value) -> bool {
    let mut pairs = vec![(a, b)];

    while let Some(pair) = pairs.pop() {
        match pair {
            (Value::Number(x), Value::Number(y)) => {
                if x.as_f64() != y.as_f64() {
                    return false;
                }
            }
            (Value::Array(xs), Value::Array(ys)) => {
                if xs.len() != ys.len() {
                    return false;
                }
                pairs.extend(xs.iter().zip(ys));
            }
            (Value::Object(xs), Value::Object(ys)) => {
                if xs.len() != ys.len() {
                    return false;
                }
                for (key, x) in xs {
                    match ys.get(key) {
                        Some(y) => pairs.push((x, y)),
                        None => return false,
                    }
                }
            }
            (x, y) => {
                if x != y {
                    return false;
                }
            }
        }
    }

    true
}

/// Turn an arbitrary snapshot value into a document
///
/// Objects are used as-is, `null` becomes the empty document, and any other
/// value is wrapped as `{"value": v}`.
pub fn to_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        Value::Null => Document::new(),
        other => {
            let mut doc = Document::new();
            doc.insert("value".to_string(), other);
            doc
        }
    }
}

/// Diff two stored JSON texts, returning both delta sides as JSON text
///
/// Empty or unparseable text counts as the empty document.
pub fn diff_json(before_text: &str, after_text: &str) -> (String, String) {
    let delta = diff(&parse_document(before_text), &parse_document(after_text));
    (
        Value::Object(delta.before).to_string(),
        Value::Object(delta.after).to_string(),
    )
}

fn parse_document(text: &str) -> Document {
    if text.trim().is_empty() {
        return Document::new();
    }
    serde_json::from_str::<Value>(text)
        .map(to_document)
        .unwrap_or_default()
}
