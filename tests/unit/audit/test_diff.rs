// Unit tests for the audit diff engine

use gatekeeper::audit::{diff, diff_json, to_document, Document};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    to_document(value)
}

/// `{"n": {"n": ... {"leaf": leaf}}}` with `depth` wrapping levels
fn nested(depth: usize, leaf: i64) -> Document {
    let mut doc = Document::new();
    doc.insert("leaf".to_string(), json!(leaf));
    for _ in 0..depth {
        let mut outer = Document::new();
        outer.insert("n".to_string(), Value::Object(doc));
        doc = outer;
    }
    doc
}

/// Walk down the `n` chain one level at a time, freeing each shell as it
/// goes, and return the depth reached plus the bottom document.
fn unwind(mut doc: Document) -> (usize, Document) {
    let mut depth = 0;
    while let Some(Value::Object(inner)) = doc.remove("n") {
        doc = inner;
        depth += 1;
    }
    (depth, doc)
}

fn sides(before: Value, after: Value) -> (Value, Value) {
    let delta = diff(&doc(before), &doc(after));
    (Value::Object(delta.before), Value::Object(delta.after))
}

#[test]
fn test_reference_cases() {
    assert_eq!(
        sides(json!({"a": 1, "b": 2}), json!({"a": 1, "b": 3})),
        (json!({"b": 2}), json!({"b": 3}))
    );
    assert_eq!(
        sides(json!({"a": 1}), json!({"a": 1, "c": 4})),
        (json!({}), json!({"c": 4}))
    );
    assert_eq!(
        sides(json!({"a": {"x": 1, "y": 2}}), json!({"a": {"x": 1, "y": 3}})),
        (json!({"a": {"y": 2}}), json!({"a": {"y": 3}}))
    );
}

#[test]
fn test_identity_is_empty() {
    let snapshot = json!({
        "id": "p-1",
        "tags": ["a", "b"],
        "owner": {"id": 7, "roles": [{"name": "admin"}]},
        "deleted": null
    });
    assert!(diff(&doc(snapshot.clone()), &doc(snapshot)).is_empty());
}

#[test]
fn test_deeply_nested_change() {
    assert_eq!(
        sides(
            json!({"l1": {"l2": {"l3": {"keep": 1, "v": "old"}}}}),
            json!({"l1": {"l2": {"l3": {"keep": 1, "v": "new"}}}})
        ),
        (
            json!({"l1": {"l2": {"l3": {"v": "old"}}}}),
            json!({"l1": {"l2": {"l3": {"v": "new"}}}})
        )
    );
}

#[test]
fn test_nested_removal_only_touches_before() {
    assert_eq!(
        sides(json!({"a": {"x": 1, "y": 2}}), json!({"a": {"x": 1}})),
        (json!({"a": {"y": 2}}), json!({}))
    );
}

#[test]
fn test_heterogeneous_values() {
    assert_eq!(
        sides(
            json!({"n": 1, "s": "1", "b": true, "z": null}),
            json!({"n": 1.5, "s": 1, "b": true, "z": 0})
        ),
        (json!({"n": 1, "s": "1", "z": null}), json!({"n": 1.5, "s": 1, "z": 0}))
    );
}

#[test]
fn test_object_replaced_by_scalar_and_back() {
    assert_eq!(
        sides(json!({"a": {"x": 1}}), json!({"a": 5})),
        (json!({"a": {"x": 1}}), json!({"a": 5}))
    );
    assert_eq!(
        sides(json!({"a": 5}), json!({"a": {"x": 1}})),
        (json!({"a": 5}), json!({"a": {"x": 1}}))
    );
}

#[test]
fn test_empty_snapshots() {
    assert_eq!(sides(json!({}), json!({"a": 1})), (json!({}), json!({"a": 1})));
    assert_eq!(sides(json!({"a": 1}), Value::Null), (json!({"a": 1}), json!({})));
}

#[test]
fn test_diff_json_on_stored_text() {
    let (before, after) = diff_json(r#"{"a":1,"b":{"c":2}}"#, r#"{"a":1,"b":{"c":3}}"#);
    assert_eq!(serde_json::from_str::<Value>(&before).unwrap(), json!({"b": {"c": 2}}));
    assert_eq!(serde_json::from_str::<Value>(&after).unwrap(), json!({"b": {"c": 3}}));
}

#[test]
fn test_diff_json_treats_bad_text_as_empty() {
    let (before, after) = diff_json("{broken", "   ");
    assert_eq!(before, "{}");
    assert_eq!(after, "{}");

    let (before, after) = diff_json("42", r#"{"value":42}"#);
    assert_eq!((before.as_str(), after.as_str()), ("{}", "{}"));
}

#[test]
fn test_integer_and_float_forms_are_equal() {
    assert!(diff(&doc(json!({"price": 10})), &doc(json!({"price": 10.0}))).is_empty());
    assert!(diff(&doc(json!({"dims": [2, 3.5]})), &doc(json!({"dims": [2.0, 3.5]}))).is_empty());
    assert_eq!(
        sides(json!({"price": 10, "qty": 1}), json!({"price": 10.0, "qty": 2})),
        (json!({"qty": 1}), json!({"qty": 2}))
    );
}

#[test]
fn test_very_deep_nesting() {
    const DEPTH: usize = 20_000;
    let before = nested(DEPTH, 1);
    let after = nested(DEPTH, 2);

    let delta = diff(&before, &after);

    let (depth, bottom) = unwind(delta.before);
    assert_eq!(depth, DEPTH);
    assert_eq!(Value::Object(bottom), json!({"leaf": 1}));
    let (depth, bottom) = unwind(delta.after);
    assert_eq!(depth, DEPTH);
    assert_eq!(Value::Object(bottom), json!({"leaf": 2}));

    assert!(diff(&before, &before).is_empty());
    unwind(before);
    unwind(after);
}
