use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use json_duck::{json, matches, validate, ErrorKind, Kind, MappingTemplate, Template, TemplateSet, Value};
use serde_json::json as j;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn orders() -> TemplateSet {
    TemplateSet::from_path(fixture("orders.template.json")).unwrap()
}

#[test]
fn good_orders_pass() {
    let src = std::fs::read_to_string(fixture("orders.good.json")).unwrap();
    let value = json::from_str(&src, orders().root()).unwrap();
    let Value::List(items) = value else { panic!("expected a list of orders") };
    assert_eq!(items.len(), 2);
}

#[test]
fn bad_orders_fail_with_precise_paths() {
    let set = orders();
    let src = std::fs::read_to_string(fixture("orders.bad.ndjson")).unwrap();
    let lines: Vec<&str> = src.lines().collect();

    let first = Value::from(serde_json::from_str::<serde_json::Value>(lines[0]).unwrap());
    let order = set.get("Order").unwrap();
    let err = validate(&first, order).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CheckFailed);
    assert_eq!(err.path(), r#"$["items"][0]["sku"]"#);

    let second = Value::from(serde_json::from_str::<serde_json::Value>(lines[1]).unwrap());
    let err = validate(&second, order).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedKey);
    assert_eq!(err.to_string(), r#"$: should not have a child called "coupon""#);
}

#[test]
fn strict_superset_rejection() {
    let t = MappingTemplate::new().strict().field("a", Kind::Int).field("b", Kind::Str).build();
    assert!(matches(&Value::from(j!({"a": 1, "b": "x"})), &t));
    for extra in ["c", "A", "", "b "] {
        let mut obj = j!({"a": 1, "b": "x"});
        obj[extra] = j!(0);
        let err = validate(&Value::from(obj), &t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedKey, "{extra:?}");
    }
}

#[test]
fn tuple_exactness() {
    let exact = Template::tuple([Kind::Int, Kind::Str]);
    assert_eq!(
        validate(&Value::from(j!([1, "a", 2])), &exact).unwrap_err().kind(),
        ErrorKind::LengthMismatch,
    );
    assert!(matches(&Value::from(j!([1, "a"])), &exact));
    assert!(matches(&Value::from(j!([1, "a", 2])), &Template::tuple_rest([Kind::Int])));
}

#[test]
fn notation_and_builder_templates_agree() {
    let built = MappingTemplate::new()
        .field("person", Template::seq(
            MappingTemplate::new()
                .field("id", Kind::Int)
                .nullable("name", Kind::Str)
                .optional("age", Kind::Int),
        ))
        .build();
    let written = json_duck::notation::parse(&j!({
        "person": [{"id": "int", "name|null": "str", "age?": "int"}]
    }))
    .unwrap();

    for doc in [
        j!({"person": [{"id": 1, "name": null}]}),
        j!({"person": [{"id": 1, "name": null, "age": 14}]}),
        j!({"person": [{"id": "x"}]}),
        j!({"person": [{"id": 1}]}),
        j!({"person": {}}),
    ] {
        let value = Value::from(doc);
        assert_eq!(validate(&value, &built), validate(&value, &written));
    }
}

#[test]
fn templates_are_shared_across_threads() {
    let set = Arc::new(orders());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                let order = j!([{"id": i, "customer": null, "items": [], "shipping": [0, 0]}]);
                matches(&Value::from(order), set.root())
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
