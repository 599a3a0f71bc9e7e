//! Runtime data model: the already-decoded values templates are matched against.
//!
//! Mirrors what a JSON decoder hands back (null, bools, numbers, strings,
//! arrays, objects) plus two shapes JSON text cannot express directly:
//! set-like collections and attribute-bearing records.
use std::fmt;
use indexmap::IndexMap;
use serde_json::Number;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`; still of kind `Int`.
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Set-like collection; elements are unique (see [`Value::set`]).
    Set(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(Record),
}

/// Attribute-bearing value, checked by [`crate::template::Duck`].
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
    pub class: String,
    pub attrs: IndexMap<String, Value>,
}

/// Runtime types a template may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    /// `Int` ∪ `Float`
    Number,
    Str,
    List,
    Set,
    Map,
    Object,
}

// ------------------------------- Value ------------------------------------ //

impl Value {
    /// Build a set, dropping duplicates while keeping first-seen order.
    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            if !out.contains(&item) { out.push(item); }
        }
        Value::Set(out)
    }

    pub fn record<I, K>(class: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Record {
            class: class.into(),
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) | Value::UInt(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::List(_) => Kind::List,
            Value::Set(_) => Kind::Set,
            Value::Map(_) => Kind::Map,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Name used in error messages; records report their class.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Object(record) if !record.class.is_empty() => &record.class,
            other => other.kind().name(),
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Attribute lookup; only records carry attributes.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(record) => record.attrs.get(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Number => "number",
            Kind::Str => "str",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::Map => "map",
            Kind::Object => "object",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "null" => Kind::Null,
            "bool" => Kind::Bool,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "number" => Kind::Number,
            "str" => Kind::Str,
            "list" => Kind::List,
            "set" => Kind::Set,
            "map" => Kind::Map,
            "object" => Kind::Object,
            _ => return None,
        };
        Some(kind)
    }

    /// Is `value`'s runtime type this kind or one of its subtypes?
    pub fn admits(self, value: &Value) -> bool {
        let actual = value.kind();
        actual == self || (self == Kind::Number && matches!(actual, Kind::Int | Kind::Float))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

// ---------------------------- Conversions --------------------------------- //

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(xs) => Value::List(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self { Value::from(v.clone()) }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        use serde_json::Value as J;
        match v {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::Number((*i).into()),
            Value::UInt(u) => J::Number((*u).into()),
            Value::Float(f) => Number::from_f64(*f).map(J::Number).unwrap_or(J::Null),
            Value::Str(s) => J::String(s.clone()),
            Value::List(xs) | Value::Set(xs) => J::Array(xs.iter().map(J::from).collect()),
            Value::Map(m) => J::Object(m.iter().map(|(k, v)| (k.clone(), J::from(v))).collect()),
            Value::Object(record) => {
                J::Object(record.attrs.iter().map(|(k, v)| (k.clone(), J::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self { serde_json::Value::from(&v) }
}

impl From<bool> for Value { fn from(b: bool) -> Self { Value::Bool(b) } }
impl From<i64> for Value { fn from(i: i64) -> Self { Value::Int(i) } }
impl From<u64> for Value {
    fn from(u: u64) -> Self { i64::try_from(u).map_or(Value::UInt(u), Value::Int) }
}
impl From<f64> for Value { fn from(f: f64) -> Self { Value::Float(f) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::Str(s.to_string()) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::Str(s) } }

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_split_into_int_and_float() {
        assert_eq!(Value::from(json!(3)), Value::Int(3));
        assert_eq!(Value::from(json!(3.5)), Value::Float(3.5));
    }

    #[test]
    fn integers_past_i64_stay_integers() {
        let big = Value::from(json!(u64::MAX));
        assert_eq!(big, Value::UInt(u64::MAX));
        assert!(Kind::Int.admits(&big));
        assert!(Kind::Number.admits(&big));
        assert_eq!(serde_json::Value::from(&big), json!(u64::MAX));
        assert_eq!(Value::from(7u64), Value::Int(7));
    }

    #[test]
    fn number_admits_int_and_float_but_not_bool() {
        assert!(Kind::Number.admits(&Value::Int(1)));
        assert!(Kind::Number.admits(&Value::Float(1.0)));
        assert!(!Kind::Number.admits(&Value::Bool(true)));
        assert!(!Kind::Int.admits(&Value::Bool(true)));
        assert!(!Kind::Int.admits(&Value::Float(1.0)));
    }

    #[test]
    fn set_drops_duplicates() {
        let s = Value::set(["a".into(), "b".into(), "a".into()]);
        assert_eq!(s, Value::Set(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn map_keeps_insertion_order_through_conversion() {
        let v = Value::from(json!({"z": 1, "a": [true, null]}));
        let Value::Map(m) = &v else { panic!("expected map") };
        assert_eq!(m.keys().collect::<Vec<_>>(), ["z", "a"]);
        assert_eq!(serde_json::Value::from(&v), json!({"z": 1, "a": [true, null]}));
    }

    #[test]
    fn records_expose_attributes_and_class_name() {
        let r = Value::record("Point", [("x", Value::Int(1))]);
        assert_eq!(r.attr("x"), Some(&Value::Int(1)));
        assert_eq!(r.attr("y"), None);
        assert_eq!(r.type_name(), "Point");
        assert_eq!(Value::Map(IndexMap::new()).attr("x"), None);
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(serde_json::Value::from(&Value::Float(f64::NAN)), json!(null));
    }
}
