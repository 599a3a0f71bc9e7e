//! Declarative structural validation for decoded JSON-like data.
//!
//! Describe the expected shape as a [`Template`], hand it a [`Value`], and get
//! back either `Ok(())` or a [`ValidationError`] naming the exact path and
//! reason of the first divergence.
//!
//! ```
//! use json_duck::{matches, validate, Kind, MappingTemplate, Template, Value};
//!
//! let person = MappingTemplate::new()
//!     .field("id", Kind::Int)
//!     .nullable("name", Kind::Str)
//!     .optional("age", Kind::Int)
//!     .build();
//! let people = MappingTemplate::new().field("person", Template::seq(person)).build();
//!
//! let ok = Value::from(serde_json::json!({"person": [{"id": 1, "name": null}]}));
//! assert!(matches(&ok, &people));
//!
//! let bad = Value::from(serde_json::json!({"person": [{"id": "x"}]}));
//! let err = validate(&bad, &people).unwrap_err();
//! assert_eq!(err.path(), r#"$["person"][0]["id"]"#);
//! ```
//!
//! Templates can also be written as JSON, see [`notation`].
pub mod value;
pub mod path;
pub mod error;
pub mod template;
pub mod matcher;
pub mod config;
pub mod notation;
pub mod json;
pub mod signature;

pub use config::Config;
pub use error::{ErrorKind, ValidationError};
pub use matcher::{matches, validate, Validator};
pub use notation::{NotationError, TemplateSet};
pub use path::{Path, Segment};
pub use signature::Signature;
pub use template::{
    Check, DecimalCheck, Duck, Key, MapOption, MappingTemplate, PatternCheck, StringCheck, Template,
    TupleTemplate,
};
pub use value::{Kind, Record, Value};
