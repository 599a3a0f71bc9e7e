//! Template model: declarative descriptions of the shape a value must have.
//!
//! A `Template` is a closed sum type, one arm per kind of shape description.
//! Templates are built once, never mutated afterwards, and may be shared
//! freely across threads and validation calls (`Template: Send + Sync`).
//!
//! Layout:
//! - `mapping`: mapping templates, keys/options and the subtype resolver
//! - `check`:   the custom-check protocol plus a few stock checks
//! - `duck`:    attribute-based structural checks with composition
pub mod mapping;
pub mod check;
pub mod duck;

use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::path::Path;
use crate::value::{Kind, Value};

pub use mapping::{Effective, Entry, Key, MapOption, MappingTemplate};
pub use check::{Check, DecimalCheck, PatternCheck, StringCheck};
pub use duck::Duck;

#[derive(Clone, Debug)]
pub enum Template {
    /// Documentation only; always passes.
    Doc(String),
    Any,
    /// Runtime type (or a subtype of it).
    Type(Kind),
    /// At least one member must match; members are tried in order.
    OneOf(Vec<Template>),
    /// Set-like value whose every element matches.
    SetOf(Box<Template>),
    Mapping(Arc<MappingTemplate>),
    /// Homogeneous list.
    Sequence(Box<Template>),
    Tuple(TupleTemplate),
    /// Null, or else the inner template.
    Nullable(Box<Template>),
    /// Absent, or else the inner template.
    Optional(Box<Template>),
    Custom(Arc<dyn Check>),
    Duck(Arc<Duck>),
    Predicate(Predicate),
}

/// Positional template. With `rest`, any trailing elements past `items` are accepted.
#[derive(Clone, Debug)]
pub struct TupleTemplate {
    pub items: Vec<Template>,
    pub rest: bool,
}

/// Named escape hatch: passes iff the closure returns true.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

// ---------------------------- Constructors -------------------------------- //

impl Template {
    pub fn doc(text: impl Into<String>) -> Self { Template::Doc(text.into()) }

    pub fn one_of<I, T>(choices: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Template>,
    {
        Template::OneOf(choices.into_iter().map(Into::into).collect())
    }

    pub fn set_of(inner: impl Into<Template>) -> Self { Template::SetOf(Box::new(inner.into())) }
    pub fn seq(inner: impl Into<Template>) -> Self { Template::Sequence(Box::new(inner.into())) }
    pub fn nullable(inner: impl Into<Template>) -> Self { Template::Nullable(Box::new(inner.into())) }
    pub fn optional(inner: impl Into<Template>) -> Self { Template::Optional(Box::new(inner.into())) }

    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Template>,
    {
        Template::Tuple(TupleTemplate { items: items.into_iter().map(Into::into).collect(), rest: false })
    }

    /// Tuple terminated by a rest marker.
    pub fn tuple_rest<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Template>,
    {
        Template::Tuple(TupleTemplate { items: items.into_iter().map(Into::into).collect(), rest: true })
    }

    pub fn custom(check: impl Check + 'static) -> Self { Template::Custom(Arc::new(check)) }

    pub fn predicate<F>(name: impl Into<Arc<str>>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Template::Predicate(Predicate { name: name.into(), test: Arc::new(test) })
    }

    pub fn is_optional(&self) -> bool { matches!(self, Template::Optional(_)) }

    /// Report definition errors without needing a value to validate.
    ///
    /// Catches duplicate `Strict` options and empty alternations anywhere in
    /// the template, including inside subtype parents and duck attributes.
    pub fn verify(&self) -> Result<(), ValidationError> {
        self.verify_at(&Path::root())
    }

    fn verify_at(&self, path: &Path<'_>) -> Result<(), ValidationError> {
        match self {
            Template::Doc(_) | Template::Any | Template::Type(_)
            | Template::Custom(_) | Template::Predicate(_) => Ok(()),
            Template::OneOf(choices) => {
                if choices.is_empty() {
                    return Err(ValidationError::malformed(path, "alternation template has no members"));
                }
                choices.iter().try_for_each(|c| c.verify_at(path))
            }
            Template::SetOf(inner) | Template::Sequence(inner)
            | Template::Nullable(inner) | Template::Optional(inner) => inner.verify_at(path),
            Template::Tuple(t) => {
                for (i, item) in t.items.iter().enumerate() {
                    item.verify_at(&path.index(i))?;
                }
                Ok(())
            }
            Template::Mapping(m) => m.verify_at(path),
            Template::Duck(d) => d.verify_at(path),
        }
    }
}

impl From<Kind> for Template {
    fn from(kind: Kind) -> Self { Template::Type(kind) }
}

impl From<MappingTemplate> for Template {
    fn from(m: MappingTemplate) -> Self { Template::Mapping(Arc::new(m)) }
}

impl From<Arc<MappingTemplate>> for Template {
    fn from(m: Arc<MappingTemplate>) -> Self { Template::Mapping(m) }
}

impl From<Duck> for Template {
    fn from(d: Duck) -> Self { Template::Duck(Arc::new(d)) }
}

impl Predicate {
    pub fn name(&self) -> &str { &self.name }
    pub fn test(&self, value: &Value) -> bool { (self.test)(value) }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

// ------------------------------ Display ----------------------------------- //

/// Compact rendering used inside error messages.
impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Template]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Template::Doc(text) => write!(f, "# {text}"),
            Template::Any => f.write_str("any"),
            Template::Type(kind) => write!(f, "{kind}"),
            Template::OneOf(choices) => {
                f.write_str("one of (")?;
                list(f, choices)?;
                f.write_str(")")
            }
            Template::SetOf(inner) => write!(f, "{{{inner}}}"),
            Template::Mapping(_) => f.write_str("map"),
            Template::Sequence(inner) => write!(f, "[{inner}]"),
            Template::Tuple(t) => {
                f.write_str("(")?;
                list(f, &t.items)?;
                if t.rest {
                    f.write_str(if t.items.is_empty() { "..." } else { ", ..." })?;
                }
                f.write_str(")")
            }
            Template::Nullable(inner) => write!(f, "{inner}|null"),
            Template::Optional(inner) => write!(f, "{inner}?"),
            Template::Custom(check) => f.write_str(&check.describe()),
            Template::Duck(_) => f.write_str("object with attributes"),
            Template::Predicate(p) => write!(f, "<{}>", p.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_compact() {
        let t = Template::seq(Template::one_of([Kind::Int, Kind::Str]));
        assert_eq!(t.to_string(), "[one of (int, str)]");
        assert_eq!(Template::tuple_rest([Kind::Int]).to_string(), "(int, ...)");
        assert_eq!(Template::nullable(Kind::Float).to_string(), "float|null");
        assert_eq!(Template::set_of(Kind::Str).to_string(), "{str}");
    }

    #[test]
    fn verify_rejects_empty_alternation() {
        let t = Template::seq(Template::OneOf(Vec::new()));
        let err = t.verify().unwrap_err();
        assert!(err.kind().is_template_error());
    }

    #[test]
    fn verify_reports_nested_duplicate_strict() {
        let inner = MappingTemplate::new().field("a", Kind::Int).strict().strict();
        let outer = MappingTemplate::new().field("inner", inner);
        let err = Template::from(outer).verify().unwrap_err();
        assert!(err.kind().is_template_error());
        assert_eq!(err.path(), r#"$["inner"]"#);
    }

    #[test]
    fn templates_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }
}
