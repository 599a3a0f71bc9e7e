//! Mapping templates and the subtype resolver.
//!
//! A mapping template is an ordered list of `(key, template)` entries plus an
//! option set. `SubtypeOf` parents are flattened into one effective entry list
//! on first use and memoized; resolution is pure, so a race between two first
//! uses just computes the same list twice and keeps one.
use std::sync::Arc;
use once_cell::sync::OnceCell;

use super::Template;
use crate::error::ValidationError;
use crate::path::Path;

#[derive(Clone, Debug)]
pub enum Key {
    /// Required key.
    Name(String),
    /// Skipped entirely when absent.
    Optional(String),
    /// Must be present; skipped when its value is null.
    Nullable(String),
    /// Every key/value pair of the value must match `(this key template, entry template)`.
    Each(Template),
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub key: Key,
    pub value: Template,
}

#[derive(Clone, Debug)]
pub enum MapOption {
    /// No keys beyond the declared ones.
    Strict,
    /// Inherit the parents' entries; own entries win on collision.
    SubtypeOf(Vec<Arc<MappingTemplate>>),
}

#[derive(Debug, Default)]
pub struct MappingTemplate {
    entries: Vec<Entry>,
    options: Vec<MapOption>,
    effective: OnceCell<Arc<Effective>>,
}

/// Flattened entries of a mapping template after subtype resolution.
#[derive(Clone, Debug, Default)]
pub struct Effective {
    entries: Vec<Entry>,
}

// ------------------------------- Builder ---------------------------------- //

impl MappingTemplate {
    pub fn new() -> Self { Self::default() }

    pub fn entry(mut self, key: Key, value: impl Into<Template>) -> Self {
        self.entries.push(Entry { key, value: value.into() });
        self
    }

    pub fn field(self, name: impl Into<String>, value: impl Into<Template>) -> Self {
        self.entry(Key::Name(name.into()), value)
    }

    pub fn optional(self, name: impl Into<String>, value: impl Into<Template>) -> Self {
        self.entry(Key::Optional(name.into()), value)
    }

    pub fn nullable(self, name: impl Into<String>, value: impl Into<Template>) -> Self {
        self.entry(Key::Nullable(name.into()), value)
    }

    pub fn each(self, key: impl Into<Template>, value: impl Into<Template>) -> Self {
        self.entry(Key::Each(key.into()), value)
    }

    pub fn option(mut self, option: MapOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn strict(self) -> Self { self.option(MapOption::Strict) }

    pub fn subtype_of<I>(self, parents: I) -> Self
    where
        I: IntoIterator<Item = Arc<MappingTemplate>>,
    {
        self.option(MapOption::SubtypeOf(parents.into_iter().collect()))
    }

    /// Wrap as a template without checking it; see [`try_build`](Self::try_build).
    pub fn build(self) -> Template { Template::from(self) }

    /// Like [`build`](Self::build), but reports definition errors (a second
    /// `Strict`, an empty alternation anywhere inside) up front.
    pub fn try_build(self) -> Result<Template, ValidationError> {
        let template = self.build();
        template.verify()?;
        Ok(template)
    }

    pub fn entries(&self) -> &[Entry] { &self.entries }
    pub fn options(&self) -> &[MapOption] { &self.options }
}

// ------------------------------ Resolution -------------------------------- //

impl MappingTemplate {
    /// Whether `Strict` is set. Declaring it twice is a definition error.
    pub fn is_strict(&self) -> Result<bool, String> {
        let count = self.options.iter().filter(|o| matches!(o, MapOption::Strict)).count();
        match count {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err("template specifies strict option twice".to_string()),
        }
    }

    /// Effective entries: parents first (depth-first, in declaration order),
    /// then this template's own entries, each overriding by key name.
    pub fn effective(&self) -> Arc<Effective> {
        self.effective.get_or_init(|| Arc::new(self.resolve())).clone()
    }

    fn resolve(&self) -> Effective {
        let mut out = Effective::default();
        for option in &self.options {
            if let MapOption::SubtypeOf(parents) = option {
                for parent in parents {
                    for entry in parent.effective().entries() {
                        out.insert(entry.clone());
                    }
                }
            }
        }
        for entry in &self.entries {
            out.insert(entry.clone());
        }
        out
    }

    pub(crate) fn verify_at(&self, path: &Path<'_>) -> Result<(), ValidationError> {
        self.is_strict().map_err(|msg| ValidationError::malformed(path, msg))?;
        for option in &self.options {
            if let MapOption::SubtypeOf(parents) = option {
                for parent in parents {
                    parent.verify_at(path)?;
                }
            }
        }
        for entry in &self.entries {
            match &entry.key {
                Key::Name(name) | Key::Optional(name) | Key::Nullable(name) => {
                    entry.value.verify_at(&path.key(name))?;
                }
                Key::Each(key) => {
                    key.verify_at(path)?;
                    entry.value.verify_at(path)?;
                }
            }
        }
        Ok(())
    }
}

impl Key {
    /// Literal key name, if this is not a key template.
    pub fn name(&self) -> Option<&str> {
        match self {
            Key::Name(n) | Key::Optional(n) | Key::Nullable(n) => Some(n),
            Key::Each(_) => None,
        }
    }
}

impl Effective {
    fn insert(&mut self, entry: Entry) {
        if let Some(name) = entry.key.name() {
            if let Some(slot) = self.entries.iter_mut().find(|e| e.key.name() == Some(name)) {
                *slot = entry;
                return;
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] { &self.entries }

    /// Is `key` one of the literal keys (required, optional or nullable)?
    pub fn declares(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key.name() == Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    fn names(e: &Effective) -> Vec<String> {
        e.entries().iter().map(|e| match &e.key {
            Key::Name(n) => n.clone(),
            Key::Optional(n) => format!("{n}?"),
            Key::Nullable(n) => format!("{n}|null"),
            Key::Each(t) => format!("<{t}>"),
        }).collect()
    }

    #[test]
    fn parents_resolve_depth_first_and_own_entries_win() {
        let base = Arc::new(MappingTemplate::new().field("id", Kind::Int).field("kind", Kind::Str));
        let parent = Arc::new(MappingTemplate::new().subtype_of([base]).field("kind", Kind::Int));
        let child = MappingTemplate::new()
            .strict()
            .subtype_of([parent])
            .optional("kind", Kind::Float)
            .field("x", Kind::Int);
        let eff = child.effective();
        assert_eq!(names(&eff), ["id", "kind?", "x"]);
        let kind = eff.entries().iter().find(|e| e.key.name() == Some("kind")).unwrap();
        assert_eq!(kind.value.to_string(), "float");
    }

    #[test]
    fn resolution_is_idempotent() {
        let base = Arc::new(MappingTemplate::new().field("id", Kind::Int));
        let child = MappingTemplate::new().subtype_of([base]).field("x", Kind::Int);
        let first = child.effective();
        let second = child.effective();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(names(&first), names(&child.resolve()));
    }

    #[test]
    fn key_templates_accumulate_instead_of_overriding() {
        let base = Arc::new(MappingTemplate::new().each(Kind::Str, Kind::Int));
        let child = MappingTemplate::new().subtype_of([base]).each(Kind::Str, Kind::Number);
        assert_eq!(names(&child.effective()), ["<str>", "<str>"]);
    }

    #[test]
    fn strict_twice_is_a_definition_error() {
        assert_eq!(MappingTemplate::new().strict().is_strict(), Ok(true));
        assert!(MappingTemplate::new().strict().strict().is_strict().is_err());
        assert_eq!(MappingTemplate::new().is_strict(), Ok(false));
    }

    #[test]
    fn try_build_reports_strict_twice_without_a_value() {
        let err = MappingTemplate::new().field("a", Kind::Int).strict().strict().try_build().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedTemplate);
        assert_eq!(err.to_string(), "$: template specifies strict option twice");
        assert!(MappingTemplate::new().strict().field("a", Kind::Int).try_build().is_ok());
    }
}
