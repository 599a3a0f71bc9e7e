//! The recursive matcher.
//!
//! `check` dispatches on the template arm, descends with a child path, and
//! stops at the first failure. Dispatch order matters only for the wrapper
//! arms (`Doc`, `Optional`, `Nullable`, `Any`), which are peeled off before
//! any structural arm is considered.
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use crate::config::Config;
use crate::error::{ErrorKind, ValidationError};
use crate::path::Path;
use crate::template::{Duck, Key, MappingTemplate, Template, TupleTemplate};
use crate::value::Value;

// ------------------------------- Front API -------------------------------- //

#[derive(Clone, Debug, Default)]
pub struct Validator {
    config: Config,
}

impl Validator {
    pub fn new(config: Config) -> Self { Self { config } }

    pub fn config(&self) -> &Config { &self.config }

    pub fn validate(&self, value: &Value, template: &Template) -> Result<(), ValidationError> {
        self.validate_at(value, template, &self.config.root)
    }

    /// Like [`validate`](Self::validate) with an explicit root label (e.g. `sum(b)`).
    pub fn validate_at(&self, value: &Value, template: &Template, label: &str) -> Result<(), ValidationError> {
        if !self.config.enabled {
            return Ok(());
        }
        check(value, template, &Path::named(label))
    }

    pub fn matches(&self, value: &Value, template: &Template) -> bool {
        self.validate(value, template).is_ok()
    }
}

/// Validate with the default configuration.
pub fn validate(value: &Value, template: &Template) -> Result<(), ValidationError> {
    Validator::default().validate(value, template)
}

/// Yes/no form of [`validate`].
pub fn matches(value: &Value, template: &Template) -> bool {
    validate(value, template).is_ok()
}

// ------------------------------- Dispatch --------------------------------- //

fn check(value: &Value, template: &Template, path: &Path<'_>) -> Result<(), ValidationError> {
    match template {
        Template::Doc(_) => Ok(()),
        // present, so only the inner template matters
        Template::Optional(inner) => check(value, inner, path),
        Template::Nullable(inner) => {
            if value.is_null() { Ok(()) } else { check(value, inner, path) }
        }
        Template::Any => Ok(()),
        Template::Custom(c) => guarded(path, || c.check(value, path)).map_err(|e| e.located_at(path)),
        Template::Predicate(p) => guarded(path, || {
            if p.test(value) {
                Ok(())
            } else {
                Err(ValidationError::check_failed(path, format!("failed {} check", p.name())))
            }
        }),
        Template::Duck(d) => check_duck(value, d, path, &mut HashSet::new()),
        Template::OneOf(choices) => check_one_of(value, choices, path),
        Template::SetOf(inner) => {
            let Value::Set(items) = value else {
                return Err(mismatch(value, template, path));
            };
            for (i, item) in items.iter().enumerate() {
                check(item, inner, &path.index(i))?;
            }
            Ok(())
        }
        Template::Mapping(m) => check_mapping(value, m, path),
        Template::Sequence(inner) => {
            let Value::List(items) = value else {
                return Err(ValidationError::new(
                    ErrorKind::TypeMismatch,
                    path,
                    format!("is {} but should be a list", value.type_name()),
                ));
            };
            for (i, item) in items.iter().enumerate() {
                check(item, inner, &path.index(i))?;
            }
            Ok(())
        }
        Template::Tuple(t) => check_tuple(value, t, template, path),
        Template::Type(kind) => {
            if kind.admits(value) { Ok(()) } else { Err(mismatch(value, template, path)) }
        }
    }
}

fn mismatch(value: &Value, template: &Template, path: &Path<'_>) -> ValidationError {
    ValidationError::new(
        ErrorKind::TypeMismatch,
        path,
        format!("is {} but should be {template}", value.type_name()),
    )
}

// ------------------------------- Arms ------------------------------------- //

fn check_one_of(value: &Value, choices: &[Template], path: &Path<'_>) -> Result<(), ValidationError> {
    if choices.is_empty() {
        return Err(ValidationError::malformed(path, "alternation template has no members"));
    }
    let mut broken: Option<ValidationError> = None;
    for choice in choices {
        match check(value, choice, path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind().is_template_error() && broken.is_none() => broken = Some(e),
            Err(_) => {}
        }
    }
    // a broken member outranks an ordinary miss
    if let Some(e) = broken {
        return Err(e);
    }
    Err(ValidationError::new(
        ErrorKind::NoAlternative,
        path,
        format!("is {} but should be {}", value.type_name(), Template::OneOf(choices.to_vec())),
    ))
}

fn check_mapping(value: &Value, m: &MappingTemplate, path: &Path<'_>) -> Result<(), ValidationError> {
    let strict = m.is_strict().map_err(|msg| ValidationError::malformed(path, msg))?;
    let Value::Map(obj) = value else {
        return Err(ValidationError::new(
            ErrorKind::TypeMismatch,
            path,
            format!("is {} but should be a map", value.type_name()),
        ));
    };
    let effective = m.effective();

    if strict {
        if let Some(key) = obj.keys().find(|k| !effective.declares(k)) {
            return Err(ValidationError::new(
                ErrorKind::UnexpectedKey,
                path,
                format!("should not have a child called {key:?}"),
            ));
        }
    }

    for entry in effective.entries() {
        match &entry.key {
            Key::Name(name) => match obj.get(name) {
                None if entry.value.is_optional() => {}
                None => return Err(missing_key(name, path)),
                Some(v) => check(v, &entry.value, &path.key(name))?,
            },
            Key::Optional(name) => {
                if let Some(v) = obj.get(name) {
                    check(v, &entry.value, &path.key(name))?;
                }
            }
            Key::Nullable(name) => match obj.get(name) {
                None => return Err(missing_key(name, path)),
                Some(Value::Null) => {}
                Some(v) => check(v, &entry.value, &path.key(name))?,
            },
            Key::Each(key_template) => {
                for (k, v) in obj {
                    check(&Value::Str(k.clone()), key_template, &path.key_of(k))?;
                    check(v, &entry.value, &path.key(k))?;
                }
            }
        }
    }
    Ok(())
}

fn missing_key(name: &str, path: &Path<'_>) -> ValidationError {
    ValidationError::new(ErrorKind::MissingKey, path, format!("should have a child called {name:?}"))
}

fn check_tuple(value: &Value, t: &TupleTemplate, template: &Template, path: &Path<'_>) -> Result<(), ValidationError> {
    let Value::List(items) = value else {
        return Err(mismatch(value, template, path));
    };
    for (i, expect) in t.items.iter().enumerate() {
        match items.get(i) {
            None if expect.is_optional() => {}
            None => {
                return Err(ValidationError::new(
                    ErrorKind::LengthMismatch,
                    path,
                    format!("has {} elements but should be {template}; [{i}] is omitted", items.len()),
                ));
            }
            // position must exist, nothing else to check
            Some(_) if matches!(expect, Template::Any) => {}
            Some(item) => check(item, expect, &path.index(i))?,
        }
    }
    if !t.rest && items.len() > t.items.len() {
        return Err(ValidationError::new(
            ErrorKind::LengthMismatch,
            path,
            format!("has {} elements but should be {template}", items.len()),
        ));
    }
    Ok(())
}

fn check_duck<'t>(
    value: &Value,
    duck: &'t Duck,
    path: &Path<'_>,
    checked: &mut HashSet<&'t str>,
) -> Result<(), ValidationError> {
    for (name, template) in duck.attributes() {
        if !checked.insert(name.as_str()) {
            continue;
        }
        match value.attr(name) {
            None if template.is_optional() => {}
            None => {
                return Err(ValidationError::new(
                    ErrorKind::MissingKey,
                    path,
                    format!("is {} and does not have a {name}", value.type_name()),
                ));
            }
            Some(v) => check(v, template, &path.attr(name))?,
        }
    }
    for parent in duck.parents() {
        check_duck(value, parent, path, checked)?;
    }
    Ok(())
}

// ------------------------------- Guards ----------------------------------- //

/// Run a user callback; a panic inside it becomes a located template error.
fn guarded<F>(path: &Path<'_>, f: F) -> Result<(), ValidationError>
where
    F: FnOnce() -> Result<(), ValidationError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(ValidationError::malformed(
            path,
            format!("internal error: {}", panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in user check".to_string()
    }
}

// ------------------------------- Tests ------------------------------------ //
