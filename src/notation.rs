//! JSON notation for templates.
//!
//! ```text
//! "int" "str" "number" ...      type names (see `Kind::from_name`), plus "any"
//! "# free text"                 documentation, always passes
//! "Person"                      reference to a `$defs` entry
//! [T]                           list of T (exactly one element template)
//! {"$oneOf": [A, B]}            first matching member wins
//! {"$setOf": T}                 set whose members all match T
//! {"$tuple": [A, B, "..."]}     positional; trailing "..." accepts any tail
//! {"$nullable": T}              null or T
//! {"$optional": T}              absent or T
//! {"$strlen": {"min": 1, "max": 8}}
//! {"$decimal": true}            decimal literal string
//! {"$pattern": "^[a-z]+$"}      string matching a regex
//! {"$doc": "text"}              documentation
//! {"id": "int",                 mapping: required key
//!  "age?": "int",               optional key
//!  "name|null": "str",          nullable key
//!  "<str>": "number",           every key/value pair
//!  "$options": ["strict", {"subtypeOf": ["Base"]}]}
//! ```
//!
//! A document is either a bare template or `{"$defs": {...}, "$root": T}`.
//! Definitions are resolved on demand and memoized; a definition that reaches
//! itself through references is rejected.
use std::path::Path as FsPath;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use thiserror::Error;
use tracing::debug;

use crate::path::Path;
use crate::template::{DecimalCheck, MapOption, MappingTemplate, PatternCheck, StringCheck, Template};
use crate::value::Kind;

const REST_MARKER: &str = "...";

#[derive(Debug, Error)]
pub enum NotationError {
    #[error("{at}: {message}")]
    Malformed { at: String, message: String },
    #[error("{at}: unknown template reference {name:?}")]
    UnknownRef { at: String, name: String },
    #[error("template definitions form a cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("{at}: invalid pattern: {source}")]
    Pattern { at: String, source: regex::Error },
    #[error("failed to read template file {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("template is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotationError {
    fn malformed(at: &Path<'_>, message: impl Into<String>) -> Self {
        NotationError::Malformed { at: at.to_string(), message: message.into() }
    }
}

/// A root template together with its named definitions.
#[derive(Clone, Debug)]
pub struct TemplateSet {
    root: Template,
    defs: IndexMap<String, Template>,
}

impl TemplateSet {
    pub fn from_json(doc: &Json) -> Result<Self, NotationError> {
        let empty = Map::new();
        let (raw_defs, raw_root) = match doc {
            Json::Object(map) if map.contains_key("$root") || map.contains_key("$defs") => {
                if let Some(extra) = map.keys().find(|k| *k != "$root" && *k != "$defs") {
                    return Err(NotationError::malformed(
                        &Path::root(),
                        format!("template document has unexpected key {extra:?}"),
                    ));
                }
                let root = map.get("$root").ok_or_else(|| {
                    NotationError::malformed(&Path::root(), "template document with $defs needs a $root")
                })?;
                let defs = match map.get("$defs") {
                    None => &empty,
                    Some(Json::Object(defs)) => defs,
                    Some(_) => return Err(NotationError::malformed(&Path::root(), "$defs must be an object")),
                };
                (defs, root)
            }
            other => (&empty, other),
        };

        let mut loader = Loader { raw: raw_defs, done: IndexMap::new(), active: Vec::new() };
        // resolve every definition, so unused ones are still checked
        for name in raw_defs.keys() {
            loader.definition(name, &Path::root())?;
        }
        let root = loader.template(raw_root, &Path::root())?;
        debug!(definitions = loader.done.len(), "loaded template set");
        Ok(Self { root, defs: loader.done })
    }

    pub fn from_path(path: impl AsRef<FsPath>) -> Result<Self, NotationError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| NotationError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "reading template file");
        source.parse()
    }

    pub fn root(&self) -> &Template { &self.root }

    pub fn get(&self, name: &str) -> Option<&Template> { self.defs.get(name) }

    pub fn definitions(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.defs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromStr for TemplateSet {
    type Err = NotationError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let doc: Json = serde_json::from_str(src)?;
        Self::from_json(&doc)
    }
}

/// Parse a single template with no definitions.
pub fn parse(doc: &Json) -> Result<Template, NotationError> {
    TemplateSet::from_json(doc).map(|set| set.root)
}

// ------------------------------- Loader ----------------------------------- //

struct Loader<'d> {
    raw: &'d Map<String, Json>,
    done: IndexMap<String, Template>,
    /// definitions currently being resolved, outermost first
    active: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StrLen {
    #[serde(default)]
    min: usize,
    max: usize,
}

impl<'d> Loader<'d> {
    fn definition(&mut self, name: &str, at: &Path<'_>) -> Result<Template, NotationError> {
        if let Some(t) = self.done.get(name) {
            return Ok(t.clone());
        }
        if let Some(start) = self.active.iter().position(|n| n == name) {
            let mut cycle = self.active[start..].to_vec();
            cycle.push(name.to_string());
            return Err(NotationError::Cycle(cycle));
        }
        let raw = self.raw.get(name).ok_or_else(|| NotationError::UnknownRef {
            at: at.to_string(),
            name: name.to_string(),
        })?;

        self.active.push(name.to_string());
        let label = format!("$defs.{name}");
        let resolved = self.template(raw, &Path::named(&label));
        self.active.pop();
        let template = resolved?;

        debug!(name, "resolved template definition");
        self.done.insert(name.to_string(), template.clone());
        Ok(template)
    }

    fn template(&mut self, raw: &Json, at: &Path<'_>) -> Result<Template, NotationError> {
        match raw {
            Json::String(s) => self.named(s, at),
            Json::Array(items) => match items.as_slice() {
                [inner] => Ok(Template::seq(self.template(inner, &at.index(0))?)),
                _ => Err(NotationError::malformed(
                    at,
                    format!("list templates take exactly one element template, got {}", items.len()),
                )),
            },
            Json::Object(map) => self.object(map, at),
            other => Err(NotationError::malformed(at, format!("{other} is not a valid type template"))),
        }
    }

    fn named(&mut self, name: &str, at: &Path<'_>) -> Result<Template, NotationError> {
        if let Some(text) = name.strip_prefix('#') {
            return Ok(Template::doc(text.trim()));
        }
        if name == "any" {
            return Ok(Template::Any);
        }
        if let Some(kind) = Kind::from_name(name) {
            return Ok(Template::Type(kind));
        }
        self.definition(name, at)
    }

    fn object(&mut self, map: &Map<String, Json>, at: &Path<'_>) -> Result<Template, NotationError> {
        if map.len() == 1 {
            if let Some((key, arg)) = map.iter().next() {
                if key.starts_with('$') && key != "$options" {
                    return self.directive(key, arg, at);
                }
            }
        }
        self.mapping(map, at).map(Template::from)
    }

    fn directive(&mut self, name: &str, arg: &Json, at: &Path<'_>) -> Result<Template, NotationError> {
        let here = at.key(name);
        match name {
            "$oneOf" => {
                let choices = self.array(arg, &here)?;
                if choices.is_empty() {
                    return Err(NotationError::malformed(&here, "alternation template has no members"));
                }
                let mut out = Vec::with_capacity(choices.len());
                for (i, choice) in choices.iter().enumerate() {
                    out.push(self.template(choice, &here.index(i))?);
                }
                Ok(Template::OneOf(out))
            }
            "$setOf" => Ok(Template::set_of(self.template(arg, &here)?)),
            "$nullable" => Ok(Template::nullable(self.template(arg, &here)?)),
            "$optional" => Ok(Template::optional(self.template(arg, &here)?)),
            "$tuple" => {
                let raw_items = self.array(arg, &here)?;
                let mut items = Vec::with_capacity(raw_items.len());
                let mut rest = false;
                for (i, item) in raw_items.iter().enumerate() {
                    if item.as_str() == Some(REST_MARKER) {
                        if i + 1 != raw_items.len() {
                            return Err(NotationError::malformed(&here.index(i), "\"...\" may only end a tuple"));
                        }
                        rest = true;
                    } else {
                        items.push(self.template(item, &here.index(i))?);
                    }
                }
                Ok(if rest { Template::tuple_rest(items) } else { Template::tuple(items) })
            }
            "$strlen" => {
                let bounds = StrLen::deserialize(arg)
                    .map_err(|e| NotationError::malformed(&here, e.to_string()))?;
                if bounds.min > bounds.max {
                    return Err(NotationError::malformed(&here, "min is larger than max"));
                }
                Ok(Template::custom(StringCheck::between(bounds.min, bounds.max)))
            }
            "$decimal" => Ok(Template::custom(DecimalCheck)),
            "$pattern" => {
                let pattern = arg.as_str()
                    .ok_or_else(|| NotationError::malformed(&here, "pattern must be a string"))?;
                let check = PatternCheck::new(pattern)
                    .map_err(|source| NotationError::Pattern { at: here.to_string(), source })?;
                Ok(Template::custom(check))
            }
            "$doc" => match arg {
                Json::String(text) => Ok(Template::doc(text.clone())),
                _ => Err(NotationError::malformed(&here, "documentation must be a string")),
            },
            other => Err(NotationError::malformed(at, format!("unknown template directive {other:?}"))),
        }
    }

    fn mapping(&mut self, map: &Map<String, Json>, at: &Path<'_>) -> Result<MappingTemplate, NotationError> {
        let mut m = MappingTemplate::new();
        for (key, raw) in map {
            if key == "$options" {
                for option in self.options(raw, &at.key(key))? {
                    m = m.option(option);
                }
                continue;
            }
            if key.starts_with('$') {
                return Err(NotationError::malformed(at, format!("{key:?} is reserved; only $options may appear in a mapping")));
            }
            if let Some(inner) = key.strip_prefix('<').and_then(|k| k.strip_suffix('>')) {
                let key_template = self.named(inner, at)?;
                let value_template = self.template(raw, &at.key(key))?;
                m = m.each(key_template, value_template);
            } else if let Some(name) = key.strip_suffix("|null") {
                m = m.nullable(name, self.template(raw, &at.key(name))?);
            } else if let Some(name) = key.strip_suffix('?') {
                m = m.optional(name, self.template(raw, &at.key(name))?);
            } else {
                m = m.field(key.as_str(), self.template(raw, &at.key(key))?);
            }
        }
        m.is_strict().map_err(|msg| NotationError::malformed(at, msg))?;
        Ok(m)
    }

    fn options(&mut self, raw: &Json, at: &Path<'_>) -> Result<Vec<MapOption>, NotationError> {
        let mut out = Vec::new();
        for (i, option) in self.array(raw, at)?.iter().enumerate() {
            let here = at.index(i);
            match option {
                Json::String(s) if s == "strict" => out.push(MapOption::Strict),
                Json::Object(o) if o.len() == 1 && o.contains_key("subtypeOf") => {
                    let parents = self.array(&o["subtypeOf"], &here)?;
                    let mut resolved = Vec::with_capacity(parents.len());
                    for (j, parent) in parents.iter().enumerate() {
                        resolved.push(self.parent(parent, &here.index(j))?);
                    }
                    out.push(MapOption::SubtypeOf(resolved));
                }
                other => {
                    return Err(NotationError::malformed(&here, format!("unsupported template option {other}")));
                }
            }
        }
        Ok(out)
    }

    fn parent(&mut self, raw: &Json, at: &Path<'_>) -> Result<Arc<MappingTemplate>, NotationError> {
        match self.template(raw, at)? {
            Template::Mapping(m) => Ok(m),
            other => Err(NotationError::malformed(
                at,
                format!("subtype parent must be a mapping template, got {other}"),
            )),
        }
    }

    fn array<'j>(&self, raw: &'j Json, at: &Path<'_>) -> Result<&'j Vec<Json>, NotationError> {
        raw.as_array().ok_or_else(|| NotationError::malformed(at, format!("expected an array, got {raw}")))
    }
}

// ------------------------------- Tests ------------------------------------ //
