//! Structural ("duck") checks: a value qualifies by the attributes it carries.
//!
//! A duck may extend other ducks. The matcher walks own attributes first, then
//! each parent depth-first, and checks every attribute name at most once per
//! walk (the first declaration wins). The set of already-checked names lives
//! in the walk, never in the template.
use std::sync::Arc;
use indexmap::IndexMap;

use super::Template;
use crate::error::ValidationError;
use crate::path::Path;

#[derive(Debug, Default)]
pub struct Duck {
    attributes: IndexMap<String, Template>,
    extends: Vec<Arc<Duck>>,
}

impl Duck {
    pub fn new() -> Self { Self::default() }

    /// Declare an attribute. Wrap the template in `Template::Optional` to allow absence.
    pub fn attr(mut self, name: impl Into<String>, template: impl Into<Template>) -> Self {
        self.attributes.insert(name.into(), template.into());
        self
    }

    pub fn extends(mut self, parent: Arc<Duck>) -> Self {
        self.extends.push(parent);
        self
    }

    pub fn build(self) -> Template { Template::from(self) }

    pub fn attributes(&self) -> &IndexMap<String, Template> { &self.attributes }
    pub fn parents(&self) -> &[Arc<Duck>] { &self.extends }

    pub(crate) fn verify_at(&self, path: &Path<'_>) -> Result<(), ValidationError> {
        for (name, template) in &self.attributes {
            template.verify_at(&path.attr(name))?;
        }
        self.extends.iter().try_for_each(|p| p.verify_at(path))
    }
}
