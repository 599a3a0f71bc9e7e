//! Location of the sub-value currently being examined.
//!
//! A `Path` is a borrowed, append-only chain: each child points at its parent
//! frame on the stack, so deriving a child never touches the parent and an
//! alternation can retry every member from the same parent path. The chain is
//! only rendered to a `String` when an error is built.
use std::fmt;

#[derive(Clone, Copy, Debug)]
pub struct Path<'a> {
    parent: Option<&'a Path<'a>>,
    segment: Segment<'a>,
}

#[derive(Clone, Copy, Debug)]
pub enum Segment<'a> {
    /// Label of the root (`$` by default, `sum(b)` for call boundaries, ...).
    Root(&'a str),
    /// `["name"]`
    Key(&'a str),
    /// `[3]`
    Index(usize),
    /// `.name`
    Attr(&'a str),
    /// `[key "name"]`: the key itself, checked against a key template.
    KeyOf(&'a str),
}

impl<'a> Path<'a> {
    pub const DEFAULT_ROOT: &'static str = "$";

    pub fn root() -> Path<'static> {
        Path { parent: None, segment: Segment::Root(Path::DEFAULT_ROOT) }
    }

    pub fn named(label: &'a str) -> Self {
        Path { parent: None, segment: Segment::Root(label) }
    }

    pub fn child(&'a self, segment: Segment<'a>) -> Path<'a> {
        Path { parent: Some(self), segment }
    }

    pub fn key(&'a self, name: &'a str) -> Path<'a> { self.child(Segment::Key(name)) }
    pub fn index(&'a self, i: usize) -> Path<'a> { self.child(Segment::Index(i)) }
    pub fn attr(&'a self, name: &'a str) -> Path<'a> { self.child(Segment::Attr(name)) }
    pub fn key_of(&'a self, name: &'a str) -> Path<'a> { self.child(Segment::KeyOf(name)) }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            parent.fmt(f)?;
        }
        match self.segment {
            Segment::Root(label) => f.write_str(label),
            Segment::Key(name) => write!(f, "[{name:?}]"),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Attr(name) => write!(f, ".{name}"),
            Segment::KeyOf(name) => write!(f, "[key {name:?}]"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_indices_and_attributes() {
        let root = Path::root();
        let person = root.key("person");
        let first = person.index(0);
        let id = first.key("id");
        assert_eq!(id.to_string(), r#"$["person"][0]["id"]"#);
        let name = first.attr("name");
        assert_eq!(name.to_string(), r#"$["person"][0].name"#);
    }

    #[test]
    fn deriving_a_child_leaves_the_parent_intact() {
        let root = Path::named("json validation");
        let a = root.key("a");
        let b = root.key("b");
        assert_eq!(a.to_string(), r#"json validation["a"]"#);
        assert_eq!(b.to_string(), r#"json validation["b"]"#);
        assert_eq!(root.to_string(), "json validation");
    }

    #[test]
    fn key_segments_render_distinctly_from_value_segments() {
        let root = Path::root();
        assert_eq!(root.key_of("k").to_string(), r#"$[key "k"]"#);
    }
}
