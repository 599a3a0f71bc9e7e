use thiserror::Error;
use crate::path::Path;

/// Informal classification of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    MissingKey,
    /// strict mappings only
    UnexpectedKey,
    /// fixed tuples and call signatures
    LengthMismatch,
    /// no member of an alternation matched
    NoAlternative,
    /// a custom check or predicate rejected the value
    CheckFailed,
    /// the template is broken, not the data
    MalformedTemplate,
}

impl ErrorKind {
    pub fn is_template_error(self) -> bool { self == ErrorKind::MalformedTemplate }
}

/// The single error shape every failure ends in.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct ValidationError {
    path: String,
    kind: ErrorKind,
    message: String,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, path: &Path<'_>, message: impl Into<String>) -> Self {
        Self { path: path.to_string(), kind, message: message.into() }
    }

    /// Error without a location; the matcher attaches the current path.
    pub fn unlocated(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { path: String::new(), kind, message: message.into() }
    }

    pub fn check_failed(path: &Path<'_>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CheckFailed, path, message)
    }

    pub fn malformed(path: &Path<'_>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedTemplate, path, message)
    }

    pub(crate) fn located_at(mut self, path: &Path<'_>) -> Self {
        if self.path.is_empty() {
            self.path = path.to_string();
        }
        self
    }

    pub fn path(&self) -> &str { &self.path }
    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn message(&self) -> &str { &self.message }

    fn render(&self) -> String {
        if self.path.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.path, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_the_path() {
        let root = Path::root();
        let err = ValidationError::new(ErrorKind::MissingKey, &root.key("a"), "should have a child called b");
        assert_eq!(err.to_string(), r#"$["a"]: should have a child called b"#);
    }

    #[test]
    fn located_at_only_fills_an_empty_path() {
        let root = Path::root();
        let here = root.index(2);
        let err = ValidationError::unlocated(ErrorKind::CheckFailed, "nope").located_at(&here);
        assert_eq!(err.path(), "$[2]");
        let again = err.clone().located_at(&root);
        assert_eq!(again.path(), "$[2]");
        assert_eq!(again.to_string(), "$[2]: nope");
    }
}
