use std::error::Error;
use std::fmt;

/// Segment length bound from the address grammar.
const MAX_SEGMENT_LEN: usize = 255;

/// Validates a single path segment against `[A-Za-z0-9_\-]+`, non-empty, ≤255 chars.
pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    let ok = !name.is_empty()
        && name.len() <= MAX_SEGMENT_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(InvalidName { name: name.into() })
    }
}

#[derive(Clone)]
pub struct InvalidName {
    pub name: String,
}

impl Error for InvalidName {}

impl fmt::Display for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "\"{}\": must be 1-{} chars of a-Z, 0-9, _, or -",
            self.name, MAX_SEGMENT_LEN
        )
    }
}

impl fmt::Debug for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Validates a selection path: `/`-separated segments, each a name, `..` or `*`.
pub fn validate_path(path: &str) -> Result<(), InvalidPath> {
    let ok = path.split('/').filter(|s| !s.is_empty()).all(|seg| {
        seg == ".."
            || seg == "*"
            || seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    });
    if ok {
        Ok(())
    } else {
        Err(InvalidPath { path: path.into() })
    }
}

#[derive(Clone)]
pub struct InvalidPath {
    pub path: String,
}

impl Error for InvalidPath {}

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\": invalid selection path", self.path)
    }
}

impl fmt::Debug for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        assert!(validate_name("pinger").is_ok());
        assert!(validate_name("actor_1-b").is_ok());
    }

    #[test]
    fn rejects_empty_and_illegal_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("has/slash").is_err());
    }

    #[test]
    fn rejects_names_over_max_len() {
        let name = "a".repeat(MAX_SEGMENT_LEN + 1);
        assert!(validate_name(&name).is_err());
    }

    #[test]
    fn accepts_selection_wildcards() {
        assert!(validate_path("../*").is_ok());
        assert!(validate_path("child/grandchild").is_ok());
    }
}
