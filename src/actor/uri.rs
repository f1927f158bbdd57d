use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use uuid::Uuid;

/// A rooted path, `/root/(segment/)*segment`. Interned behind an `Arc`
/// so cloning an address is cheap regardless of depth.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ActorPath(Arc<String>);

impl ActorPath {
    pub fn new(path: impl Into<String>) -> Self {
        ActorPath(Arc::new(path.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a validated child segment, producing the child's path.
    pub fn child(&self, name: &str) -> ActorPath {
        if self.0.ends_with('/') {
            ActorPath::new(format!("{}{}", self.0, name))
        } else {
            ActorPath::new(format!("{}/{}", self.0, name))
        }
    }

    pub fn parent(&self) -> Option<ActorPath> {
        let s = self.0.trim_end_matches('/');
        let idx = s.rfind('/')?;
        if idx == 0 {
            None
        } else {
            Some(ActorPath::new(&s[..idx]))
        }
    }
}

impl Deref for ActorPath {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> From<&'a str> for ActorPath {
    fn from(s: &'a str) -> Self {
        ActorPath::new(s)
    }
}

impl From<String> for ActorPath {
    fn from(s: String) -> Self {
        ActorPath::new(s)
    }
}

/// The other half of an `ActorAddress`: distinguishes a normal, tagged
/// incarnation from the perpetual sentinel used for well-known actors and
/// dead letters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Incarnation {
    Tagged(u32),
    Perpetual,
}

impl Incarnation {
    pub fn fresh() -> Self {
        Incarnation::Tagged(Uuid::new_v4().as_u128() as u32)
    }

    pub fn is_perpetual(&self) -> bool {
        matches!(self, Incarnation::Perpetual)
    }
}

impl fmt::Debug for Incarnation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Incarnation::Tagged(tag) => write!(f, "{:08x}", tag),
            Incarnation::Perpetual => f.write_str("perpetual"),
        }
    }
}

pub type ActorId = u32;

/// An actor's full address: path plus incarnation. `host` is carried for
/// display/debugging only — cross-node addressing is out of scope.
#[derive(Clone)]
pub struct ActorUri {
    pub path: ActorPath,
    pub name: Arc<String>,
    pub host: Arc<str>,
    pub incarnation: Incarnation,
}

impl ActorUri {
    pub fn root(host: Arc<str>, name: &str) -> ActorUri {
        ActorUri {
            path: ActorPath::new(format!("/{}", name)),
            name: Arc::new(name.to_string()),
            host,
            incarnation: Incarnation::Perpetual,
        }
    }

    pub fn child(&self, name: &str, well_known: bool) -> ActorUri {
        ActorUri {
            path: self.path.child(name),
            name: Arc::new(name.to_string()),
            host: self.host.clone(),
            incarnation: if well_known {
                Incarnation::Perpetual
            } else {
                Incarnation::fresh()
            },
        }
    }
}

impl PartialEq for ActorUri {
    fn eq(&self, other: &ActorUri) -> bool {
        self.path == other.path && self.incarnation == other.incarnation
    }
}

impl Eq for ActorUri {}

impl Hash for ActorUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl fmt::Display for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.incarnation {
            Incarnation::Perpetual => write!(f, "{}", self.path),
            Incarnation::Tagged(tag) => write!(f, "{}#{:x}", self.path, tag),
        }
    }
}

impl fmt::Debug for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActorUri[{}://{}]", self.host, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpetual_uri_has_no_incarnation_suffix() {
        let root = ActorUri::root(Arc::from("localhost"), "user");
        assert_eq!(root.to_string(), "/user");
    }

    #[test]
    fn tagged_uri_renders_incarnation_suffix() {
        let root = ActorUri::root(Arc::from("localhost"), "user");
        let child = root.child("worker", false);
        assert!(child.to_string().starts_with("/user/worker#"));
    }

    #[test]
    fn equality_ignores_host_and_name_but_not_incarnation() {
        let root = ActorUri::root(Arc::from("localhost"), "user");
        let a = root.child("worker", false);
        let b = root.child("worker", false);
        assert_ne!(a, b);
    }
}
