//! Interned command identities.
//!
//! A [`Command`] is compared by identity: two handles are equal only when
//! they come from the same registry entry. A [`CommandRegistry`] interns
//! names so asking twice for `"deploy"` yields equal handles, and owns one
//! global identity that is the implicit root of every command tree.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;

enum Identity {
    Global,
    Named(String),
}

/// Interned command identity.
#[derive(Clone)]
pub struct Command(Arc<Identity>);

impl Command {
    fn named(name: &str) -> Self {
        Self(Arc::new(Identity::Named(name.to_string())))
    }

    fn global() -> Self {
        Self(Arc::new(Identity::Global))
    }

    /// The command name, or `None` for the global root.
    pub fn name(&self) -> Option<&str> {
        match self.0.as_ref() {
            Identity::Global => None,
            Identity::Named(name) => Some(name),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.0.as_ref(), Identity::Global)
    }

    /// Case-sensitive name comparison. The global root matches nothing.
    pub fn matches(&self, token: &str) -> bool {
        self.name() == Some(token)
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Command {}

impl Hash for Command {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_ref() {
            Identity::Global => write!(f, "<global>"),
            Identity::Named(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
    }
}

/// Name-to-identity cache for one command tree.
///
/// Safe to share between threads; lookups from concurrent runs intern into
/// the same map.
pub struct CommandRegistry {
    global: Command,
    names: Mutex<HashMap<String, Command>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            global: Command::global(),
            names: Mutex::new(HashMap::new()),
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity for `name`, created on first use.
    pub fn get(&self, name: &str) -> Command {
        self.names
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Command::named(name))
            .clone()
    }

    /// Same as [`get`](Self::get); reads better at registration sites.
    pub fn create(&self, name: &str) -> Command {
        self.get(name)
    }

    /// The root identity of this registry.
    pub fn global(&self) -> Command {
        self.global.clone()
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.lock().is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("names", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn same_name_same_identity() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.get("run"), registry.get("run"));
        assert_eq!(registry.create("run"), registry.get("run"));
        assert_ne!(registry.get("run"), registry.get("stop"));
    }

    #[test]
    fn registries_do_not_share_identities() {
        let a = CommandRegistry::new();
        let b = CommandRegistry::new();
        assert_ne!(a.get("run"), b.get("run"));
        assert_ne!(a.global(), b.global());
    }

    #[test]
    fn global_matches_nothing() {
        let registry = CommandRegistry::new();
        let global = registry.global();
        assert!(global.is_global());
        assert!(global.name().is_none());
        for token in ["", "--", "global", "<global>"] {
            assert!(!global.matches(token));
        }
        assert_ne!(global, registry.get("global"));
    }

    #[test]
    fn matching_is_exact() {
        let registry = CommandRegistry::new();
        let run = registry.get("run");
        assert!(run.matches("run"));
        assert!(!run.matches("Run"));
        assert!(!run.matches("run "));
    }

    #[test]
    fn hashes_by_identity() {
        let registry = CommandRegistry::new();
        let set: HashSet<Command> = ["a", "b", "a"].iter().map(|n| registry.get(n)).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn concurrent_interning() {
        let registry = Arc::new(CommandRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.get("shared"))
            })
            .collect();
        let commands: Vec<Command> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(commands.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn display_forms() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.get("run").to_string(), "run");
        assert_eq!(registry.global().to_string(), "<global>");
        assert_eq!(format!("{:?}", registry.get("run")), "Command(run)");
    }
}
