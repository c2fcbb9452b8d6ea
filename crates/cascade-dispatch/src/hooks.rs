//! Before and after hooks.
//!
//! Every level between the root and the resolved command may carry one
//! hook of each kind. They run around the handler:
//!
//! ```text
//! resolved leaf
//!   → before hooks, root to leaf  ← (validation, setup)
//!   → handler
//!   → after hooks, leaf to root   ← (cleanup, reporting)
//! ```
//!
//! A failing before hook skips the remaining before hooks, the handler and
//! every after hook. A failing handler skips every after hook. Hooks are
//! always called with the resolved command, not with the level that owns
//! them.

use std::fmt;
use std::rc::Rc;

use cascade_options::BoxError;
use thiserror::Error;

use crate::{Command, CommandStore};

/// Hook callback: resolved command, the invocation's stores and the tail.
pub type HookFn = Rc<dyn Fn(&Command, &CommandStore, &[String]) -> anyhow::Result<()>>;

/// When a hook ran relative to the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
        }
    }
}

/// A hook failed.
#[derive(Debug, Error)]
#[error("hook error ({phase}) on {level}: {message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    pub phase: HookPhase,
    /// The level whose hook failed.
    pub level: Command,
    #[source]
    pub source: Option<BoxError>,
}

impl HookError {
    pub fn before(level: &Command, cause: anyhow::Error) -> Self {
        Self::new(HookPhase::Before, level, cause)
    }

    pub fn after(level: &Command, cause: anyhow::Error) -> Self {
        Self::new(HookPhase::After, level, cause)
    }

    fn new(phase: HookPhase, level: &Command, cause: anyhow::Error) -> Self {
        Self {
            message: cause.to_string(),
            phase,
            level: level.clone(),
            source: Some(cause.into()),
        }
    }
}

/// The before/after pair registered on one level.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) before: Option<HookFn>,
    pub(crate) after: Option<HookFn>,
}

impl Hooks {
    pub(crate) fn run_before(
        &self,
        level: &Command,
        command: &Command,
        store: &CommandStore,
        tail: &[String],
    ) -> Result<(), HookError> {
        match &self.before {
            Some(hook) => hook(command, store, tail).map_err(|e| HookError::before(level, e)),
            None => Ok(()),
        }
    }

    pub(crate) fn run_after(
        &self,
        level: &Command,
        command: &Command,
        store: &CommandStore,
        tail: &[String],
    ) -> Result<(), HookError> {
        match &self.after {
            Some(hook) => hook(command, store, tail).map_err(|e| HookError::after(level, e)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRegistry;
    use std::cell::Cell;

    #[test]
    fn hook_error_creation() {
        let registry = CommandRegistry::new();
        let err = HookError::before(&registry.get("db"), anyhow::anyhow!("not logged in"));
        assert_eq!(err.phase, HookPhase::Before);
        assert_eq!(err.message, "not logged in");
        assert_eq!(err.to_string(), "hook error (before) on db: not logged in");
    }

    #[test]
    fn missing_hooks_are_ok() {
        let registry = CommandRegistry::new();
        let level = registry.get("db");
        let store = CommandStore::new();
        let hooks = Hooks::default();
        assert!(hooks.run_before(&level, &level, &store, &[]).is_ok());
        assert!(hooks.run_after(&level, &level, &store, &[]).is_ok());
    }

    #[test]
    fn hooks_receive_the_resolved_command() {
        let registry = CommandRegistry::new();
        let level = registry.global();
        let leaf = registry.get("leaf");
        let seen = Rc::new(Cell::new(false));
        let flag = seen.clone();
        let expected = leaf.clone();
        let hooks = Hooks {
            before: Some(Rc::new(move |cmd: &Command, _: &CommandStore, tail: &[String]| -> anyhow::Result<()> {
                flag.set(cmd == &expected && tail == ["x".to_string()]);
                Ok(())
            })),
            after: Some(Rc::new(|_: &Command, _: &CommandStore, _: &[String]| -> anyhow::Result<()> {
                anyhow::bail!("after failed")
            })),
        };
        let store = CommandStore::new();
        let tail = vec!["x".to_string()];

        hooks.run_before(&level, &leaf, &store, &tail).unwrap();
        assert!(seen.get());

        let err = hooks.run_after(&level, &leaf, &store, &tail).unwrap_err();
        assert_eq!(err.phase, HookPhase::After);
        assert_eq!(err.level, level);
    }
}
