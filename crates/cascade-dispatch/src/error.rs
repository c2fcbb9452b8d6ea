//! Dispatch errors.

use cascade_options::{BoxError, OptionError};
use thiserror::Error;

use crate::hooks::HookError;
use crate::Command;

/// Errors raised while registering or running a command tree.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler on the resolved command or any of its ancestors.
    #[error("No handler found for command {command}")]
    NoHandler { command: Command },

    /// A command was attached below a second parent.
    #[error("Command {command} already is a sub command of {parent}, cannot add to {requested}")]
    SubCommandConflict {
        command: Command,
        parent: Command,
        requested: Command,
    },

    /// A command was attached below itself or one of its descendants.
    #[error("Command {command} cannot be a sub command of {requested}: {requested} is already below it")]
    SubCommandCycle { command: Command, requested: Command },

    /// One invocation visited the same command twice.
    #[error("Command {command} is already associated with a store")]
    RepeatedLevel { command: Command },

    /// A before or after hook failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The handler failed.
    #[error("Handler for {command} failed: {source}")]
    Handler {
        command: Command,
        #[source]
        source: BoxError,
    },

    /// Declaring, sourcing or reading options failed.
    #[error(transparent)]
    Option(#[from] OptionError),
}

impl DispatchError {
    pub(crate) fn handler(command: &Command, cause: anyhow::Error) -> Self {
        Self::Handler {
            command: command.clone(),
            source: cause.into(),
        }
    }

    /// Returns true for [`DispatchError::NoHandler`].
    pub fn is_no_handler(&self) -> bool {
        matches!(self, Self::NoHandler { .. })
    }

    /// Returns true for [`DispatchError::SubCommandConflict`] and
    /// [`DispatchError::SubCommandCycle`].
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SubCommandConflict { .. } | Self::SubCommandCycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRegistry;

    #[test]
    fn conflict_message_names_all_parties() {
        let registry = CommandRegistry::new();
        let err = DispatchError::SubCommandConflict {
            command: registry.get("sub"),
            parent: registry.get("one"),
            requested: registry.get("two"),
        };
        assert_eq!(
            err.to_string(),
            "Command sub already is a sub command of one, cannot add to two"
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn cycle_message_names_both_commands() {
        let registry = CommandRegistry::new();
        let err = DispatchError::SubCommandCycle {
            command: registry.get("top"),
            requested: registry.get("leaf"),
        };
        assert_eq!(
            err.to_string(),
            "Command top cannot be a sub command of leaf: leaf is already below it"
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn handler_error_keeps_cause() {
        let registry = CommandRegistry::new();
        let err = DispatchError::handler(&registry.get("run"), anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Handler for run failed: disk full");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn option_errors_convert() {
        let err: DispatchError = OptionError::unknown("port").into();
        assert!(matches!(err, DispatchError::Option(ref e) if e.is_unknown()));
    }
}
