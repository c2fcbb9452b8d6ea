//! Command handler types.
//!
//! A handler receives the resolved [`Command`], the [`CommandStore`] built
//! for the invocation and the tail left after option parsing. It returns
//! the value [`CommandGroup::run`](crate::CommandGroup::run) hands back.
//!
//! Closures registered through
//! [`CommandConfig::handler`](crate::CommandConfig::handler) are the common
//! case. Implement [`Handler`] for handlers that carry state:
//!
//! ```rust
//! use cascade_dispatch::{Command, CommandGroup, CommandStore, Handler, HandlerResult};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! impl Handler<String> for Greeter {
//!     fn handle(&self, _: &Command, _: &CommandStore, tail: &[String]) -> HandlerResult<String> {
//!         Ok(format!("{}, {}", self.greeting, tail.join(" ")))
//!     }
//! }
//!
//! let mut group = CommandGroup::<String>::new();
//! group
//!     .register("greet", |cfg| cfg.handler_with(Greeter { greeting: "Hello" }))
//!     .unwrap();
//! let out = group.run(&["greet", "world"]).unwrap();
//! assert_eq!(out.as_deref(), Some("Hello, world"));
//! ```

use std::rc::Rc;

use crate::{Command, CommandStore};

/// Result type for handlers. Any error converts through `anyhow`.
pub type HandlerResult<T> = Result<T, anyhow::Error>;

/// A command handler.
pub trait Handler<T> {
    fn handle(&self, command: &Command, store: &CommandStore, tail: &[String]) -> HandlerResult<T>;
}

impl<T, F> Handler<T> for F
where
    F: Fn(&Command, &CommandStore, &[String]) -> HandlerResult<T>,
{
    fn handle(&self, command: &Command, store: &CommandStore, tail: &[String]) -> HandlerResult<T> {
        self(command, store, tail)
    }
}

pub(crate) type HandlerRef<T> = Rc<dyn Handler<T>>;

/// Store customization callback, run after the level's sources are bound.
pub type StoreConfigFn = Rc<dyn Fn(&cascade_options::OptionStore) -> anyhow::Result<()>>;
