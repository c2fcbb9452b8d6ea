//! Command tree dispatch for layered, typed options.
//!
//! `cascade-dispatch` routes an argument vector through a tree of named
//! commands. Each level the walk visits declares its own options and gets
//! its own [`OptionStore`](cascade_options::OptionStore); the resolved
//! command's handler then reads its options, or any ancestor's, through
//! a [`CommandStore`].
//!
//! # Features
//!
//! - **Interned identities**: [`CommandRegistry`] hands out comparable
//!   [`Command`] handles and a root that never matches input
//! - **Tail splitting**: options are consumed level by level; what is left
//!   selects the sub-command or becomes the handler's tail
//! - **Handler fallback**: a command without a handler runs its nearest
//!   ancestor's
//! - **Hooks**: before hooks root to leaf, after hooks leaf to root
//! - **Layered sources**: defaults, property file, environment, custom
//!   sources and arguments, in that precedence
//!
//! # Example
//!
//! ```rust
//! use cascade_dispatch::{CommandGroup, CommandRef};
//! use cascade_options::Opt;
//!
//! let verbose = Opt::boolean("verbose");
//! let force = Opt::boolean("force");
//!
//! let mut group = CommandGroup::<String>::new();
//! let (v, f) = (verbose.clone(), force.clone());
//! group
//!     .register(CommandRef::Global, |cfg| cfg.option(&verbose))
//!     .unwrap()
//!     .register("db", |cfg| cfg.sub_command("migrate"))
//!     .unwrap()
//!     .register("migrate", |cfg| {
//!         cfg.option(&force).handler(move |cmd, store, tail| {
//!             Ok(format!(
//!                 "{cmd} verbose={:?} force={:?} tail={tail:?}",
//!                 store.find(&v)?,
//!                 store.get(&f)?,
//!             ))
//!         })
//!     })
//!     .unwrap();
//!
//! let out = group.run(&["--verbose", "db", "migrate", "--force", "extra"]).unwrap();
//! assert_eq!(
//!     out.as_deref(),
//!     Some("migrate verbose=Some(true) force=Some(true) tail=[\"extra\"]")
//! );
//! ```

mod error;
mod group;
mod handler;
mod hooks;
mod identity;
mod settings;
mod store;

pub use error::DispatchError;
pub use group::{CommandConfig, CommandGroup, CommandRef};
pub use handler::{Handler, HandlerResult, StoreConfigFn};
pub use hooks::{HookError, HookFn, HookPhase};
pub use identity::{Command, CommandRegistry};
pub use settings::SourceSettings;
pub use store::CommandStore;
