//! # Cascade - Layered Options for Command Trees
//!
//! Cascade resolves typed options for a tree of commands. Every level a
//! command line walks through gets its own option store, filled from
//! several sources in increasing precedence:
//!
//! 1. declared defaults
//! 2. a property file
//! 3. environment variables
//! 4. sources bound by a store customization callback
//! 5. command line arguments
//!
//! The resolved command's handler then reads its own options, or those of
//! any ancestor, and receives whatever arguments were left over.
//!
//! This crate re-exports the two building blocks:
//!
//! - [`options`] ([`cascade_options`]): option descriptors, sources and the
//!   option store with change listeners
//! - [`dispatch`] ([`cascade_dispatch`]): command registration, resolution,
//!   handlers and hooks
//!
//! ## Quick Start
//!
//! ```rust
//! use cascade::prelude::*;
//!
//! let port = Opt::integer("port").default_value(8080);
//! let read = port.clone();
//!
//! let mut app = CommandGroup::<i64>::new()
//!     .settings(SourceSettings::new().environment("APP", "_").env_reader(MockEnv::new()));
//! app.register("serve", |cfg| {
//!     cfg.option(&port)
//!         .handler(move |_, store, _| Ok(store.get(&read)?.unwrap_or_default()))
//! })
//! .unwrap();
//!
//! assert_eq!(app.run(&["serve", "--port=9000"]).unwrap(), Some(9000));
//! assert_eq!(app.run(&["serve"]).unwrap(), Some(8080));
//! ```

pub use cascade_dispatch as dispatch;
pub use cascade_options as options;

pub use cascade_dispatch::{
    Command, CommandConfig, CommandGroup, CommandRef, CommandRegistry, CommandStore,
    DispatchError, Handler, HandlerResult, HookError, HookPhase, SourceSettings,
};
pub use cascade_options::{
    AnyOpt, DynamicOption, EnvReader, MockEnv, Opt, OptionError, OptionKind, OptionSource,
    OptionStore, OptionValue, RealEnv, ResourceLocator, StaticResources,
};

/// The types most programs need.
pub mod prelude {
    pub use cascade_dispatch::{
        Command, CommandGroup, CommandRef, CommandStore, DispatchError, HandlerResult,
        SourceSettings,
    };
    pub use cascade_options::{
        ArgumentSource, DefaultsSource, EnvironmentSource, FnSource, MockEnv, Opt, OptionError,
        OptionStore, PropertyFileSource, PropertyLineSource, StaticResources,
    };
}
