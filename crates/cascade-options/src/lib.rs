//! Typed options resolved from layered sources.
//!
//! `cascade-options` merges built-in defaults, property files, environment
//! variables and command-line arguments into one typed, observable value
//! bag per command level.
//!
//! # Quick Start
//!
//! ```
//! use cascade_options::{ArgumentSource, DefaultsSource, EnvironmentSource, MockEnv, Opt, OptionStore};
//!
//! let port = Opt::integer("port").default_value(8080);
//! let verbose = Opt::boolean("verbose");
//!
//! let environment = EnvironmentSource::new("APP", "_");
//! let arguments = ArgumentSource::new();
//! let store = OptionStore::with_sources(
//!     [port.any(), verbose.any()],
//!     &[&DefaultsSource, &environment, &arguments],
//! )
//! .unwrap();
//!
//! environment.consume(&MockEnv::new().with_var("APP_PORT", "9000")).unwrap();
//! arguments.consume(&["--verbose"]).unwrap();
//!
//! assert_eq!(store.get(&port).unwrap(), Some(9000));
//! assert_eq!(store.get(&verbose).unwrap(), Some(true));
//! ```
//!
//! # Architecture
//!
//! Sources implement [`OptionSource`]. A store subscribes its declared
//! options to each source it binds; sources then push parsed values back
//! through [`OptionConsumer`]. Binding order is precedence order:
//!
//! ```text
//! OptionStore
//! ├── DefaultsSource      → port = 8080
//! ├── PropertyFileSource  → (no file)
//! ├── EnvironmentSource   → port = 9000   ← replaces the default
//! └── ArgumentSource      → verbose = true
//! ```
//!
//! # Testing
//!
//! External inputs are behind traits with in-memory implementations:
//! [`MockEnv`] for the environment and [`StaticResources`] for property
//! files. [`OptionStore::flush`] waits for asynchronous listeners.

mod duration;
pub mod env;
mod error;
pub mod name;
mod option;
pub mod resource;
mod source;
pub mod sources;
mod store;
mod value;

pub use duration::parse_duration;
pub use error::{BoxError, OptionError};
pub use option::{AnyOpt, Opt, OptionId};
pub use source::{
    deliver, resolve_values, ConsumerRef, OptionConsumer, OptionSource, Subscription,
    Subscriptions,
};
pub use store::{DynamicOption, OptionStore, Sink};
pub use value::{parse_boolean, FromValue, IntoValue, OptionKind, OptionValue};

pub use env::{EnvReader, MockEnv, RealEnv};
pub use resource::{FileSystem, ResourceLocator, StaticResources};
pub use sources::{
    parse_properties, ArgumentSource, DefaultsSource, EnvironmentSource, Feed, FnSource,
    Properties, PropertyFileSource, PropertyLineSource, ScanMode,
};
