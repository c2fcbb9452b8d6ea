//! Option source implementations.
//!
//! - [`DefaultsSource`] - Each option's fallback value, delivered on subscribe
//! - [`ArgumentSource`] - `--name=value` tokens from an argument vector
//! - [`EnvironmentSource`] - `PREFIX_NAME` keys from an environment
//! - [`PropertyFileSource`] - `key = value` lines from a file or resource
//! - [`PropertyLineSource`] - `key=value` tokens from a single string
//! - [`FnSource`] - A closure that feeds the consumer directly

mod arguments;
mod defaults;
mod environment;
mod func;
mod property_file;
mod property_line;

pub use arguments::{split_arguments, ArgumentSource, ScanMode, END_OF_OPTIONS};
pub use defaults::DefaultsSource;
pub use environment::EnvironmentSource;
pub use func::{FnSource, Feed};
pub use property_file::{parse_properties, Properties, PropertyFileSource};
pub use property_line::PropertyLineSource;
