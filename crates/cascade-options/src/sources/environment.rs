//! Environment variable source.

use log::trace;

use crate::env::{EnvReader, RealEnv};
use crate::name::environment_key;
use crate::source::{deliver, ConsumerRef, OptionSource, Subscriptions};
use crate::{AnyOpt, OptionError};

/// Reads `<PREFIX><SEP><UPPER_NAME>` keys from an environment.
///
/// With prefix `APP` and separator `_`, the option `first name` is read
/// from `APP_FIRST_NAME`. Each key holds a single value.
///
/// # Example
///
/// ```
/// use cascade_options::{EnvironmentSource, MockEnv, Opt, OptionStore};
///
/// let port = Opt::integer("port");
/// let store = OptionStore::new([port.any()]).unwrap();
/// let source = EnvironmentSource::new("APP", "_");
/// store.bind(&source).unwrap();
///
/// source.consume(&MockEnv::new().with_var("APP_PORT", "8080")).unwrap();
/// assert_eq!(store.get(&port).unwrap(), Some(8080));
/// ```
pub struct EnvironmentSource {
    prefix: String,
    separator: String,
    subscriptions: Subscriptions,
}

impl EnvironmentSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            subscriptions: Subscriptions::new(),
        }
    }

    /// The key this source reads for an option.
    pub fn key_for(&self, option: &AnyOpt) -> String {
        environment_key(&self.prefix, &self.separator, option.name())
    }

    /// Deliver every subscribed option whose key is set in `env`.
    pub fn consume(&self, env: &dyn EnvReader) -> Result<(), OptionError> {
        for subscription in self.subscriptions.snapshot() {
            for option in &subscription.options {
                let key = self.key_for(option);
                let Some(raw) = env.var(&key) else {
                    continue;
                };
                trace!("environment key '{key}' sets option '{option}'");
                let value = option.parse_value(&raw)?;
                deliver(self.name(), subscription.consumer.as_ref(), option, vec![value])?;
            }
        }
        Ok(())
    }

    /// Deliver from the real process environment.
    pub fn consume_process_env(&self) -> Result<(), OptionError> {
        self.consume(&RealEnv)
    }
}

impl OptionSource for EnvironmentSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        self.subscriptions.add(options, consumer);
        Ok(())
    }

    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        self.subscriptions.remove(options, consumer);
    }
}
