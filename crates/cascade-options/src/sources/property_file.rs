//! Property file source.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::name::property_keys;
use crate::resource::{FileSystem, ResourceLocator};
use crate::source::{deliver, resolve_values, ConsumerRef, OptionSource, Subscriptions};
use crate::{AnyOpt, OptionError};

/// Parsed `key -> value` pairs. Later lines override earlier ones.
pub type Properties = HashMap<String, String>;

/// Parse property text.
///
/// Blank lines and lines starting with `#` or `!` are ignored. The key
/// ends at the first `=`, `:` or whitespace; whitespace around a single
/// `=` or `:` is skipped, so `key=value`, `key = value`, `key: value` and
/// `key value` all read the same. Values are trimmed. A line with only a
/// key has an empty value.
pub fn parse_properties(text: &str) -> Properties {
    let mut properties = Properties::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.find(|c: char| c == '=' || c == ':' || c.is_whitespace()) {
            Some(index) => {
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix(|c: char| c == '=' || c == ':')
                    .unwrap_or(rest);
                (&line[..index], rest)
            }
            None => (line, ""),
        };
        properties.insert(key.to_string(), value.trim().to_string());
    }
    properties
}

/// Reads `key = value` pairs from a properties file.
///
/// For an option named `first name` the keys `FIRST_NAME`, `first_name`,
/// `first-name` and `first.name` are tried in that order.
/// Boolean options fall back to the same spellings of `no first name`,
/// `not ...` and `non ...`, inverting the value. Missing files are not an
/// error.
#[derive(Default)]
pub struct PropertyFileSource {
    subscriptions: Subscriptions,
}

impl PropertyFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a plain path or `file://` locator from disk.
    pub fn consume(&self, locator: &str) -> Result<(), OptionError> {
        self.consume_locator(locator, &FileSystem)
    }

    /// Read a locator through the given resolver.
    pub fn consume_locator(
        &self,
        locator: &str,
        resources: &dyn ResourceLocator,
    ) -> Result<(), OptionError> {
        match resources
            .open(locator)
            .map_err(|e| OptionError::source_failure(self.name(), e))?
        {
            Some(text) => self.consume_str(&text),
            None => {
                debug!("property file '{locator}' not found, skipping");
                Ok(())
            }
        }
    }

    pub fn consume_path(&self, path: impl AsRef<Path>) -> Result<(), OptionError> {
        match path.as_ref().to_str() {
            Some(locator) => self.consume(locator),
            None => Err(OptionError::source_failure(
                self.name(),
                format!("path is not valid UTF-8: {}", path.as_ref().display()),
            )),
        }
    }

    pub fn consume_reader(&self, mut reader: impl Read) -> Result<(), OptionError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| OptionError::source_failure(self.name(), e))?;
        self.consume_str(&text)
    }

    pub fn consume_str(&self, text: &str) -> Result<(), OptionError> {
        self.consume_properties(&parse_properties(text))
    }

    /// Deliver from already parsed properties.
    pub fn consume_properties(&self, properties: &Properties) -> Result<(), OptionError> {
        for subscription in self.subscriptions.snapshot() {
            for option in &subscription.options {
                let found = resolve_values(option, |name| {
                    property_keys(name)
                        .iter()
                        .find_map(|key| properties.get(key))
                        .map(|value| vec![value.clone()])
                })?;
                if let Some(values) = found {
                    deliver(self.name(), subscription.consumer.as_ref(), option, values)?;
                }
            }
        }
        Ok(())
    }
}

impl OptionSource for PropertyFileSource {
    fn name(&self) -> &str {
        "property file"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        self.subscriptions.add(options, consumer);
        Ok(())
    }

    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        self.subscriptions.remove(options, consumer);
    }
}
