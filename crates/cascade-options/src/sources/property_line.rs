//! Single-line property source.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::name::canonical;
use crate::source::{deliver_gathered, name_lookup, ConsumerRef, OptionSource, Subscriptions};
use crate::{AnyOpt, OptionError};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Reads `key=value` tokens from one string, such as an `*_OPTS` style
/// variable or a line of a script.
///
/// Tokens are split on whitespace unless another separator pattern is
/// given. Keys are canonicalized, so `FIRST_NAME`, `first-name` and
/// `first_name` all address `first name`. A bare key carries the empty
/// string. Keys no subscribed option answers to are an error.
///
/// # Example
///
/// ```
/// use cascade_options::{Opt, OptionStore, PropertyLineSource};
///
/// let first = Opt::string("first name");
/// let debug = Opt::boolean("debug");
/// let store = OptionStore::new([first.any(), debug.any()]).unwrap();
/// let source = PropertyLineSource::new();
/// store.bind(&source).unwrap();
///
/// source.consume("first-name=John debug").unwrap();
/// assert_eq!(store.get(&first).unwrap().as_deref(), Some("John"));
/// assert_eq!(store.get(&debug).unwrap(), Some(true));
/// ```
pub struct PropertyLineSource {
    separator: Regex,
    subscriptions: Subscriptions,
}

impl Default for PropertyLineSource {
    fn default() -> Self {
        Self::with_separator(WHITESPACE.clone())
    }
}

impl PropertyLineSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split tokens on a custom pattern, e.g. `;` or `,\s*`.
    pub fn with_separator(separator: Regex) -> Self {
        Self {
            separator,
            subscriptions: Subscriptions::new(),
        }
    }

    pub fn consume(&self, line: &str) -> Result<(), OptionError> {
        let tokens: Vec<(String, String)> = self
            .separator
            .split(line)
            .filter(|t| !t.is_empty())
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (canonical(key), value.to_string()),
                None => (canonical(token), String::new()),
            })
            .collect();

        for subscription in self.subscriptions.snapshot() {
            let lookup = name_lookup(&subscription.options);
            let mut gathered: HashMap<String, Vec<String>> = HashMap::new();
            for (key, value) in &tokens {
                if !lookup.contains_key(key) {
                    return Err(OptionError::unknown(key.clone()));
                }
                gathered.entry(key.clone()).or_default().push(value.clone());
            }
            deliver_gathered(self.name(), &subscription, &gathered)?;
        }
        Ok(())
    }
}

impl OptionSource for PropertyLineSource {
    fn name(&self) -> &str {
        "property line"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        self.subscriptions.add(options, consumer);
        Ok(())
    }

    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        self.subscriptions.remove(options, consumer);
    }
}
