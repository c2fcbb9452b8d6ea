//! Command-line argument source.

use std::collections::HashMap;

use log::trace;

use crate::source::{deliver_gathered, name_lookup, ConsumerRef, OptionSource, Subscriptions};
use crate::{AnyOpt, OptionError};

/// Marks the end of options; everything after it is tail.
pub const END_OF_OPTIONS: &str = "--";

/// What to do with the first token that is not a recognized option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Keep consuming options anywhere in the vector; every other token
    /// goes to the tail in its original order.
    Full,
    /// Stop at the first token that is not a recognized option; it and
    /// everything after it becomes the tail verbatim.
    StopAtUnknown,
}

impl ScanMode {
    pub fn from_full_scan(full_scan: bool) -> Self {
        if full_scan {
            ScanMode::Full
        } else {
            ScanMode::StopAtUnknown
        }
    }
}

/// Reads `--name=value` and bare `--name` tokens.
///
/// Names have `-` read as a space, so `--first-name=John` sets the option
/// `first name`. A bare `--name` carries the empty string, which boolean
/// options read as true. Boolean options also answer to `--no-name`,
/// `--not-name` and `--non-name`, which invert the value.
///
/// # Example
///
/// ```
/// use cascade_options::{ArgumentSource, Opt, OptionStore, ScanMode};
///
/// let verbose = Opt::boolean("verbose");
/// let store = OptionStore::new([verbose.any()]).unwrap();
/// let source = ArgumentSource::new();
/// store.bind(&source).unwrap();
///
/// let tail = source
///     .consume_tailed(&["--no-verbose", "run", "--fast"], ScanMode::StopAtUnknown)
///     .unwrap();
/// assert_eq!(tail, vec!["run", "--fast"]);
/// assert_eq!(store.get(&verbose).unwrap(), Some(false));
/// ```
#[derive(Default)]
pub struct ArgumentSource {
    subscriptions: Subscriptions,
}

impl ArgumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver options to every subscriber, scanning the whole vector.
    pub fn consume<S: AsRef<str>>(&self, args: &[S]) -> Result<(), OptionError> {
        for subscription in self.subscriptions.snapshot() {
            let lookup = name_lookup(&subscription.options);
            let (gathered, _) = split_arguments(args, |name| lookup.contains_key(name), ScanMode::Full);
            deliver_gathered(self.name(), &subscription, &gathered)?;
        }
        Ok(())
    }

    /// Deliver options to the single subscriber and return the tail.
    ///
    /// The tail depends on which options are recognized, so this is only
    /// defined for one subscriber. With none, nothing is recognized.
    pub fn consume_tailed<S: AsRef<str>>(
        &self,
        args: &[S],
        mode: ScanMode,
    ) -> Result<Vec<String>, OptionError> {
        let subscriptions = self.subscriptions.snapshot();
        match subscriptions.as_slice() {
            [] => Ok(split_arguments(args, |_| false, mode).1),
            [subscription] => {
                let lookup = name_lookup(&subscription.options);
                let (gathered, tail) = split_arguments(args, |name| lookup.contains_key(name), mode);
                deliver_gathered(self.name(), subscription, &gathered)?;
                Ok(tail)
            }
            _ => Err(OptionError::source_failure(
                self.name(),
                "a tail can only be computed for a single subscriber",
            )),
        }
    }
}

impl OptionSource for ArgumentSource {
    fn name(&self) -> &str {
        "arguments"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        self.subscriptions.add(options, consumer);
        Ok(())
    }

    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        self.subscriptions.remove(options, consumer);
    }
}

/// Split an argument vector into recognized option values and the tail.
///
/// `recognizes` is asked about each normalized `--name`. Values are keyed
/// by the normalized name they were given under, in encounter order. A
/// `--` reached while still scanning ends option parsing and is dropped;
/// one that only appears inside the tail is kept for the next level.
pub fn split_arguments<S, F>(
    args: &[S],
    recognizes: F,
    mode: ScanMode,
) -> (HashMap<String, Vec<String>>, Vec<String>)
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut gathered: HashMap<String, Vec<String>> = HashMap::new();
    let mut tail: Vec<String> = Vec::new();
    let mut ended = false;

    for arg in args.iter().map(AsRef::as_ref) {
        if ended || (!tail.is_empty() && mode == ScanMode::StopAtUnknown) {
            tail.push(arg.to_string());
            continue;
        }

        if arg == END_OF_OPTIONS {
            ended = true;
            continue;
        }

        let Some(body) = arg.strip_prefix("--") else {
            tail.push(arg.to_string());
            continue;
        };

        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name, value),
            None => (body, ""),
        };
        let name = name.replace('-', " ");

        if recognizes(&name) {
            trace!("consumed option '{name}' = '{value}'");
            gathered.entry(name).or_default().push(value.to_string());
        } else {
            tail.push(arg.to_string());
        }
    }

    (gathered, tail)
}
