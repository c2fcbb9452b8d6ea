//! The option source protocol.
//!
//! A source is anything that can produce raw values for options. Consumers
//! (usually an [`OptionStore`](crate::OptionStore)) subscribe with the set of
//! options they care about; the source later calls
//! [`OptionConsumer::accept`] once per option it found a value for, with
//! every value collected for that option during the pass, already parsed.
//!
//! ```text
//! store.bind(&source)
//!   → source.subscribe(options, store)
//!   → source.consume(input)            (defaults deliver during subscribe)
//!       → store.accept(option, values) (once per option with values)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::name::boolean_forms;
use crate::{AnyOpt, OptionError, OptionValue};

/// Receives parsed values from a source.
///
/// Returning an error aborts the source's current pass; the source wraps
/// it in [`OptionError::SourceFailure`] and hands it to its caller.
pub trait OptionConsumer: Send + Sync {
    fn accept(&self, option: &AnyOpt, values: Vec<OptionValue>) -> Result<(), OptionError>;
}

/// Shared handle to a consumer, compared by address.
pub type ConsumerRef = Arc<dyn OptionConsumer>;

/// A provider of option values.
pub trait OptionSource: Send + Sync {
    /// Human-readable name used in error messages.
    fn name(&self) -> &str;

    /// Register interest in exactly `options`, replacing any earlier
    /// registration of the same consumer. Sources may deliver immediately.
    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError>;

    /// Narrow a registration. A consumer left with no options is dropped.
    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef);
}

/// One consumer and the options it asked for.
#[derive(Clone)]
pub struct Subscription {
    pub consumer: ConsumerRef,
    pub options: Vec<AnyOpt>,
}

/// Registration bookkeeping shared by the sources that deliver later.
#[derive(Default)]
pub struct Subscriptions {
    entries: Mutex<Vec<Subscription>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, options: &[AnyOpt], consumer: ConsumerRef) {
        let mut entries = self.entries.lock();
        let subscription = Subscription {
            consumer,
            options: options.to_vec(),
        };
        match entries
            .iter_mut()
            .find(|s| same_consumer(&s.consumer, &subscription.consumer))
        {
            Some(existing) => *existing = subscription,
            None => entries.push(subscription),
        }
    }

    pub fn remove(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries
            .iter_mut()
            .find(|s| same_consumer(&s.consumer, consumer))
        {
            entry.options.retain(|o| !options.contains(o));
        }
        entries.retain(|s| !s.options.is_empty());
    }

    /// Copy of the current registrations. Sources iterate the copy so that
    /// consumers may subscribe or unsubscribe while being notified.
    pub fn snapshot(&self) -> Vec<Subscription> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn same_consumer(a: &ConsumerRef, b: &ConsumerRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Hand values to a consumer, wrapping its failure.
pub fn deliver(
    source_name: &str,
    consumer: &dyn OptionConsumer,
    option: &AnyOpt,
    values: Vec<OptionValue>,
) -> Result<(), OptionError> {
    consumer
        .accept(option, values)
        .map_err(|e| OptionError::source_failure(source_name, e))
}

/// Find and parse the raw values for `option`.
///
/// `find` looks raw values up by a canonical name. Boolean options try
/// their plain name first, then `no`, `not` and `non` forms; the first hit
/// wins and values found under a negated form are inverted.
pub fn resolve_values<F>(option: &AnyOpt, find: F) -> Result<Option<Vec<OptionValue>>, OptionError>
where
    F: Fn(&str) -> Option<Vec<String>>,
{
    let (raw, negated) = if option.is_boolean() {
        let mut hit = None;
        for (index, form) in boolean_forms(option.name()).iter().enumerate() {
            if let Some(raw) = find(form) {
                hit = Some((raw, index > 0));
                break;
            }
        }
        match hit {
            Some(hit) => hit,
            None => return Ok(None),
        }
    } else {
        match find(option.name()) {
            Some(raw) => (raw, false),
            None => return Ok(None),
        }
    };

    raw.iter()
        .map(|r| {
            let value = option.parse_value(r)?;
            Ok(if negated { value.negated() } else { value })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Name lookup for tokenizing sources: every canonical name plus the
/// negated spellings of boolean options.
pub(crate) fn name_lookup(options: &[AnyOpt]) -> HashMap<String, AnyOpt> {
    let mut lookup = HashMap::new();
    for option in options {
        lookup.insert(option.name().to_string(), option.clone());
    }
    for option in options.iter().filter(|o| o.is_boolean()) {
        for form in boolean_forms(option.name()).iter().skip(1) {
            lookup
                .entry(form.clone())
                .or_insert_with(|| option.clone());
        }
    }
    lookup
}

/// Deliver gathered name-keyed raw values to one subscription, in the
/// subscription's option order.
pub(crate) fn deliver_gathered(
    source_name: &str,
    subscription: &Subscription,
    gathered: &HashMap<String, Vec<String>>,
) -> Result<(), OptionError> {
    for option in &subscription.options {
        if let Some(values) = resolve_values(option, |name| gathered.get(name).cloned())? {
            deliver(source_name, subscription.consumer.as_ref(), option, values)?;
        }
    }
    Ok(())
}
