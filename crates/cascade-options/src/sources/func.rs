//! Closure-backed source.

use std::sync::Arc;

use crate::source::{deliver, ConsumerRef, OptionConsumer, OptionSource, Subscriptions};
use crate::value::IntoValue;
use crate::{AnyOpt, Opt, OptionError, OptionValue};

type FeedFn = dyn Fn(&Feed<'_>) -> Result<(), OptionError> + Send + Sync;

/// Handle passed to an [`FnSource`] closure for delivering values.
pub struct Feed<'a> {
    source_name: &'a str,
    consumer: &'a dyn OptionConsumer,
}

impl Feed<'_> {
    /// Deliver a single typed value.
    pub fn set<T: IntoValue>(&self, option: &Opt<T>, value: T) -> Result<(), OptionError> {
        self.set_values(option.as_any(), vec![value.into_value()])
    }

    /// Deliver raw text, parsed by the option.
    pub fn set_raw(&self, option: &AnyOpt, raw: &str) -> Result<(), OptionError> {
        let value = option.parse_value(raw)?;
        self.set_values(option, vec![value])
    }

    pub fn set_values(&self, option: &AnyOpt, values: Vec<OptionValue>) -> Result<(), OptionError> {
        deliver(self.source_name, self.consumer, option, values)
    }
}

/// A source whose closure feeds each consumer when it subscribes, and
/// which can push more values later through [`FnSource::emit`].
///
/// Handy inside store customization callbacks:
///
/// ```
/// use cascade_options::{FnSource, Opt, OptionStore};
///
/// let name = Opt::string("name");
/// let store = OptionStore::new([name.any()]).unwrap();
/// let fixed = name.clone();
/// store
///     .bind(&FnSource::new(move |feed| feed.set(&fixed, "John".to_string())))
///     .unwrap();
/// assert_eq!(store.get(&name).unwrap().as_deref(), Some("John"));
/// ```
#[derive(Clone)]
pub struct FnSource {
    feed: Arc<FeedFn>,
    subscriptions: Arc<Subscriptions>,
}

impl FnSource {
    pub fn new<F>(feed: F) -> Self
    where
        F: Fn(&Feed<'_>) -> Result<(), OptionError> + Send + Sync + 'static,
    {
        Self {
            feed: Arc::new(feed),
            subscriptions: Arc::new(Subscriptions::new()),
        }
    }

    /// A source that delivers nothing on subscribe.
    pub fn empty() -> Self {
        Self::new(|_| Ok(()))
    }

    /// Push values to every subscriber interested in `option`.
    pub fn emit(&self, option: &AnyOpt, values: Vec<OptionValue>) -> Result<(), OptionError> {
        for subscription in self.subscriptions.snapshot() {
            if subscription.options.contains(option) {
                deliver(self.name(), subscription.consumer.as_ref(), option, values.clone())?;
            }
        }
        Ok(())
    }

    /// Push a single typed value.
    pub fn emit_value<T: IntoValue>(&self, option: &Opt<T>, value: T) -> Result<(), OptionError> {
        self.emit(option.as_any(), vec![value.into_value()])
    }
}

impl OptionSource for FnSource {
    fn name(&self) -> &str {
        "function"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        self.subscriptions.add(options, consumer.clone());
        let feed = Feed {
            source_name: self.name(),
            consumer: consumer.as_ref(),
        };
        (self.feed)(&feed)
    }

    fn unsubscribe(&self, options: &[AnyOpt], consumer: &ConsumerRef) {
        self.subscriptions.remove(options, consumer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::Recorder;

    #[test]
    fn feeds_on_subscribe() {
        let count = Opt::integer("count");
        let fed = count.clone();
        let source = FnSource::new(move |feed| feed.set(&fed, 9));
        let recorder = Recorder::shared();

        source.subscribe(&[count.any()], recorder.clone()).unwrap();

        assert_eq!(recorder.values("count"), Some(vec![OptionValue::Integer(9)]));
    }

    #[test]
    fn emits_later_to_interested_subscribers() {
        let count = Opt::integer("count");
        let other = Opt::integer("other");
        let source = FnSource::empty();
        let interested = Recorder::shared();
        let bystander = Recorder::shared();
        source.subscribe(&[count.any()], interested.clone()).unwrap();
        source.subscribe(&[other.any()], bystander.clone()).unwrap();

        source.emit_value(&count, 4).unwrap();

        assert_eq!(interested.values("count"), Some(vec![OptionValue::Integer(4)]));
        assert_eq!(bystander.count(), 0);
    }

    #[test]
    fn raw_values_are_parsed() {
        let count = Opt::integer("count");
        let fed = count.any();
        let source = FnSource::new(move |feed| feed.set_raw(&fed, "nope"));

        let err = source
            .subscribe(&[count.any()], Recorder::shared())
            .unwrap_err();
        assert!(matches!(err, OptionError::Parse { .. }));
    }
}
