//! Default value source.

use crate::source::{deliver, ConsumerRef, OptionSource};
use crate::{AnyOpt, OptionError};

/// Delivers each option's fallback value, once, at subscribe time.
///
/// Options without a fallback are skipped. It should typically be the
/// first source bound to a store, so every later source overrides it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultsSource;

impl DefaultsSource {
    pub fn new() -> Self {
        Self
    }
}

impl OptionSource for DefaultsSource {
    fn name(&self) -> &str {
        "defaults"
    }

    fn subscribe(&self, options: &[AnyOpt], consumer: ConsumerRef) -> Result<(), OptionError> {
        for option in options {
            if let Some(value) = option.default() {
                deliver(self.name(), consumer.as_ref(), option, vec![value.clone()])?;
            }
        }
        Ok(())
    }

    fn unsubscribe(&self, _options: &[AnyOpt], _consumer: &ConsumerRef) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{Failing, Recorder};
    use crate::{Opt, OptionValue};

    #[test]
    fn delivers_defaults_on_subscribe() {
        let recorder = Recorder::shared();
        let name = Opt::string("name").default_str("John");
        let count = Opt::integer("count").default_value(3);

        DefaultsSource
            .subscribe(&[name.any(), count.any()], recorder.clone())
            .unwrap();

        assert_eq!(
            recorder.values("name"),
            Some(vec![OptionValue::String("John".into())])
        );
        assert_eq!(recorder.values("count"), Some(vec![OptionValue::Integer(3)]));
    }

    #[test]
    fn skips_options_without_default() {
        let recorder = Recorder::shared();
        let verbose = Opt::boolean("verbose");

        DefaultsSource
            .subscribe(&[verbose.any()], recorder.clone())
            .unwrap();

        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn wraps_consumer_failure() {
        let name = Opt::string("name").default_str("John");
        let err = DefaultsSource
            .subscribe(&[name.any()], std::sync::Arc::new(Failing))
            .unwrap_err();
        assert!(matches!(err, OptionError::SourceFailure { .. }));
    }
}
