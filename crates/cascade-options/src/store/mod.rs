//! The per-level option store.
//!
//! An [`OptionStore`] declares a fixed set of options, binds to sources in
//! precedence order and keeps the latest value list each source assigned.
//! Every assignment replaces the previous list for that option; the last
//! source to speak wins.
//!
//! Change listeners run on a worker thread owned by the store, one call at
//! a time and in the order assignments arrived. A listener that fails or
//! panics is logged and skipped; other listeners still run. Use
//! [`OptionStore::flush`] to wait for pending notifications.

mod dynamic;
mod worker;

pub use dynamic::{DynamicOption, Sink};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{trace, warn};
use parking_lot::{Mutex, RwLock};

use crate::option::OptionId;
use crate::source::{ConsumerRef, OptionConsumer, OptionSource};
use crate::value::FromValue;
use crate::{AnyOpt, Opt, OptionError, OptionValue};
use worker::Notifier;

type Listener = Arc<dyn Fn(&AnyOpt, &[OptionValue]) -> anyhow::Result<()> + Send + Sync>;

struct StoreShared {
    options: Vec<AnyOpt>,
    declared: HashSet<OptionId>,
    bag: RwLock<HashMap<OptionId, Vec<OptionValue>>>,
    listeners: Mutex<HashMap<OptionId, Vec<Listener>>>,
    notifier: Notifier,
}

impl StoreShared {
    fn ensure_known(&self, option: &AnyOpt) -> Result<(), OptionError> {
        if self.declared.contains(&option.id()) {
            Ok(())
        } else {
            Err(OptionError::unknown(option.name()))
        }
    }

    fn values(&self, option: &AnyOpt) -> Result<Option<Vec<OptionValue>>, OptionError> {
        self.ensure_known(option)?;
        Ok(self.bag.read().get(&option.id()).cloned())
    }

    /// Register a listener, firing it at once when a value is present.
    fn listen(&self, option: &AnyOpt, listener: Listener) -> Result<(), OptionError> {
        self.ensure_known(option)?;
        let mut listeners = self.listeners.lock();
        if let Some(current) = self.bag.read().get(&option.id()) {
            self.notify(option, current, &listener);
        }
        listeners.entry(option.id()).or_default().push(listener);
        Ok(())
    }

    fn notify(&self, option: &AnyOpt, values: &[OptionValue], listener: &Listener) {
        let option = option.clone();
        let values = values.to_vec();
        let listener = listener.clone();
        self.notifier.submit(Box::new(move || {
            if let Err(e) = listener(&option, &values) {
                warn!("Listener for option '{}' failed: {:#}", option, e);
            }
        }));
    }
}

impl OptionConsumer for StoreShared {
    fn accept(&self, option: &AnyOpt, values: Vec<OptionValue>) -> Result<(), OptionError> {
        self.ensure_known(option)?;
        trace!("Assigning {} value(s) to '{}'", values.len(), option);
        // Holding the listener lock orders this assignment against
        // listeners registering concurrently.
        let listeners = self.listeners.lock();
        if let Some(registered) = listeners.get(&option.id()) {
            for listener in registered {
                self.notify(option, &values, listener);
            }
        }
        self.bag.write().insert(option.id(), values);
        Ok(())
    }
}

/// Typed, observable values for one set of declared options.
///
/// # Example
///
/// ```
/// use cascade_options::{ArgumentSource, DefaultsSource, Opt, OptionStore};
///
/// let name = Opt::string("name").default_str("World");
/// let loud = Opt::boolean("loud");
/// let store = OptionStore::new([name.any(), loud.any()]).unwrap();
///
/// let arguments = ArgumentSource::new();
/// store.bind(&DefaultsSource).unwrap();
/// store.bind(&arguments).unwrap();
/// arguments.consume(&["--name=John", "--no-loud"]).unwrap();
///
/// assert_eq!(store.get(&name).unwrap().as_deref(), Some("John"));
/// assert_eq!(store.get(&loud).unwrap(), Some(false));
/// ```
pub struct OptionStore {
    shared: Arc<StoreShared>,
}

impl OptionStore {
    /// Declare a store. Two options sharing a canonical name fail with
    /// [`OptionError::DuplicateOption`].
    pub fn new<I>(options: I) -> Result<Self, OptionError>
    where
        I: IntoIterator,
        I::Item: Into<AnyOpt>,
    {
        let options: Vec<AnyOpt> = options.into_iter().map(Into::into).collect();
        let mut names = HashSet::new();
        for option in &options {
            if !names.insert(option.name()) {
                return Err(OptionError::duplicate(option.name()));
            }
        }
        let notifier = Notifier::spawn("cascade-notify")
            .map_err(|e| OptionError::source_failure("notifier", e))?;
        Ok(Self {
            shared: Arc::new(StoreShared {
                declared: options.iter().map(AnyOpt::id).collect(),
                options,
                bag: RwLock::new(HashMap::new()),
                listeners: Mutex::new(HashMap::new()),
                notifier,
            }),
        })
    }

    /// Declare a store and bind each source in order.
    pub fn with_sources<I>(options: I, sources: &[&dyn OptionSource]) -> Result<Self, OptionError>
    where
        I: IntoIterator,
        I::Item: Into<AnyOpt>,
    {
        let store = Self::new(options)?;
        for source in sources {
            store.bind(*source)?;
        }
        Ok(store)
    }

    /// Subscribe every declared option to `source`.
    pub fn bind(&self, source: &dyn OptionSource) -> Result<(), OptionError> {
        trace!("Binding {} option(s) to {}", self.shared.options.len(), source.name());
        source.subscribe(&self.shared.options, self.consumer())
    }

    /// Withdraw every declared option from `source`.
    pub fn unbind(&self, source: &dyn OptionSource) {
        source.unsubscribe(&self.shared.options, &self.consumer());
    }

    fn consumer(&self) -> ConsumerRef {
        self.shared.clone()
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &[AnyOpt] {
        &self.shared.options
    }

    /// Whether `option` was declared here.
    pub fn knows<O: AsRef<AnyOpt> + ?Sized>(&self, option: &O) -> bool {
        self.shared.declared.contains(&option.as_ref().id())
    }

    /// Whether some source assigned `option` a value.
    pub fn has<O: AsRef<AnyOpt> + ?Sized>(&self, option: &O) -> bool {
        self.shared.bag.read().contains_key(&option.as_ref().id())
    }

    /// First value of the latest assignment.
    pub fn get<T: FromValue>(&self, option: &Opt<T>) -> Result<Option<T>, OptionError> {
        match self.value(option.as_any())? {
            Some(value) => convert(option.as_any(), &value).map(Some),
            None => Ok(None),
        }
    }

    /// Every value of the latest assignment; empty when unassigned.
    pub fn get_all<T: FromValue>(&self, option: &Opt<T>) -> Result<Vec<T>, OptionError> {
        self.values(option.as_any())?
            .unwrap_or_default()
            .iter()
            .map(|v| convert(option.as_any(), v))
            .collect()
    }

    /// Untyped form of [`get`](Self::get).
    pub fn value(&self, option: &AnyOpt) -> Result<Option<OptionValue>, OptionError> {
        Ok(self.values(option)?.and_then(|v| v.into_iter().next()))
    }

    /// Untyped form of [`get_all`](Self::get_all).
    pub fn values(&self, option: &AnyOpt) -> Result<Option<Vec<OptionValue>>, OptionError> {
        self.shared.values(option)
    }

    /// Listen for the first value of each assignment, with the option.
    pub fn on_change<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(&AnyOpt, T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared.listen(
            option.as_any(),
            Arc::new(move |opt: &AnyOpt, values: &[OptionValue]| -> anyhow::Result<()> {
                match values.first() {
                    Some(value) => listener(opt, convert(opt, value)?),
                    None => Ok(()),
                }
            }),
        )
    }

    /// Listen for every value of each assignment, with the option.
    pub fn on_changes<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(&AnyOpt, Vec<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared.listen(
            option.as_any(),
            Arc::new(move |opt: &AnyOpt, values: &[OptionValue]| -> anyhow::Result<()> {
                let values = values
                    .iter()
                    .map(|v| convert(opt, v))
                    .collect::<Result<Vec<T>, _>>()?;
                listener(opt, values)
            }),
        )
    }

    /// Listen for the first value of each assignment.
    pub fn on_value<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_change(option, move |_, value| listener(value))
    }

    /// Listen for every value of each assignment.
    pub fn on_values<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(Vec<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_changes(option, move |_, values| listener(values))
    }

    /// A deferred [`on_value`](Self::on_value) registration.
    pub fn dynamic<T: FromValue>(&self, option: &Opt<T>) -> Result<DynamicOption<T>, OptionError> {
        self.shared.ensure_known(option.as_any())?;
        let shared = self.shared.clone();
        let option = option.any();
        let name = option.name().to_string();
        Ok(DynamicOption::new(&name, move |sink: Sink<T>| {
            shared.listen(
                &option,
                Arc::new(move |opt: &AnyOpt, values: &[OptionValue]| -> anyhow::Result<()> {
                    match values.first() {
                        Some(value) => sink(convert(opt, value)?),
                        None => Ok(()),
                    }
                }),
            )
        }))
    }

    /// A deferred [`on_values`](Self::on_values) registration.
    pub fn dynamic_values<T: FromValue>(
        &self,
        option: &Opt<T>,
    ) -> Result<DynamicOption<Vec<T>>, OptionError> {
        self.shared.ensure_known(option.as_any())?;
        let shared = self.shared.clone();
        let option = option.any();
        let name = option.name().to_string();
        Ok(DynamicOption::new(&name, move |sink: Sink<Vec<T>>| {
            shared.listen(
                &option,
                Arc::new(move |opt: &AnyOpt, values: &[OptionValue]| -> anyhow::Result<()> {
                    let values = values
                        .iter()
                        .map(|v| convert(opt, v))
                        .collect::<Result<Vec<T>, _>>()?;
                    sink(values)
                }),
            )
        }))
    }

    /// Block until every notification queued so far has been delivered.
    pub fn flush(&self) {
        self.shared.notifier.flush();
    }

    /// Drain pending notifications and stop the worker. Later
    /// assignments still update values but notify nobody.
    pub fn close(&self) {
        self.shared.notifier.close();
    }
}

impl Drop for OptionStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for OptionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionStore")
            .field("options", &self.shared.options)
            .field("assigned", &self.shared.bag.read().len())
            .field("closed", &self.shared.notifier.is_closed())
            .finish()
    }
}

fn convert<T: FromValue>(option: &AnyOpt, value: &OptionValue) -> Result<T, OptionError> {
    T::from_value(value).ok_or_else(|| OptionError::TypeMismatch {
        name: option.name().to_string(),
        expected: T::EXPECTED,
    })
}
