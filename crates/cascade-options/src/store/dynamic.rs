//! Deferred listener registration.

use std::fmt;

use crate::OptionError;

/// Callback receiving the values a [`DynamicOption`] pushes.
pub type Sink<T> = Box<dyn Fn(T) -> anyhow::Result<()> + Send + Sync + 'static>;

type Register<T> = Box<dyn FnOnce(Sink<T>) -> Result<(), OptionError> + Send + 'static>;

/// A push stream of an option's values that registers nothing until
/// [`attach`](Self::attach) is called.
///
/// Returned by [`OptionStore::dynamic`](crate::OptionStore::dynamic) and
/// [`OptionStore::dynamic_values`](crate::OptionStore::dynamic_values).
/// Derive streams with [`map`](Self::map) before attaching:
///
/// ```
/// use cascade_options::{FnSource, Opt, OptionStore};
/// use std::sync::{Arc, Mutex};
///
/// let port = Opt::integer("port").default_value(8080);
/// let store = OptionStore::new([port.any()]).unwrap();
/// store.bind(&cascade_options::DefaultsSource).unwrap();
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// store
///     .dynamic(&port)
///     .unwrap()
///     .map(|p| format!("0.0.0.0:{p}"))
///     .attach(move |addr| {
///         sink.lock().unwrap().push(addr);
///         Ok(())
///     })
///     .unwrap();
///
/// store.flush();
/// assert_eq!(*seen.lock().unwrap(), vec!["0.0.0.0:8080".to_string()]);
/// ```
pub struct DynamicOption<T> {
    name: String,
    register: Register<T>,
}

impl<T: Send + 'static> DynamicOption<T> {
    pub(crate) fn new<R>(name: &str, register: R) -> Self
    where
        R: FnOnce(Sink<T>) -> Result<(), OptionError> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            register: Box::new(register),
        }
    }

    /// Name of the underlying option.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `sink` as a listener. It fires at once if the option
    /// already holds a value, then on every reassignment.
    pub fn attach<F>(self, sink: F) -> Result<(), OptionError>
    where
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        (self.register)(Box::new(sink))
    }

    /// A stream of `f` applied to each value. Nothing is registered yet.
    pub fn map<U, F>(self, f: F) -> DynamicOption<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let register = self.register;
        DynamicOption {
            name: self.name,
            register: Box::new(move |sink: Sink<U>| {
                register(Box::new(move |value: T| sink(f(value))))
            }),
        }
    }
}

impl<T> fmt::Debug for DynamicOption<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicOption")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
