//! The per-invocation chain of option stores.

use std::fmt;

use cascade_options::{
    AnyOpt, DynamicOption, FromValue, Opt, OptionError, OptionSource, OptionStore,
};

use crate::{Command, DispatchError};

/// One [`OptionStore`] per visited command level, root first.
///
/// Plain reads ([`get`](Self::get), [`get_all`](Self::get_all)) go to the
/// main level, which is the command being executed. [`find`](Self::find)
/// searches every level from the root down and reads the first one that
/// declares the option. Listener registration is routed the same way.
pub struct CommandStore {
    levels: Vec<(Command, OptionStore)>,
    main: Option<usize>,
}

impl CommandStore {
    pub(crate) fn new() -> Self {
        Self {
            levels: Vec::new(),
            main: None,
        }
    }

    /// Append a level. The first level becomes main until
    /// [`set_main`](Self::set_main) says otherwise. Each command gets at
    /// most one level.
    pub(crate) fn add_store(
        &mut self,
        command: Command,
        store: OptionStore,
    ) -> Result<(), DispatchError> {
        if self.position(&command).is_some() {
            return Err(DispatchError::RepeatedLevel { command });
        }
        if self.main.is_none() {
            self.main = Some(self.levels.len());
        }
        self.levels.push((command, store));
        Ok(())
    }

    pub(crate) fn set_main(&mut self, command: &Command) {
        if let Some(index) = self.position(command) {
            self.main = Some(index);
        }
    }

    fn position(&self, command: &Command) -> Option<usize> {
        self.levels.iter().position(|(c, _)| c == command)
    }

    /// The command being executed.
    pub fn main(&self) -> Option<&Command> {
        self.main.map(|i| &self.levels[i].0)
    }

    /// Visited commands, root first.
    pub fn commands(&self) -> Vec<Command> {
        self.levels.iter().map(|(c, _)| c.clone()).collect()
    }

    /// The store built for `command`, if it was visited.
    pub fn option_store(&self, command: &Command) -> Option<&OptionStore> {
        self.levels
            .iter()
            .find(|(c, _)| c == command)
            .map(|(_, store)| store)
    }

    fn main_store(&self) -> Option<&OptionStore> {
        self.main.map(|i| &self.levels[i].1)
    }

    fn level_store(&self, command: &Command, option: &AnyOpt) -> Result<&OptionStore, OptionError> {
        self.option_store(command)
            .ok_or_else(|| OptionError::unknown(option.name()))
    }

    /// Shallowest level declaring `option`.
    fn find_store(&self, option: &AnyOpt) -> Result<&OptionStore, OptionError> {
        self.levels
            .iter()
            .map(|(_, store)| store)
            .find(|store| store.knows(option))
            .ok_or_else(|| OptionError::unknown(option.name()))
    }

    /// Every declared option, root level first.
    pub fn options(&self) -> Vec<AnyOpt> {
        self.levels
            .iter()
            .flat_map(|(_, store)| store.options().iter().cloned())
            .collect()
    }

    /// Options declared at `command`; empty when it was not visited.
    pub fn options_of(&self, command: &Command) -> Vec<AnyOpt> {
        self.option_store(command)
            .map(|store| store.options().to_vec())
            .unwrap_or_default()
    }

    /// Whether any level declares `option`.
    pub fn knows<O: AsRef<AnyOpt> + ?Sized>(&self, option: &O) -> bool {
        self.levels.iter().any(|(_, store)| store.knows(option))
    }

    /// Whether any level holds a value for `option`.
    pub fn has<O: AsRef<AnyOpt> + ?Sized>(&self, option: &O) -> bool {
        self.levels.iter().any(|(_, store)| store.has(option))
    }

    pub fn get<T: FromValue>(&self, option: &Opt<T>) -> Result<Option<T>, OptionError> {
        self.main_store()
            .ok_or_else(|| OptionError::unknown(option.name()))?
            .get(option)
    }

    pub fn get_all<T: FromValue>(&self, option: &Opt<T>) -> Result<Vec<T>, OptionError> {
        self.main_store()
            .ok_or_else(|| OptionError::unknown(option.name()))?
            .get_all(option)
    }

    /// Read from the level built for `command`.
    pub fn get_in<T: FromValue>(
        &self,
        command: &Command,
        option: &Opt<T>,
    ) -> Result<Option<T>, OptionError> {
        self.level_store(command, option.as_any())?.get(option)
    }

    pub fn get_all_in<T: FromValue>(
        &self,
        command: &Command,
        option: &Opt<T>,
    ) -> Result<Vec<T>, OptionError> {
        self.level_store(command, option.as_any())?.get_all(option)
    }

    /// Read from the shallowest level that declares `option`.
    pub fn find<T: FromValue>(&self, option: &Opt<T>) -> Result<Option<T>, OptionError> {
        self.find_store(option.as_any())?.get(option)
    }

    pub fn find_all<T: FromValue>(&self, option: &Opt<T>) -> Result<Vec<T>, OptionError> {
        self.find_store(option.as_any())?.get_all(option)
    }

    /// Bind an extra source to the main level.
    pub fn bind(&self, source: &dyn OptionSource) -> Result<(), OptionError> {
        match self.main_store() {
            Some(store) => store.bind(source),
            None => Ok(()),
        }
    }

    pub fn on_change<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(&AnyOpt, T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.find_store(option.as_any())?.on_change(option, listener)
    }

    pub fn on_changes<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(&AnyOpt, Vec<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.find_store(option.as_any())?.on_changes(option, listener)
    }

    pub fn on_value<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.find_store(option.as_any())?.on_value(option, listener)
    }

    pub fn on_values<T, F>(&self, option: &Opt<T>, listener: F) -> Result<(), OptionError>
    where
        T: FromValue,
        F: Fn(Vec<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.find_store(option.as_any())?.on_values(option, listener)
    }

    pub fn dynamic<T: FromValue>(&self, option: &Opt<T>) -> Result<DynamicOption<T>, OptionError> {
        self.find_store(option.as_any())?.dynamic(option)
    }

    pub fn dynamic_values<T: FromValue>(
        &self,
        option: &Opt<T>,
    ) -> Result<DynamicOption<Vec<T>>, OptionError> {
        self.find_store(option.as_any())?.dynamic_values(option)
    }

    /// Wait for pending listener notifications on every level.
    pub fn flush(&self) {
        for (_, store) in &self.levels {
            store.flush();
        }
    }
}

impl fmt::Debug for CommandStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStore")
            .field("commands", &self.commands())
            .field("main", &self.main())
            .finish()
    }
}
