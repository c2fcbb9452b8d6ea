//! Command tree registration and dispatch.
//!
//! A [`CommandGroup`] holds one registration per command. Running it walks
//! the argument vector down the tree: each visited level gets its own
//! [`OptionStore`] fed by defaults, the configured property file and
//! environment, the level's store customization and finally the
//! arguments. Options recognized at a level are consumed there; the first
//! remaining token selects a sub-command, or makes the current level the
//! resolved command.
//!
//! ```text
//! run(["--verbose", "db", "migrate", "--dry-run"])
//!   <global>  consumes --verbose, tail [db, migrate, --dry-run]
//!   db        tail [migrate, --dry-run]
//!   migrate   consumes --dry-run, tail []  ← resolved
//! ```
//!
//! The resolved command runs the nearest handler found walking up its
//! parents, wrapped in the before and after hooks of every level from the
//! root down to it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use cascade_options::{
    AnyOpt, ArgumentSource, DefaultsSource, EnvironmentSource, OptionError, OptionStore,
    Properties, PropertyFileSource, ScanMode,
};
use log::debug;
use once_cell::unsync::OnceCell;

use crate::handler::{Handler, HandlerRef, HandlerResult, StoreConfigFn};
use crate::hooks::Hooks;
use crate::{Command, CommandRegistry, CommandStore, DispatchError, SourceSettings};

/// A command to register, by name or by identity.
#[derive(Debug, Clone)]
pub enum CommandRef {
    /// The root of the group's tree.
    Global,
    Name(String),
    Command(Command),
}

impl From<&str> for CommandRef {
    fn from(name: &str) -> Self {
        CommandRef::Name(name.to_string())
    }
}

impl From<String> for CommandRef {
    fn from(name: String) -> Self {
        CommandRef::Name(name)
    }
}

impl From<Command> for CommandRef {
    fn from(command: Command) -> Self {
        CommandRef::Command(command)
    }
}

impl From<&Command> for CommandRef {
    fn from(command: &Command) -> Self {
        CommandRef::Command(command.clone())
    }
}

/// Configuration collected by the closure passed to
/// [`CommandGroup::register`]. Nothing is applied until the closure
/// returns.
pub struct CommandConfig<T> {
    options: Vec<AnyOpt>,
    subs: Vec<CommandRef>,
    handler: Option<HandlerRef<T>>,
    hooks: Hooks,
    store_config: Option<StoreConfigFn>,
    full_scan: Option<bool>,
}

impl<T: 'static> CommandConfig<T> {
    fn new() -> Self {
        Self {
            options: Vec::new(),
            subs: Vec::new(),
            handler: None,
            hooks: Hooks::default(),
            store_config: None,
            full_scan: None,
        }
    }

    /// Declare an option at this level.
    pub fn option(mut self, option: impl Into<AnyOpt>) -> Self {
        self.options.push(option.into());
        self
    }

    /// Declare several options at this level.
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AnyOpt>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Run `f` when this command, or a descendant without its own
    /// handler, is resolved.
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Command, &CommandStore, &[String]) -> HandlerResult<T> + 'static,
    {
        self.handler = Some(Rc::new(f));
        self
    }

    /// Like [`handler`](Self::handler), for [`Handler`] implementations.
    pub fn handler_with(mut self, handler: impl Handler<T> + 'static) -> Self {
        self.handler = Some(Rc::new(handler));
        self
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&Command, &CommandStore, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.hooks.before = Some(Rc::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&Command, &CommandStore, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.hooks.after = Some(Rc::new(f));
        self
    }

    /// Adjust this level's store after its standard sources are bound
    /// and before arguments are consumed, e.g. to bind an extra source.
    pub fn configure_store<F>(mut self, f: F) -> Self
    where
        F: Fn(&OptionStore) -> anyhow::Result<()> + 'static,
    {
        self.store_config = Some(Rc::new(f));
        self
    }

    /// Attach a child. A command has at most one parent.
    pub fn sub_command(mut self, command: impl Into<CommandRef>) -> Self {
        self.subs.push(command.into());
        self
    }

    /// Force or forbid scanning past unrecognized tokens. Unset, levels
    /// without sub-commands scan fully and others stop at the first one.
    pub fn full_scan(mut self, full_scan: bool) -> Self {
        self.full_scan = Some(full_scan);
        self
    }
}

struct Node<T> {
    options: Vec<AnyOpt>,
    subs: Vec<Command>,
    parent: Option<Command>,
    handler: Option<HandlerRef<T>>,
    hooks: Hooks,
    store_config: Option<StoreConfigFn>,
    full_scan: Option<bool>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            subs: Vec::new(),
            parent: None,
            handler: None,
            hooks: Hooks::default(),
            store_config: None,
            full_scan: None,
        }
    }
}

/// A tree of commands, each with options, hooks and an optional handler.
///
/// # Example
///
/// ```rust
/// use cascade_dispatch::CommandGroup;
/// use cascade_options::Opt;
///
/// let name = Opt::string("name").default_str("World");
///
/// let mut group = CommandGroup::<String>::new();
/// let greeting = name.clone();
/// group
///     .register("greet", |cfg| {
///         cfg.option(&name).handler(move |_, store, _| {
///             Ok(format!("Hello, {}!", store.get(&greeting)?.unwrap_or_default()))
///         })
///     })
///     .unwrap();
///
/// assert_eq!(group.run(&["greet"]).unwrap().as_deref(), Some("Hello, World!"));
/// assert_eq!(
///     group.run(&["greet", "--name=John"]).unwrap().as_deref(),
///     Some("Hello, John!")
/// );
/// ```
pub struct CommandGroup<T = ()> {
    registry: Arc<CommandRegistry>,
    global: Command,
    nodes: HashMap<Command, Node<T>>,
    order: Vec<Command>,
    settings: SourceSettings,
    root_children: OnceCell<Vec<Command>>,
}

impl<T: 'static> Default for CommandGroup<T> {
    fn default() -> Self {
        Self::with_registry(Arc::new(CommandRegistry::new()))
    }
}

impl<T: 'static> CommandGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group interning names through a shared registry.
    pub fn with_registry(registry: Arc<CommandRegistry>) -> Self {
        let global = registry.global();
        let mut nodes = HashMap::new();
        nodes.insert(global.clone(), Node::default());
        Self {
            registry,
            order: vec![global.clone()],
            global,
            nodes,
            settings: SourceSettings::default(),
            root_children: OnceCell::new(),
        }
    }

    /// Property file and environment bound at every level.
    pub fn settings(mut self, settings: SourceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn source_settings(&self) -> &SourceSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The root of this group's tree.
    pub fn global(&self) -> Command {
        self.global.clone()
    }

    /// The identity for `name` in this group's registry.
    pub fn command(&self, name: &str) -> Command {
        self.registry.get(name)
    }

    fn identity(&self, command: CommandRef) -> Command {
        match command {
            CommandRef::Global => self.global.clone(),
            CommandRef::Name(name) => self.registry.get(&name),
            CommandRef::Command(command) => command,
        }
    }

    /// Whether `command` has a registration.
    pub fn is_registered(&self, command: &Command) -> bool {
        self.nodes.contains_key(command)
    }

    /// Register a command without configuration.
    pub fn declare(&mut self, command: impl Into<CommandRef>) -> &mut Self {
        let command = self.identity(command.into());
        self.ensure(&command);
        self
    }

    /// Register or extend a command.
    ///
    /// Options and sub-commands accumulate over repeated registrations;
    /// handler, hooks, store customization and scan mode are replaced.
    /// Attaching a sub-command that already has a different parent fails
    /// with [`DispatchError::SubCommandConflict`] and leaves the group
    /// untouched. Attaching the root, the command itself or one of its
    /// ancestors fails with [`DispatchError::SubCommandCycle`].
    pub fn register<C, F>(&mut self, command: C, configure: F) -> Result<&mut Self, DispatchError>
    where
        C: Into<CommandRef>,
        F: FnOnce(CommandConfig<T>) -> CommandConfig<T>,
    {
        let command = self.identity(command.into());
        let config = configure(CommandConfig::new());
        let subs: Vec<Command> = config
            .subs
            .into_iter()
            .map(|sub| self.identity(sub))
            .collect();

        let ancestors = self.lineage(&command);
        for sub in &subs {
            if *sub == self.global || ancestors.contains(sub) {
                return Err(DispatchError::SubCommandCycle {
                    command: sub.clone(),
                    requested: command,
                });
            }
            if let Some(parent) = self.parent_of(sub) {
                if parent != command {
                    return Err(DispatchError::SubCommandConflict {
                        command: sub.clone(),
                        parent,
                        requested: command,
                    });
                }
            }
        }

        self.ensure(&command);
        for sub in &subs {
            self.ensure(sub).parent = Some(command.clone());
        }

        let node = self.ensure(&command);
        for option in config.options {
            if !node.options.contains(&option) {
                node.options.push(option);
            }
        }
        for sub in subs {
            if !node.subs.contains(&sub) {
                node.subs.push(sub);
            }
        }
        if config.handler.is_some() {
            node.handler = config.handler;
        }
        if config.hooks.before.is_some() {
            node.hooks.before = config.hooks.before;
        }
        if config.hooks.after.is_some() {
            node.hooks.after = config.hooks.after;
        }
        if config.store_config.is_some() {
            node.store_config = config.store_config;
        }
        if config.full_scan.is_some() {
            node.full_scan = config.full_scan;
        }
        Ok(self)
    }

    fn ensure(&mut self, command: &Command) -> &mut Node<T> {
        if !self.nodes.contains_key(command) {
            self.order.push(command.clone());
        }
        self.nodes.entry(command.clone()).or_default()
    }

    /// Children of the root: its explicit sub-commands or, when it has
    /// none, every parentless command. Fixed on the first use that finds
    /// any; while there are none it is recomputed on every call.
    fn root_children(&self) -> &[Command] {
        if let Some(children) = self.root_children.get() {
            return children;
        }
        let explicit = self
            .nodes
            .get(&self.global)
            .map(|node| node.subs.clone())
            .unwrap_or_default();
        let children: Vec<Command> = if explicit.is_empty() {
            self.order
                .iter()
                .filter(|c| **c != self.global)
                .filter(|c| self.nodes.get(*c).is_some_and(|node| node.parent.is_none()))
                .cloned()
                .collect()
        } else {
            explicit
        };
        if children.is_empty() {
            return &[];
        }
        self.root_children.get_or_init(|| children)
    }

    fn children_of<'a>(&'a self, command: &Command, node: &'a Node<T>) -> &'a [Command] {
        if *command == self.global {
            self.root_children()
        } else {
            &node.subs
        }
    }

    fn parent_of(&self, command: &Command) -> Option<Command> {
        let node = self.nodes.get(command)?;
        if let Some(parent) = &node.parent {
            return Some(parent.clone());
        }
        match self.root_children.get() {
            Some(children) if *command != self.global && children.contains(command) => {
                Some(self.global.clone())
            }
            _ => None,
        }
    }

    /// Ancestors of `leaf` through parent links, root first, ending with
    /// `leaf` itself.
    fn lineage(&self, leaf: &Command) -> Vec<Command> {
        let mut lineage = vec![leaf.clone()];
        let mut current = leaf.clone();
        while let Some(parent) = self.parent_of(&current) {
            lineage.push(parent.clone());
            current = parent;
        }
        lineage.reverse();
        lineage
    }

    /// Resolve `args` from the root and run the resolved command.
    ///
    /// Returns `Ok(None)` only when the starting command is unregistered.
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Option<T>, DispatchError> {
        self.run_command(&self.global, args)
    }

    /// Resolve `args` starting at `command` instead of the root.
    pub fn run_command<S: AsRef<str>>(
        &self,
        command: &Command,
        args: &[S],
    ) -> Result<Option<T>, DispatchError> {
        self.root_children();
        let properties = self.settings.load_properties()?;
        let mut chain = CommandStore::new();
        let mut current = command.clone();
        let mut args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        loop {
            let Some(node) = self.nodes.get(&current) else {
                debug!("Command {current} is not registered, nothing to run");
                return Ok(None);
            };

            let arguments = ArgumentSource::new();
            let store = self.level_store(&current, node, &arguments, properties.as_ref())?;
            let children = self.children_of(&current, node);
            let full_scan = node.full_scan.unwrap_or(children.is_empty());
            let tail = arguments.consume_tailed(&args, ScanMode::from_full_scan(full_scan))?;
            chain.add_store(current.clone(), store)?;

            let next = tail
                .first()
                .and_then(|token| children.iter().find(|child| child.matches(token)));
            match next {
                Some(sub) => {
                    debug!("Command {current} descends into {sub}");
                    current = sub.clone();
                    args = tail[1..].to_vec();
                }
                None => return self.execute(&current, &mut chain, tail).map(Some),
            }
        }
    }

    fn level_store(
        &self,
        command: &Command,
        node: &Node<T>,
        arguments: &ArgumentSource,
        properties: Option<&Properties>,
    ) -> Result<OptionStore, DispatchError> {
        debug!("Building option store for {command}");
        let store = OptionStore::new(node.options.iter().cloned())?;
        store.bind(&DefaultsSource)?;

        if let Some(properties) = properties {
            let source = PropertyFileSource::new();
            store.bind(&source)?;
            source.consume_properties(properties)?;
        }

        if let Some((prefix, separator)) = self.settings.environment_binding() {
            let source = EnvironmentSource::new(prefix, separator);
            store.bind(&source)?;
            source.consume(self.settings.reader())?;
        }

        if let Some(configure) = &node.store_config {
            configure(&store).map_err(|e| {
                OptionError::source_failure(format!("store configuration of {command}"), e)
            })?;
        }

        store.bind(arguments)?;
        Ok(store)
    }

    fn execute(
        &self,
        leaf: &Command,
        chain: &mut CommandStore,
        tail: Vec<String>,
    ) -> Result<T, DispatchError> {
        let lineage = self.lineage(leaf);
        let (owner, handler) = lineage
            .iter()
            .rev()
            .find_map(|level| {
                let handler = self.nodes.get(level)?.handler.clone()?;
                Some((level, handler))
            })
            .ok_or_else(|| DispatchError::NoHandler {
                command: leaf.clone(),
            })?;
        if owner != leaf {
            debug!("Command {leaf} runs the handler of {owner}");
        }

        chain.set_main(leaf);
        let chain: &CommandStore = chain;
        let levels: Vec<(&Command, &Hooks)> = lineage
            .iter()
            .filter_map(|level| self.nodes.get(level).map(|node| (level, &node.hooks)))
            .collect();

        for (level, hooks) in &levels {
            hooks.run_before(level, leaf, chain, &tail)?;
        }
        let value = handler
            .handle(leaf, chain, &tail)
            .map_err(|e| DispatchError::handler(leaf, e))?;
        for (level, hooks) in levels.iter().rev() {
            hooks.run_after(level, leaf, chain, &tail)?;
        }
        Ok(value)
    }
}

impl<T> fmt::Debug for CommandGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGroup")
            .field("commands", &self.order)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl Fn(&Command, &CommandStore, &[String]) -> HandlerResult<()> {
        |_: &Command, _: &CommandStore, _: &[String]| Ok(())
    }

    #[test]
    fn the_root_is_always_registered() {
        let group = CommandGroup::<()>::new();
        assert!(group.is_registered(&group.global()));
    }

    #[test]
    fn sub_commands_register_implicitly() {
        let mut group = CommandGroup::<()>::new();
        group.register("top", |cfg| cfg.sub_command("middle")).unwrap();
        let middle = group.command("middle");
        assert!(group.is_registered(&middle));
        assert_eq!(group.parent_of(&middle), Some(group.command("top")));
    }

    #[test]
    fn conflicting_parent_leaves_group_untouched() {
        let mut group = CommandGroup::<()>::new();
        group.register("start-one", |cfg| cfg.sub_command("sub")).unwrap();

        let err = group
            .register("start-two", |cfg| {
                cfg.sub_command("other").sub_command("sub").handler(noop())
            })
            .err()
            .unwrap();

        assert!(err.is_conflict());
        assert!(!group.is_registered(&group.command("start-two")));
        assert!(!group.is_registered(&group.command("other")));
        assert_eq!(
            group.parent_of(&group.command("sub")),
            Some(group.command("start-one"))
        );
    }

    #[test]
    fn re_registering_under_the_same_parent_is_allowed() {
        let mut group = CommandGroup::<()>::new();
        group.register("top", |cfg| cfg.sub_command("sub")).unwrap();
        group.register("top", |cfg| cfg.sub_command("sub")).unwrap();
        let top = group.command("top");
        assert_eq!(group.nodes[&top].subs, vec![group.command("sub")]);
    }

    #[test]
    fn registrations_accumulate_options() {
        let mut group = CommandGroup::<()>::new();
        let a = cascade_options::Opt::string("a");
        let b = cascade_options::Opt::string("b");
        group.register("run", |cfg| cfg.option(&a)).unwrap();
        group.register("run", |cfg| cfg.option(&b).full_scan(false)).unwrap();
        let node = &group.nodes[&group.command("run")];
        assert_eq!(node.options, vec![a.any(), b.any()]);
        assert_eq!(node.full_scan, Some(false));
    }

    #[test]
    fn root_children_are_parentless_commands_in_order() {
        let mut group = CommandGroup::<()>::new();
        group.register("b", |cfg| cfg.sub_command("c")).unwrap();
        group.declare("a");
        assert_eq!(
            group.root_children(),
            &[group.command("b"), group.command("a")][..]
        );
    }

    #[test]
    fn explicit_root_children_win() {
        let mut group = CommandGroup::<()>::new();
        group
            .register(CommandRef::Global, |cfg| cfg.sub_command("run"))
            .unwrap();
        group.declare("other");
        assert_eq!(group.root_children(), &[group.command("run")][..]);
    }

    #[test]
    fn implicit_root_parentage_counts_as_a_parent() {
        let mut group = CommandGroup::<()>::new();
        group.declare("run");
        group.root_children();

        let err = group
            .register("other", |cfg| cfg.sub_command("run"))
            .err()
            .unwrap();
        assert!(err.is_conflict());
    }

    #[test]
    fn lineage_runs_root_to_leaf() {
        let mut group = CommandGroup::<()>::new();
        group.register("top", |cfg| cfg.sub_command("middle")).unwrap();
        group.register("middle", |cfg| cfg.sub_command("leaf")).unwrap();
        group.root_children();

        let lineage = group.lineage(&group.command("leaf"));
        assert_eq!(
            lineage,
            vec![
                group.global(),
                group.command("top"),
                group.command("middle"),
                group.command("leaf"),
            ]
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let mut group = CommandGroup::<()>::new();
        group.register("a", |cfg| cfg.sub_command("b")).unwrap();

        let err = group.register("b", |cfg| cfg.sub_command("a")).err().unwrap();
        assert!(matches!(err, DispatchError::SubCommandCycle { .. }));
        assert_eq!(group.parent_of(&group.command("a")), None);

        let err = group.register("c", |cfg| cfg.sub_command("c")).err().unwrap();
        assert!(matches!(err, DispatchError::SubCommandCycle { .. }));

        let err = group
            .register("d", |cfg| cfg.sub_command(CommandRef::Global))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::SubCommandCycle { .. }));
    }

    #[test]
    fn deep_cycles_are_rejected() {
        let mut group = CommandGroup::<()>::new();
        group.register("top", |cfg| cfg.sub_command("middle")).unwrap();
        group.register("middle", |cfg| cfg.sub_command("leaf")).unwrap();

        let err = group.register("leaf", |cfg| cfg.sub_command("top")).err().unwrap();
        assert!(matches!(err, DispatchError::SubCommandCycle { .. }));
        assert!(group.nodes[&group.command("leaf")].subs.is_empty());
    }

    #[test]
    fn repeated_options_are_declared_once() {
        let mut group = CommandGroup::<()>::new();
        let k = cascade_options::Opt::string("k");
        group.register("run", |cfg| cfg.option(&k)).unwrap();
        group.register("run", |cfg| cfg.option(&k).options([k.any()])).unwrap();
        assert_eq!(group.nodes[&group.command("run")].options, vec![k.any()]);
    }

    #[test]
    fn empty_root_children_are_not_frozen() {
        let mut group = CommandGroup::<()>::new();
        assert!(group.root_children().is_empty());

        group.declare("serve");
        assert_eq!(group.root_children(), &[group.command("serve")][..]);

        group.declare("later");
        assert_eq!(group.root_children(), &[group.command("serve")][..]);
    }
}
