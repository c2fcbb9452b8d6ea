//! Before and after hooks along the resolved lineage.

use std::cell::RefCell;
use std::rc::Rc;

use cascade_dispatch::{Command, CommandConfig, CommandGroup, CommandRef, CommandStore, DispatchError, HookPhase};

type Log = Rc<RefCell<Vec<String>>>;

fn hook(
    log: &Log,
    entry: &str,
) -> impl Fn(&Command, &CommandStore, &[String]) -> anyhow::Result<()> + 'static {
    let (log, entry) = (log.clone(), entry.to_string());
    move |_: &Command, _: &CommandStore, _: &[String]| {
        log.borrow_mut().push(entry.clone());
        Ok(())
    }
}

fn failing(
    log: &Log,
    entry: &str,
) -> impl Fn(&Command, &CommandStore, &[String]) -> anyhow::Result<()> + 'static {
    let (log, entry) = (log.clone(), entry.to_string());
    move |_: &Command, _: &CommandStore, _: &[String]| {
        log.borrow_mut().push(entry.clone());
        anyhow::bail!("{entry} failed")
    }
}

fn wrapped(log: &Log, name: &str) -> impl FnOnce(CommandConfig<()>) -> CommandConfig<()> {
    let before = hook(log, &format!("before {name}"));
    let after = hook(log, &format!("after {name}"));
    move |cfg| cfg.before(before).after(after)
}

fn tree(log: &Log) -> CommandGroup<()> {
    let exec = log.clone();
    let mut group = CommandGroup::new();
    group
        .register(CommandRef::Global, wrapped(log, "global"))
        .unwrap()
        .register("run", |cfg| wrapped(log, "run")(cfg.sub_command("sub")))
        .unwrap()
        .register("sub", |cfg| {
            wrapped(log, "sub")(cfg).handler(move |_, _, _| {
                exec.borrow_mut().push("exec".to_string());
                Ok(())
            })
        })
        .unwrap();
    group
}

#[test]
fn hooks_wrap_the_handler_root_first() {
    let log = Log::default();
    let group = tree(&log);

    group.run(&["run", "sub"]).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "before global",
            "before run",
            "before sub",
            "exec",
            "after sub",
            "after run",
            "after global",
        ]
    );
}

#[test]
fn only_resolved_levels_run_hooks() {
    let log = Log::default();
    let group = tree(&log);

    let err = group.run(&["run"]).unwrap_err();

    assert!(err.is_no_handler());
    assert!(log.borrow().is_empty());
}

#[test]
fn failing_before_hook_stops_everything() {
    let log = Log::default();
    let exec = log.clone();
    let mut group = CommandGroup::<()>::new();
    group
        .register(CommandRef::Global, |cfg| {
            cfg.before(hook(&log, "before global"))
                .after(hook(&log, "after global"))
        })
        .unwrap()
        .register("run", |cfg| {
            cfg.before(failing(&log, "before run"))
                .after(hook(&log, "after run"))
                .handler(move |_, _, _| {
                    exec.borrow_mut().push("exec".to_string());
                    Ok(())
                })
        })
        .unwrap();

    let err = group.run(&["run"]).unwrap_err();

    match &err {
        DispatchError::Hook(hook) => {
            assert_eq!(hook.phase, HookPhase::Before);
            assert_eq!(hook.level, group.command("run"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*log.borrow(), vec!["before global", "before run"]);
}

#[test]
fn failing_handler_skips_after_hooks() {
    let log = Log::default();
    let mut group = CommandGroup::<()>::new();
    group
        .register("run", |cfg| {
            cfg.before(hook(&log, "before run"))
                .after(hook(&log, "after run"))
                .handler(|_, _, _| anyhow::bail!("boom"))
        })
        .unwrap();

    let err = group.run(&["run"]).unwrap_err();

    assert!(matches!(err, DispatchError::Handler { .. }));
    assert_eq!(*log.borrow(), vec!["before run"]);
}

#[test]
fn failing_after_hook_stops_the_unwind() {
    let log = Log::default();
    let mut group = CommandGroup::<()>::new();
    group
        .register(CommandRef::Global, |cfg| cfg.after(hook(&log, "after global")))
        .unwrap()
        .register("run", |cfg| {
            cfg.after(failing(&log, "after run"))
                .handler(|_, _, _| Ok(()))
        })
        .unwrap();

    let err = group.run(&["run"]).unwrap_err();

    match err {
        DispatchError::Hook(hook) => assert_eq!(hook.phase, HookPhase::After),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*log.borrow(), vec!["after run"]);
}

#[test]
fn hooks_see_the_resolved_command_and_its_tail() {
    let seen: Rc<RefCell<Vec<(String, Vec<String>)>>> = Rc::default();
    let record = seen.clone();
    let mut group = CommandGroup::<()>::new();
    group
        .register(CommandRef::Global, |cfg| {
            cfg.before(move |command: &Command, store: &CommandStore, tail: &[String]| {
                assert_eq!(store.main(), Some(command));
                record
                    .borrow_mut()
                    .push((command.to_string(), tail.to_vec()));
                Ok(())
            })
        })
        .unwrap()
        .register("run", |cfg| cfg.handler(|_, _, _| Ok(())))
        .unwrap();

    group.run(&["run", "a", "b"]).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![("run".to_string(), vec!["a".to_string(), "b".to_string()])]
    );
}

#[test]
fn failing_root_before_hook_runs_once_and_stops_everything() {
    let log = Log::default();
    let exec = log.clone();
    let mut group = CommandGroup::<()>::new();
    group
        .register(CommandRef::Global, |cfg| {
            cfg.before(failing(&log, "before global"))
                .after(hook(&log, "after global"))
        })
        .unwrap()
        .register("run", |cfg| {
            wrapped(&log, "run")(cfg.sub_command("sub"))
        })
        .unwrap()
        .register("sub", |cfg| {
            wrapped(&log, "sub")(cfg).handler(move |_, _, _| {
                exec.borrow_mut().push("exec".to_string());
                Ok(())
            })
        })
        .unwrap();

    let err = group.run(&["run", "sub"]).unwrap_err();

    match err {
        DispatchError::Hook(hook) => {
            assert_eq!(hook.phase, HookPhase::Before);
            assert_eq!(hook.level, group.global());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*log.borrow(), vec!["before global"]);
}
