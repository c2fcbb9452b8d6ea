use cascade::prelude::*;

#[test]
fn prelude_covers_a_small_application() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.properties");
    std::fs::write(&path, "name = from-file\n").unwrap();

    let name = Opt::string("name");
    let loud = Opt::boolean("loud");
    let (read_name, read_loud) = (name.clone(), loud.clone());

    let mut app = CommandGroup::<String>::new().settings(
        SourceSettings::new()
            .property_file(path.to_string_lossy())
            .environment("", "_")
            .env_reader(MockEnv::new().with_var("LOUD", "true")),
    );
    app.register(CommandRef::Global, |cfg| cfg.option(&loud))
        .unwrap()
        .register("greet", |cfg| {
            cfg.option(&name).handler(move |_, store, tail| {
                let mut greeting = format!("hello {}", store.get(&read_name)?.unwrap_or_default());
                if store.find(&read_loud)?.unwrap_or(false) {
                    greeting = greeting.to_uppercase();
                }
                Ok(format!("{greeting} {}", tail.join(" ")))
            })
        })
        .unwrap();

    let out = app.run(&["greet", "--name=cli", "and", "friends"]).unwrap();
    assert_eq!(out.as_deref(), Some("HELLO CLI and friends"));

    let out = app.run(&["--no-loud", "greet"]).unwrap();
    assert_eq!(out.as_deref(), Some("hello from-file "));
}

#[test]
fn standalone_store_with_sources() -> anyhow::Result<()> {
    let level = Opt::integer("level").default_value(1);
    let arguments = ArgumentSource::new();
    let store = OptionStore::with_sources([level.any()], &[&DefaultsSource, &arguments])?;

    assert_eq!(store.get(&level)?, Some(1));
    arguments.consume(&["--level=4"])?;
    assert_eq!(store.get(&level)?, Some(4));
    Ok(())
}
