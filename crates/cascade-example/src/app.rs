//! The demo command tree.
//!
//! ```text
//! cascade-demo [--verbose] [--env=NAME]
//!   serve [--host=H] [--port=P] [--timeout=30s] [--mode=fast|safe]
//!   db [--database=URL]
//!     migrate [--dry-run] [STEPS...]
//!     status
//! ```
//!
//! Every option can also come from `cascade-demo.properties` or from
//! `DEMO_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use cascade::prelude::*;
use log::info;
use url::Url;

pub const PROPERTY_FILE: &str = "cascade-demo.properties";
pub const ENV_PREFIX: &str = "DEMO";

/// Options shared across the tree.
#[derive(Clone)]
pub struct DemoOptions {
    pub verbose: Opt<bool>,
    pub env: Opt<String>,
    pub host: Opt<String>,
    pub port: Opt<i64>,
    pub timeout: Opt<Duration>,
    pub mode: Opt<String>,
    pub database: Opt<Url>,
    pub dry_run: Opt<bool>,
    pub workdir: Opt<PathBuf>,
}

impl DemoOptions {
    pub fn new() -> Result<Self, OptionError> {
        Ok(Self {
            verbose: Opt::boolean("verbose"),
            env: Opt::string("env").default_str("dev"),
            host: Opt::string("host").default_str("127.0.0.1"),
            port: Opt::integer("port").default_value(8080),
            timeout: Opt::duration("timeout").default_expr("30s")?,
            mode: Opt::one_of("mode", ["fast", "safe"]).default_str("safe"),
            database: Opt::uri("database").default_uri("postgres://localhost/demo")?,
            dry_run: Opt::boolean("dry-run"),
            workdir: Opt::path("workdir"),
        })
    }
}

/// Settings for a real run: the property file next to the working
/// directory and the process environment.
pub fn default_settings() -> SourceSettings {
    SourceSettings::new()
        .property_file(PROPERTY_FILE)
        .environment(ENV_PREFIX, "_")
}

pub fn build(settings: SourceSettings) -> anyhow::Result<CommandGroup<String>> {
    let opts = DemoOptions::new()?;
    let mut app = CommandGroup::new().settings(settings);

    let o = opts.clone();
    app.register(CommandRef::Global, |cfg| {
        cfg.options([opts.verbose.any(), opts.env.any()])
            .before(move |command, store, _| {
                if store.find(&o.verbose)?.unwrap_or(false) {
                    info!("running {command} in {}", store.find(&o.env)?.unwrap_or_default());
                }
                Ok(())
            })
            .handler(|_, _, tail| {
                if tail.is_empty() {
                    Ok("usage: cascade-demo [--verbose] <serve|db> ...".to_string())
                } else {
                    anyhow::bail!("unknown command: {}", tail.join(" "))
                }
            })
    })?;

    let o = opts.clone();
    app.register("serve", |cfg| {
        cfg.options([
            opts.host.any(),
            opts.port.any(),
            opts.timeout.any(),
            opts.mode.any(),
            opts.workdir.any(),
        ])
        .handler(move |_, store, _| {
            let host = store.get(&o.host)?.unwrap_or_default();
            let port = store.get(&o.port)?.unwrap_or_default();
            let timeout = store.get(&o.timeout)?.unwrap_or_default();
            let mode = store.get(&o.mode)?.unwrap_or_default();

            // Follow later changes to the port, e.g. from a reload.
            store.on_value(&o.port, |port: i64| {
                info!("port is now {port}");
                Ok(())
            })?;
            store.flush();

            let mut line = format!(
                "serving on {host}:{port} (timeout {}s, {mode})",
                timeout.as_secs()
            );
            if let Some(dir) = store.get(&o.workdir)? {
                line.push_str(&format!(" from {}", dir.display()));
            }
            Ok(line)
        })
    })?;

    app.register("db", |cfg| {
        cfg.option(&opts.database)
            .sub_command("migrate")
            .sub_command("status")
    })?;

    let o = opts.clone();
    app.register("migrate", |cfg| {
        cfg.option(&opts.dry_run).handler(move |_, store, steps| {
            let database = store
                .find(&o.database)?
                .ok_or_else(|| anyhow::anyhow!("no database configured"))?;
            let verb = if store.get(&o.dry_run)?.unwrap_or(false) {
                "would migrate"
            } else {
                "migrating"
            };
            let steps = if steps.is_empty() {
                "all pending".to_string()
            } else {
                steps.join(", ")
            };
            Ok(format!("{verb} {database} ({steps})"))
        })
    })?;

    let o = opts;
    app.register("status", |cfg| {
        cfg.handler(move |_, store, _| {
            let database = store.find(&o.database)?;
            let env = store.find(&o.env)?.unwrap_or_default();
            Ok(match database {
                Some(url) => format!("{env}: {} on {}", url.path(), url.host_str().unwrap_or("?")),
                None => format!("{env}: no database"),
            })
        })
    })?;

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn run(settings: SourceSettings, args: &[&str]) -> String {
        build(settings).unwrap().run(args).unwrap().unwrap()
    }

    #[test]
    fn bare_invocation_prints_usage() {
        assert!(run(SourceSettings::new(), &[]).starts_with("usage:"));
    }

    #[test]
    fn unknown_command_fails() {
        let err = build(SourceSettings::new()).unwrap().run(&["deploy"]).unwrap_err();
        assert!(err.to_string().contains("unknown command: deploy"));
    }

    #[test]
    fn serve_uses_defaults() {
        assert_eq!(
            run(SourceSettings::new(), &["serve"]),
            "serving on 127.0.0.1:8080 (timeout 30s, safe)"
        );
    }

    #[test]
    fn serve_layers_every_source() {
        let settings = SourceSettings::new()
            .property_file("embedded://demo.properties")
            .resources(StaticResources::new().with("demo.properties", "port=9000\ntimeout=2m\nmode=FAST"))
            .environment(ENV_PREFIX, "_")
            .env_reader(MockEnv::new().with_var("DEMO_HOST", "0.0.0.0").with_var("DEMO_PORT", "9100"));

        assert_eq!(
            run(settings, &["serve", "--port=9200", "--workdir=/srv"]),
            "serving on 0.0.0.0:9200 (timeout 120s, fast) from /srv"
        );
    }

    #[test]
    fn migrate_reads_the_database_from_its_parent() {
        assert_eq!(
            run(
                SourceSettings::new(),
                &["db", "--database=postgres://db.internal/prod", "migrate", "--dry-run", "0042"]
            ),
            "would migrate postgres://db.internal/prod (0042)"
        );
    }

    #[test]
    fn status_reports_the_environment() {
        let settings = SourceSettings::new()
            .environment(ENV_PREFIX, "_")
            .env_reader(MockEnv::new().with_var("DEMO_ENV", "staging"));
        assert_eq!(run(settings, &["db", "status"]), "staging: /demo on localhost");
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let err = build(SourceSettings::new())
            .unwrap()
            .run(&["serve", "--mode=reckless"])
            .unwrap_err();
        assert!(err.to_string().contains("reckless"));
    }

    #[test]
    #[serial]
    fn reads_the_process_environment() {
        std::env::set_var("DEMO_PORT", "7000");
        let out = run(SourceSettings::new().environment(ENV_PREFIX, "_"), &["serve"]);
        std::env::remove_var("DEMO_PORT");
        assert_eq!(out, "serving on 127.0.0.1:7000 (timeout 30s, safe)");
    }

    #[test]
    #[serial]
    fn reads_the_property_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROPERTY_FILE);
        std::fs::write(&path, "database = postgres://files.example.org/app\n").unwrap();

        let settings = SourceSettings::new().property_file(path.to_string_lossy());
        assert_eq!(
            run(settings, &["db", "migrate"]),
            "migrating postgres://files.example.org/app (all pending)"
        );
    }
}
