use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zenruntime::{Greeting, Session, SessionConfig};

#[derive(Parser)]
struct Cli {
    /// directory searched for Lua modules, may repeat
    #[arg(short = 'L', long = "module-path", value_name = "DIR")]
    module_paths: Vec<PathBuf>,

    /// zencode engine module
    #[arg(long, default_value = "zencode")]
    engine: String,

    /// name of the host-interop module
    #[arg(long, default_value = "host")]
    host_module: String,

    /// host expression whose value is exposed to the session
    #[arg(long, default_value = "4+4")]
    expr: String,

    /// global receiving the exposed value
    #[arg(long, default_value = "number")]
    bind: String,

    #[arg(long, default_value = "Tom")]
    first_name: String,

    #[arg(long, default_value = "Fuerstner")]
    last_name: String,

    #[arg(long, default_value = "Tom Fuerstner")]
    result: String,

    /// zencode script to run instead of the hello scenario
    #[arg(long)]
    script: Option<PathBuf>,

    /// argument of the engine's `begin` call
    #[arg(long, default_value_t = 1)]
    level: i64,

    /// more logging, may repeat
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::new(SessionConfig {
        module_paths: cli.module_paths,
        engine_module: cli.engine,
        host_module: cli.host_module,
    })?;
    session.load_modules()?;

    let number = session.expose(&cli.bind, &cli.expr)?;
    println!("{number}");

    let script = match cli.script {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => Greeting::hello(cli.first_name, cli.last_name, cli.result)?.render(),
    };

    session.begin(cli.level)?;
    session.parse(&script)?;
    session.run()?;

    Ok(())
}
