use clap::Parser;
use std::path::PathBuf;
use teardown::DemoConfig;
use teardown_registry::global;

#[derive(Parser)]
#[command(name = "teardown")]
#[command(about = "Write a temporary file, read it back, and tear everything down in reverse", long_about = None)]
#[command(version)]
struct Cli {
    /// Message written to the temporary file
    #[arg(long, env = "TEARDOWN_MESSAGE", default_value = "hello world")]
    message: String,

    /// Directory for the temporary file (defaults to the system temp dir)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Register an extra cleanup action that fails
    #[arg(long)]
    fail_cleanup: bool,

    /// Use the process-wide registry and run it on SIGINT/SIGTERM
    #[arg(long)]
    global: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    teardown::logging::init(level).map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;

    let config = DemoConfig {
        message: cli.message,
        dir: cli.dir,
        fail_cleanup: cli.fail_cleanup,
    };

    let contents = if cli.global {
        global::install_signal_handler()?;
        teardown::run_global(&config)?
    } else {
        teardown::run(&config)?
    };

    println!("{contents}");
    Ok(())
}
