use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use dy_console::console::{Console, Reply};
use dy_console::render;
use dy_core::services::config_loader;
use dy_core::services::docker::DockerCli;
use dy_core::services::session::Session;

#[derive(Debug, Parser)]
#[command(name = "dockyard", version, about = "Create app folders and deploy them as local containers")]
struct Args {
    /// Directory holding the managed folders (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Run the commands in this file instead of reading stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write debug logs to .dockyard-debug.log
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let _guard = setup_logging(args.debug);

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let config = config_loader::load_or_default(&root)?;
    tracing::debug!(root = %root.display(), ?config, "starting");

    let mut console = Console::new(Session::with_docker(root, &config));

    match args.script {
        Some(script_path) => run_script(&mut console, script_path).await,
        None => run_interactive(&mut console).await,
    }
}

/// Logs go to stderr at `info`. With `--debug` they go to
/// `.dockyard-debug.log` in the working directory at `debug` instead; the
/// returned guard must live until exit.
fn setup_logging(debug: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if debug {
        let file_appender = tracing_appender::rolling::never(".", config_loader::DEBUG_LOG_FILENAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_env_filter(filter)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .init();
        None
    }
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Text(text) | Reply::Error(text) => println!("{text}"),
        Reply::Quit => {}
    }
}

/// Read commands from stdin until `quit` or end of input.
async fn run_interactive(console: &mut Console<DockerCli>) -> color_eyre::Result<()> {
    println!("{}", render::TITLE);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("dockyard> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if let Some(reply) = console.handle_line(&line).await {
            print_reply(&reply);
            if reply == Reply::Quit {
                break;
            }
        }
    }
    Ok(())
}

/// Run a script, echoing each command before its output. Failed commands do
/// not stop the script.
async fn run_script(console: &mut Console<DockerCli>, script_path: PathBuf) -> color_eyre::Result<()> {
    let script = tokio::fs::read_to_string(&script_path).await?;
    let mut failures = 0usize;

    for line in script.lines() {
        let Some(reply) = console.handle_line(line).await else {
            continue;
        };
        println!("> {}", line.trim());
        print_reply(&reply);
        if reply.is_error() {
            failures += 1;
        }
        if reply == Reply::Quit {
            break;
        }
    }

    if failures > 0 {
        tracing::warn!(failures, script = %script_path.display(), "script finished with errors");
    }
    Ok(())
}
