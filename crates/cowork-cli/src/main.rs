//! Demo CLI driving the `cowork-core` tool runtime: load config, start
//! every built-in tool set for a workspace, then either run one call
//! from the command line or drop into an interactive REPL.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cowork_core::{build_default_toolsets, ConfigManager, ToolCall, ToolCallFunction, ToolRuntime};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Parser)]
#[command(name = "cowork-cli", about = "Demo CLI for the cowork-core tool runtime")]
struct Cli {
    /// Workspace root the filesystem/shell/LSP tools operate against.
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Path to a runtime.toml config file. Defaults to the platform config dir.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List every tool exposed by the runtime.
    ListTools,
    /// Invoke one tool with a JSON arguments object and print the result.
    Call {
        name: String,
        #[arg(default_value = "{}")]
        arguments: String,
    },
    /// Drop into an interactive `tool_name {json args}` REPL.
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let workspace = cli
        .workspace
        .canonicalize()
        .with_context(|| format!("workspace {} does not exist", cli.workspace.display()))?;

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };

    let sets = build_default_toolsets(config_manager.config(), workspace.clone())?;
    let runtime = ToolRuntime::new(sets);
    runtime.start().await;

    let result = run_command(&runtime, cli.command.unwrap_or(Command::Repl)).await;

    runtime.stop().await;
    result
}

async fn run_command(runtime: &ToolRuntime, command: Command) -> Result<()> {
    match command {
        Command::ListTools => {
            for tool in runtime.tools() {
                println!("{:<28} {}", tool.name(), tool.description());
            }
            let instructions = runtime.instructions();
            if !instructions.is_empty() {
                println!("\n{instructions}");
            }
            Ok(())
        }
        Command::Call { name, arguments } => {
            let result = dispatch(runtime, &name, &arguments).await;
            println!("{}", result.output);
            if result.is_error {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Repl => run_repl(runtime).await,
    }
}

async fn dispatch(runtime: &ToolRuntime, name: &str, arguments: &str) -> cowork_core::ToolCallResult {
    runtime
        .dispatch(ToolCall {
            function: ToolCallFunction { name: name.to_string(), arguments: arguments.to_string() },
        })
        .await
}

async fn run_repl(runtime: &ToolRuntime) -> Result<()> {
    println!("cowork-cli REPL. Type a tool name and JSON arguments, e.g.:");
    println!("  read_file {{\"path\": \"Cargo.toml\"}}");
    println!("Type `tools` to list tools, `exit` to quit.\n");

    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    loop {
        match editor.readline("cowork> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if line == "exit" || line == "quit" {
                    break;
                }
                if line == "tools" {
                    for tool in runtime.tools() {
                        println!("{:<28} {}", tool.name(), tool.description());
                    }
                    continue;
                }
                let (name, arguments) = match line.split_once(' ') {
                    Some((name, rest)) => (name, rest.trim()),
                    None => (line, "{}"),
                };
                let result = dispatch(runtime, name, if arguments.is_empty() { "{}" } else { arguments }).await;
                println!("{}", result.output);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }
    Ok(())
}
