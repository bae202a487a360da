use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "artifice", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a graph description and print a per-node summary.
    Run(RunArgs),
    /// List the registered node kinds with their ports and parameters.
    Nodes,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input graph description JSON.
    #[arg(long)]
    graph: PathBuf,

    /// Worker threads for the run (default: global rayon pool).
    #[arg(long)]
    threads: Option<usize>,

    /// Only run this node and its ancestors. Repeatable.
    #[arg(long = "target")]
    targets: Vec<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ARTIFICE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Nodes => cmd_nodes(),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let registry = artifice::OperatorRegistry::with_builtins();
    let mut graph = artifice::Graph::load(&args.graph, &registry)
        .with_context(|| format!("load graph '{}'", args.graph.display()))?;

    let opts = artifice::ExecOptions {
        threads: args.threads,
        targets: args.targets.into_iter().map(artifice::NodeId).collect(),
        cancel: None,
    };
    let report = graph.execute_with(&opts)?;

    println!("graph '{}': {} node(s)", graph.name(), graph.len());
    for &id in &report.order {
        let kind = graph.kind(id).unwrap_or("?");
        let status = if report.computed.contains(&id) {
            "computed".to_string()
        } else if report.reused.contains(&id) {
            "reused".to_string()
        } else if report.skipped.contains(&id) {
            "skipped".to_string()
        } else if let Some(f) = report.failures.iter().find(|f| f.node == id) {
            format!("failed: {}", f.error)
        } else {
            "?".to_string()
        };
        println!("  {:>5} {kind:<12} {status}", id.to_string());
    }

    if report.is_success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} node(s) failed, {} skipped",
            report.failures.len(),
            report.skipped.len()
        )
    }
}

fn cmd_nodes() -> anyhow::Result<()> {
    let registry = artifice::OperatorRegistry::with_builtins();
    for kind in registry.kinds() {
        let op = registry.create(kind)?;
        println!("{kind}");
        for input in op.inputs() {
            let opt = if input.required { "" } else { " (optional)" };
            println!("  in  {}: {}{opt}", input.name, input.ty);
        }
        for output in op.outputs() {
            println!("  out {}: {}", output.name, output.ty);
        }
        for param in op.params() {
            println!("  param {} = {}", param.name, param.default.to_json());
        }
    }
    Ok(())
}
