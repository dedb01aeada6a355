use std::ffi::OsStr;

use anyhow::{Context, Result};
use citegraph_analysis::NeighborhoodAnalyzer;
use citegraph_config::{config_path, ensure_workspace_config, validate_config};
use citegraphd::cli::{Cli, Commands, LogFormat};
use citegraphd::commands::{
    run_analyze_file, run_export, run_ingest, run_related, run_report, run_search, run_stats,
    run_timeline, run_years,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.log_format);
    run(cli)
}

fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Human => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(cli: Cli) -> Result<()> {
    std::fs::create_dir_all(&cli.workspace).with_context(|| {
        format!(
            "failed to create workspace directory {}",
            cli.workspace.display()
        )
    })?;
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    let mut config = ensure_workspace_config(&workspace).with_context(|| {
        format!(
            "failed to load or create workspace config at {}",
            config_path(&workspace).display()
        )
    })?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "{}", warning.message);
    }
    if let Some(strategy) = cli.community_strategy {
        config.analytics.community_strategy = strategy;
    }
    tracing::debug!(
        workspace = %workspace.display(),
        community_strategy = config.analytics.community_strategy.as_str(),
        "loaded workspace config"
    );

    let analyzer = NeighborhoodAnalyzer::with_config(&workspace, config);
    let mut out = std::io::stdout().lock();

    match &cli.command {
        Commands::Ingest(args) => run_ingest(&workspace, args, &mut out).map(|_| ()),
        Commands::Search(args) => run_search(&workspace, args, &mut out),
        Commands::Years(args) => run_years(&workspace, args, &mut out),
        Commands::Related(args) => run_related(&workspace, args, &mut out),
        Commands::Report(args) => run_report(&analyzer, args, &mut out),
        Commands::Timeline(args) => run_timeline(&analyzer, args, &mut out),
        Commands::Export(args) => run_export(&analyzer, args, &mut out),
        Commands::AnalyzeFile(args) => run_analyze_file(&analyzer, args, &mut out),
        Commands::Stats => run_stats(&workspace, &mut out),
    }
}
