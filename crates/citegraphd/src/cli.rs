use std::path::PathBuf;

use citegraph_analysis::ExportFormat;
use citegraph_config::CommunityStrategyKind;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid output format '{other}', expected one of: table, json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct IngestArgs {
    #[arg(help = "JSON file with {\"papers\": [...], \"citations\": [...]}")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SearchArgs {
    #[arg(help = "Substring matched against title, authors and keywords")]
    pub query: String,

    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct YearsArgs {
    #[arg(help = "First publication year (inclusive)")]
    pub start: i32,

    #[arg(help = "Last publication year (inclusive)")]
    pub end: i32,

    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct PaperArgs {
    #[arg(help = "Paper DOI")]
    pub doi: String,

    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct GraphFilterArgs {
    #[arg(long, requires = "max_year", help = "Keep papers published from this year")]
    pub min_year: Option<i32>,

    #[arg(long, requires = "min_year", help = "Keep papers published up to this year")]
    pub max_year: Option<i32>,

    #[arg(long, help = "Keep papers with at least this many citations")]
    pub min_citations: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ExportArgs {
    #[arg(help = "Root paper DOI")]
    pub doi: String,

    #[arg(
        long,
        default_value = "json",
        value_parser = parse_export_format,
        help = "Export format: json or csv"
    )]
    pub format: ExportFormat,

    #[arg(long, help = "Write to this file instead of stdout")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub filter: GraphFilterArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AnalyzeFileArgs {
    #[arg(help = "JSON file with {\"nodes\": [...], \"edges\": [...]}")]
    pub file: PathBuf,

    #[arg(
        long,
        value_delimiter = ',',
        value_name = "KEYWORD",
        help = "Optional comma-separated reference keywords for relevance"
    )]
    pub keywords: Vec<String>,

    #[command(flatten)]
    pub filter: GraphFilterArgs,

    #[arg(
        long,
        default_value = "table",
        value_parser = parse_output_format,
        help = "Output format: table or json"
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Load papers and citation pairs into the workspace database
    Ingest(IngestArgs),
    /// Search stored papers
    Search(SearchArgs),
    /// List stored papers published in a year range
    Years(YearsArgs),
    /// Show papers related through shared references or co-citation
    Related(PaperArgs),
    /// Analyze the citation neighborhood of a stored paper
    Report(PaperArgs),
    /// Per-year paper counts over a paper's neighborhood
    Timeline(PaperArgs),
    /// Export a paper's neighborhood graph as JSON or CSV
    Export(ExportArgs),
    /// Analyze a node/edge JSON file without touching the database
    AnalyzeFile(AnalyzeFileArgs),
    /// Show database totals
    Stats,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "CiteGraph citation analytics")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .citegraph/"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[arg(
        long,
        global = true,
        value_parser = parse_community_strategy,
        help = "Override analytics.community_strategy: louvain or label_propagation"
    )]
    pub community_strategy: Option<CommunityStrategyKind>,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_community_strategy(value: &str) -> Result<CommunityStrategyKind, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|err: citegraph_analysis::AnalysisError| err.to_string())
}
