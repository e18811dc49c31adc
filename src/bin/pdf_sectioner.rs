//! Split PDFs into TOC sections and chapters, then optionally summarize them.
//!
//! Usage:
//!   pdf_sectioner extract --input-dir input --output-dir output
//!   pdf_sectioner run --input-dir input --output-dir output --workers 4
//!
//! Logging follows `RUST_LOG` (default `info`).

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_sectioner::{
    BatchReport, BatchRunner, ExtractionConfig, RetryPolicy, ServiceConfig, Services,
    SummarizerBackend, SummaryConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "pdf_sectioner",
    version,
    about = "TOC-driven section/chapter extraction for PDF folders"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract TOC and content JSON for every PDF; no external services
    Extract(ExtractArgs),
    /// Extract, then summarize and embed every section and chapter
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Directory of PDF files to read
    #[arg(long, env = "PDF_SECTIONER_INPUT", default_value = "input")]
    input_dir: PathBuf,

    /// Directory for toc_{id}.json and content_{id}.json
    #[arg(long, env = "PDF_SECTIONER_OUTPUT", default_value = "output")]
    output_dir: PathBuf,

    /// TOC marker strings (replace the defaults when given)
    #[arg(long = "toc-marker")]
    toc_markers: Vec<String>,

    /// Maximum pages in the TOC window
    #[arg(long, default_value_t = 5)]
    toc_window_pages: usize,

    /// Minimum number of dots that form a dot leader
    #[arg(long, default_value_t = 6)]
    min_dot_leader: usize,

    /// Keyword that marks a TOC line as a section
    #[arg(long, default_value = "section")]
    section_keyword: String,
}

impl ExtractArgs {
    fn extraction_config(&self) -> ExtractionConfig {
        let mut config = ExtractionConfig::new()
            .with_toc_window_pages(self.toc_window_pages)
            .with_min_dot_leader(self.min_dot_leader)
            .with_section_keyword(self.section_keyword.as_str());
        if !self.toc_markers.is_empty() {
            config = config.with_toc_markers(self.toc_markers.iter().cloned());
        }
        config
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Gemini,
    Openai,
}

impl From<Backend> for SummarizerBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Gemini => SummarizerBackend::Gemini,
            Backend::Openai => SummarizerBackend::OpenAi,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    extract: ExtractArgs,

    /// Summarizer backend
    #[arg(
        long,
        env = "PDF_SECTIONER_SUMMARIZER",
        value_enum,
        default_value_t = Backend::Gemini
    )]
    summarizer: Backend,

    /// API key for the summarizer
    #[arg(long, env = "SUMMARIZER_API_KEY", hide_env_values = true)]
    summarizer_api_key: String,

    /// Summarizer model (defaults to the backend's usual model)
    #[arg(long, env = "SUMMARIZER_MODEL")]
    summarizer_model: Option<String>,

    /// Summarizer base URL (defaults to the backend's public endpoint)
    #[arg(long, env = "SUMMARIZER_BASE_URL")]
    summarizer_base_url: Option<String>,

    /// Instruction placed before each node's text
    #[arg(long, default_value = pdf_sectioner::config::DEFAULT_SUMMARY_PROMPT)]
    prompt: String,

    /// API key for the embeddings endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    embedding_api_key: String,

    /// Embedding model
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Base URL of the OpenAI-compatible embeddings API
    #[arg(
        long,
        env = "EMBEDDING_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    embedding_base_url: String,

    /// API key for Pinecone
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_api_key: String,

    /// Pinecone index name
    #[arg(long, env = "PINECONE_INDEX", default_value = "pdf-sections")]
    index_name: String,

    /// Vector dimension of the index
    #[arg(long, env = "PINECONE_DIMENSION", default_value_t = 384)]
    dimension: usize,

    /// Serverless cloud for index creation
    #[arg(long, env = "PINECONE_CLOUD", default_value = "aws")]
    cloud: String,

    /// Serverless region for index creation
    #[arg(long, env = "PINECONE_REGION", default_value = "us-east-1")]
    region: String,

    /// Document-batch index appended to every embedding id
    #[arg(long, default_value_t = 0)]
    batch_index: usize,

    /// Concurrent summary workers per document
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Attempts per external call, including the first
    #[arg(long, default_value_t = 3)]
    max_attempts: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

impl RunArgs {
    fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig {
            summarizer: self.summarizer.into(),
            summarizer_api_key: self.summarizer_api_key.clone(),
            embedding_api_key: self.embedding_api_key.clone(),
            embedding_base_url: self.embedding_base_url.clone(),
            embedding_model: self.embedding_model.clone(),
            vector_api_key: self.pinecone_api_key.clone(),
            index_name: self.index_name.clone(),
            dimension: self.dimension,
            cloud: self.cloud.clone(),
            region: self.region.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            ..ServiceConfig::default()
        };
        if self.summarizer == Backend::Openai {
            config.summarizer_model = "gpt-4o-mini".to_string();
            config.summarizer_base_url = "https://api.openai.com/v1".to_string();
        }
        if let Some(model) = &self.summarizer_model {
            config.summarizer_model = model.clone();
        }
        if let Some(url) = &self.summarizer_base_url {
            config.summarizer_base_url = url.clone();
        }
        config
    }

    fn summary_config(&self) -> SummaryConfig {
        SummaryConfig::new()
            .with_prompt(self.prompt.as_str())
            .with_batch_index(self.batch_index)
            .with_workers(self.workers)
            .with_retry(RetryPolicy::default().with_max_attempts(self.max_attempts))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Extract(args) => BatchRunner::new(&args.input_dir, &args.output_dir)
            .with_extraction(args.extraction_config())
            .run(),
        Command::Run(args) => run_with_services(args),
    };

    match result {
        Ok(report) => {
            print_summary(&report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn run_with_services(args: &RunArgs) -> pdf_sectioner::Result<BatchReport> {
    let services = Services::from_config(&args.service_config())?;
    BatchRunner::new(&args.extract.input_dir, &args.extract.output_dir)
        .with_extraction(args.extract.extraction_config())
        .with_summaries(&services, args.summary_config())
        .run()
}

fn print_summary(report: &BatchReport) {
    for document in &report.documents {
        let summarized = match &document.summary {
            Some(summary) => format!(", {}/{} summarized", summary.summarized, summary.nodes),
            None => String::new(),
        };
        println!(
            "{}: {} section(s), {} chapter(s){} -> {}",
            document.id,
            document.sections,
            document.chapters,
            summarized,
            document.paths.content.display()
        );
    }
    for (path, error) in &report.failures {
        println!("{}: FAILED ({})", path.display(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["pdf_sectioner", "extract"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Extract(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_toc_markers_replace_defaults() {
        let defaults = extract_args(&[]).extraction_config();
        assert_eq!(defaults.toc_markers, ExtractionConfig::default().toc_markers);

        let custom = extract_args(&["--toc-marker", "CONTENTS", "--toc-marker", "Index"])
            .extraction_config();
        assert_eq!(custom.toc_markers, vec!["CONTENTS", "Index"]);
    }

    #[test]
    fn test_toc_marker_help_describes_replacement() {
        let cli = Cli::command();
        let extract = cli.find_subcommand("extract").unwrap();
        let help = extract
            .get_arguments()
            .find(|arg| arg.get_id() == "toc_markers")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();
        assert_eq!(help, "TOC marker strings (replace the defaults when given)");
    }
}
