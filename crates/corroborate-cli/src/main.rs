//! Corroborate CLI
//!
//! # Commands
//!
//! - `score`: aggregate a completed answer set into an overall percentage
//! - `chunk`: split extracted evidence text into indexable chunks
//! - `check-judgment`: validate a judgment payload against the result contract
//!
//! Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

use corroborate_core::{
    chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    parse_judgment,
    scoring::parse_labels,
    AggregateScore, ChunkerConfig, EvidenceChunker, FileType, JudgmentError, QuestionScore,
    ScoreAggregator, MAX_QUESTION_POINTS,
};

/// Corroborate - evidence-grounded assessment scoring
#[derive(Parser)]
#[command(name = "corroborate")]
#[command(version)]
#[command(about = "Score assessment answers and check evidence judgments")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate answers (JSON or YAML map of question id to label)
    Score {
        answers: PathBuf,

        /// Points a fully implemented question is worth
        #[arg(long, default_value_t = MAX_QUESTION_POINTS)]
        max_points: f64,

        /// Include per-question scores
        #[arg(long)]
        breakdown: bool,
    },

    /// Split a text file into evidence chunks
    Chunk {
        file: PathBuf,

        /// Document id recorded on every chunk (defaults to the file name)
        #[arg(long)]
        document_id: Option<String>,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
        overlap: usize,
    },

    /// Parse and validate a judgment payload
    CheckJudgment { payload: PathBuf },
}

#[derive(Serialize)]
struct ScoreReport {
    score: AggregateScore,

    #[serde(skip_serializing_if = "Option::is_none")]
    questions: Option<Vec<QuestionScore>>,
}

#[derive(Serialize)]
struct JudgmentCheck {
    valid: bool,
    violations: Vec<String>,
}

/// `RUST_LOG` or `warn` by default; `-v` is debug, `-vv` is trace.
fn log_filter(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Score {
            answers,
            max_points,
            breakdown,
        } => score(&answers, max_points, breakdown),
        Commands::Chunk {
            file,
            document_id,
            chunk_size,
            overlap,
        } => chunk(&file, document_id, chunk_size, overlap),
        Commands::CheckJudgment { payload } => check_judgment(&payload),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn score(path: &Path, max_points: f64, breakdown: bool) -> Result<ExitCode> {
    let labels = load_answers(path)?;
    let aggregator = ScoreAggregator::with_max_points(max_points)?;
    let answers = parse_labels(&labels)
        .with_context(|| format!("Invalid answer in {}", path.display()))?;

    tracing::info!(answers = answers.len(), max_points, "Scoring answer set");

    let report = ScoreReport {
        score: aggregator.aggregate(answers.values()),
        questions: breakdown.then(|| aggregator.question_scores(&answers)),
    };
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn chunk(
    path: &Path,
    document_id: Option<String>,
    chunk_size: usize,
    overlap: usize,
) -> Result<ExitCode> {
    let chunker = EvidenceChunker::new(ChunkerConfig {
        chunk_size,
        chunk_overlap: overlap,
    })?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let document_id = document_id.unwrap_or_else(|| file_name(path));
    let file_type = FileType::from_path(path).ok();
    let chunks = chunker.chunk_document(&document_id, file_type, &text);

    print_json(&chunks)?;
    Ok(ExitCode::SUCCESS)
}

fn check_judgment(path: &Path) -> Result<ExitCode> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let (report, code) = match parse_judgment(&payload) {
        Ok(_) => (
            JudgmentCheck {
                valid: true,
                violations: Vec::new(),
            },
            ExitCode::SUCCESS,
        ),
        Err(e) => (
            JudgmentCheck {
                valid: false,
                violations: violations(e),
            },
            ExitCode::FAILURE,
        ),
    };
    print_json(&report)?;
    Ok(code)
}

/// Read a question id to label map, choosing the format by extension.
fn load_answers(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_answers(&content, is_yaml(path))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_answers(content: &str, yaml: bool) -> Result<BTreeMap<String, String>> {
    Ok(if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn violations(error: JudgmentError) -> Vec<String> {
    match error {
        JudgmentError::SchemaViolation(list) => list,
        other => vec![other.to_string()],
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_log_level() {
        assert_eq!(log_filter(1).to_string(), "debug");
        assert_eq!(log_filter(2).to_string(), "trace");
        assert_eq!(log_filter(5).to_string(), "trace");
    }

    #[test]
    fn test_parse_answers_json_and_yaml() {
        let json = r#"{"q1": "Implemented", "q2": "Not Relevant"}"#;
        let yaml = "q1: Implemented\nq2: Not Relevant\n";

        let from_json = parse_answers(json, false).unwrap();
        let from_yaml = parse_answers(yaml, true).unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json["q2"], "Not Relevant");
    }

    #[test]
    fn test_is_yaml() {
        assert!(is_yaml(Path::new("answers.yaml")));
        assert!(is_yaml(Path::new("answers.yml")));
        assert!(!is_yaml(Path::new("answers.json")));
    }

    #[test]
    fn test_violations_lists_schema_errors() {
        let err = parse_judgment(r#"{"is_valid": "yes"}"#).unwrap_err();
        let list = violations(err);
        assert!(list.len() > 1);
    }

    #[test]
    fn test_violations_wraps_other_errors() {
        let err = parse_judgment("not json").unwrap_err();
        assert_eq!(violations(err).len(), 1);
    }

    #[test]
    fn test_cli_parses_score_flags() {
        let cli = Cli::try_parse_from([
            "corroborate",
            "score",
            "answers.json",
            "--max-points",
            "5",
            "--breakdown",
        ])
        .unwrap();

        match cli.command {
            Commands::Score {
                max_points,
                breakdown,
                ..
            } => {
                assert_eq!(max_points, 5.0);
                assert!(breakdown);
            }
            _ => panic!("expected score command"),
        }
    }
}
