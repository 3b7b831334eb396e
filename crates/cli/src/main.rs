//! Lexifill CLI: dry-run enrichment of vocabulary entries and transcription audits.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use lexifill_core::audit::{audit_transcriptions, Finding, TranscriptionRow};
use lexifill_core::cache::{default_cache_dir, CachedCompletion};
use lexifill_core::completion::openai::OpenAiClient;
use lexifill_core::{prepare_word_actions, ActionSet, Pipeline, PipelineConfig, WordRequest};

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "lexifill",
    about = "Enrich French/German vocabulary entries and compile them to SQL",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one word or phrase and show the compiled statements
    Prepare(PrepareArgs),
    /// Resolve every entry of a word file
    Batch(BatchArgs),
    /// Check exported transcriptions for format problems
    Audit(AuditArgs),
}

// ─── Shared arguments (embedded in each subcommand) ──────────────

#[derive(Parser, Debug)]
struct ServiceArgs {
    /// User whose rejected words must never be inserted
    #[arg(long)]
    user_id: Option<String>,

    /// Rejected-words registry table
    #[arg(long)]
    rejected_table: Option<String>,

    /// Store only the token itself for verbs, without the paradigm
    #[arg(long, default_value_t = false)]
    no_expand_verbs: bool,

    /// Completion model (default: $OPENAI_MODEL or gpt-4o)
    #[arg(long)]
    model: Option<String>,

    /// Replay completion replies from the on-disk cache
    #[arg(long, default_value_t = false)]
    cache: bool,

    /// Log the structured decision trail of each entry
    #[arg(long, default_value_t = false)]
    debug_info: bool,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ─── Prepare ─────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Resolve one entry without touching any database")]
struct PrepareArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Word or phrase to add
    word: String,

    /// Target word list
    #[arg(long, default_value_t = 1)]
    list_id: i64,

    /// Language tag of the word
    #[arg(long, default_value = "fr")]
    language: String,

    /// Print the full action set as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

// ─── Batch ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Resolve entries listed as `word[,language[,list_id]]` lines")]
struct BatchArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Word file; `#` starts a comment line
    file: PathBuf,
}

// ─── Audit ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Audit a JSON export of [{word, transcription}] rows")]
struct AuditArgs {
    /// Exported rows
    file: PathBuf,

    /// Print the full report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Init logging
    let log_level = match &cli.command {
        Command::Prepare(a) if a.service.verbose => "debug",
        Command::Batch(a) if a.service.verbose => "debug",
        Command::Audit(a) if a.verbose => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Prepare(args) => run_prepare(args),
        Command::Batch(args) => run_batch(args),
        Command::Audit(args) => run_audit(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn load_config(args: &ServiceArgs) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if args.debug_info {
        config.debug = true;
    }
    if config.api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set, entries will be stored unenriched");
    }
    config
}

fn build_request(word: &str, list_id: i64, language: &str, args: &ServiceArgs) -> WordRequest {
    let mut request =
        WordRequest::new(word, list_id, language).with_expand_verbs(!args.no_expand_verbs);
    if let Some(user) = &args.user_id {
        request = request.with_user(user);
    }
    if let Some(table) = &args.rejected_table {
        request = request.with_rejected_words_table(table);
    }
    request
}

/// Prepare one request, replaying cached replies when asked to.
fn prepare(config: &PipelineConfig, request: &WordRequest, cache: bool) -> Result<ActionSet> {
    let actions = match (cache, config.api_key.as_deref()) {
        (true, Some(key)) => {
            let client = OpenAiClient::from_config(config, key)?;
            let cached = CachedCompletion::new(client, default_cache_dir());
            Pipeline::new(Some(&cached), config).prepare(request)
        }
        _ => prepare_word_actions(request, config),
    };
    actions.with_context(|| format!("Failed to prepare {:?}", request.word))
}

fn print_summary(actions: &ActionSet) {
    let pos = match actions.pos {
        Some(tag) => tag.as_str(),
        None => "phrase",
    };
    println!("{} [{}]", actions.canonical_word, pos);
    println!("  association:   {}", actions.association.as_deref().unwrap_or("-"));
    println!("  transcription: {}", actions.transcription.as_deref().unwrap_or("-"));
    if actions.is_phrase {
        println!("  tokens:        {}", actions.tokens.join(", "));
    }
    if !actions.entries.is_empty() {
        println!("  paradigm:      {} rows", actions.entries.len());
    }
    println!("  statements:    {}", actions.queries.len());
}

/// Parse `word[,language[,list_id]]`; `None` for blank and comment lines.
fn parse_batch_line(line: &str) -> Result<Option<(String, String, i64)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut fields = line.split(',').map(str::trim);
    let word = fields.next().unwrap_or_default().to_string();
    if word.is_empty() {
        bail!("Missing word in line {:?}", line);
    }
    let language = fields
        .next()
        .filter(|l| !l.is_empty())
        .unwrap_or("fr")
        .to_lowercase();
    let list_id = match fields.next().filter(|l| !l.is_empty()) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid list id {:?}", raw))?,
        None => 1,
    };
    Ok(Some((word, language, list_id)))
}

fn read_rows(path: &Path) -> Result<Vec<TranscriptionRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid row export {}", path.display()))
}

// ─── Runners ─────────────────────────────────────────────────────

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let config = load_config(&args.service);
    let request = build_request(&args.word, args.list_id, &args.language, &args.service);
    let actions = prepare(&config, &request, args.service.cache)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
    } else {
        print_summary(&actions);
    }
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let config = load_config(&args.service);
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;

    let mut done = 0;
    let mut failed = 0;
    for (number, line) in text.lines().enumerate() {
        let entry = match parse_batch_line(line) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                log::error!("Line {}: {:#}", number + 1, e);
                failed += 1;
                continue;
            }
        };
        let (word, language, list_id) = entry;
        let request = build_request(&word, list_id, &language, &args.service);
        match prepare(&config, &request, args.service.cache) {
            Ok(actions) => {
                print_summary(&actions);
                done += 1;
            }
            Err(e) => {
                log::error!("Line {}: {:#}", number + 1, e);
                failed += 1;
            }
        }
    }

    log::info!("Batch finished: {} prepared, {} failed", done, failed);
    if done == 0 && failed > 0 {
        bail!("Every entry in {} failed", args.file.display());
    }
    Ok(())
}

fn run_audit(args: AuditArgs) -> Result<()> {
    let rows = read_rows(&args.file)?;
    let audit = audit_transcriptions(&rows);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&audit)?);
        return Ok(());
    }

    println!("Rows: {} ({} pass)", audit.total, audit.passing);
    for finding in [
        Finding::Empty,
        Finding::NotWrapped,
        Finding::Bracketed,
        Finding::DoubleDot,
        Finding::DotNextToLiaison,
        Finding::SpaceNextToLiaison,
        Finding::MultiSegment,
    ] {
        println!("- {}: {}", finding.as_str(), audit.count(finding));
        if let Some(samples) = audit.samples.get(&finding) {
            for (word, transcription) in samples {
                println!("    {} -> {:?}", word, transcription);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_line_defaults() {
        assert_eq!(
            parse_batch_line("ami").unwrap(),
            Some(("ami".to_string(), "fr".to_string(), 1))
        );
        assert_eq!(
            parse_batch_line(" Haus , DE , 7 ").unwrap(),
            Some(("Haus".to_string(), "de".to_string(), 7))
        );
        assert_eq!(
            parse_batch_line("mes amis,,3").unwrap(),
            Some(("mes amis".to_string(), "fr".to_string(), 3))
        );
    }

    #[test]
    fn test_parse_batch_line_skips_comments() {
        assert_eq!(parse_batch_line("# header").unwrap(), None);
        assert_eq!(parse_batch_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_batch_line_rejects_bad_list_id() {
        assert!(parse_batch_line("ami,fr,abc").is_err());
        assert!(parse_batch_line(",fr").is_err());
    }
}
