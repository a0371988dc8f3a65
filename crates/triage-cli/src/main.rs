//! Risk-triage CLI
//!
//! The `triage` command runs the conversational risk-triage engine from the
//! shell.
//!
//! ## Commands
//!
//! - `score`: Score a single message with no conversation context
//! - `replay`: Run a transcript (one message per line) through one conversation
//! - `message`: Triage a message against a conversation stored on disk
//! - `escalated`: List stored conversations escalated recently
//! - `lexicon`: Inspect or validate a lexicon

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use triage_core::{
    ConversationId, ConversationRiskState, EscalationContacts, EscalationEvent, EscalationTarget,
    Lexicon, RiskTier, TriageEngine, TriageResult, UserRef, METRICS,
};
use triage_service::{BroadcastSink, ConversationStore, FsConversationStore, TriageService};

#[derive(Parser)]
#[command(name = "triage")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Conversational risk-triage engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Lexicon file to load instead of the built-in lexicon
    #[arg(long, global = true, env = "TRIAGE_LEXICON")]
    lexicon: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one message with no conversation context
    Score {
        /// Message text
        text: String,
    },

    /// Replay a transcript file through a single fresh conversation
    Replay {
        /// Transcript file, one message per line
        file: PathBuf,

        /// Conversation id to use (random if omitted)
        #[arg(short, long)]
        conversation: Option<String>,

        /// Anonymized user reference
        #[arg(short, long, default_value = "anonymous")]
        user: String,
    },

    /// Triage one message against a conversation stored on disk
    Message {
        /// Conversation id
        #[arg(short, long)]
        conversation: String,

        /// Anonymized user reference
        #[arg(short, long, default_value = "anonymous")]
        user: String,

        /// State directory (default: .triage in current directory)
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// Message text
        text: String,
    },

    /// List stored conversations escalated within the last N hours
    Escalated {
        /// Look-back window in hours (at most ten years)
        #[arg(
            long,
            default_value = "24",
            value_parser = clap::value_parser!(u32).range(1..=87_600)
        )]
        hours: u32,

        /// State directory (default: .triage in current directory)
        #[arg(long)]
        store_dir: Option<PathBuf>,
    },

    /// Inspect lexicons
    Lexicon {
        #[command(subcommand)]
        action: LexiconAction,
    },
}

#[derive(Subcommand)]
enum LexiconAction {
    /// Validate a lexicon file and print its summary
    Check {
        /// Path to the lexicon JSON file
        path: PathBuf,
    },
    /// Print the summary of the active lexicon
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    triage_core::init_tracing(cli.json, level);

    let contacts = EscalationContacts::from_env();

    let outcome = match cli.command {
        Commands::Lexicon { action } => match action {
            LexiconAction::Check { path } => cmd_lexicon_check(&path),
            LexiconAction::Show => {
                let engine = build_engine(cli.lexicon.as_deref())?;
                print_json(&LexiconSummary::of(engine.lexicon()))
            }
        },
        Commands::Score { text } => {
            let engine = build_engine(cli.lexicon.as_deref())?;
            print_json(&engine.score(&text))
        }
        Commands::Replay {
            file,
            conversation,
            user,
        } => {
            let engine = build_engine(cli.lexicon.as_deref())?;
            cmd_replay(&engine, &file, conversation, &user, &contacts)
        }
        Commands::Message {
            conversation,
            user,
            store_dir,
            text,
        } => {
            let engine = build_engine(cli.lexicon.as_deref())?;
            cmd_message(
                engine,
                &resolve_store_dir(store_dir),
                &conversation,
                &user,
                &text,
                &contacts,
            )
            .await
        }
        Commands::Escalated { hours, store_dir } => {
            cmd_escalated(&resolve_store_dir(store_dir), hours).await
        }
    };

    METRICS.flush();
    outcome
}

fn build_engine(lexicon: Option<&Path>) -> Result<TriageEngine> {
    match lexicon {
        Some(path) => TriageEngine::from_lexicon_path(path)
            .with_context(|| format!("Failed to load lexicon from {:?}", path)),
        None => Ok(TriageEngine::default()),
    }
}

fn resolve_store_dir(store_dir: Option<PathBuf>) -> PathBuf {
    store_dir.unwrap_or_else(|| PathBuf::from(".triage"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LexiconSummary {
    version: String,
    fingerprint: String,
    critical: usize,
    high: usize,
    medium: usize,
}

impl LexiconSummary {
    fn of(lexicon: &Lexicon) -> Self {
        Self {
            version: lexicon.version().to_string(),
            fingerprint: lexicon.fingerprint(),
            critical: lexicon.entries(RiskTier::Critical).len(),
            high: lexicon.entries(RiskTier::High).len(),
            medium: lexicon.entries(RiskTier::Medium).len(),
        }
    }
}

/// Validate a lexicon file without building an engine.
fn cmd_lexicon_check(path: &Path) -> Result<()> {
    let lexicon =
        Lexicon::from_path(path).with_context(|| format!("Invalid lexicon {:?}", path))?;
    let summary = LexiconSummary::of(&lexicon);
    println!(
        "Lexicon {} OK: {} critical, {} high, {} medium",
        summary.version, summary.critical, summary.high, summary.medium
    );
    println!("Fingerprint: {}", summary.fingerprint);
    Ok(())
}

/// One line of replay output. Message text is not echoed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayLine {
    line: usize,
    tier: RiskTier,
    numeric_score: u32,
    flags: Vec<String>,
    conversation_tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation: Option<EscalationEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact: Option<String>,
}

impl ReplayLine {
    fn new(line: usize, result: &TriageResult, contacts: &EscalationContacts) -> Self {
        Self {
            line,
            tier: result.score_result.tier,
            numeric_score: result.score_result.numeric_score,
            flags: result.score_result.labels().map(str::to_string).collect(),
            conversation_tier: result.updated_state.current_tier,
            escalation: result.escalation_event.clone(),
            contact: result
                .escalation_event
                .as_ref()
                .map(|e| contacts.for_target(e.target).to_string()),
        }
    }
}

/// Run every non-empty line of `transcript` through one conversation.
fn replay_transcript(
    engine: &TriageEngine,
    transcript: &str,
    conversation_id: &ConversationId,
    user: &UserRef,
) -> Result<Vec<(usize, TriageResult)>> {
    let mut state = ConversationRiskState::new(conversation_id.clone());
    let mut results = Vec::new();
    for (idx, text) in transcript.lines().enumerate() {
        if text.trim().is_empty() {
            continue;
        }
        let result = engine
            .process(conversation_id, state, text, user, Utc::now())
            .with_context(|| format!("Failed to triage line {}", idx + 1))?;
        state = result.updated_state.clone();
        results.push((idx + 1, result));
    }
    Ok(results)
}

fn cmd_replay(
    engine: &TriageEngine,
    file: &Path,
    conversation: Option<String>,
    user: &str,
    contacts: &EscalationContacts,
) -> Result<()> {
    let transcript = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read transcript {:?}", file))?;
    let conversation_id = conversation
        .map(ConversationId::from)
        .unwrap_or_default();
    let user = UserRef::from(user);

    let results = replay_transcript(engine, &transcript, &conversation_id, &user)?;
    let lines: Vec<_> = results
        .iter()
        .map(|(line, result)| ReplayLine::new(*line, result, contacts))
        .collect();
    print_json(&lines)?;

    if let Some((_, last)) = results.last() {
        info!(
            conversation_id = %conversation_id,
            messages = results.len(),
            final_tier = %last.updated_state.current_tier,
            escalated = last.updated_state.escalated,
            "Replay complete"
        );
    }
    Ok(())
}

/// Triage one message against the on-disk store.
///
/// Escalations go out over a broadcast sink. The CLI subscribes as the only
/// observer and returns whatever it received alongside the result.
async fn triage_stored(
    engine: TriageEngine,
    store_dir: &Path,
    conversation: &str,
    user: &str,
    text: &str,
) -> Result<(TriageResult, Vec<EscalationEvent>)> {
    let store = FsConversationStore::new(store_dir)
        .with_context(|| format!("Failed to open state directory {:?}", store_dir))?;
    let sink = Arc::new(BroadcastSink::new(4));
    let mut observer = sink.subscribe();
    let svc = TriageService::new(engine, Arc::new(store), sink);

    let result = svc
        .handle_message(&ConversationId::from(conversation), &UserRef::from(user), text)
        .await
        .context("Failed to triage message")?;

    let mut delivered = Vec::new();
    while let Ok(event) = observer.try_recv() {
        delivered.push(event);
    }
    Ok((result, delivered))
}

async fn cmd_message(
    engine: TriageEngine,
    store_dir: &Path,
    conversation: &str,
    user: &str,
    text: &str,
    contacts: &EscalationContacts,
) -> Result<()> {
    let (result, delivered) = triage_stored(engine, store_dir, conversation, user, text).await?;
    print_json(&ReplayLine::new(1, &result, contacts))?;

    for event in &delivered {
        println!(
            "Escalated to {}: contact {}",
            event.target,
            contacts.for_target(event.target)
        );
        if event.target == EscalationTarget::Hotline {
            println!("Emergency services: {}", contacts.emergency);
        }
    }
    Ok(())
}

/// Start of the look-back window ending at `now`.
fn escalation_window(now: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>> {
    Duration::try_hours(i64::from(hours))
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| format!("Look-back window of {} hours is out of range", hours))
}

async fn cmd_escalated(store_dir: &Path, hours: u32) -> Result<()> {
    let store = FsConversationStore::new(store_dir)
        .with_context(|| format!("Failed to open state directory {:?}", store_dir))?;
    let since = escalation_window(Utc::now(), hours)?;
    let states = store
        .list_escalated_since(since)
        .await
        .context("Failed to list escalated conversations")?;

    if states.is_empty() {
        println!("No conversations escalated in the last {} hours", hours);
        return Ok(());
    }
    for state in &states {
        let target = state
            .escalation_target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let at = state
            .escalated_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{}\t{}",
            state.conversation_id, state.current_tier, target, at
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_transcript_tracks_tiers() {
        let engine = TriageEngine::default();
        let transcript = concat!(
            "hi\n",
            "I'm stressed about exams\n",
            "\n",
            "I feel hopeless and trapped\n",
            "I want to end my life\n",
        );
        let results = replay_transcript(
            &engine,
            transcript,
            &ConversationId::from("replay-1"),
            &UserRef::anonymous(),
        )
        .unwrap();

        let tiers: Vec<_> = results
            .iter()
            .map(|(_, r)| r.updated_state.current_tier)
            .collect();
        assert_eq!(
            tiers,
            vec![
                RiskTier::None,
                RiskTier::Medium,
                RiskTier::High,
                RiskTier::Critical
            ]
        );
        // Blank line skipped but line numbers kept.
        let lines: Vec<_> = results.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![1, 2, 4, 5]);

        let events: Vec<_> = results
            .iter()
            .filter_map(|(_, r)| r.escalation_event.as_ref())
            .map(|e| e.target)
            .collect();
        assert_eq!(
            events,
            vec![EscalationTarget::Counselor, EscalationTarget::Hotline]
        );
    }

    #[test]
    fn test_replay_line_carries_contact() {
        let engine = TriageEngine::default();
        let results = replay_transcript(
            &engine,
            "suicide",
            &ConversationId::from("replay-2"),
            &UserRef::anonymous(),
        )
        .unwrap();
        let contacts = EscalationContacts::default();
        let line = ReplayLine::new(results[0].0, &results[0].1, &contacts);
        assert_eq!(line.contact.as_deref(), Some("+91-9152987821"));

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["conversationTier"], "critical");
        assert!(json.get("escalation").is_some());
    }

    #[test]
    fn test_lexicon_check_rejects_bad_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("lexicon.json");
        std::fs::write(&path, r#"{"version": "v2", "high": ["hopeless"]}"#).unwrap();
        assert!(cmd_lexicon_check(&path).is_err());

        std::fs::write(&path, r#"{"version": "v2", "critical": ["suicide"]}"#).unwrap();
        assert!(cmd_lexicon_check(&path).is_ok());
    }

    #[test]
    fn test_build_engine_reports_missing_lexicon() {
        let err = build_engine(Some(Path::new("/nonexistent/lexicon.json"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load lexicon"));
    }

    #[tokio::test]
    async fn test_message_persists_between_invocations() {
        let temp_dir = tempfile::tempdir().unwrap();
        let contacts = EscalationContacts::default();

        cmd_message(
            TriageEngine::default(),
            temp_dir.path(),
            "cli-conv",
            "anon",
            "I feel hopeless",
            &contacts,
        )
        .await
        .unwrap();
        cmd_message(
            TriageEngine::default(),
            temp_dir.path(),
            "cli-conv",
            "anon",
            "ok",
            &contacts,
        )
        .await
        .unwrap();

        let store = FsConversationStore::new(temp_dir.path()).unwrap();
        let state = store
            .load(&ConversationId::from("cli-conv"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.current_tier, RiskTier::High);
        assert_eq!(state.escalation_target, Some(EscalationTarget::Counselor));

        assert!(cmd_escalated(temp_dir.path(), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_stored_escalation_reaches_broadcast_observer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (result, delivered) = triage_stored(
            TriageEngine::default(),
            temp_dir.path(),
            "cli-broadcast",
            "anon",
            "I took all the pills",
        )
        .await
        .unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].target, EscalationTarget::Hotline);
        assert_eq!(Some(&delivered[0]), result.escalation_event.as_ref());

        let (_, again) = triage_stored(
            TriageEngine::default(),
            temp_dir.path(),
            "cli-broadcast",
            "anon",
            "I took all the pills",
        )
        .await
        .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_escalation_window_rejects_out_of_range_hours() {
        let now = Utc::now();
        assert_eq!(escalation_window(now, 24).unwrap(), now - Duration::hours(24));

        let err = escalation_window(now, u32::MAX).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_hours_flag_is_range_checked() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let parse = |hours: &str| Cli::try_parse_from(["triage", "escalated", "--hours", hours]);
        assert!(parse("-5").is_err());
        assert!(parse("0").is_err());
        assert!(parse("9999999999").is_err());
        assert!(parse("48").is_ok());
    }
}
