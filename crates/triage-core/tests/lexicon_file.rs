//! Loading lexicons from disk.

use std::io::Write;

use tempfile::NamedTempFile;

use triage_core::{Lexicon, LexiconLoadError, RiskTier, TriageEngine, TriageError};

fn write_lexicon(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_valid_file() {
    let file = write_lexicon(
        r#"{
            "version": "campus-2024-05",
            "critical": ["suicide", {"phrase": "kill myself", "label": "crisis:self-harm"}],
            "high": ["hopeless"],
            "medium": ["stressed"]
        }"#,
    );
    let lexicon = Lexicon::from_path(file.path()).unwrap();
    assert_eq!(lexicon.version(), "campus-2024-05");
    assert_eq!(lexicon.len(), 4);

    let engine = TriageEngine::new(lexicon);
    let r = engine.score("I want to KILL MYSELF");
    assert_eq!(r.tier, RiskTier::Critical);
    assert_eq!(r.labels().collect::<Vec<_>>(), vec!["crisis:self-harm"]);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Lexicon::from_path(&dir.path().join("absent.json")).unwrap_err();
    match err {
        LexiconLoadError::Io { path, .. } => assert!(path.ends_with("absent.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn truncated_file_is_fatal() {
    let file = write_lexicon(r#"{"version": "v1", "critical": ["suicide""#);
    let err = TriageEngine::from_lexicon_path(file.path()).unwrap_err();
    assert!(matches!(
        err,
        TriageError::LexiconLoad(LexiconLoadError::Malformed(_))
    ));
}

#[test]
fn file_without_critical_phrases_is_rejected() {
    let file = write_lexicon(r#"{"version": "v1", "critical": [], "high": ["hopeless"]}"#);
    assert!(matches!(
        Lexicon::from_path(file.path()).unwrap_err(),
        LexiconLoadError::NoCriticalPhrases
    ));
}
