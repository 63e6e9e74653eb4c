use pretty_assertions::assert_eq;
use sagan_core::{
    ChangeId, ChangeState, CheckResult, MissionError, MissionId, MissionOutcome, RepositoryError,
    RepositoryPort,
};
use sagan_patterns::{Detector, Language, SourceFile};
use sagan_sim::{
    safe_files, vulnerable_file_name, vulnerable_snippets, Simulation, SimulationConfig,
    SimulationError, VulnerabilityFactory,
};
use sagan_test_utils::builtin_library;
use std::io::Write;
use std::sync::Arc;

#[test]
fn every_vulnerable_snippet_triggers_its_label() {
    let detector = Detector::new(builtin_library());
    for tag in Language::BUILTIN {
        let language = Language::new(tag);
        for (label, content) in vulnerable_snippets(&language) {
            let labels = detector.detect_content(&language, content);
            assert!(
                labels.iter().any(|l| l == label),
                "{tag}: expected {label} in {labels:?}"
            );
        }
    }
}

#[test]
fn safe_files_trigger_nothing() {
    let detector = Detector::new(builtin_library());
    for tag in Language::BUILTIN {
        let language = Language::new(tag);
        for (name, content) in safe_files(&language) {
            assert!(
                detector.detect_content(&language, content).is_empty(),
                "{tag}: {name} should be clean"
            );
        }
    }
}

#[tokio::test]
async fn every_snippet_reaches_passed() {
    for tag in Language::BUILTIN {
        let language = Language::new(tag);
        for (label, content) in vulnerable_snippets(&language) {
            let sim = Simulation::with_library(SimulationConfig::new(), builtin_library());
            let mut files = vec![SourceFile::new(
                vulnerable_file_name(&language),
                *content,
                language.clone(),
            )];
            files.extend(
                safe_files(&language)
                    .iter()
                    .map(|(name, body)| SourceFile::new(*name, *body, language.clone())),
            );

            let report = sim.run_with_files(&language, files).await.unwrap();

            assert_eq!(
                report.result.outcome,
                MissionOutcome::Passed,
                "{tag}: {label} survived remediation"
            );
            assert!(report.merged, "{tag}: {label}");
        }
    }
}

#[tokio::test]
async fn seeded_runs_pass_for_every_language() {
    for tag in Language::BUILTIN {
        for seed in [1_u64, 2, 3, 42, 1337] {
            let config = SimulationConfig::new().with_language(tag).with_seed(seed);
            let report = Simulation::new(config).unwrap().run().await.unwrap();

            assert_eq!(report.result.outcome, MissionOutcome::Passed, "{tag} seed {seed}");
            assert!(report.passed());
            assert_eq!(report.title, format!("Feature: Update {tag} service"));
            assert_eq!(report.submitted[0].name(), vulnerable_file_name(&Language::new(tag)));
        }
    }
}

#[tokio::test]
async fn same_seed_reproduces_the_change() {
    let config = SimulationConfig::new().with_language("javascript").with_seed(99);
    let first = Simulation::new(config.clone()).unwrap().run().await.unwrap();
    let second = Simulation::new(config).unwrap().run().await.unwrap();

    assert_eq!(first.submitted, second.submitted);
    assert_eq!(first.result.triggered_labels, second.result.triggered_labels);
    assert_eq!(first.result.fixed_files, second.result.fixed_files);
    assert_ne!(first.result.mission, second.result.mission);
}

#[tokio::test]
async fn unknown_language_is_clean_and_left_open() {
    let config = SimulationConfig::new().with_language("cobol").with_seed(5);
    let sim = Simulation::new(config).unwrap();

    let report = sim.run().await.unwrap();

    assert_eq!(report.submitted.len(), 1);
    assert_eq!(report.submitted[0].name(), "unknown.txt");
    assert_eq!(report.result.outcome, MissionOutcome::Clean);
    assert!(!report.merged);

    let change = sim.repository().get_change(report.change).await.unwrap();
    assert_eq!(change.state, ChangeState::Open);
    assert_eq!(change.check("Security"), Some(CheckResult::Pass));
}

#[tokio::test]
async fn merge_on_clean_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "language = \"ruby\"\n\n[mission]\nmerge_on_clean = true").unwrap();
    let config = SimulationConfig::load(file.path()).unwrap();
    let sim = Simulation::new(config).unwrap();

    let files = vec![SourceFile::new("config.rb", "TIMEOUT = 30", "ruby")];
    let report = sim.run_with_files(&Language::ruby(), files).await.unwrap();

    assert_eq!(report.result.outcome, MissionOutcome::Clean);
    assert!(report.merged);
}

#[tokio::test]
async fn board_holds_the_final_snapshot() {
    let sim = Simulation::new(SimulationConfig::new().with_language("go").with_seed(8)).unwrap();
    let report = sim.run().await.unwrap();

    let snapshot = sim.board().snapshot();
    assert_eq!(snapshot.change, Some(report.change));
    assert!(!snapshot.is_running());
    assert_eq!(snapshot.result.as_ref(), Some(&report.result));
    assert_eq!(snapshot.logs, report.logs);
    assert!(snapshot.logs.iter().any(|l| l.starts_with("mission complete")));
}

#[tokio::test]
async fn second_simulation_is_rejected_while_running() {
    let sim = Arc::new(Simulation::new(SimulationConfig::new().with_seed(4)).unwrap());

    let (a, b) = tokio::join!(sim.run(), sim.run());
    let results = [a, b];

    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(SimulationError::AlreadyRunning)))
        .count();
    let passed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(rejected, 1);
    assert_eq!(passed, 1);
    assert!(!sim.is_running());
}

#[tokio::test]
async fn background_start_holds_the_slot_until_done() {
    let sim = Arc::new(Simulation::new(SimulationConfig::new().with_seed(12)).unwrap());

    let handle = sim.start().unwrap();
    assert!(sim.is_running());
    assert!(matches!(sim.start(), Err(SimulationError::AlreadyRunning)));
    assert!(matches!(sim.run().await, Err(SimulationError::AlreadyRunning)));

    let report = handle.await.unwrap().unwrap();
    assert!(report.passed());
    assert!(!sim.is_running());
    assert_eq!(
        sim.board().snapshot().result.map(|r| r.outcome),
        Some(MissionOutcome::Passed)
    );
}

#[test]
fn factory_changes_vary_with_seed() {
    let mut seen = std::collections::BTreeSet::new();
    for seed in 0..32 {
        let files = VulnerabilityFactory::new(seed).generate_change_files(&Language::python());
        seen.insert(files[0].content().to_string());
    }
    assert!(seen.len() > 1);
}

#[tokio::test]
async fn claim_held_on_the_repository_blocks_the_run() {
    let sim = Simulation::new(SimulationConfig::new().with_seed(42)).unwrap();
    let holder = MissionId::new();
    sim.repository().missions().try_claim(ChangeId(1), holder).unwrap();

    let err = sim.run().await.unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Mission(MissionError::MissionInProgress(ChangeId(1)))
    ));
    let change = sim.repository().get_change(ChangeId(1)).await.unwrap();
    assert!(change.annotations.is_empty());
    assert!(change.checks.is_empty());

    assert!(sim.repository().missions().release(ChangeId(1), holder));
    assert!(sim.run().await.unwrap().passed());
}

#[tokio::test]
async fn duplicate_file_names_are_refused() {
    let sim = Simulation::with_library(SimulationConfig::new(), builtin_library());
    let files = vec![
        SourceFile::new("app.py", "eval(x)", "python"),
        SourceFile::new("app.py", "import json", "python"),
    ];

    let err = sim.run_with_files(&Language::python(), files).await.unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Repository(RepositoryError::DuplicateFile(name)) if name == "app.py"
    ));
    assert!(!sim.is_running());
}
