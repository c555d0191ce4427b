//! End-to-end grading runs with a fixture fetcher, shell commands in place of
//! the Flutter toolchain and in-memory completion clients.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gradekit_core::evaluator::fakes::{FailingCompletionClient, StaticCompletionClient};
use gradekit_core::{
    BuildHeuristic, CompletionClient, EvaluationRequest, FetchError, GradeError, Grader,
    LlmEvaluator, RepoLocator, RepositoryFetcher, ScoringPolicy, StageConfig, Toolchain,
    ToolchainConfig,
};

const REPO: &str = "https://github.com/acme/flutter-app";
const QUALITY_REPLY: &str = r#"{"score": 15, "summary": "Well structured widgets", "strengths": ["clear state handling"], "weaknesses": [], "recommendation": "Add golden tests"}"#;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Writes fixture files into the destination instead of cloning.
struct FixtureFetcher {
    files: Vec<(&'static str, Vec<u8>)>,
    failure: Option<&'static str>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl FixtureFetcher {
    fn with_files(files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(p, c)| (p, c.as_bytes().to_vec()))
                .collect(),
            failure: None,
            destinations: Mutex::new(Vec::new()),
        }
    }

    fn valid_app() -> Self {
        Self::with_files(vec![
            ("pubspec.yaml", "name: flutter_app\n"),
            ("lib/main.dart", "void main() => runApp(const App());\n"),
            ("lib/src/app.dart", "class App extends StatelessWidget {}\n"),
        ])
    }

    fn failing(reason: &'static str) -> Self {
        Self {
            files: Vec::new(),
            failure: Some(reason),
            destinations: Mutex::new(Vec::new()),
        }
    }

    fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryFetcher for FixtureFetcher {
    async fn fetch(&self, _locator: &RepoLocator, dest: &Path) -> Result<(), FetchError> {
        self.destinations.lock().unwrap().push(dest.to_path_buf());
        if let Some(reason) = self.failure {
            return Err(FetchError::Clone(reason.to_string()));
        }
        for (relative, content) in &self.files {
            let path = dest.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        Ok(())
    }
}

fn toolchain(install: &str, analyze: &str, test: &str) -> Toolchain {
    Toolchain::new(ToolchainConfig {
        install: StageConfig::shell("pub_get", install, 10),
        analyze: StageConfig::shell("analyze", analyze, 10),
        build: StageConfig::shell("build", "exit 1", 10),
        test: StageConfig::shell("test", test, 10),
        build_heuristic: BuildHeuristic::SeverityLines,
    })
}

fn passing_toolchain() -> Toolchain {
    toolchain(
        "echo 'Got dependencies!'",
        "echo 'No issues found!'",
        "echo '00:03 +4: All tests passed!'",
    )
}

fn grader(
    root: &Path,
    fetcher: Arc<FixtureFetcher>,
    toolchain: Toolchain,
    client: Arc<dyn CompletionClient>,
) -> Grader {
    Grader::new(
        root.to_path_buf(),
        vec!["github.com".to_string(), "www.github.com".to_string()],
        ScoringPolicy::reference(),
        fetcher,
        toolchain,
        LlmEvaluator::new(client),
    )
    .unwrap()
}

fn assert_no_workspaces_left(root: &Path) {
    if root.exists() {
        let left: Vec<_> = std::fs::read_dir(root).unwrap().collect();
        assert!(left.is_empty(), "workspaces left behind: {left:?}");
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_host_has_no_side_effects() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("workspaces");
    let fetcher = Arc::new(FixtureFetcher::valid_app());
    let grader = grader(
        &root,
        fetcher.clone(),
        passing_toolchain(),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    for url in [
        "https://gitlab.com/acme/app",
        "ftp://github.com/acme/app",
        "not a url",
        "https://github.com/acme",
    ] {
        let err = grader.evaluate(url).await.unwrap_err();
        assert!(matches!(err, GradeError::InvalidRequest(_)), "{url}: {err}");
        assert_eq!(err.status_code(), 400);
    }

    assert!(fetcher.destinations().is_empty());
    assert!(!root.exists());
}

// ---------------------------------------------------------------------------
// Gating failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clone_failure_reports_single_check() {
    let tmp = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticCompletionClient::new(QUALITY_REPLY));
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::failing("repository not found")),
        passing_toolchain(),
        client.clone(),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 0);
    assert_eq!(response.max_score, 20);
    assert_eq!(response.checks.len(), 1);
    assert_eq!(response.checks[0].name, "Clone Repository");
    assert!(!response.checks[0].passed);
    assert!(response.checks[0].message.contains("repository not found"));
    assert!(!response.details.clone_successful);
    assert_eq!(client.call_count(), 0);
    assert_no_workspaces_left(tmp.path());
}

#[tokio::test]
async fn missing_entry_point_scores_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FixtureFetcher::with_files(vec![("pubspec.yaml", "name: app\n")]));
    let grader = grader(
        tmp.path(),
        fetcher,
        passing_toolchain(),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 0);
    assert_eq!(response.checks.len(), 2);
    let structure = response.check("File Structure").unwrap();
    assert!(!structure.passed);
    assert!(structure.message.contains("lib/main.dart"));
    assert!(response.details.clone_successful);
    assert!(!response.details.files_valid);
    assert!(response.feedback.contains("File Structure"));
}

#[tokio::test]
async fn install_failure_stops_before_tests() {
    let tmp = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticCompletionClient::new(QUALITY_REPLY));
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::valid_app()),
        toolchain(
            "echo 'Because app depends on foo, version solving failed.' >&2; exit 1",
            "true",
            "true",
        ),
        client.clone(),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert!(response.total_score <= 5);
    assert_eq!(response.checks.len(), 3);
    assert!(!response.check("Install Dependencies").unwrap().passed);
    assert!(response.check("Unit Tests").is_none());
    assert!(response.check("Code Quality").is_none());
    assert!(response.details.code_quality.is_none());
    assert_eq!(client.call_count(), 0);
    assert_no_workspaces_left(tmp.path());
}

#[tokio::test]
async fn build_failure_stops_before_tests() {
    let tmp = tempfile::tempdir().unwrap();
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::valid_app()),
        toolchain("true", "echo 'error • Undefined name foo • lib/main.dart:3:5'", "true"),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert!(response.total_score <= 5);
    assert_eq!(response.checks.len(), 4);
    assert!(!response.details.build_successful);
    assert!(response.details.pub_get_successful);
}

// ---------------------------------------------------------------------------
// Non-gating stages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_tests_still_get_quality_review() {
    let tmp = tempfile::tempdir().unwrap();
    let client = Arc::new(StaticCompletionClient::new(
        r#"{"score": 12, "summary": "Decent", "strengths": [], "weaknesses": ["long build methods"], "recommendation": "Split widgets"}"#,
    ));
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::valid_app()),
        toolchain("true", "true", "echo '00:04 +2 -1: Some tests failed.'; exit 1"),
        client.clone(),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 12);
    assert_eq!(response.checks.len(), 6);
    assert!(!response.details.tests_passed);
    let tests = response.check("Unit Tests").unwrap();
    assert_eq!(tests.score, 0);
    assert_eq!(tests.message, "Some tests failed");
    assert_eq!(response.check("Code Quality").unwrap().score, 12);
    assert_eq!(client.call_count(), 1);
    assert!(response.feedback.contains("Unit Tests"));
}

#[tokio::test]
async fn unreachable_evaluator_degrades_to_zero_quality() {
    let tmp = tempfile::tempdir().unwrap();
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::valid_app()),
        passing_toolchain(),
        Arc::new(FailingCompletionClient::network()),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 5);
    let quality = response.details.code_quality.as_ref().unwrap();
    assert_eq!(quality.score, 0);
    assert!(quality.summary.contains("unavailable"));
    assert!(!response.check("Code Quality").unwrap().passed);
}

#[tokio::test]
async fn unreadable_sources_skip_the_evaluator() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = FixtureFetcher {
        files: vec![
            ("pubspec.yaml", b"name: app\n".to_vec()),
            ("lib/main.dart", vec![0xff, 0xfe, 0xfd]),
        ],
        failure: None,
        destinations: Mutex::new(Vec::new()),
    };
    let client = Arc::new(StaticCompletionClient::new(QUALITY_REPLY));
    let grader = grader(tmp.path(), Arc::new(fetcher), passing_toolchain(), client.clone());

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 5);
    assert_eq!(client.call_count(), 0);
    let quality = response.details.code_quality.as_ref().unwrap();
    assert_eq!(quality.score, 0);
    assert_eq!(response.check("Code Quality").unwrap().score, 0);
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fully_passing_repository_scores_maximum() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FixtureFetcher::valid_app());
    let client = Arc::new(StaticCompletionClient::new(QUALITY_REPLY));
    let grader = grader(tmp.path(), fetcher.clone(), passing_toolchain(), client.clone());

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 20);
    assert_eq!(response.max_score, 20);
    assert_eq!(response.checks.len(), 6);
    assert_eq!(response.passed_count(), 6);
    assert_eq!(response.repository, REPO);

    let details = &response.details;
    assert!(details.clone_successful && details.files_valid);
    assert!(details.pub_get_successful && details.build_successful && details.tests_passed);
    assert_eq!(details.code_quality.as_ref().unwrap().score, 15);

    let score_sum: u32 = response.checks.iter().map(|c| c.score).sum();
    assert_eq!(score_sum, response.total_score);

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("// File: lib/main.dart"));
    assert!(prompt.contains("// File: lib/src/app.dart"));

    let dest = &fetcher.destinations()[0];
    assert!(dest.starts_with(tmp.path()));
    assert!(!dest.exists());
    assert_no_workspaces_left(tmp.path());
}

#[tokio::test]
async fn relative_workspace_root_grades_in_place() {
    let tmp = tempfile::Builder::new()
        .prefix("gradekit-flow-")
        .tempdir_in(".")
        .unwrap();
    let root = Path::new(".").join(tmp.path().file_name().unwrap());
    let fetcher = Arc::new(FixtureFetcher::valid_app());
    let grader = grader(
        &root,
        fetcher.clone(),
        passing_toolchain(),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    assert_eq!(response.total_score, 20);

    let dest = &fetcher.destinations()[0];
    assert!(dest.is_absolute());
    assert!(!dest.exists());
    assert_no_workspaces_left(&root);
}

#[tokio::test]
async fn response_serializes_with_wire_names() {
    let tmp = tempfile::tempdir().unwrap();
    let grader = grader(
        tmp.path(),
        Arc::new(FixtureFetcher::valid_app()),
        passing_toolchain(),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    let response = grader.evaluate(REPO).await.unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["totalScore"], 20);
    assert_eq!(json["maxScore"], 20);
    assert_eq!(json["details"]["pubGetSuccessful"], true);
    assert_eq!(json["details"]["codeQuality"]["score"], 15);
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_credential_aborts_and_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FixtureFetcher::valid_app());
    let grader = grader(
        tmp.path(),
        fetcher.clone(),
        passing_toolchain(),
        Arc::new(FailingCompletionClient::missing_credential()),
    );

    let err = grader.evaluate(REPO).await.unwrap_err();
    assert!(matches!(err, GradeError::Configuration(_)), "{err}");
    assert_eq!(err.status_code(), 500);
    assert!(!fetcher.destinations()[0].exists());
    assert_no_workspaces_left(tmp.path());
}

#[test]
fn invalid_policy_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut policy = ScoringPolicy::reference();
    policy.max_score = 3;

    let result = Grader::new(
        tmp.path().to_path_buf(),
        vec!["github.com".to_string()],
        policy,
        Arc::new(FixtureFetcher::valid_app()),
        passing_toolchain(),
        LlmEvaluator::new(Arc::new(StaticCompletionClient::new(QUALITY_REPLY))),
    );
    assert!(matches!(result, Err(GradeError::Configuration(_))));
}

#[tokio::test]
async fn empty_request_is_rejected_before_grading() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FixtureFetcher::valid_app());
    let grader = grader(
        tmp.path(),
        fetcher.clone(),
        passing_toolchain(),
        Arc::new(StaticCompletionClient::new(QUALITY_REPLY)),
    );

    let err = grader
        .evaluate_request(&EvaluationRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, GradeError::InvalidRequest(_)));
    assert!(fetcher.destinations().is_empty());

    let response = grader
        .evaluate_request(&EvaluationRequest::new(REPO))
        .await
        .unwrap();
    assert_eq!(response.total_score, 20);
}
