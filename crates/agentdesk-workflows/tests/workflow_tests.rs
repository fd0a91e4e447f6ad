use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use agentdesk_congress::CongressClient;
use agentdesk_llm_api::testing::ScriptedLlmClient;
use agentdesk_logging::RunLogger;
use agentdesk_types::{QualityThresholds, RunEvent, TaskDefinition, TaskPriority, TaskType};
use agentdesk_workflows::{
    CodeAgent, CodeReviewTeam, CongressAnalysisWorkflow, HistoricalAnalysis, ProjectManagementWorkflow,
    IMPROVEMENT_GOALS,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn last_user_message(llm: &ScriptedLlmClient, call: usize) -> String {
    llm.requests()[call]
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Code review
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_review_team_report_follows_aspect_order() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies([
        "security findings",
        "performance findings",
        "style findings",
        "documentation findings",
        "testing findings",
        "### Summary\n1. Fix the SQL injection",
    ]));
    let team = CodeReviewTeam::new(llm.clone(), dir.path().to_path_buf(), None);

    let report = team
        .review_code("query = 'SELECT * FROM users WHERE id=' + user_id", "app/db.py")
        .await
        .unwrap();

    assert_eq!(report.file_path, "app/db.py");
    assert_eq!(report.security, "security findings");
    assert_eq!(report.performance, "performance findings");
    assert_eq!(report.style, "style findings");
    assert_eq!(report.documentation, "documentation findings");
    assert_eq!(report.testing, "testing findings");
    assert_eq!(report.summary, "### Summary\n1. Fix the SQL injection");
    assert_eq!(llm.request_count(), 6);

    assert!(last_user_message(&llm, 0).contains("```python\n"));
    let synthesis = last_user_message(&llm, 5);
    assert!(synthesis.starts_with("Synthesize the following reviews for app/db.py:"));
    assert!(synthesis.contains("Security Review:\nsecurity findings"));
    assert!(synthesis.contains("Testing Review:\ntesting findings"));
}

#[tokio::test]
async fn test_review_team_stops_on_failed_specialist() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies(["security findings"]));
    llm.push_error("rate limited");
    let team = CodeReviewTeam::new(llm.clone(), dir.path().to_path_buf(), None);

    let err = team.review_code("fn main() {}", "src/main.rs").await.unwrap_err();
    assert!(format!("{:#}", err).contains("Performance review failed"));
    assert_eq!(llm.request_count(), 2);
}

// ---------------------------------------------------------------------------
// Code implementation
// ---------------------------------------------------------------------------

fn fibonacci_task(max_iterations: usize) -> TaskDefinition {
    TaskDefinition {
        id: "TASK-001".into(),
        task_type: TaskType::Feature,
        priority: TaskPriority::High,
        description: "Create a function to calculate Fibonacci numbers".into(),
        requirements: vec!["Implement recursive and iterative solutions".into(), "Add type hints".into()],
        acceptance_criteria: vec!["All test cases pass".into()],
        dependencies: None,
        max_iterations,
        quality_thresholds: QualityThresholds::default(),
    }
}

#[tokio::test]
async fn test_code_agent_feeds_previous_code_forward() {
    let llm = Arc::new(ScriptedLlmClient::with_replies(["first version", "second version"]));
    let agent = CodeAgent::new(llm.clone(), None, None);

    let result = agent.implement_task(&fibonacci_task(2)).await.unwrap();

    assert_eq!(result.task_id, "TASK-001");
    assert_eq!(result.code, "second version");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.final_goal, IMPROVEMENT_GOALS[1]);

    let first = last_user_message(&llm, 0);
    assert!(first.contains("Previous Code: None"));
    assert!(first.contains("Requirements: Implement recursive and iterative solutions; Add type hints"));
    assert!(first.contains("Iteration: 1/2"));
    let second = last_user_message(&llm, 1);
    assert!(second.contains("Previous Code: first version"));
    assert!(second.contains(&format!("Current Goal: {}", IMPROVEMENT_GOALS[1])));
}

#[tokio::test]
async fn test_code_agent_modify_code() {
    let llm = Arc::new(ScriptedLlmClient::with_replies(["fixed code"]));
    let agent = CodeAgent::new(llm.clone(), None, None);

    let modified = agent
        .modify_code("def fib(n): pass", "Handle negative input", &fibonacci_task(1))
        .await
        .unwrap();

    assert_eq!(modified, "fixed code");
    let prompt = last_user_message(&llm, 0);
    assert!(prompt.contains("Feedback:\nHandle negative input"));
    assert!(prompt.contains("Original Requirements:\n- Implement recursive and iterative solutions\n- Add type hints"));
}

// ---------------------------------------------------------------------------
// Congress analysis
// ---------------------------------------------------------------------------

fn six_step_replies() -> ScriptedLlmClient {
    ScriptedLlmClient::with_replies([
        "interpreted",
        "modern summary",
        "federalism view",
        "rights view",
        "structure view",
        "We the People 🗽",
    ])
}

#[tokio::test]
async fn test_congress_workflow_yields_and_saves_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(six_step_replies());
    let workflow = CongressAnalysisWorkflow::new(llm.clone(), None, None, dir.path().join("analyses"));

    let mut streamed = 0;
    let responses = workflow
        .run_with("Analyze healthcare legislation from 2023", |_| streamed += 1)
        .await;

    let contents: Vec<&str> = responses.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "🔍 Interpreting query...\n\ninterpreted",
            "📊 Modern Analysis:\n\nmodern summary",
            "🏛 Federalism Analysis:\n\nfederalism view",
            "🏛 Rights Analysis:\n\nrights view",
            "🏛 Structure Analysis:\n\nstructure view",
            "📜 Founding Father's Tweet:\n\nWe the People 🗽",
        ]
    );
    assert_eq!(streamed, 6);
    assert!(responses.iter().all(|r| r.event == RunEvent::RunResponse));

    let mut saved: Vec<String> = std::fs::read_dir(dir.path().join("analyses"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();
    assert_eq!(saved.len(), 6);
    assert!(saved[0].starts_with("constitutional_analysis_"));
    assert!(saved.iter().any(|f| f.starts_with("founding_father_tweet_") && f.ends_with(".txt")));

    let tweet_file = saved.iter().find(|f| f.starts_with("founding_father_tweet_")).unwrap();
    let text = std::fs::read_to_string(dir.path().join("analyses").join(tweet_file)).unwrap();
    assert_eq!(text, "Query: Analyze healthcare legislation from 2023\n\nWe the People 🗽");

    let expert_prompt = last_user_message(&llm, 2);
    assert_eq!(expert_prompt, "Analyze the federalism implications of: modern summary");
    let tweet_prompt = last_user_message(&llm, 5);
    assert!(tweet_prompt.contains("And these historical perspectives:\nfederalism view\n\nrights view\n\nstructure view"));
}

#[tokio::test]
async fn test_congress_workflow_failure_yields_error_response() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies(["interpreted"]));
    llm.push_error("model overloaded");
    let workflow = CongressAnalysisWorkflow::new(llm, None, None, dir.path().to_path_buf());

    let responses = workflow.run("What about S. 77?").await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].content, "🔍 Interpreting query...\n\ninterpreted");
    assert!(responses[1].content.starts_with("Error analyzing query: "));
    assert!(responses[1].content.contains("model overloaded"));
}

#[tokio::test]
async fn test_congress_workflow_enriches_bill_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bill/118/hr/1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bill": {
                "title": "Clean Water Act",
                "summary": "Updates water standards",
                "latestAction": {"text": "Passed House"},
                "introducedDate": "2024-01-02",
                "amendments": []
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(six_step_replies());
    let client = CongressClient::new("test-key".to_string()).with_base_url(&server.uri());
    let workflow = CongressAnalysisWorkflow::new(llm.clone(), None, Some(client), dir.path().to_path_buf());

    let responses = workflow.run("What would the founding fathers think about H.R. 1234?").await;
    assert_eq!(responses.len(), 6);

    let interpreter_prompt = last_user_message(&llm, 0);
    assert_eq!(
        interpreter_prompt,
        "Format this query for congressional analysis: \
         Query: What would the founding fathers think about H.R. 1234?\n\n\
         Bill Details:\nTitle: Clean Water Act\nSummary: Updates water standards\n\
         Latest Action: Passed House\nIntroduced: 2024-01-02"
    );
}

// ---------------------------------------------------------------------------
// Historical analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_historical_analysis_runs_team() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies([
        "H.R. 1234 passed the House",
        "Madison would object",
        "Combined perspective",
    ]));
    let analysis = HistoricalAnalysis::new(llm.clone(), None, None, dir.path().to_path_buf());

    let response = analysis.analyze_query("Compare recent privacy laws").await.unwrap();

    assert_eq!(response.content, "Combined perspective");
    assert_eq!(response.metrics["members"], json!(2));
    assert!(last_user_message(&llm, 0).contains("Compare recent privacy laws\n\nConsider:"));
    let leader_prompt = last_user_message(&llm, 2);
    assert!(leader_prompt.contains("### Modern Congress Analyst"));
    assert!(leader_prompt.contains("Madison would object"));

    let saved = analysis
        .save_interactive("privacy", "Compare recent privacy laws", &response.content)
        .await
        .unwrap();
    assert_eq!(saved, dir.path().join("privacy.txt"));
    assert_eq!(
        std::fs::read_to_string(saved).unwrap(),
        "Query: Compare recent privacy laws\n\nAnalysis:\nCombined perspective"
    );
    assert!(analysis.save_interactive("../escape", "q", "a").await.is_err());
}

#[tokio::test]
async fn test_prepare_data_fetches_only_when_bills_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bill"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bills": [{"number": "1234"}]})))
        .expect(1)
        .mount(&server)
        .await;
    let client = CongressClient::new("test-key".to_string()).with_base_url(&server.uri());

    let dir = tempfile::tempdir().unwrap();
    assert!(HistoricalAnalysis::prepare_data(Some(&client), dir.path()).await.unwrap());
    assert!(dir.path().join("bills.json").exists());

    assert!(!HistoricalAnalysis::prepare_data(Some(&client), dir.path()).await.unwrap());
}

// ---------------------------------------------------------------------------
// Project management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_project_workflow_stops_when_no_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies([
        "requirements drafted",
        "status report written",
        "requirements updated",
        "tasks updated",
        "Everything checks out.\nNO_GAPS_FOUND",
    ]));
    let mut workflow = ProjectManagementWorkflow::new(llm.clone(), dir.path().to_path_buf(), None, None);

    let response = workflow.run(5).await;

    assert_eq!(response.event, RunEvent::WorkflowComplete);
    assert_eq!(response.content, "Workflow completed");
    assert_eq!(response.metrics["total_iterations"], json!(1));
    assert_eq!(response.metrics["completion_status"], json!({"complete": true, "gaps": []}));
    assert_eq!(llm.request_count(), 5);
    assert_eq!(workflow.memory().runs.len(), 1);
    assert_eq!(workflow.memory().runs[0].input, json!({"iteration": 0}));
    assert_eq!(workflow.memory().runs[0].response.event, RunEvent::IterationComplete);

    assert!(last_user_message(&llm, 0).starts_with("Create initial project requirements document"));
    assert!(dir.path().join("requirements/quality.txt").exists());
}

#[tokio::test]
async fn test_project_workflow_collects_gaps_and_analyses_initial_requirements() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("requirements")).unwrap();
    std::fs::write(
        dir.path().join("requirements/initial_requirements.txt"),
        "Build a customer portal",
    )
    .unwrap();

    let llm = Arc::new(ScriptedLlmClient::with_replies([
        "analysed",
        "s1",
        "a1",
        "p1",
        "GAP: risks lack owners",
        "s2",
        "a2",
        "p2",
        "Remaining:\nGAP: no effort estimates\nGAP: missing acceptance criteria",
    ]));
    let mut workflow = ProjectManagementWorkflow::new(llm.clone(), dir.path().to_path_buf(), None, None);

    let response = workflow.run(2).await;

    assert_eq!(response.metrics["total_iterations"], json!(2));
    assert_eq!(
        response.metrics["completion_status"],
        json!({"complete": false, "gaps": ["no effort estimates", "missing acceptance criteria"]})
    );
    assert_eq!(workflow.memory().runs.len(), 2);
    assert!(last_user_message(&llm, 0).contains("requirements/initial_requirements.txt"));
}

#[tokio::test]
async fn test_project_workflow_continues_after_failed_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::with_replies(["requirements drafted"]));
    llm.push_error("connection reset");
    for reply in ["s", "a", "p", "NO_GAPS_FOUND"] {
        llm.push_text(reply);
    }
    let logger = RunLogger::new(dir.path(), "project").await.unwrap();
    let log_path = logger.path().to_path_buf();
    let mut workflow = ProjectManagementWorkflow::new(llm.clone(), dir.path().join("docs"), None, None)
        .with_run_logger(Arc::new(Mutex::new(logger)));

    let response = workflow.run(3).await;

    assert_eq!(response.event, RunEvent::WorkflowComplete);
    assert_eq!(response.metrics["total_iterations"], json!(2));
    assert_eq!(response.metrics["completion_status"]["complete"], json!(true));
    assert_eq!(workflow.memory().runs.len(), 1);
    assert_eq!(workflow.memory().runs[0].input, json!({"iteration": 1}));

    let entries: Vec<serde_json::Value> = std::fs::read_to_string(log_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["agent_name"], "Requirements Analyst");
    assert_eq!(entries[4]["agent_name"], "Quality Assurance");
}

#[tokio::test]
async fn test_project_workflow_caps_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::new().with_fallback("still refining"));
    let mut workflow = ProjectManagementWorkflow::new(llm.clone(), dir.path().to_path_buf(), None, None);

    let response = workflow.run(50).await;

    assert_eq!(response.metrics["total_iterations"], json!(20));
    assert_eq!(llm.request_count(), 1 + 20 * 4);
}

#[tokio::test]
async fn test_project_workflow_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::new());
    llm.push_error("invalid api key");
    let mut workflow = ProjectManagementWorkflow::new(llm, dir.path().to_path_buf(), None, None);

    let response = workflow.run(3).await;

    assert_eq!(response.event, RunEvent::WorkflowError);
    assert!(response.content.starts_with("Workflow failed: "));
    assert!(response.content.contains("invalid api key"));
    assert_eq!(response.metrics["iteration"], json!(0));
}
