use serde_json::json;
use std::sync::Arc;

use agentdesk_agents::{Agent, AgentStorage, JsonFileStorage, ListFilesTool, SaveFileTool, TeamAgent};
use agentdesk_knowledge::{KnowledgeBase, StoreBackend};
use agentdesk_llm_api::testing::ScriptedLlmClient;
use agentdesk_llm_api::{HashingEmbedder, ToolCall};
use agentdesk_types::Document;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_plain_run_returns_answer() {
    let llm = Arc::new(ScriptedLlmClient::with_replies(["Hello there"]));
    let agent = Agent::builder(llm.clone()).name("greeter").build();

    let response = agent.run("hi").await.unwrap();
    assert_eq!(response.content, "Hello there");
    assert_eq!(response.metrics["llm_calls"], json!(1));
    assert_eq!(response.metrics["tool_calls"], json!(0));

    let request = &llm.requests()[0];
    assert_eq!(request.len(), 2);
    assert_eq!(request[1].content, "hi");
}

#[tokio::test]
async fn test_tool_round_then_answer() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::new());
    llm.push_tool_calls(vec![ToolCall::new(
        "call_1",
        "save_file",
        json!({"contents": "- gather requirements", "file_name": "tasks/plan.md"}),
    )]);
    llm.push_text("Saved the plan.");

    let agent = Agent::builder(llm.clone())
        .tool(SaveFileTool)
        .tool(ListFilesTool)
        .work_dir(dir.path())
        .build();

    let response = agent.run("write a plan").await.unwrap();
    assert_eq!(response.content, "Saved the plan.");
    assert_eq!(response.metrics["tool_calls"], json!(1));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("tasks/plan.md")).unwrap(),
        "- gather requirements"
    );

    let second = &llm.requests()[1];
    let tool_message = second.last().unwrap();
    assert_eq!(tool_message.role, "tool");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.content, "tasks/plan.md");
    assert_eq!(llm.offered_tools()[0], vec!["list_files", "save_file"]);
}

#[tokio::test]
async fn test_last_round_offers_no_tools() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(ScriptedLlmClient::new().with_fallback("final answer"));
    llm.push_tool_calls(vec![ToolCall::new("c1", "list_files", json!({}))]);

    let agent = Agent::builder(llm.clone())
        .tool(ListFilesTool)
        .work_dir(dir.path())
        .max_tool_rounds(1)
        .build();

    let response = agent.run("what files exist?").await.unwrap();
    assert_eq!(response.content, "final answer");
    assert_eq!(response.metrics["llm_calls"], json!(2));
    assert!(llm.offered_tools()[1].is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let llm = Arc::new(ScriptedLlmClient::new());
    llm.push_tool_calls(vec![ToolCall::new("c1", "launch_rocket", json!({}))]);
    llm.push_text("Sorry, I can't do that.");

    let agent = Agent::builder(llm.clone()).build();
    agent.run("launch").await.unwrap();

    let tool_message = llm.requests()[1].last().cloned().unwrap();
    assert_eq!(tool_message.content, "Error: Tool 'launch_rocket' not found");
}

#[tokio::test]
async fn test_chat_history_window() {
    let llm = Arc::new(ScriptedLlmClient::with_replies(["one", "two", "three"]));
    let agent = Agent::builder(llm.clone())
        .read_chat_history(true)
        .num_history_messages(2)
        .build();

    agent.run("first").await.unwrap();
    agent.run("second").await.unwrap();
    agent.run("third").await.unwrap();

    let last = &llm.requests()[2];
    let contents: Vec<&str> = last.iter().skip(1).map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "two", "third"]);
    assert_eq!(agent.history().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_history_persists_through_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn AgentStorage> = Arc::new(JsonFileStorage::new(dir.path()));

    let first = Agent::builder(Arc::new(ScriptedLlmClient::with_replies(["noted"])))
        .storage(storage.clone())
        .session_id("session-1")
        .build();
    first.run("remember the budget is 40k").await.unwrap();

    let llm = Arc::new(ScriptedLlmClient::with_replies(["40k"]));
    let second = Agent::builder(llm.clone())
        .storage(storage.clone())
        .session_id("session-1")
        .read_chat_history(true)
        .build();
    second.run("what is the budget?").await.unwrap();

    assert_eq!(llm.requests()[0][1].content, "remember the budget is 40k");
    let stored = storage.read("session-1").await.unwrap().unwrap();
    assert_eq!(stored.messages.len(), 4);

    second.clear_history().await.unwrap();
    assert!(storage.read("session-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_knowledge_references_injected() {
    let backend = StoreBackend::memory();
    let knowledge = KnowledgeBase::new(
        Arc::new(vec![Document::new("hr", "Employees accrue two vacation days per month")]),
        backend.open("hr_docs").unwrap(),
        Arc::new(HashingEmbedder::new(64)),
    );
    knowledge.load(false, false).await.unwrap();

    let llm = Arc::new(ScriptedLlmClient::with_replies(["Two days per month."]));
    let agent = Agent::builder(llm.clone())
        .knowledge(Arc::new(knowledge))
        .search_knowledge(true)
        .build();
    agent.run("How many vacation days do employees accrue?").await.unwrap();

    let user = &llm.requests()[0][1].content;
    assert!(user.starts_with("How many vacation days"));
    assert!(user.contains("<references>"));
    assert!(user.contains("two vacation days per month"));

    // Stored history keeps the raw question
    assert_eq!(
        agent.history().await.unwrap()[0].content,
        "How many vacation days do employees accrue?"
    );
}

#[tokio::test]
async fn test_llm_failure_propagates() {
    let llm = Arc::new(ScriptedLlmClient::new());
    llm.push_error("rate limited");
    let agent = Agent::builder(llm).name("reviewer").build();

    let err = agent.run("review").await.unwrap_err();
    assert!(format!("{:#}", err).contains("rate limited"));
    assert!(agent.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_team_members_then_leader() {
    let security = Agent::builder(Arc::new(ScriptedLlmClient::with_replies(["SQL injection on line 3"])))
        .name("Security")
        .role("Find vulnerabilities")
        .build();
    let style = Agent::builder(Arc::new(ScriptedLlmClient::with_replies(["Use snake_case"])))
        .name("Style")
        .build();
    let leader_llm = Arc::new(ScriptedLlmClient::with_replies(["Fix the injection first."]));
    let leader = Agent::builder(leader_llm.clone()).name("Lead").build();

    let team = TeamAgent::new(leader, vec![security, style]);
    let run = team.run_detailed("review this").await.unwrap();

    assert_eq!(run.members.len(), 2);
    assert_eq!(run.members[0].response.content, "SQL injection on line 3");
    assert_eq!(run.summary.content, "Fix the injection first.");

    let prompt = &leader_llm.requests()[0][1].content;
    assert!(prompt.starts_with("Task: review this"));
    assert!(prompt.contains("### Security (Find vulnerabilities)\nSQL injection on line 3"));
    assert!(prompt.contains("### Style\nUse snake_case"));
}
