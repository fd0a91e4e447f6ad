use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use agentdesk_knowledge::{format_references, KnowledgeBase};
use agentdesk_llm_api::{ChatMessage, LlmClient, ToolCall};
use agentdesk_logging::{safe_truncate, RunEntry, RunLogger};
use agentdesk_toolcore::{Tool, ToolContext, ToolParameters, ToolRegistry, ToolResult};
use agentdesk_types::run::new_run_id;
use agentdesk_types::RunResponse;

use crate::storage::{AgentSession, AgentStorage};

/// Tool-call rounds allowed per run before the model must answer
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 5;

/// History messages replayed when `read_chat_history` is on
pub const DEFAULT_NUM_HISTORY_MESSAGES: usize = 6;

/// An LLM bound to a prompt, tools, an optional knowledge base and optional session storage
pub struct Agent {
    name: String,
    role: Option<String>,
    description: Option<String>,
    instructions: Vec<String>,
    system_prompt: Option<String>,
    llm: Arc<dyn LlmClient>,
    knowledge: Option<Arc<KnowledgeBase>>,
    search_knowledge: bool,
    tools: ToolRegistry,
    tool_context: ToolContext,
    storage: Option<Arc<dyn AgentStorage>>,
    session_id: String,
    markdown: bool,
    add_datetime_to_instructions: bool,
    read_chat_history: bool,
    num_history_messages: usize,
    max_tool_rounds: usize,
    show_tool_calls: bool,
    run_logger: Option<Arc<Mutex<RunLogger>>>,
    history: Mutex<Option<Vec<ChatMessage>>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.llm.model_name())
            .field("tools", &self.tools.names())
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl Agent {
    pub fn builder(llm: Arc<dyn LlmClient>) -> AgentBuilder {
        AgentBuilder::new(llm)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn model(&self) -> &str {
        self.llm.model_name()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn knowledge(&self) -> Option<&Arc<KnowledgeBase>> {
        self.knowledge.as_ref()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// The system message sent at the start of every run.
    ///
    /// An explicit system prompt is used verbatim; otherwise the description,
    /// role, numbered instructions and formatting hints are assembled.
    pub fn system_message(&self) -> String {
        if let Some(prompt) = &self.system_prompt {
            return prompt.clone();
        }

        let mut sections = Vec::new();
        if let Some(description) = &self.description {
            sections.push(description.clone());
        }
        if let Some(role) = &self.role {
            sections.push(format!("Your role is: {}", role));
        }

        let mut instructions = self.instructions.clone();
        if self.markdown {
            instructions.push("Use markdown to format your answers.".to_string());
        }
        if self.add_datetime_to_instructions {
            instructions.push(format!(
                "The current time is {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }
        if !instructions.is_empty() {
            let numbered = instructions
                .iter()
                .enumerate()
                .map(|(i, instruction)| format!("{}. {}", i + 1, instruction))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## Instructions\n{}", numbered));
        }

        sections.join("\n\n")
    }

    /// Conversation so far; loaded from storage on first use
    pub async fn history(&self) -> Result<Vec<ChatMessage>> {
        let mut cached = self.history.lock().await;
        if cached.is_none() {
            let loaded = match &self.storage {
                Some(storage) => storage
                    .read(&self.session_id)
                    .await
                    .context("Failed to read agent session")?
                    .map(|session| session.messages)
                    .unwrap_or_default(),
                None => Vec::new(),
            };
            *cached = Some(loaded);
        }
        Ok(cached.clone().unwrap_or_default())
    }

    /// Forget the conversation, in memory and in storage
    pub async fn clear_history(&self) -> Result<()> {
        *self.history.lock().await = Some(Vec::new());
        if let Some(storage) = &self.storage {
            storage.delete_session(&self.session_id).await?;
        }
        Ok(())
    }

    async fn user_message(&self, message: &str) -> Result<String> {
        let Some(knowledge) = self.knowledge.as_ref().filter(|_| self.search_knowledge) else {
            return Ok(message.to_string());
        };

        let references = knowledge
            .search(message)
            .await
            .context("Knowledge search failed")?;
        log::debug!("{}: {} knowledge references", self.name, references.len());
        if references.is_empty() {
            return Ok(message.to_string());
        }

        Ok(format!(
            "{}\n\nUse the following references from the knowledge base if they help answer the question.\n\n<references>\n{}\n</references>",
            message,
            format_references(&references)
        ))
    }

    async fn log_message(&self, run_id: &str, role: &str, content: &str) {
        if let Some(logger) = &self.run_logger {
            let entry = RunEntry::new(role, content)
                .model(self.model())
                .from_agent(&self.name, run_id);
            logger.lock().await.append(&entry).await;
        }
    }

    async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolResult {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;
        if self.show_tool_calls {
            println!(
                "  {} {} calling {} with {}",
                "▶️".blue(),
                self.name,
                name,
                safe_truncate(arguments, 100)
            );
        }

        let result = match ToolParameters::from_json(arguments) {
            Ok(params) => self.tools.execute(name, params, &self.tool_context).await,
            Err(e) => ToolResult::error(format!("Failed to parse tool arguments: {}", e)),
        };

        if self.show_tool_calls {
            let marker = if result.is_success() { "✅" } else { "❌" };
            println!("  {} {}", marker, safe_truncate(&result.to_message(), 200));
        }
        result
    }

    /// Run one exchange: prompt, tool rounds, final answer, persisted history
    pub async fn run(&self, message: &str) -> Result<RunResponse> {
        let run_id = new_run_id();
        log::info!("{} run {} started", self.name, run_id);

        let mut messages = vec![ChatMessage::system(self.system_message())];
        let history = self.history().await?;
        if self.read_chat_history {
            let skip = history.len().saturating_sub(self.num_history_messages);
            messages.extend(history.iter().skip(skip).cloned());
        }
        messages.push(ChatMessage::user(self.user_message(message).await?));
        self.log_message(&run_id, "user", message).await;

        let definitions = self.tools.definitions();
        let mut tool_calls_made = 0usize;
        let mut llm_calls = 0usize;
        let mut content = String::new();

        for round in 0..=self.max_tool_rounds {
            // The last round offers no tools so the model has to answer
            let tools = if round < self.max_tool_rounds {
                definitions.clone()
            } else {
                Vec::new()
            };

            let response = self
                .llm
                .chat(messages.clone(), tools)
                .await
                .with_context(|| format!("{} LLM call failed", self.name))?;
            llm_calls += 1;

            let tool_calls = response
                .message
                .tool_calls
                .clone()
                .filter(|calls| !calls.is_empty());
            let Some(tool_calls) = tool_calls else {
                content = response.message.content;
                break;
            };
            if round == self.max_tool_rounds {
                log::warn!("{}: tool calls requested after the last round, ignoring", self.name);
                content = response.message.content;
                break;
            }

            log::debug!("{}: {} tool call(s) in round {}", self.name, tool_calls.len(), round + 1);
            messages.push(response.message.clone());
            for tool_call in &tool_calls {
                let result = self.execute_tool_call(tool_call).await;
                tool_calls_made += 1;
                messages.push(ChatMessage::tool(
                    &tool_call.id,
                    &tool_call.function.name,
                    result.to_message(),
                ));
            }
        }

        self.log_message(&run_id, "assistant", &content).await;
        self.remember(message, &content).await?;

        Ok(RunResponse::new(run_id, content)
            .with_metric("llm_calls", llm_calls)
            .with_metric("tool_calls", tool_calls_made)
            .with_metric("model", self.model()))
    }

    async fn remember(&self, user: &str, assistant: &str) -> Result<()> {
        let mut cached = self.history.lock().await;
        let history = cached.get_or_insert_with(Vec::new);
        history.push(ChatMessage::user(user));
        history.push(ChatMessage::assistant(assistant));

        if let Some(storage) = &self.storage {
            let mut session = storage
                .read(&self.session_id)
                .await?
                .unwrap_or_else(|| AgentSession::new(&self.session_id, &self.name));
            session.record_exchange(user, assistant);
            storage
                .upsert(&session)
                .await
                .context("Failed to store agent session")?;
        }
        Ok(())
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    name: String,
    role: Option<String>,
    description: Option<String>,
    instructions: Vec<String>,
    system_prompt: Option<String>,
    llm: Arc<dyn LlmClient>,
    knowledge: Option<Arc<KnowledgeBase>>,
    search_knowledge: bool,
    tools: ToolRegistry,
    work_dir: PathBuf,
    storage: Option<Arc<dyn AgentStorage>>,
    session_id: Option<String>,
    markdown: bool,
    add_datetime_to_instructions: bool,
    read_chat_history: bool,
    num_history_messages: usize,
    max_tool_rounds: usize,
    show_tool_calls: bool,
    run_logger: Option<Arc<Mutex<RunLogger>>>,
}

impl AgentBuilder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            name: "agent".to_string(),
            role: None,
            description: None,
            instructions: Vec::new(),
            system_prompt: None,
            llm,
            knowledge: None,
            search_knowledge: false,
            tools: ToolRegistry::new(),
            work_dir: PathBuf::from("."),
            storage: None,
            session_id: None,
            markdown: false,
            add_datetime_to_instructions: false,
            read_chat_history: false,
            num_history_messages: DEFAULT_NUM_HISTORY_MESSAGES,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            show_tool_calls: false,
            run_logger: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn instruction(mut self, instruction: &str) -> Self {
        self.instructions.push(instruction.to_string());
        self
    }

    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    /// Replace the assembled system message entirely
    pub fn system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string());
        self
    }

    pub fn knowledge(mut self, knowledge: Arc<KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Inject knowledge-base hits into the user message of every run
    pub fn search_knowledge(mut self, enabled: bool) -> Self {
        self.search_knowledge = enabled;
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register_arc(tool);
        self
    }

    /// Base directory file tools are confined to
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn storage(mut self, storage: Arc<dyn AgentStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn markdown(mut self, enabled: bool) -> Self {
        self.markdown = enabled;
        self
    }

    pub fn add_datetime_to_instructions(mut self, enabled: bool) -> Self {
        self.add_datetime_to_instructions = enabled;
        self
    }

    pub fn read_chat_history(mut self, enabled: bool) -> Self {
        self.read_chat_history = enabled;
        self
    }

    pub fn num_history_messages(mut self, count: usize) -> Self {
        self.num_history_messages = count;
        self
    }

    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn show_tool_calls(mut self, enabled: bool) -> Self {
        self.show_tool_calls = enabled;
        self
    }

    pub fn run_logger(mut self, logger: Arc<Mutex<RunLogger>>) -> Self {
        self.run_logger = Some(logger);
        self
    }

    pub fn build(self) -> Agent {
        let session_id = self.session_id.unwrap_or_else(new_run_id);
        let tool_context = ToolContext::new(self.work_dir, session_id.clone());
        Agent {
            name: self.name,
            role: self.role,
            description: self.description,
            instructions: self.instructions,
            system_prompt: self.system_prompt,
            llm: self.llm,
            knowledge: self.knowledge,
            search_knowledge: self.search_knowledge,
            tools: self.tools,
            tool_context,
            storage: self.storage,
            session_id,
            markdown: self.markdown,
            add_datetime_to_instructions: self.add_datetime_to_instructions,
            read_chat_history: self.read_chat_history,
            num_history_messages: self.num_history_messages,
            max_tool_rounds: self.max_tool_rounds,
            show_tool_calls: self.show_tool_calls,
            run_logger: self.run_logger,
            history: Mutex::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_llm_api::testing::ScriptedLlmClient;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_system_message_layout() {
        let agent = Agent::builder(Arc::new(ScriptedLlmClient::new()))
            .description("You review code.")
            .role("Security reviewer")
            .instructions(["Find injection flaws", "Rate severity"])
            .markdown(true)
            .build();

        assert_eq!(
            agent.system_message(),
            "You review code.\n\nYour role is: Security reviewer\n\n## Instructions\n\
             1. Find injection flaws\n2. Rate severity\n3. Use markdown to format your answers."
        );
    }

    #[test]
    fn test_explicit_system_prompt_wins() {
        let agent = Agent::builder(Arc::new(ScriptedLlmClient::new()))
            .system_prompt("Only this.")
            .instruction("ignored")
            .build();
        assert_eq!(agent.system_message(), "Only this.");
    }

    #[test]
    fn test_datetime_instruction() {
        let agent = Agent::builder(Arc::new(ScriptedLlmClient::new()))
            .add_datetime_to_instructions(true)
            .build();
        assert!(agent.system_message().contains("1. The current time is "));
    }
}
