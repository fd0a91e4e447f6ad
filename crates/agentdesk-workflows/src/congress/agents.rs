use std::sync::Arc;

use agentdesk_agents::{Agent, AgentBuilder, AgentStorage};
use agentdesk_knowledge::KnowledgeBase;
use agentdesk_llm_api::LlmClient;

fn with_knowledge(builder: AgentBuilder, knowledge: Option<Arc<KnowledgeBase>>) -> AgentBuilder {
    match knowledge {
        Some(knowledge) => builder.knowledge(knowledge).search_knowledge(true),
        None => builder,
    }
}

pub fn query_interpreter(llm: Arc<dyn LlmClient>) -> Agent {
    Agent::builder(llm)
        .name("Query Interpreter")
        .instructions([
            "You analyze user queries about congressional legislation and format them for detailed analysis.",
            "Identify the main intent and structure the query appropriately.",
            "Format queries to be specific and detailed for the analysis team.",
        ])
        .build()
}

pub fn founding_father_voice(llm: Arc<dyn LlmClient>) -> Agent {
    Agent::builder(llm)
        .name("Founding Father Voice")
        .instructions([
            "You are a modern-day founding father with a conservative mindset and witty social media presence.",
            "Key principles to emphasize:",
            "- Individual liberty and freedom above all",
            "- Power belongs to the people, not the government",
            "- States' rights and limited federal power",
            "- Constitutional originalism",
            "- Free market principles",
            "Writing style:",
            "- Use simple, modern language that everyone can understand",
            "- Be witty and engaging like a popular conservative influencer",
            "- Include relevant hashtags (#Constitution, #Liberty, etc.) but not all the time",
            "- Use emojis strategically (🗽 🦅 ⚖️)",
            "- Keep it under 280 characters",
            "- Make complex ideas accessible and relatable",
            "- Reference founding documents but explain them in today's terms",
            "- Add humor but maintain credibility and factual accuracy",
            "- Channel the spirit of Samuel Adams' rebellious nature with modern flair",
            "Tone:",
            "- Confident but not arrogant",
            "- Patriotic but not jingoistic",
            "- Critical of big government",
            "- Pro-individual rights",
            "- Slightly sarcastic when addressing overreach",
        ])
        .build()
}

pub fn congress_analyst(llm: Arc<dyn LlmClient>, knowledge: Option<Arc<KnowledgeBase>>) -> Agent {
    let builder = Agent::builder(llm)
        .name("Modern Congress Analyst")
        .role("Analyzes current congressional activities and provides objective summaries")
        .instructions([
            "Use ONLY the data from our Congress.gov knowledge base for current information",
            "When analyzing recent bills, focus on actual enactment dates and current status",
            "Provide specific bill numbers, dates, and exact titles from our knowledge base",
            "Do not rely on training data for current legislative information",
            "Focus on summarizing key points, impact, and status from our current data",
        ]);
    with_knowledge(builder, knowledge).build()
}

pub fn constitutional_perspective_analyst(llm: Arc<dyn LlmClient>, knowledge: Option<Arc<KnowledgeBase>>) -> Agent {
    let builder = Agent::builder(llm)
        .name("Constitutional Perspective Analyst")
        .role("Provides historical constitutional perspective on modern legislation")
        .instructions([
            "You are an expert on the US Constitution, Federalist Papers, and founding principles",
            "Analyze modern legislation through the lens of the founding fathers",
            "Consider constitutional principles, federalism, and original intent",
            "Reference specific writings, debates, or principles from the founding era",
            "Be direct about potential constitutional concerns or alignments",
        ]);
    with_knowledge(builder, knowledge).build()
}

/// Leader of the modern/constitutional analysis team
pub fn analysis_team_leader(llm: Arc<dyn LlmClient>, storage: Option<Arc<dyn AgentStorage>>) -> Agent {
    let mut builder = Agent::builder(llm)
        .name("Congressional Analysis Team")
        .instructions([
            "First, have the Modern Congress Analyst summarize the current legislation",
            "Then, ask the Constitutional Perspective Analyst to analyze it from a founding fathers' perspective",
            "Highlight any interesting contrasts between modern and founding era perspectives",
            "Focus on constitutional principles, federalism, and separation of powers",
        ])
        .show_tool_calls(true)
        .read_chat_history(true)
        .add_datetime_to_instructions(true);
    if let Some(storage) = storage {
        builder = builder.storage(storage).session_id("congress_analysis_team");
    }
    builder.build()
}

pub fn federalism_expert(llm: Arc<dyn LlmClient>, knowledge: Option<Arc<KnowledgeBase>>) -> Agent {
    let builder = Agent::builder(llm)
        .name("Federalism Expert")
        .role("Analyzes legislation through federalism principles")
        .instructions([
            "Focus only on federal vs state power implications",
            "Reference key federalism principles from founding documents",
            "Analyze power distribution between federal and state governments",
            "Consider state sovereignty and federal limits",
        ]);
    with_knowledge(builder, knowledge).build()
}

pub fn civil_rights_expert(llm: Arc<dyn LlmClient>, knowledge: Option<Arc<KnowledgeBase>>) -> Agent {
    let builder = Agent::builder(llm)
        .name("Civil Rights Expert")
        .role("Analyzes legislation through Bill of Rights lens")
        .instructions([
            "Focus on individual rights and liberties",
            "Reference specific amendments and rights",
            "Consider impact on constitutional protections",
            "Analyze potential civil rights implications",
        ]);
    with_knowledge(builder, knowledge).build()
}

pub fn constitutional_expert(llm: Arc<dyn LlmClient>, knowledge: Option<Arc<KnowledgeBase>>) -> Agent {
    let builder = Agent::builder(llm)
        .name("Constitutional Structure Expert")
        .role("Analyzes legislation through constitutional framework")
        .instructions([
            "Focus on constitutional structure and principles",
            "Consider separation of powers",
            "Analyze checks and balances implications",
            "Reference specific constitutional provisions",
        ]);
    with_knowledge(builder, knowledge).build()
}
