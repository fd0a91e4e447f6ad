use anyhow::Result;
use colored::Colorize;

use agentdesk_types::run::new_run_id;
use agentdesk_types::RunResponse;

use crate::agent::Agent;

/// Output of one team member
#[derive(Debug, Clone)]
pub struct MemberResponse {
    pub name: String,
    pub role: Option<String>,
    pub response: RunResponse,
}

/// Every member's answer plus the leader's synthesis
#[derive(Debug, Clone)]
pub struct TeamRun {
    pub members: Vec<MemberResponse>,
    pub summary: RunResponse,
}

/// A leader agent coordinating member agents.
///
/// Members answer the task one after another; the leader then receives all
/// of their answers and writes the final response.
pub struct TeamAgent {
    leader: Agent,
    members: Vec<Agent>,
    verbose: bool,
}

impl TeamAgent {
    pub fn new(leader: Agent, members: Vec<Agent>) -> Self {
        Self {
            leader,
            members,
            verbose: false,
        }
    }

    /// Print a progress line per member
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn leader(&self) -> &Agent {
        &self.leader
    }

    pub fn members(&self) -> &[Agent] {
        &self.members
    }

    /// Prompt handed to the leader after every member answered
    pub fn synthesis_prompt(task: &str, members: &[MemberResponse]) -> String {
        let sections = members
            .iter()
            .map(|member| {
                let heading = match &member.role {
                    Some(role) => format!("### {} ({})", member.name, role),
                    None => format!("### {}", member.name),
                };
                format!("{}\n{}", heading, member.response.content.trim())
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Task: {}\n\nYour team members responded as follows:\n\n{}\n\n\
             Combine these responses into a single, well-organized answer.",
            task, sections
        )
    }

    pub async fn run_detailed(&self, task: &str) -> Result<TeamRun> {
        let mut members = Vec::with_capacity(self.members.len());
        for member in &self.members {
            if self.verbose {
                println!("{} {} is working...", "🤝".cyan(), member.name().bold());
            }
            let response = member.run(task).await?;
            members.push(MemberResponse {
                name: member.name().to_string(),
                role: member.role().map(str::to_string),
                response,
            });
        }

        if self.verbose {
            println!("{} {} is summarizing...", "🧭".cyan(), self.leader.name().bold());
        }
        let summary = self
            .leader
            .run(&Self::synthesis_prompt(task, &members))
            .await?;
        Ok(TeamRun { members, summary })
    }

    /// Run the whole team and return the leader's answer
    pub async fn run(&self, task: &str) -> Result<RunResponse> {
        let team_run = self.run_detailed(task).await?;
        Ok(RunResponse::new(new_run_id(), team_run.summary.content)
            .with_metric("members", team_run.members.len()))
    }
}
