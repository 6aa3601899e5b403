use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{AgentInvoker, AgentRequest, AgentResponse};

pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 300;

const AGENT_SYSTEM_PROMPT: &str = r#"You are one member of a marketing agency team working on a single campaign.
Stay in your role. Use the handoff from the previous specialist and respect every directive.

Respond with ONLY a JSON object, no markdown fences. After the JSON, on a new line,
you may add one or two sentences of narration addressed to the client."#;

/// Invokes agents through the `claude` CLI.
pub struct ClaudeInvoker {
    command: String,
    timeout: Duration,
}

impl ClaudeInvoker {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn call_claude(&self, prompt: &str) -> Result<String> {
        let child = Command::new(&self.command)
            .args([
                "--print",
                "--output-format",
                "text",
                "-p",
                prompt,
                "--system-prompt",
                AGENT_SYSTEM_PROMPT,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .with_context(|| format!("Agent call timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("Failed to run {} CLI", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Agent command failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Whatever follows the JSON object is narration.
fn split_narration(output: &str) -> String {
    match output.rfind('}') {
        Some(end) => output[end + 1..].trim().trim_start_matches("```").trim().to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl AgentInvoker for ClaudeInvoker {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentResponse> {
        tracing::debug!(phase = %request.phase, command = %self.command, "Invoking agent");
        let output = self.call_claude(&request.to_prompt()).await?;
        let mut narration = split_narration(&output);
        if narration.is_empty() {
            narration = format!("{} delivered the {} results.", request.agent, request.phase.title());
        }
        Ok(AgentResponse {
            payload: serde_json::Value::String(output),
            narration,
        })
    }
}
