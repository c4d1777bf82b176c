//! Call log: an append-only record of every prompt and raw completion
//!
//! Entries look like
//!
//! ```text
//! [INFO][2025-03-01 12:00:00] [Response] select_relevant [1, 3]
//! [INFO][2025-03-01 12:00:01] [Request] generate_reply prompt
//!     user: Memories relevant to this conversation:
//!     ...
//! ```
//!
//! Single-line content follows the title; multi-line content starts on the
//! next line with each line indented by four spaces.

use super::{CompletionRequest, LanguageModelGateway};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{Level, debug, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders one call-log entry, including the trailing newline
pub fn format_entry(level: Level, at: DateTime<Local>, title: &str, content: &str) -> String {
    let lines: Vec<&str> = content.trim().lines().collect();
    let body = match lines.as_slice() {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => {
            let indented: Vec<String> = many.iter().map(|line| format!("    {line}")).collect();
            format!("\n{}", indented.join("\n"))
        },
    };
    format!(
        "[{}][{}] {}{}\n",
        level,
        at.format(TIMESTAMP_FORMAT),
        title,
        body
    )
}

/// File-backed call log
#[derive(Debug, Clone)]
pub struct CallLog {
    path: PathBuf,
}

impl CallLog {
    /// Log to `path`, creating the file on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time
    pub async fn append(&self, level: Level, title: &str, content: &str) -> Result<()> {
        let entry = format_entry(level, Local::now(), title, content);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    // The log is an audit trail; failing to write it never fails a turn.
    async fn record(&self, level: Level, title: &str, content: &str) {
        if let Err(e) = self.append(level, title, content).await {
            warn!("Failed to write call log {}: {}", self.path.display(), e);
        }
    }
}

fn render_prompt(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gateway decorator that writes every request and response to a [`CallLog`]
pub struct LoggingGateway<G> {
    inner: G,
    log: CallLog,
}

impl<G> LoggingGateway<G> {
    /// Wrap `inner`, logging to `log`
    pub fn new(inner: G, log: CallLog) -> Self {
        Self { inner, log }
    }

    /// The wrapped gateway
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: LanguageModelGateway> LanguageModelGateway for LoggingGateway<G> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let label = request.purpose.label();
        debug!("Sending {} request to model {}", label, request.model);
        self.log
            .record(
                Level::INFO,
                &format!("[Request] {label} prompt"),
                &render_prompt(request),
            )
            .await;

        match self.inner.complete(request).await {
            Ok(text) => {
                self.log
                    .record(Level::INFO, &format!("[Response] {label}"), &text)
                    .await;
                Ok(text)
            },
            Err(e) => {
                self.log
                    .record(Level::ERROR, &format!("[Error] {label}"), &e.to_string())
                    .await;
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{CallPurpose, PromptMessage, ScriptedGateway};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_single_line_entry() {
        let entry = format_entry(Level::INFO, fixed_time(), "[Response] select_relevant", "[1, 3]\n");
        assert_eq!(
            entry,
            "[INFO][2025-03-01 12:30:05] [Response] select_relevant [1, 3]\n"
        );
    }

    #[test]
    fn test_multi_line_entry_is_indented() {
        let entry = format_entry(Level::ERROR, fixed_time(), "title", "first\nsecond");
        assert_eq!(
            entry,
            "[ERROR][2025-03-01 12:30:05] title\n    first\n    second\n"
        );
    }

    #[test]
    fn test_empty_content() {
        let entry = format_entry(Level::INFO, fixed_time(), "title", "   ");
        assert_eq!(entry, "[INFO][2025-03-01 12:30:05] title\n");
    }

    #[tokio::test]
    async fn test_logging_gateway_writes_request_and_response() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("calls.log"));
        let gateway = LoggingGateway::new(ScriptedGateway::with_responses(["Hello!"]), log.clone());

        let request = CompletionRequest {
            purpose: CallPurpose::GenerateReply,
            model: "deepseek-v3".to_string(),
            messages: vec![PromptMessage::user("Say hello")],
            enable_thinking: false,
        };
        let reply = gateway.complete(&request).await.unwrap();
        assert_eq!(reply, "Hello!");
        assert_eq!(gateway.inner().requests(), vec![request]);

        let written = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[Request] generate_reply prompt user: Say hello"));
        assert!(lines[1].ends_with("[Response] generate_reply Hello!"));
    }

    #[tokio::test]
    async fn test_logging_gateway_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::new(dir.path().join("calls.log"));
        let gateway = LoggingGateway::new(ScriptedGateway::new(), log.clone());

        let request = CompletionRequest {
            purpose: CallPurpose::SelectRelevant,
            model: "deepseek-v3".to_string(),
            messages: vec![PromptMessage::user("anything")],
            enable_thinking: false,
        };
        assert!(gateway.complete(&request).await.is_err());

        let written = std::fs::read_to_string(log.path()).unwrap();
        assert!(written.contains("[ERROR]"));
        assert!(written.contains("[Error] select_relevant"));
    }
}
