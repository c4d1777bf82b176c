//! Line-oriented chat loop

use anyhow::Result;
use memchat_core::{LanguageModelGateway, MemoryChat, MemoryStore, UserInput, classify_input};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

pub const USER_PROMPT: &str = "you> ";
pub const ASSISTANT_PREFIX: &str = "assistant> ";

/// Reads user lines from `input` until an exit command or end of input,
/// writing each reply to `output`. Returns the number of completed turns.
///
/// A failed turn ends the loop with the error; memories from earlier turns
/// are already persisted at that point.
pub async fn run_chat<G, S, R, W>(
    chat: &mut MemoryChat<G, S>,
    input: R,
    output: &mut W,
) -> Result<usize>
where
    G: LanguageModelGateway,
    S: MemoryStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut turns = 0;

    loop {
        output.write_all(USER_PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("End of input");
            output.write_all(b"\n").await?;
            break;
        };

        let message = match classify_input(&line) {
            UserInput::Exit => break,
            UserInput::Blank => continue,
            UserInput::Message(message) => message,
        };

        let report = chat.handle_turn(message).await?;
        turns += 1;

        if !report.summary.is_noop() {
            info!(
                "Turn {}: +{} ~{} -{} memories",
                turns,
                report.summary.added.len(),
                report.summary.modified.len(),
                report.summary.deleted.len()
            );
        }

        output
            .write_all(format!("{ASSISTANT_PREFIX}{}\n", report.reply).as_bytes())
            .await?;
    }

    output.flush().await?;
    Ok(turns)
}
