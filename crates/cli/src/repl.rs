//! Interactive read-eval-print loop.

use runtime::{Backend, Session, ToolHost};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &str = "> ";

/// Whether `line` ends the session.
pub fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

/// Read queries from `input` until `quit` or EOF, writing replies to `output`.
///
/// A failed turn is reported and the loop keeps going.
pub async fn run<B, T, R, W>(
    session: &mut Session<B, T>,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    B: Backend,
    T: ToolHost,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_quit(query) {
            break;
        }

        let text = match session.chat(query).await {
            Ok(reply) => format!("\n{reply}\n\n"),
            Err(e) => {
                tracing::debug!(session = %session.id, error = %e, "turn failed");
                format!("\nError: {e}\n\n")
            }
        };
        output.write_all(text.as_bytes()).await?;
    }

    output.flush().await
}
