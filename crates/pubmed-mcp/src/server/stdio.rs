//! Stdio transport for MCP protocol.
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout. Logging goes to stderr,
//! so stdout carries protocol messages only.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tools::{McpTool, ToolContext};

use super::transport::{JsonRpcResponse, handle_request, parse_request};

/// Handle MCP protocol over the process's stdin/stdout.
pub async fn run_stdio(tools: Vec<Box<dyn McpTool>>, ctx: ToolContext) -> anyhow::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    tracing::info!("MCP stdio server ready, waiting for requests...");

    serve(reader, writer, &tools, &ctx).await
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            tracing::info!("Stdin closed, shutting down");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match parse_request(trimmed) {
            Ok(req) => req,
            Err(error_response) => {
                tracing::warn!(line = %trimmed, "Rejected request line");
                write_message(&mut writer, &error_response).await?;
                continue;
            }
        };

        tracing::debug!(method = %request.method, "Received request");

        if let Some(response) = handle_request(&request, tools, ctx).await {
            write_message(&mut writer, &response).await?;
        }
    }

    Ok(())
}

async fn write_message<W>(writer: &mut W, response: &JsonRpcResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response_json = serde_json::to_string(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
