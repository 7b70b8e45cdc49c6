//! `pear chat` -- stream a reply to one message.
//!
//! Text goes to stdout as it arrives. Reasoning is written dimmed to
//! stderr so that stdout stays pipeable. Usage chunks are summed and
//! reported on stderr once the stream ends.

use std::io::Write;

use clap::Args;
use futures_util::StreamExt;
use pearai_llm::{ApiHandler, ApiStream, ApiStreamChunk, ConversationTurn};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Arguments for the `chat` subcommand.
#[derive(Args)]
pub struct ChatArgs {
    /// System prompt.
    #[arg(short, long, default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system: String,

    /// Message to send.
    pub message: String,
}

/// Token counts summed over every usage chunk of a stream.
#[derive(Debug, Default, PartialEq)]
pub struct UsageTotals {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_write_tokens: i64,
    pub cache_read_tokens: i64,
    pub reports: usize,
}

impl UsageTotals {
    fn add(&mut self, chunk: &ApiStreamChunk) {
        if let ApiStreamChunk::Usage {
            input_tokens,
            output_tokens,
            cache_write_tokens,
            cache_read_tokens,
            ..
        } = chunk
        {
            self.input_tokens += input_tokens;
            self.output_tokens += output_tokens;
            self.cache_write_tokens += cache_write_tokens.unwrap_or(0);
            self.cache_read_tokens += cache_read_tokens.unwrap_or(0);
            self.reports += 1;
        }
    }

    fn summary(&self) -> String {
        let mut line = format!(
            "[{} in / {} out",
            self.input_tokens, self.output_tokens
        );
        if self.cache_read_tokens > 0 || self.cache_write_tokens > 0 {
            line.push_str(&format!(
                ", cache {} read / {} written",
                self.cache_read_tokens, self.cache_write_tokens
            ));
        }
        line.push(']');
        line
    }
}

pub async fn run(handler: &dyn ApiHandler, args: ChatArgs) -> anyhow::Result<()> {
    let turns = [ConversationTurn::user(args.message)];
    let stream = handler.create_message(&args.system, &turns).await?;

    let totals = render(stream, &mut std::io::stdout(), &mut std::io::stderr()).await?;

    println!();
    if totals.reports > 0 {
        eprintln!("{}", totals.summary());
    }
    Ok(())
}

/// Write a stream's chunks as they arrive and return the usage totals.
pub async fn render(
    mut stream: ApiStream,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<UsageTotals> {
    let mut totals = UsageTotals::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match &chunk {
            ApiStreamChunk::Text { text, .. } => {
                write!(out, "{text}")?;
                out.flush()?;
            }
            ApiStreamChunk::Reasoning { text } => {
                write!(err, "{DIM}{text}{RESET}")?;
                err.flush()?;
            }
            ApiStreamChunk::Usage { .. } => totals.add(&chunk),
        }
    }

    Ok(totals)
}
