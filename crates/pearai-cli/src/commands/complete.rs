//! `pear complete` -- single-shot completion.

use clap::Args;
use pearai_llm::ApiHandler;

/// Arguments for the `complete` subcommand.
#[derive(Args)]
pub struct CompleteArgs {
    /// Prompt to send.
    pub prompt: String,
}

pub async fn run(handler: &dyn ApiHandler, args: CompleteArgs) -> anyhow::Result<()> {
    let text = handler.complete_prompt(&args.prompt).await?;
    println!("{text}");
    Ok(())
}
