//! `pear model` -- print the resolved model as JSON.

use pearai_llm::ApiHandler;

pub async fn run(handler: &dyn ApiHandler) -> anyhow::Result<()> {
    let model = handler.model().await;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}
