use account_plan_builder::{
    AccountPlanBuilder, GeminiClient, PlanBuilderConfig, PlanChat, TavilyClient,
};
use anyhow::{anyhow, Result};
use dotenv::dotenv;
use std::io::{self, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let company = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: chat_with_plan <company name>"))?;

    let config = PlanBuilderConfig::from_env()?;
    let completion = Arc::new(GeminiClient::from_env()?);
    let builder = AccountPlanBuilder::new(Arc::new(TavilyClient::from_env()?), completion.clone())
        .with_config(config.clone());

    println!("🚀 Researching {}...", company);
    let plan = builder.build(&company).await?;
    println!("{}\n", plan);

    let chat = PlanChat::new(completion, config.text_model);

    println!("🤖 Ask questions about the plan (type 'quit' to exit).");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let question = input.trim();

        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match chat.answer(question, &plan).await {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => eprintln!("❌ {}", e),
        }
    }

    Ok(())
}
