use account_plan_builder::{
    AccountPlanBuilder, GeminiClient, PlanBuilderConfig, PlanEvent, TavilyClient,
};
use dotenv::dotenv;
use futures::StreamExt;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

fn prompt_line(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let config = PlanBuilderConfig::from_env()?;
    let search = Arc::new(TavilyClient::from_env()?);
    let completion = Arc::new(GeminiClient::from_env()?);

    let (tx, mut rx) = futures::channel::mpsc::unbounded();
    let builder = AccountPlanBuilder::new(search, completion)
        .with_config(config.clone())
        .with_progress(tx);

    let progress = tokio::spawn(async move {
        while let Some(event) = rx.next().await {
            match event {
                PlanEvent::Searching => println!("🔎 Searching the web..."),
                PlanEvent::EvidenceCollected { chars, sources } => {
                    println!("📚 Collected {} chars from {} sources", chars, sources)
                }
                PlanEvent::Synthesizing => println!("🧠 Synthesizing account plan..."),
                PlanEvent::Expanding { sections } => {
                    println!("✍️  Expanding short sections: {}", sections.join(", "))
                }
                PlanEvent::Finalizing => println!("📎 Attaching sources..."),
                PlanEvent::Completed => println!("✅ Done.\n"),
            }
        }
    });

    let query = prompt_line("Enter company name: ")?;
    let mut plan = builder.build_for_query(&query).await?;
    drop(builder);
    progress.await?;

    println!("{}", plan);

    loop {
        let choice = prompt_line("\nDo you want to edit any section? (yes/no): ")?;
        if !choice.eq_ignore_ascii_case("yes") {
            break;
        }

        let keys: Vec<&str> = plan.section_keys().collect();
        let section = prompt_line(&format!("Enter section name ({}): ", keys.join(", ")))?;
        let new_text = prompt_line("Enter new content: ")?;

        match plan.edit_section(&section, new_text) {
            Ok(()) => println!("Section updated successfully."),
            Err(e) => println!("{}", e),
        }
    }

    println!("\nFinal Plan:");
    println!("{}", plan);
    println!("\n{}", plan.to_json_pretty()?);

    Ok(())
}
