//! `vouch evidence`: rank portfolio evidence against a query.
//!
//! Builds the same pool the gateway uses, without calling the model or
//! touching governance.

use tracing::debug;
use vouch_config::AppConfig;
use vouch_evidence::{FileContentSource, build_evidence_context, rank_evidence};

pub async fn run(query: String, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let source = FileContentSource::new(config.content.root_dir());
    debug!(root = %source.root().display(), query = %query, limit, "Ranking evidence");
    let context = build_evidence_context(&source).await?;

    println!(
        "Evidence pool: {} items, {} projects, {} skills",
        context.evidence.len(),
        context.projects.len(),
        context.skill_universe.len()
    );

    let ranked = rank_evidence(&query, &context.evidence, limit);
    if ranked.is_empty() {
        println!("No evidence matches \"{query}\".");
        return Ok(());
    }

    for (rank, item) in ranked.iter().enumerate() {
        println!("\n{:>2}. {} [{}]", rank + 1, item.title, item.source_kind);
        println!("    id:   {}", item.id);
        println!("    url:  {}", item.url);
        if !item.tags.is_empty() {
            println!("    tags: {}", item.tags.join(", "));
        }
        println!("    {}", item.snippet);
    }

    Ok(())
}
