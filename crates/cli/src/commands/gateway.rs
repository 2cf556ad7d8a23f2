//! `vouch gateway`: start the HTTP API server.

use vouch_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Vouch Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.provider.model);
    println!(
        "   Budget:    {} tokens/day",
        config.budget.daily_token_budget
    );

    vouch_gateway::start(config).await?;

    Ok(())
}
