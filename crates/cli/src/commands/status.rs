//! `vouch status`: show configuration and governance limits.

use vouch_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let limits = &config.rate_limit;

    println!("Vouch Status");
    println!("============");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Content root:  {}", config.content.root_dir().display());
    println!("  Enabled:       {}", if config.enabled { "yes" } else { "no" });
    println!(
        "  API key:       {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!("  Provider:      {} ({})", config.provider.name, config.provider.base_url);
    println!("  Model:         {}", config.provider.model);
    println!("  Temperature:   {}", config.provider.temperature);
    println!("  Timeout:       {} ms", config.provider.request_timeout_ms);
    println!("  Daily budget:  {} tokens", config.budget.daily_token_budget);
    println!(
        "  Rate window:   {} requests / {} s, cooldown {} s",
        limits.window_limit, limits.window_secs, limits.cooldown_secs
    );
    println!(
        "  Session cap:   {} requests / {} s",
        limits.session_limit, limits.session_lifetime_secs
    );
    println!("  Gateway:       {}:{}", config.gateway.host, config.gateway.port);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, run `vouch onboard` first");
    }

    Ok(())
}
