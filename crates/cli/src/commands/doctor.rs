//! `vouch doctor`: diagnose configuration, content and upstream reachability.

use vouch_config::AppConfig;
use vouch_evidence::FileContentSource;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Vouch Doctor, System Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file, using defaults (run `vouch onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if !config.enabled {
        println!("  ⚠️  Assistant disabled (VOUCH_ENABLED)");
        issues += 1;
    }

    if config.rate_limit.uses_default_salt() {
        println!("  ⚠️  Default rate-limit salt in use, set VOUCH_RATE_LIMIT_SALT");
        issues += 1;
    }

    let source = FileContentSource::new(config.content.root_dir());
    for (label, path) in [
        ("Projects", source.projects_path()),
        ("Resume", source.resume_path()),
        ("Activity", source.activity_path()),
    ] {
        if path.exists() {
            println!("  ✅ {label} file: {}", path.display());
        } else {
            println!("  ⚠️  {label} file missing: {}", path.display());
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  ✅ API key configured");
        let provider = vouch_providers::build_from_config(&config)?;
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Upstream reachable ({})", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Upstream answered but is not healthy ({})", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Upstream check failed: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No API key configured, set VOUCH_API_KEY or GROQ_API_KEY");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
