//! `vouch onboard`: first-time setup.

use std::path::Path;
use vouch_config::AppConfig;

/// Empty content files, relative to the content root.
const CONTENT_SKELETON: &[(&str, &str)] = &[
    ("projects/projects.json", "{\n  \"projects\": []\n}\n"),
    ("resume/derived.json", "{\n  \"experience\": [],\n  \"skills\": [],\n  \"skillClusters\": {}\n}\n"),
    ("now/entries.json", "{\n  \"entries\": []\n}\n"),
];

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Vouch, First-Time Setup");
    println!("=======================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let config = if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
        AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config.toml at: {}", config_path.display());
        AppConfig::default()
    };

    let content_root = config.content.root_dir();
    write_content_skeleton(&content_root)?;

    println!("\nNext steps:");
    println!("   1. Set VOUCH_API_KEY (or api_key in {})", config_path.display());
    println!("   2. Fill in the JSON files under {}", content_root.display());
    println!("   3. Run: vouch evidence \"your strongest skill\"");
    println!("   4. Run: vouch gateway\n");

    Ok(())
}

fn write_content_skeleton(root: &Path) -> std::io::Result<()> {
    for (relative, body) in CONTENT_SKELETON {
        let path = root.join(relative);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        println!("  Created {}", path.display());
    }
    Ok(())
}
