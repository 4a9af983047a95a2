use anyhow::Result;

use crate::config::Config;
use crate::providers;

/// Prints a setup checklist: credentials, writable directories, and a live
/// round trip against the generative backend.
pub async fn run(config: &Config) -> Result<()> {
    println!("🩺 MedGate Doctor");
    println!("  Config: {}", config.config_path.display());
    println!(
        "  Generative: {} ({})",
        config.generative.provider, config.generative.model
    );

    check_credentials(config);
    check_directories(config);
    probe_generative(config).await;

    Ok(())
}

fn check_credentials(config: &Config) {
    if config
        .generative
        .api_key
        .as_deref()
        .is_some_and(|k| !k.is_empty())
    {
        println!("  ✅ generative API key configured");
    } else {
        println!("  ❌ generative API key missing");
        println!("  💡 Set GOOGLE_GEMINI_API_KEY or [generative].api_key in config.toml");
    }

    if config
        .transcription
        .api_key
        .as_deref()
        .is_some_and(|k| !k.is_empty())
    {
        println!("  ✅ transcription API key configured");
    } else {
        println!("  ❌ transcription API key missing (speech-to-text will fail)");
        println!("  💡 Set OPENAI_API_KEY or [transcription].api_key in config.toml");
    }

    let avatar = &config.avatar;
    if avatar.api_key.is_some() && avatar.agent_id.is_some() && avatar.client_key.is_some() {
        println!("  ✅ avatar credentials complete");
    } else {
        println!("  ❌ avatar credentials incomplete (avatar endpoints degraded)");
        println!("  💡 Set DID_API_KEY, DID_AGENT_ID and DID_CLIENT_KEY");
    }
}

fn check_directories(config: &Config) {
    for (label, dir) in [
        ("media dir", &config.media.dir),
        ("reports dir", &config.reports.dir),
    ] {
        match std::fs::create_dir_all(dir) {
            Ok(()) => println!("  ✅ {label} writable: {}", dir.display()),
            Err(err) => {
                println!("  ❌ {label} not writable: {} ({err})", dir.display());
            }
        }
    }
}

async fn probe_generative(config: &Config) {
    if config
        .generative
        .api_key
        .as_deref()
        .is_none_or(str::is_empty)
    {
        println!("  ⏭  skipping live probe (no generative API key)");
        return;
    }

    let generator = match providers::create_generator(&config.generative) {
        Ok(generator) => generator,
        Err(err) => {
            println!("  ❌ generative backend init failed: {err}");
            return;
        }
    };

    match generator.warmup().await {
        Ok(reply) => {
            crate::health::mark_ok("generative");
            let preview: String = reply.chars().take(60).collect();
            println!("  ✅ live probe ok: {preview}");
        }
        Err(err) => {
            crate::health::mark_error("generative", &err);
            println!("  ❌ live probe failed: {err}");
            println!("  💡 Check the API key and network reachability");
        }
    }
}
