use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::generation::{GenerationBackend, OllamaClient};
use crate::rag::service::RagService;
use crate::server;

/// Start the HTTP API, optionally overriding the configured bind address
#[inline]
pub async fn serve_http(config_dir: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load(config_dir).context("Failed to load configuration")?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let backend: Option<Arc<dyn GenerationBackend>> = match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            info!(
                "Using Ollama model {} at {}",
                client.model(),
                client.base_url()
            );
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Ollama client unavailable, answers will be search-only: {}", e);
            None
        }
    };

    let service = Arc::new(RagService::from_config(&config, backend));
    server::serve(service, &config.server).await
}

/// Print the generation backend status
#[inline]
pub async fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).unwrap_or_else(|e| {
        warn!("Falling back to default configuration: {}", e);
        Config {
            base_dir: config_dir.to_path_buf(),
            ..Config::default()
        }
    });

    println!("📊 Light RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🌐 Server:");
    println!("   Bind: {}", config.server.bind_address());
    println!(
        "   Retrieval: top {} of {}-dimensional TF-IDF embeddings",
        config.retrieval.top_k, config.retrieval.embedding_dimension
    );
    println!();

    println!("🤖 Ollama Status:");
    let client = match OllamaClient::new(&config.ollama) {
        Ok(client) => client,
        Err(e) => {
            println!("   ❌ Ollama: Invalid configuration - {}", e);
            return Ok(());
        }
    };

    let report = tokio::task::spawn_blocking(move || {
        let health = client.health_check();
        let models = client.list_models();
        (client, health, models)
    })
    .await
    .context("Status check task failed")?;

    match report {
        (client, Ok(()), Ok(models)) => {
            println!(
                "   ✅ Ollama: Connected ({}:{})",
                config.ollama.host, config.ollama.port
            );
            println!("   📋 Model: {}", client.model());
            println!("   📦 Installed models: {}", models.len());
        }
        (_, Err(e), Ok(models)) => {
            println!("   ⚠️  Ollama: Connected but unhealthy - {}", e);
            for model in models {
                println!("      - {}", model.name);
            }
        }
        (_, _, Err(e)) => {
            println!("   ❌ Ollama: Not reachable - {}", e);
            println!("   💡 Chat will return search-only answers until Ollama is running");
        }
    }

    Ok(())
}
