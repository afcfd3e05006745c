use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use k3s_mcp_rs::cluster::HttpClusterClient;
use k3s_mcp_rs::config::Config;
use k3s_mcp_rs::mcp::registry;
use k3s_mcp_rs::mcp::router::Router;
use k3s_mcp_rs::mcp::server;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdio (the default)
    Serve,
    /// Print the tool catalog as JSON and exit
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env();

    // stdout carries the MCP protocol; logs go to stderr
    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();

    match Args::parse().command.unwrap_or(Commands::Serve) {
        Commands::Tools => {
            let catalog: Vec<serde_json::Value> = registry::CATALOG
                .iter()
                .map(|descriptor| {
                    serde_json::json!({
                        "name": descriptor.name,
                        "description": descriptor.description,
                        "inputSchema": descriptor.input_schema(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Commands::Serve => {
            log::info!("Starting K3s MCP server");
            log::info!("Using kubeconfig: {}", config.kubeconfig.display());
            log::info!("Default namespace: {}", config.default_namespace);

            let cluster = HttpClusterClient::connect(&config).with_context(|| {
                format!(
                    "failed to initialize cluster client from {}",
                    config.kubeconfig.display()
                )
            })?;
            let router = Router::new(Arc::new(cluster), config.default_namespace.clone());
            server::serve_stdio(router).await?;
        }
    }

    Ok(())
}
