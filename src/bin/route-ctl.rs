use std::path::PathBuf;

use axum::body::Bytes;
use axum::http::Request;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use canonical_router::config::{catalog, load_config};
use canonical_router::routing::{Dispatcher, Matcher, Method, Outcome};

#[derive(Parser)]
#[command(name = "route-ctl")]
#[command(about = "Inspect the route table of a canonical-router config", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration
    Check,
    /// List registered routes per method
    Routes,
    /// Show how a request would be routed
    Resolve {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path with optional query, e.g. /users/42?x=1
        target: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let table = match catalog::build_table(&config.routes) {
        Ok(table) => table,
        Err(errors) => {
            for e in errors {
                eprintln!("Error: {}", e);
            }
            std::process::exit(1);
        }
    };

    let output = match cli.command {
        Commands::Check => json!({ "valid": true, "registrations": table.len() }),
        Commands::Routes => {
            let per_method: serde_json::Map<String, Value> = Method::ALL
                .iter()
                .filter(|m| !table.routes(**m).is_empty())
                .map(|m| {
                    let routes = table
                        .routes(*m)
                        .iter()
                        .map(|r| json!({ "kind": r.kind(), "path": r.path() }))
                        .collect();
                    (m.to_string(), Value::Array(routes))
                })
                .collect();
            Value::Object(per_method)
        }
        Commands::Resolve { method, target } => {
            let method: Method = method.parse()?;
            let request = Request::builder()
                .method(method.as_str())
                .uri(&target)
                .body(Bytes::new())?;
            let (outcome, response) = Dispatcher::new(table).handle(request);
            match outcome {
                Outcome::NotFound => json!({ "outcome": "not_found" }),
                Outcome::Redirect(location) => json!({ "outcome": "redirect", "location": location }),
                Outcome::Executed => json!({
                    "outcome": "executed",
                    "status": response.status().as_u16(),
                    "body": String::from_utf8_lossy(response.body()),
                }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
