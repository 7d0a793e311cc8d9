use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "redirector-cli")]
#[command(about = "Management CLI for the IdP redirector allowlist", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Admin bearer token (JWT with read:patterns / update:patterns).
    #[arg(short, long, env = "REDIRECTOR_ADMIN_TOKEN")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current allowlist
    Get,
    /// Replace the allowlist with the JSON array in FILE
    Put { file: PathBuf },
    /// Set the error page URL
    ErrorPage { url: String },
    /// Print service metadata
    Meta,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    let res = match cli.command {
        Commands::Get => {
            client.get(format!("{}/api", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Put { file } => {
            let allowlist: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            client.put(format!("{}/api", cli.url))
                .headers(headers)
                .json(&allowlist)
                .send()
                .await?
        }
        Commands::ErrorPage { url } => {
            client.put(format!("{}/api/error-page", cli.url))
                .headers(headers)
                .json(&serde_json::json!({ "errorPage": url }))
                .send()
                .await?
        }
        Commands::Meta => client.get(format!("{}/meta", cli.url)).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .and_then(|json| serde_json::to_string_pretty(&json))
        .unwrap_or(text);

    if !status.is_success() {
        eprintln!("Error: redirector returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }

    println!("{}", body);
    Ok(())
}
