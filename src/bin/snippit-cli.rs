use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "snippit-cli")]
#[command(about = "Management CLI for the Snippit API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Cron secret, sent as a bearer token to the scheduled job route
    #[arg(short, long, env = "CRON_SECRET")]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness
    Health,
    /// Run the scheduled health check now
    Cron,
    /// Show which backend settings are present
    Debug,
    /// Show mail and notification settings
    EmailConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Health => client.get(format!("{base}/api/health")),
        Commands::Cron => {
            let mut headers = HeaderMap::new();
            if let Some(secret) = &cli.secret {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {secret}"))?);
            }
            client.get(format!("{base}/api/cron/health-check")).headers(headers)
        }
        Commands::Debug => client.get(format!("{base}/api/debug")),
        Commands::EmailConfig => client.get(format!("{base}/api/debug/email-config")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
