use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "chaos-cli")]
#[command(about = "Drive the payment service through its chaos scenarios", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8082")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Submit a single payment
    Pay {
        #[arg(long, default_value_t = 1)]
        order_id: i64,
        #[arg(long, default_value_t = 10.0)]
        amount: f64,
        #[arg(long, default_value = "4111111111111111")]
        card: String,
        /// Value for the X-Chaos-Scenario header
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Run the normal, declined and black-friday scenarios and tally statuses
    Verify {
        /// Requests sent for the black-friday scenario
        #[arg(long, default_value_t = 10)]
        rounds: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Pay {
            order_id,
            amount,
            card,
            scenario,
        } => {
            let (_, body) = pay(&client, &cli.url, order_id, amount, &card, scenario.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Verify { rounds } => verify(&client, &cli.url, rounds).await?,
    }

    Ok(())
}

async fn pay(
    client: &reqwest::Client,
    url: &str,
    order_id: i64,
    amount: f64,
    card: &str,
    scenario: Option<&str>,
) -> Result<(StatusCode, Value), reqwest::Error> {
    let mut request = client
        .post(format!("{}/payment/process", url))
        .json(&json!({ "order_id": order_id, "amount": amount, "card_number": card }));
    if let Some(scenario) = scenario {
        request = request.header("X-Chaos-Scenario", scenario);
    }

    let res = request.send().await?;
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    Ok((status, body))
}

async fn verify(client: &reqwest::Client, url: &str, rounds: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n--- Normal payment ---");
    let (status, body) = pay(client, url, 1, 10.0, "4111111111111111", None).await?;
    println!("Status: {}  Response: {}", status, body);

    println!("\n--- Declined card (ends in 00) ---");
    let (status, body) = pay(client, url, 2, 10.0, "1234567890123400", None).await?;
    println!("Status: {}  Response: {}", status, body);

    println!("\n--- Black Friday chaos ({} requests) ---", rounds);
    let mut tally: BTreeMap<u16, u32> = BTreeMap::new();
    for i in 0..rounds {
        let (status, _) = pay(client, url, 100 + i64::from(i), 10.0, "4111111111111111", Some("black-friday")).await?;
        *tally.entry(status.as_u16()).or_default() += 1;
    }
    for (status, count) in &tally {
        println!("  {}: {}", status, count);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
