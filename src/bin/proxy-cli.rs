use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, RANGE};
use serde_json::Value;

/// Relayed headers worth showing for binary resources.
const INTERESTING_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "content-range",
    "accept-ranges",
    "etag",
    "last-modified",
    "cache-control",
    "x-request-id",
];

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for label-proxy", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PROXY_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the proxy's health report
    Health,
    /// GET a path through the proxy and summarize the response
    Get {
        /// Path under the proxy, e.g. /api/submissions/demo.mp3
        path: String,
        /// Byte range to request, e.g. bytes=0-999
        #[arg(long)]
        range: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let base = cli.url.trim_end_matches('/');

    let ok = match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/api/health", base)).send().await?;
            print_json(res).await?
        }
        Commands::Get { path, range } => {
            let mut headers = HeaderMap::new();
            if let Some(range) = range {
                headers.insert(RANGE, HeaderValue::from_str(&range)?);
            }
            let path = if path.starts_with('/') { path } else { format!("/{}", path) };
            let res = client
                .get(format!("{}{}", base, path))
                .headers(headers)
                .send()
                .await?;
            print_summary(res).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(false);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(true)
}

async fn print_summary(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    println!("Status: {}", status);
    for name in INTERESTING_HEADERS {
        if let Some(value) = res.headers().get(*name) {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }

    let is_json = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let body = res.bytes().await?;

    if is_json {
        match serde_json::from_slice::<Value>(&body) {
            Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => println!("Body: {} bytes", body.len()),
        }
    } else {
        println!("Body: {} bytes", body.len());
    }

    Ok(status.is_success() || status.is_redirection())
}
