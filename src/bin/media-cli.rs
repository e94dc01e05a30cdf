use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "media-cli")]
#[command(about = "Client for a running media proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(short, long, default_value = "/api/meta")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a post URL into media URLs
    Resolve {
        post_url: String,
    },
    /// Download a media URL through the proxy
    Fetch {
        media_url: String,

        /// Filename hint sent to the proxy
        #[arg(short, long)]
        filename: Option<String>,

        /// Output path (defaults to the name chosen by the proxy)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/{}", cli.url.trim_end_matches('/'), cli.prefix.trim_matches('/'));

    match cli.command {
        Commands::Resolve { post_url } => {
            let res = client
                .get(format!("{}/download", base))
                .query(&[("url", post_url.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Fetch { media_url, filename, output } => {
            let mut query = vec![("mediaUrl", media_url.as_str())];
            if let Some(name) = filename.as_deref() {
                query.push(("filename", name));
            }
            let res = client.get(format!("{}/file", base)).query(&query).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }

            let path = output.unwrap_or_else(|| {
                res.headers()
                    .get(CONTENT_DISPOSITION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(disposition_filename)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("media.mp4"))
            });

            let mut file = tokio::fs::File::create(&path).await?;
            let mut written: u64 = 0;
            let mut body = res.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            println!("Saved {} bytes to {}", written, path.display());
        }
    }

    Ok(())
}

fn disposition_filename(value: &str) -> Option<String> {
    let start = value.find("filename=\"")? + "filename=\"".len();
    let rest = &value[start..];
    let name = &rest[..rest.find('"')?];
    (!name.is_empty()).then(|| name.to_string())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let pretty = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", pretty);
    } else {
        eprintln!("Error: proxy returned status {}", status);
        eprintln!("{}", pretty);
    }
    Ok(())
}
