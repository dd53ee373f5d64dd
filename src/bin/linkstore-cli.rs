use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use linkstore::client::LinkClient;
use linkstore::http::response::RoutesResponse;

#[derive(Parser)]
#[command(name = "linkstore-cli")]
#[command(about = "Admin CLI for a linkstore server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8067")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one route
    Get { name: String },
    /// Create or overwrite a route
    Set { name: String, target: String },
    /// Remove a route
    Delete { name: String },
    /// Show one page of routes
    List {
        #[arg(long, default_value = "")]
        cursor: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        include_generated: bool,
    },
    /// Write every route as a dump file to stdout or `--out`
    Dump {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore every route of a dump file, keeping names and times
    Load { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = LinkClient::new(&cli.url);

    match cli.command {
        Commands::Get { name } => print_json(&client.get(&name).await?)?,
        Commands::Set { name, target } => print_json(&client.put(&name, &target, None).await?)?,
        Commands::Delete { name } => print_json(&client.delete(&name).await?)?,
        Commands::List {
            cursor,
            limit,
            include_generated,
        } => print_json(&client.list(&cursor, limit, include_generated).await?)?,
        Commands::Dump { out } => {
            let dump = RoutesResponse {
                ok: true,
                routes: client.dump().await?,
                next: None,
            };
            let json = serde_json::to_string_pretty(&dump)?;
            match out {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{}", json),
            }
        }
        Commands::Load { file } => {
            let dump: RoutesResponse = serde_json::from_slice(&std::fs::read(&file)?)?;
            let report = client.load(&dump.routes).await?;
            for (name, reason) in &report.failed {
                eprintln!("Failed to store {}: {}", name, reason);
            }
            println!("Loaded {} of {} routes", report.stored, dump.routes.len());
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
