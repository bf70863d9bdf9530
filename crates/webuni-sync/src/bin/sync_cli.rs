//! webuni-sync command-line tool.
//!
//! Explicit user-triggered sync actions against the remote record store.
//!
//! Usage:
//!   webuni-sync device-code
//!   webuni-sync sync
//!   webuni-sync restore
//!   webuni-sync restore --code device_1700000000000_ab12cd34e
//!
//! Requires SUPABASE_URL and SUPABASE_ANON_KEY in the environment or .env.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use webuni_sync::{FileStore, NetworkWatch, RestConfig, RestStore, SyncAgent};

#[derive(Debug)]
enum Command {
    DeviceCode,
    Sync,
    Restore { code: Option<String> },
}

fn parse_args() -> Option<Command> {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("device-code") => Some(Command::DeviceCode),
        Some("sync") => Some(Command::Sync),
        Some("restore") => {
            let code = match args.get(2).map(String::as_str) {
                Some("--code") => Some(args.get(3)?.clone()),
                Some(_) => return None,
                None => None,
            };
            Some(Command::Restore { code })
        }
        _ => None,
    }
}

fn usage() -> ! {
    eprintln!("usage: webuni-sync <device-code | sync | restore [--code <device-code>]>");
    std::process::exit(2);
}

fn data_file() -> PathBuf {
    if let Ok(path) = env::var("WEBUNI_DATA_FILE") {
        return PathBuf::from(path);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/webuni/local.json")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "webuni_sync=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = parse_args() else { usage() };

    let local = Arc::new(FileStore::open(data_file())?);
    let store = Arc::new(RestStore::new(RestConfig::from_env()?)?);
    // The CLI runs on demand; treat the link as up and let failures queue.
    let connectivity = Arc::new(NetworkWatch::new(true));
    let agent = SyncAgent::new(local, store, connectivity)?;

    match command {
        Command::DeviceCode => {
            println!("{}", agent.device_code());
        }
        Command::Sync => {
            let synced = agent.sync_all().await;
            let pending = agent.queue_len();
            if pending > 0 {
                println!("Synced {} buckets, {} pending retry", synced, pending);
                std::process::exit(1);
            }
            println!("Synced {} buckets", synced);
        }
        Command::Restore { code: None } => {
            let restored = agent.restore_all().await;
            println!("Restored {} buckets", restored);
        }
        Command::Restore { code: Some(code) } => match agent.restore_from_code(&code).await {
            Ok(restored) => {
                println!("Restored {} buckets, device code is now {}", restored, code);
            }
            Err(e) => {
                println!("Restore failed: {} (device code unchanged)", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
