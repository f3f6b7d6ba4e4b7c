// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::process::ExitCode;

use fetchrs::config::EngineConfig;
use fetchrs::fetch::FetchBackendKind;
use fetchrs::operations::{process_fetch, search_suggest, search_web};
use fetchrs::registry::Registry;
use fetchrs::telemetry;
use tracing::{error, info};

/// `fetchrs fetch <url> [url...]` or `fetchrs search <engine> <query>` or
/// `fetchrs suggest <query>`. HTTP routing is intentionally out of scope —
/// this binary is a thin command-line driver over the library operations.
#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_telemetry();

    let config = match EngineConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        return ExitCode::FAILURE;
    };

    let envelope = match command.as_str() {
        "fetch" => {
            let urls: Vec<String> = rest.to_vec();
            process_fetch(&urls, FetchBackendKind::DirectHttp, None, "text", &config).await
        }
        "search" => {
            let Some((engine, query_parts)) = rest.split_first() else {
                print_usage();
                return ExitCode::FAILURE;
            };
            let query = query_parts.join(" ");
            let registry = Registry::new(config.clone());
            search_web(&registry, engine, &query, "link", 2, None, None, config.max_results).await
        }
        "suggest" => {
            let query = rest.join(" ");
            let registry = Registry::new(config.clone());
            search_suggest(&registry, &query, None, None).await
        }
        other => {
            error!(command = other, "unknown command");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    info!(code = envelope.code, "operation finished");
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to render envelope"),
    }

    if envelope.code == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_usage() {
    eprintln!("usage: fetchrs fetch <url> [url...]");
    eprintln!("       fetchrs search <engine> <query...>");
    eprintln!("       fetchrs suggest <query...>");
}
