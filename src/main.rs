// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::io::Read;
use std::path::PathBuf;

use bazaryab::config::settings::Settings;
use bazaryab::crawl::CancelToken;
use bazaryab::engine::{AssistantEngine, SearchRequest};
use bazaryab::normalize::DataNormalizer;
use bazaryab::utils::telemetry;
use tracing::info;

/// Entry point: reads one request from the command line (or stdin when no
/// arguments are given), runs the pipeline and prints the response as JSON.
/// Pass `--out <path>` to additionally save the search report to a file.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting bazaryab...");

    let settings = Settings::new()?;
    info!("Configuration loaded");

    let (text, out_path) = parse_args()?;
    let engine = AssistantEngine::new(settings)?;

    let request = SearchRequest::from_text(text);
    let cancel = CancelToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing with partial results");
            ctrl_c_cancel.cancel();
        }
    });

    let response = engine.handle(&request, &cancel).await;

    if let (Some(path), Some(report)) = (out_path, response.report.as_ref()) {
        DataNormalizer::new().save_report(report, &path)?;
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn parse_args() -> anyhow::Result<(String, Option<PathBuf>)> {
    let mut words = Vec::new();
    let mut out_path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--out" {
            let value = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("--out requires a file path"))?;
            out_path = Some(PathBuf::from(value));
        } else {
            words.push(arg);
        }
    }

    let text = if words.is_empty() {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer.trim().to_string()
    } else {
        words.join(" ")
    };

    if text.is_empty() {
        anyhow::bail!("no request text given on the command line or stdin");
    }
    Ok((text, out_path))
}
