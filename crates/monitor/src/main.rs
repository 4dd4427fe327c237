mod cli;
mod commands;
mod logging;

use crate::cli::Args;
use crate::commands::{parse_command, Command};
use crate::logging::init_tracing;
use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use resource_monitor::config::{load_settings, Settings};
use resource_monitor::lookup::FixtureLookup;
use resource_monitor::pipeline::{spawn_pipeline, PipelineEvent, PipelineHandle};
use resource_monitor::units::UnitCatalog;
use resource_monitor::validate::AccountNameValidator;
use resource_monitor::view::ResourceView;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, watch};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OutputLine<'a> {
    Catalog { catalog: &'a UnitCatalog },
    View { at: String, view: &'a ResourceView },
    Event { at: String, event: &'a PipelineEvent },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref())?;

    let settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let lookup = FixtureLookup::load(&args.fixtures)?;
    info!(
        fixtures = lookup.len(),
        config = ?args.config,
        cpu_unit = %settings.units.cpu,
        net_unit = %settings.units.net,
        ram_unit = %settings.units.ram,
        "resource monitor starting"
    );
    let validator = AccountNameValidator::new(&settings.account_pattern)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));
    let (pipeline, pipeline_task) = spawn_pipeline(
        Arc::new(lookup),
        Arc::new(validator),
        &settings,
        shutdown.clone(),
    );

    print_line(&OutputLine::Catalog {
        catalog: &pipeline.unit_catalog(),
    });
    let printer = tokio::spawn(print_views(pipeline.subscribe(), shutdown.clone()));
    if args.events {
        tokio::spawn(print_events(pipeline.events(), shutdown.clone()));
    }

    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(err)) => {
                        warn!(error = %err, "failed to read stdin");
                        break;
                    }
                    None => {
                        drain(&pipeline, args.drain_timeout).await;
                        break;
                    }
                };
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => {
                        drain(&pipeline, args.drain_timeout).await;
                        break;
                    }
                    Ok(Some(command)) => apply_command(&pipeline, command)?,
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, line = %line, "ignored command"),
                }
            }
        }
    }

    info!("resource monitor shutting down");
    shutdown.cancel();
    pipeline_task.await.context("pipeline task failed")?;
    let _ = printer.await;
    Ok(())
}

fn apply_command(pipeline: &PipelineHandle, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Text(text) => pipeline.set_text(text)?,
        Command::Search(Some(text)) => pipeline.search(text)?,
        Command::Search(None) => pipeline.trigger()?,
        Command::CpuUnit(unit) => pipeline.select_cpu_unit(unit)?,
        Command::NetUnit(unit) => pipeline.select_net_unit(unit)?,
        Command::RamUnit(unit) => pipeline.select_ram_unit(unit)?,
        Command::Units => print_line(&OutputLine::Catalog {
            catalog: &pipeline.unit_catalog(),
        }),
        Command::View => print_line(&OutputLine::View {
            at: now(),
            view: &pipeline.view(),
        }),
        Command::Quit => {}
    }
    Ok(())
}

async fn drain(pipeline: &PipelineHandle, timeout: Duration) {
    match tokio::time::timeout(timeout, pipeline.wait_settled()).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => warn!(error = %err, "pipeline stopped before lookups settled"),
        Err(_) => warn!(
            timeout = %humantime::format_duration(timeout),
            pending = pipeline.view().pending_lookups,
            "lookup still pending at exit"
        ),
    }
}

async fn print_views(mut views: watch::Receiver<ResourceView>, shutdown: CancellationToken) {
    let mut last: Option<ResourceView> = None;
    let mut stopping = false;
    loop {
        let view = views.borrow_and_update().clone();
        if last.as_ref() != Some(&view) {
            print_line(&OutputLine::View {
                at: now(),
                view: &view,
            });
            last = Some(view);
        }
        if stopping {
            break;
        }
        tokio::select! {
            _ = shutdown.cancelled() => stopping = true,
            changed = views.changed() => {
                if changed.is_err() {
                    stopping = true;
                }
            }
        }
    }
}

async fn print_events(mut events: broadcast::Receiver<PipelineEvent>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => {
                match event {
                    Ok(event) => print_line(&OutputLine::Event { at: now(), event: &event }),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event output lagged");
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

fn print_line(line: &OutputLine<'_>) {
    match serde_json::to_string(line) {
        Ok(payload) => println!("{payload}"),
        Err(err) => warn!(error = %err, "failed to serialize output line"),
    }
}

fn now() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
}
