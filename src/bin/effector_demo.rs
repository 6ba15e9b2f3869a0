//! # Effector Demo
//!
//! Runs a controller driving two counters and prints every record observed on
//! their subscription feeds. Configuration comes from `config/effector.toml`
//! (optional) and `EFFECTOR__*` environment variables.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use tracing::info;

use effector::actors::{ControllerActor, CounterActor, CounterState};
use effector::constants::commands;
use effector::logging::init_tracing_with;
use effector::{AgentRecord, ConfigManager, EffectorService, Priority};

const COUNTERS: [&str; 2] = ["counter-a", "counter-b"];
const CONTROLLER: &str = "controller";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load().context("loading effector configuration")?;
    init_tracing_with(&manager.config().logging);

    let mailbox = manager.config().mailbox.clone();
    let counters = Arc::new(EffectorService::<CounterState>::with_config(manager.config()));
    let controllers = EffectorService::with_config(manager.config());

    let mut feeds = Vec::new();
    for id in COUNTERS {
        let counter = CounterActor::spawn(&counters, id, mailbox.clone())?;
        feeds.push(counter.subscribe());
    }
    let controller = ControllerActor::spawn(&controllers, CONTROLLER, counters.clone(), mailbox)?;
    let mut controller_feed = controller.subscribe();

    let printer = tokio::spawn(async move {
        let mut merged = futures::stream::select_all(feeds);
        while let Some(record) = merged.next().await {
            println!(
                "[{}] {} {}",
                record.effector_id(),
                record.record_type(),
                record.payload()
            );
        }
    });

    controller
        .send(ControllerActor::dispatch(CONTROLLER, COUNTERS[0], commands::INCREMENT))
        .await?;
    controller
        .send(ControllerActor::dispatch(CONTROLLER, COUNTERS[1], commands::INCREMENT))
        .await?;
    controller
        .send(
            AgentRecord::command(
                CONTROLLER,
                serde_json::json!({
                    "type": commands::DISPATCH,
                    "target": COUNTERS[0],
                    "command": commands::ADD,
                    "amount": 40,
                }),
            )
            .with_priority(Priority::High),
        )
        .await?;
    controller
        .send(ControllerActor::dispatch(CONTROLLER, "counter-missing", commands::INCREMENT))
        .await?;

    // Three dispatches succeed and one fails; wait for all four to be handled.
    while controller.get_state().processing.handled() < 4 {
        if let Ok(Some(record)) =
            tokio::time::timeout(Duration::from_millis(50), controller_feed.recv()).await
        {
            info!(record_id = %record.id(), record_type = %record.record_type(), "Controller record");
        }
    }

    let snapshot = controller.get_state();
    info!(
        dispatched = snapshot.state.dispatched,
        failures = snapshot.processing.failures,
        avg_processing_ms = snapshot.processing.avg_processing_time_ms(),
        "Controller finished"
    );
    for id in COUNTERS {
        let counter = counters.get_state(id)?;
        println!("{id}: count={} processed={}", counter.state.count, counter.processing.processed);
    }

    controllers.terminate_all().await;
    counters.terminate_all().await;
    printer.await.context("printer task")?;
    Ok(())
}
