//! Simulated Appliance - drives a bridge end to end without hardware.
//!
//! This example demonstrates:
//! - Building a bridge with the fluent builder
//! - Answering registration and status-report frames
//! - Queueing commands that ride on the next reply
//! - Subscribing to status changes
//!
//! The simulated appliance registers once, then posts a status report every
//! 500 ms and adopts whatever status the bridge sends back, the way the real
//! controller does.
//!
//! ```text
//! cargo run --example simulated_appliance
//! ```

use std::time::Duration;

use rinnai_bridge::codec::StatusPayload;
use rinnai_bridge::protocol::{prefix, Frame, EXCHANGE_COMMAND};
use rinnai_bridge::{Bridge, HvacMode, Mutation};

const REPORT_INTERVAL: Duration = Duration::from_millis(500);
const REPORTS: usize = 8;

/// Appliance side: register, then report and adopt replies.
async fn run_appliance(bridge: Bridge) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let hello = Frame::new(prefix::REGISTER_REQUEST, EXCHANGE_COMMAND, "").encode()?;
    let ack = bridge.exchange(&hello)?;
    println!("[appliance] registered: {}", ack);

    let mut state = StatusPayload {
        is_power_on: true,
        is_heat_on: true,
        is_hot_water_on: true,
        desired_room_temp: 21,
        desired_heat_water_temp: 21,
        current_room_temp: 19,
        current_water_temp: 38,
        ..StatusPayload::default()
    };

    for _ in 0..REPORTS {
        let report = Frame::new(prefix::STATUS_REPORT, EXCHANGE_COMMAND, state.encode()?).encode()?;
        let reply = Frame::decode(&bridge.exchange(&report)?)?;
        println!("[appliance] reply {} ({} chars)", reply.prefix, reply.payload.len());

        // Adopt the commanded settings; the room slowly drifts towards the target.
        state = StatusPayload::decode(&reply.payload)?;
        if state.is_power_on && state.is_heat_on && state.current_room_temp < state.desired_room_temp {
            state.current_room_temp += 1;
        }

        tokio::time::sleep(REPORT_INTERVAL).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bridge = Bridge::builder()
        .command_timeout(Duration::from_secs(2))
        .build();

    // Print every changed field
    let mut changes = bridge.subscribe();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            for field in change.changed {
                println!("[observer] {} {} => {}", field.field, field.from, field.to);
            }
        }
    });

    let appliance = tokio::spawn(run_appliance(bridge.clone()));

    // Wait for the first report before sending commands
    tokio::time::sleep(REPORT_INTERVAL).await;
    println!("[caller] reachable: {}", bridge.is_reachable());

    let status = bridge
        .request_mutation(Mutation::room_temperature(23)?)
        .await?;
    println!("[caller] room target now {}", status.desired_room_temp);

    let status = bridge.request_mutation(Mutation::Mode(HvacMode::Heat)).await?;
    println!("[caller] mode now {}", status.hvac_mode());

    if let Some(json) = bridge.status_json()? {
        println!("[caller] status {}", json);
    }

    appliance.await??;
    Ok(())
}
