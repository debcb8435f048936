use chrono::Local;
use tracing::{error, info};

use wordclock_sync::line::{ModemPin, SerialSignalLine, SimulatedTransmitter};
use wordclock_sync::time::CalendarTimestamp;
use wordclock_sync::{ClockConfig, RadioClock, SyncEvent};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = ClockConfig::default();
    println!("Clock configuration:");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render configuration: {}", e),
    }

    // Seed the local clock from the host, as a real clock would from its RTC
    let local = match CalendarTimestamp::from_naive(&Local::now().naive_local()) {
        Ok(local) => local,
        Err(e) => {
            error!("Host clock unusable: {}", e);
            CalendarTimestamp::default()
        }
    };

    let mut clock = match RadioClock::new(config.clone(), local) {
        Ok(clock) => clock,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    // With a device argument the receiver is read from that serial port's DCD
    // pin in real time; otherwise a simulated broadcast runs on a paused clock.
    if let Some(device) = std::env::args().nth(1) {
        let mut line = match SerialSignalLine::open(&device, 9600, ModemPin::Dcd) {
            Ok(line) => line,
            Err(e) => {
                error!("{}", e);
                return;
            }
        };
        info!("Listening on {}", device);
        if let Err(e) = clock.run(&mut line).await {
            error!("Receiver stopped: {}", e);
        }
        return;
    }

    tokio::time::pause();
    let broadcast = CalendarTimestamp::new(58, 23, 31, 0, 12, 24);
    let mut line = match SimulatedTransmitter::new(broadcast, &config.decoder)
        .with_phase(3)
        .with_noise(0.005, 77)
    {
        Ok(line) => line,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    println!("\nSimulating five minutes of broadcast starting {}...", broadcast);
    let events = match clock.run_for(&mut line, 5 * 60).await {
        Ok(events) => events,
        Err(e) => {
            error!("Simulation failed: {}", e);
            return;
        }
    };

    for event in &events {
        match event {
            SyncEvent::Committed(ts) => println!("  committed {}", ts),
            SyncEvent::Distrusted { decoded, local } => {
                println!("  not trusted {} (local {})", decoded, local)
            }
            SyncEvent::Failed(e) => println!("  failed: {}", e),
            SyncEvent::Pending => {}
        }
    }

    println!("\nLocal time: {}", clock.local_time());
    match clock.persisted().map(|state| state.encode()) {
        Some(Ok(bytes)) => println!("Persisted state: {:?}", bytes),
        Some(Err(e)) => eprintln!("Failed to persist: {}", e),
        None => println!("No trusted sync yet"),
    }
}
