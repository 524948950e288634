mod cli;
mod config;
mod error;
mod manager;

use clap::Parser;
use cli::Cli;
use log::{error, info, warn};
use manager::manager::Manager;
use manager::publisher::{Message, Publisher};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::mpsc::TrySendError;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let config = match cli.station_config() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {}", err);
            return Err(err.into());
        }
    };
    config.log();

    //owns every sensor; the pulse interrupts start counting from here
    let mut manager = Manager::new(&config)?;

    let sink: Box<dyn Write + Send> = match &config.output {
        Some(path) => Box::new(OpenOptions::new().create(true).append(true).open(path)?),
        None => Box::new(io::stdout()),
    };
    let mut publisher = Publisher::new();
    publisher.start_thread(sink);
    let tx = publisher.get_tx().ok_or("publisher thread not running")?;

    let mut cycle: u64 = 0;
    while cli.cycles.map_or(true, |limit| cycle < limit) {
        cycle += 1;

        //blocks for one full polling interval
        let observation = manager.collect();

        match tx.try_send(Message::Publish(observation)) {
            Ok(_) => info!("observation {} queued", observation.date_time),
            Err(TrySendError::Full(_)) => {
                warn!("publisher still busy, dropping observation {}", observation.date_time)
            }
            Err(TrySendError::Disconnected(_)) => {
                error!("publisher thread is gone");
                return Err("publisher disconnected".into());
            }
        }
    }

    drop(tx);
    publisher.stop();
    info!("stopped after {} observations", cycle);
    Ok(())
}
