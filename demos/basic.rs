// Copyright (c) 2024 Mike Tsao

//! Plays two interleaved tracks in real time and logs every step that fires.
//!
//! `RUST_LOG=debug cargo run --example basic -- --bpm 180 --direction backward`

use clap::Parser;
use core::time::Duration;
use std::sync::{Arc, Mutex};
use stepseq::prelude::*;

/// The program's command-line arguments.
#[derive(clap::Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// Tempo in beats per minute
    #[clap(short, long, default_value_t = 120.0)]
    bpm: f64,

    /// How long to play before stopping
    #[clap(short, long, default_value_t = 4)]
    seconds: u64,

    /// forward, backward, or random
    #[clap(short, long, default_value = "forward")]
    direction: StepDirection,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let executor = |track: &Track<&'static str>| -> anyhow::Result<()> {
        log::info!("{} fired at step {}", track.parameters(), track.current_step());
        Ok(())
    };
    let mut sequencer = Sequencer::new_with(executor);
    sequencer.add_track("track1", 8, [0, 2, 4, 6])?;
    sequencer.add_track("track2", 8, [1, 3, 5, 7])?;
    sequencer.set_step_direction(args.direction);
    sequencer.on_state_change(|state| {
        let row: String = state.tracks[0]
            .steps
            .iter()
            .map(|step| if step.current { '|' } else { '.' })
            .collect();
        log::debug!("{row}");
    });

    let mut ticker = PeriodicTicker::new_with(
        Arc::new(Mutex::new(sequencer)),
        ThreadTimer::default(),
        Tempo::new_with(args.bpm)?,
    );
    ticker.start()?;
    std::thread::sleep(Duration::from_secs(args.seconds));
    ticker.stop();

    Ok(())
}
