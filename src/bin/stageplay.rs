//! stageplay - play a patch from the command line
//!
//! Run with: cargo run --bin stageplay -- <preset|patch.json> [frequency] [hold-seconds]

use std::{env, fs, thread, time::Duration};

use color_eyre::eyre::{eyre, Result};

use soundstage::{
    engine::{realtime::RealtimeEngine, AudioEngine},
    presets,
    stage::factory,
    unlock,
};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut args = env::args().skip(1);
    let source = args
        .next()
        .ok_or_else(|| eyre!("usage: stageplay <preset|patch.json> [frequency] [hold-seconds]"))?;
    let frequency: f32 = args.next().map(|arg| arg.parse()).transpose()?.unwrap_or(440.0);
    let hold: f64 = args.next().map(|arg| arg.parse()).transpose()?.unwrap_or(1.0);

    let patch = match presets::by_name(&source) {
        Some(patch) => patch,
        None => factory::from_json(&fs::read_to_string(&source)?)?,
    };

    let mut engine = RealtimeEngine::new()?;
    unlock::unlock(&mut engine)?;

    let destination = engine.destination();
    let mut binding = patch.bind(frequency);

    // A hair in the future so the whole tree starts on a clean block edge.
    let at = engine.now() + 0.05;
    binding.play(&mut engine, destination, at)?;
    log::info!("playing {source} at {frequency} Hz");

    thread::sleep(Duration::from_secs_f64(hold));
    let stop_at = binding.release(&mut engine)?;
    log::info!("released; silent at t={stop_at:.3}");

    let remaining = (stop_at - engine.now()).max(0.0) + 0.1;
    thread::sleep(Duration::from_secs_f64(remaining));
    Ok(())
}
