//! Animates a value from 0 to 100 on the real clock and draws it as a bar in the terminal.
//!
//! The preset is taken from the first argument (`gentle`, `wobbly`, `stiff`, `slow` or `default`),
//! and a second spring fades in alongside it to show a [`SpringController`] recipe.
//!
//! Run with: `cargo run --example settle -- wobbly`
//!
//! Set `RUST_LOG=tensile_core=trace` to see every tick.

use std::rc::Rc;
use tensile::prelude::*;
use tensile::SpringError;
use tracing_subscriber::EnvFilter;

const WIDTH: f64 = 60.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let preset = match std::env::args().nth(1).map(|name| name.parse::<Preset>()) {
        Some(Ok(preset)) => preset,
        Some(Err(error)) => {
            eprintln!("{error}; expected one of gentle, wobbly, stiff, slow, default");
            std::process::exit(2);
        }
        None => Preset::Default,
    };
    let config = preset.config();
    tracing::info!(
        %preset,
        stiffness = config.stiffness(),
        damping = config.damping(),
        damping_ratio = config.damping_ratio(),
        "animating 0 -> 100"
    );

    let frame_loop = Rc::new(FrameLoop::new(60));
    let mut spring = Spring::builder()
        .from(0.0)
        .to(100.0)
        .config(preset)
        .on_update(|value| println!("{:>8.3} |{}", value, bar(value)))
        .on_complete(|| tracing::info!("spring settled"))
        .build(frame_loop.clone())
        .unwrap_or_else(|error| fail(error));
    let fade = SpringController::new(SpringOptions::fade_in().delay_ms(250), frame_loop.clone())
        .unwrap_or_else(|error| fail(error));

    spring.start(0).unwrap_or_else(|error| fail(error));
    let frames = frame_loop.run_until_idle();

    tracing::info!(
        frames,
        value = spring.value(),
        opacity = %Channel::Opacity.css(fade.value()),
        "done"
    );
}

fn bar(value: f64) -> String {
    let filled = (value / 100.0 * WIDTH).round().clamp(0.0, WIDTH * 1.5) as usize;
    "#".repeat(filled)
}

fn fail(error: SpringError) -> ! {
    tracing::error!(%error, "could not animate");
    std::process::exit(1);
}
