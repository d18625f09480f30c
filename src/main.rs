//! Headless terrawalk driver.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Load a WorldConfig JSON file
//!   --save-config <PATH>  Write the effective config and exit
//!   --seed <SEED>         Override the terrain seed
//!   --ticks <N>           Number of ticks to run (default: 600, 0 = forever with --serve)
//!   --dt <SECONDS>        Fixed step for the scripted tour (default: 1/60)
//!   --serve               Start the control server and run in real time
//!   --port <PORT>         Control server port (default: 9743)

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use terrawalk::core::{logging, Result, WorldConfig};
use terrawalk::locomotion::Commands;
use terrawalk::remote::SessionControl;
use terrawalk::session::{Session, TelemetrySnapshot};

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => WorldConfig::load(&PathBuf::from(path))?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = parse_u32_arg(&args, "--seed") {
        config.terrain.seed = seed;
    }

    if let Some(path) = parse_str_arg(&args, "--save-config") {
        config.validate()?;
        config.save(&PathBuf::from(&path))?;
        log::info!("Config written to {}", path);
        return Ok(());
    }

    let ticks = parse_u64_arg(&args, "--ticks").unwrap_or(600);
    let port = parse_u16_arg(&args, "--port").unwrap_or(terrawalk_control::DEFAULT_PORT);

    let session = Session::new(config)?;

    if args.iter().any(|a| a == "--serve") {
        serve(session, port, ticks)
    } else {
        let dt = parse_f32_arg(&args, "--dt").unwrap_or(1.0 / 60.0);
        tour(session, ticks, dt)
    }
}

/// Scripted walk, jump, flight and free-flight sequence
fn tour(mut session: Session, ticks: u64, dt: f32) -> Result<()> {
    let phase_len = (ticks / 6).max(1);
    let mut last = session.telemetry();

    for i in 0..ticks {
        let phase = i / phase_len;
        let first = i % phase_len == 0;
        let mut commands = Commands {
            move_forward: true,
            look: glam::Vec2::new(0.5, 0.0),
            ..Default::default()
        };
        match phase {
            0 => {}
            1 => commands.jump = i % 45 == 0,
            2 => {
                commands.toggle_flight = first;
                commands.ascend = !first;
                commands.sprint = true;
            }
            3 => {
                commands.hover_lift = first;
                commands.toggle_free_flight = first;
                commands.look.y = -0.3;
            }
            4 => commands.descend = true,
            _ => {
                commands.reset_flight = first;
                commands.crouch = true;
            }
        }

        last = session.tick(dt, &commands);
        if first {
            log_telemetry(&last);
        }
    }

    log_telemetry(&last);
    println!("{}", serde_json::to_string_pretty(&last)?);
    Ok(())
}

fn log_telemetry(t: &TelemetrySnapshot) {
    let p = &t.player;
    log::info!(
        "tick {:>5} {:<10} pos ({:>7.2}, {:>6.2}, {:>7.2}) ground {:>6.2} slope {:>5.1}° lift {:>4.1} {} {}",
        t.tick,
        p.mode.name(),
        p.position.x,
        p.position.y,
        p.position.z,
        t.ground_height,
        t.slope_degrees,
        p.lift_force,
        p.current_biome.map(|b| b.name()).unwrap_or("-"),
        p.last_collision.map(|c| c.to_string()).unwrap_or_default(),
    );
}

/// Run in real time with the control server attached
fn serve(session: Session, port: u16, ticks: u64) -> Result<()> {
    let session = Arc::new(Mutex::new(session));

    // Control server in a background thread with its own tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let handler = Arc::new(tokio::sync::Mutex::new(SessionControl::new(session.clone())));
    let server = runtime.block_on(terrawalk_control::ControlServer::bind(handler, port))?;
    log::info!(
        "Control server started on {}",
        server.local_addr().map(|a| a.to_string()).unwrap_or_else(|| port.to_string())
    );

    let frame = Duration::from_secs_f32(1.0 / 60.0);
    let mut count = 0u64;
    while ticks == 0 || count < ticks {
        let telemetry = {
            let mut s = session.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            s.tick_realtime(&Commands::idle())
        };
        if telemetry.tick % 300 == 0 {
            log_telemetry(&telemetry);
        }
        count += 1;
        std::thread::sleep(frame);
    }

    server.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u16_arg(args: &[String], flag: &str) -> Option<u16> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
