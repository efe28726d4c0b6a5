mod simulation;

use clap::Parser;

use simulation::{SimulationClock, Simulator};

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Signalized junction simulation, headless")]
struct Cli {
    /// Simulated seconds to cover
    #[arg(long, default_value = "7200")]
    sim_seconds: f32,

    /// Real seconds the run should take
    #[arg(long, default_value = "30")]
    real_seconds: f32,

    /// Wall-clock time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Vehicle spawn probability per interval (0-100)
    #[arg(long, default_value = "30")]
    vehicle_rate: u8,

    /// Bicycle spawn probability per interval (0-100)
    #[arg(long, default_value = "25")]
    bicycle_rate: u8,

    /// Pedestrian spawn probability per interval (0-100)
    #[arg(long, default_value = "20")]
    pedestrian_rate: u8,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    run_headless(&cli);
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) {
    println!("Running junction simulation in headless mode...");
    println!(
        "Simulating {} of traffic in {} real time, {:.1}s wall per tick",
        format_time(cli.sim_seconds),
        format_time(cli.real_seconds),
        cli.delta
    );
    println!();

    let mut clock = SimulationClock::new();
    let factor = if cli.real_seconds > 0.0 {
        cli.sim_seconds / cli.real_seconds
    } else {
        0.0
    };
    clock.configure(cli.sim_seconds, cli.real_seconds, factor);

    let mut sim = match cli.seed {
        Some(seed) => Simulator::with_seed(seed),
        None => Simulator::new(),
    };
    sim.set_spawn_probability(cli.vehicle_rate, cli.bicycle_rate, cli.pedestrian_rate);
    sim.set_on_accident(|total| println!("!! accident #{}", total));
    sim.signals_mut().start();

    // Report once per real second worth of ticks
    let ticks_per_report = (1.0 / cli.delta).ceil().max(1.0) as u32;
    let mut tick: u32 = 0;

    while !clock.is_finished() {
        clock.advance(cli.delta);
        sim.update(clock.simulated_elapsed(), cli.delta, clock.time_factor());

        tick += 1;
        if tick % ticks_per_report == 0 {
            println!(
                "--- {:.0}% ({} simulated) ---",
                clock.progress_percent(),
                format_time(clock.simulated_elapsed())
            );
            sim.print_summary();
            println!();
        }
    }

    let stats = sim.stats();
    println!("=== Final State ===");
    sim.print_summary();
    println!();
    println!(
        "Simulation complete: {} simulated in {} real, {} accidents",
        format_time(clock.simulated_elapsed()),
        format_time(clock.real_elapsed()),
        stats.accidents
    );
}

fn format_time(seconds: f32) -> String {
    let total = seconds as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
