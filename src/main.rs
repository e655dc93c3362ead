//! Arcade Sim entry point
//!
//! Native builds run a headless autopilot against the in-memory daily
//! leaderboard. The web build is driven from JS through `platform::web`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;
    use glam::Vec2;

    use arcade_sim::consts::{LANE_HEIGHT, SIM_DT};
    use arcade_sim::outcome::SubmitStatus;
    use arcade_sim::sim::{GamePhase, GameState, Segment, TickInput};
    use arcade_sim::{DailyLeaderboard, Engine, GameMode, ScoreSubmitter, Settings};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Headless arcade simulation runner", long_about = None)]
    pub struct Cli {
        /// Game mode: line-bounce or lane-cross
        #[arg(long, default_value = "line-bounce")]
        mode: String,
        /// Seed of the first run; later runs use seed + n
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long, default_value_t = 5)]
        runs: u32,
        /// Settings JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Submit as this user (omit to play as a guest)
        #[arg(long)]
        user: Option<String>,
        /// Abandon a run after this many ticks
        #[arg(long, default_value_t = 36_000)]
        max_ticks: u32,
    }

    pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
        let mode = GameMode::from_str(&cli.mode).ok_or_else(|| format!("Unknown game mode: {}", cli.mode))?;
        let settings = match &cli.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        let mut submitter = ScoreSubmitter::new(DailyLeaderboard::with_modes(), cli.user.clone());
        for n in 0..cli.runs {
            let seed = cli.seed.wrapping_add(u64::from(n));
            let mut engine = Engine::new(mode, seed, settings.clone(), submitter);

            let mut ticks = 0;
            while !engine.is_over() {
                if ticks >= cli.max_ticks {
                    log::warn!("Run {} hit the tick limit, abandoning", n);
                    engine.end_run();
                    break;
                }
                let input = autopilot(engine.state());
                engine.tick(SIM_DT, &input);
                ticks += 1;
            }

            let state = engine.state();
            println!(
                "run {:>3}  seed {:>6}  score {:>3}  rounds {:>3}  {:?}",
                n,
                seed,
                state.score,
                state.round.index + 1,
                state.end_reason
            );
            submitter = engine.into_reporter();
        }

        match submitter.status() {
            Some(SubmitStatus::Failed { message }) => println!("{message}"),
            Some(status) => {
                println!("\nToday's {} ranking", mode.as_str());
                for entry in status.ranking() {
                    println!("{:>3}. {:<16} {}", entry.pos, entry.user, entry.score);
                }
            }
            None => {}
        }
        Ok(())
    }

    fn autopilot(state: &GameState) -> TickInput {
        match (state.mode, state.phase) {
            (GameMode::LineBounce, GamePhase::Input) => TickInput::line(deflector(state)),
            (GameMode::LaneCross, GamePhase::Simulating) if next_lane_clear(state) => TickInput::advance(),
            _ => TickInput::default(),
        }
    }

    /// A ramp under the spawn sloping down toward the basket
    fn deflector(state: &GameState) -> Segment {
        let spawn = state.round.spawn;
        let toward = (state.round.target.center().x - spawn.x).signum();
        let center = spawn + Vec2::new(0.0, 140.0);
        let half = Vec2::new(toward, 0.6).normalize_or_zero() * 70.0;
        Segment::new(center - half, center + half)
    }

    fn next_lane_clear(state: &GameState) -> bool {
        let next = state.body.position - Vec2::new(0.0, LANE_HEIGHT);
        let r = state.body.radius;
        state.obstacles.boxes().all(|b| {
            if next.y + r < b.y || next.y - r > b.y + b.height {
                return true;
            }
            let speed = state
                .obstacles
                .lanes()
                .get(b.lane as usize)
                .map_or(0.0, |lane| lane.speed.abs());
            let margin = r + speed * 0.25;
            b.x > next.x + margin || b.x + b.width < next.x - margin
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Arcade sim (native) starting...");

    if let Err(e) = headless::run(headless::Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
