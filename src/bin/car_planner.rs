//! Headless car planning simulation.
//!
//! Usage:
//!   cargo run --bin car_planner -- --goal 0.5,0.5,1.57 --plot route.png
//!   RUST_LOG=debug cargo run --bin car_planner -- --map maps/room.pbm --seed 3

use clap::Parser;
use log::{info, warn};

use car_planner::mission_planning::{Mission, MissionState};
use car_planner::utils::{PathStyle, Visualizer};
use car_planner::{CarRrtPlanner, Car, OccupancyGrid, PlannerResult, Pose2D, SimulationConfig};

/// Plan and drive a car-like vehicle across an occupancy grid
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Occupancy raster (PBM) overriding the configured one
    #[arg(short, long)]
    map: Option<String>,

    /// Start pose as x,y,yaw
    #[arg(long, default_value = "0,0,0", value_parser = parse_pose, allow_hyphen_values = true)]
    start: Pose2D,

    /// Goal pose as x,y,yaw
    #[arg(long, default_value = "0.2,0.2,0", value_parser = parse_pose, allow_hyphen_values = true)]
    goal: Pose2D,

    /// Seed for the planner's random stream
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation ticks before giving up
    #[arg(long, default_value_t = 100_000)]
    max_ticks: usize,

    /// Write a plot of the result to this PNG file
    #[arg(long)]
    plot: Option<String>,

    /// Save the occupancy grid used for the run
    #[arg(long)]
    save_map: Option<String>,
}

fn parse_pose(s: &str) -> Result<Pose2D, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{}: {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x, y, yaw] => Ok(Pose2D::new(*x, *y, *yaw)),
        _ => Err(format!("expected x,y,yaw but got {:?}", s)),
    }
}

fn main() -> PlannerResult<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if args.seed.is_some() {
        config.planner.seed = args.seed;
    }

    let grid = match &args.map {
        Some(path) => OccupancyGrid::load(path)?,
        None => config.build_grid()?,
    };
    info!(
        "grid {}x{} with {} occupied cells",
        grid.resolution(),
        grid.resolution(),
        grid.occupied_count()
    );

    let footprint = config.build_footprint();
    if footprint.collides(&args.start, &grid) {
        warn!("start pose is in collision");
    }
    let planner = CarRrtPlanner::new(
        grid,
        footprint.clone(),
        config.planner.clone(),
        args.start,
        args.goal,
    )?;
    let car = Car::new(args.start, footprint);
    let mut mission = Mission::new(planner, car);

    let state = mission.run(args.max_ticks);
    let episode = mission.planner().episode();
    match state {
        MissionState::Arrived => info!(
            "arrived at ({:.3}, {:.3}, {:.3}) after {} ticks, {} iterations, {} milestones",
            mission.car().pose().x,
            mission.car().pose().y,
            mission.car().pose().yaw,
            mission.ticks(),
            episode.iterations(),
            episode.milestones().len()
        ),
        other => warn!(
            "mission ended {} after {} ticks ({} iterations)",
            other,
            mission.ticks(),
            episode.iterations()
        ),
    }

    if let Some(path) = &args.save_map {
        mission.planner().grid().save(path)?;
    }

    if let Some(path) = &args.plot {
        let route = mission.planner().route();
        let mut vis = Visualizer::new();
        vis.set_title("Car RRT")
            .plot_grid(mission.planner().grid())
            .plot_tree(episode.tree())
            .plot_route(&route, &PathStyle::default())
            .plot_start(&args.start)
            .plot_goal(&args.goal)
            .plot_car(mission.car());
        vis.save_png(path, 800, 800)?;
        info!("plot written to {}", path);
    }

    Ok(())
}
