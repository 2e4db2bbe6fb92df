use elastic_mpm::mpm::models::FixedCorotated;
use elastic_mpm::statistics::SimulationStatistics;
use elastic_mpm::{Direction, ExternalForces, MpmParameters, MpmSimulation, Simulation};

use eyre::WrapErr;
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(StructOpt, Debug)]
#[structopt(name = "elastic_mpm")]
struct Opt {
    /// JSON file with the simulation parameters
    #[structopt(short, long)]
    config: Option<std::path::PathBuf>,
    /// Directory to write one MessagePack file per frame to
    #[structopt(short, long)]
    output_dir: Option<std::path::PathBuf>,
    #[structopt(short, long, default_value = "600")]
    frames: usize,
    /// Direction of gravity: none, left, right, up or down
    #[structopt(short, long, default_value = "none")]
    gravity: Direction,
    /// Resolution multiplier, ignored when a config file is given
    #[structopt(short, long)]
    quality: Option<usize>,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opt = Opt::from_args();

    let params = match (&opt.config, opt.quality) {
        (Some(path), _) => MpmParameters::from_json_file(path)?,
        (None, Some(quality)) => MpmParameters::with_quality(quality),
        (None, None) => MpmParameters::default(),
    };
    params.validate().wrap_err("Invalid simulation parameters")?;

    if let Some(dir) = &opt.output_dir {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    info!(
        "Simulating {} frames of {} particles, {} substeps per frame",
        opt.frames,
        params.num_particles,
        params.substeps_per_frame()
    );

    let mut simulation: MpmSimulation<FixedCorotated> = MpmSimulation::new(params);
    simulation.reset();
    let forces = ExternalForces::from_direction(opt.gravity);

    for frame in 0..opt.frames {
        let output = simulation.simulate_frame(&forces);

        debug!(
            frame,
            kinetic_energy = simulation.total_kinetic_energy(),
            volume = simulation.total_volume(),
            momentum = ?simulation.total_linear_momentum(),
            "Frame statistics"
        );

        if let Some(dir) = &opt.output_dir {
            let path = dir.join(format!("{:03}.dat", frame));
            let mut writer = std::fs::File::create(&path)
                .wrap_err_with(|| format!("Failed to create frame file: {:?}", path))?;
            rmp_serde::encode::write(&mut writer, &output)
                .wrap_err_with(|| format!("Failed to write frame {}", frame))?;
        }
    }

    info!("Done, simulated {:.3}s", simulation.total_time());

    Ok(())
}
