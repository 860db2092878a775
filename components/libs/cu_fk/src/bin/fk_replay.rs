use clap::Parser;
use cu_fk::{
    load_joint_states, BincodePublisher, FkConfig, FkError, FkResult, ForwardKinematics,
    LogPublisher, PoseBatch, PosePublisher,
};
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{BufWriter, Stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Replay recorded joint states through forward kinematics.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Node configuration (RON)
    #[clap(long, value_parser)]
    config: PathBuf,
    /// Recorded joint states (RON list of samples)
    #[clap(long, value_parser)]
    joint_states: PathBuf,
    /// Write length-prefixed bincode batches to this file instead of stdout
    #[clap(long, value_parser)]
    output: Option<PathBuf>,
    /// Log every pose instead of printing batches
    #[clap(long, conflicts_with = "output")]
    log_poses: bool,
    /// Override the world frame of the config
    #[clap(long)]
    world_frame: Option<String>,
}

/// Prints each batch as pretty RON.
struct RonPublisher {
    out: Stdout,
}

impl PosePublisher for RonPublisher {
    fn publish(&mut self, batch: &PoseBatch) -> FkResult<()> {
        let text = ron::ser::to_string_pretty(batch, ron::ser::PrettyConfig::default())
            .map_err(|e| FkError::Publish(e.to_string()))?;
        writeln!(self.out, "{text}")?;
        Ok(())
    }
}

fn run(args: Args) -> FkResult<()> {
    let mut config = FkConfig::from_ron_file(&args.config)?;
    if let Some(world_frame) = args.world_frame {
        config.world_frame = world_frame;
    }

    let level = config.log_level_filter()?;
    if TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("A logger is already installed, keeping it");
    }

    let description = Arc::new(config.load_description()?);
    info!(
        "Loaded '{}': {} joints from root '{}'",
        description.name(),
        description.joint_count(),
        description.root()
    );
    let samples = load_joint_states(&args.joint_states)?;

    let publisher: Box<dyn PosePublisher> = match (&args.output, args.log_poses) {
        (Some(path), _) => Box::new(BincodePublisher::new(BufWriter::new(File::create(path)?))),
        (None, true) => Box::new(LogPublisher),
        (None, false) => Box::new(RonPublisher {
            out: std::io::stdout(),
        }),
    };
    let mut fk = ForwardKinematics::from_config(&config, description, publisher);

    let mut failures = 0usize;
    for sample in &samples {
        let report = fk.process(&sample.configuration(), sample.stamp());
        if report.publish_error.is_some() {
            failures += 1;
        }
    }
    info!("Replayed {} joint states", samples.len());

    if failures > 0 {
        warn!("{failures} batches could not be published");
        return Err(FkError::Publish(format!(
            "{failures} of {} batches failed",
            samples.len()
        )));
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{e}");
        eprintln!("cu-fk-replay: {e}");
        std::process::exit(1);
    }
}
