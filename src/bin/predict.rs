//! Scores a single document image or every image in a folder.
//!
//! Run with:
//!   cargo run --bin id-forensics-predict -- card.jpg
//!   cargo run --bin id-forensics-predict -- --batch scans/

use std::path::PathBuf;

use clap::Parser;
use id_forensics::{
    DetectorConfig, DetectorService,
    config::{DEFAULT_MODEL_PATH, DEFAULT_THRESHOLD},
    error::{ForensicsError, Result},
    report::{render_batch, render_result},
};

#[derive(Parser, Debug)]
#[command(name = "id-forensics-predict")]
#[command(about = "Score document images with a trained forgery detector")]
#[command(version)]
struct Args {
    /// Image to score, or a folder when --batch is given
    input: PathBuf,

    /// Score every supported image directly inside INPUT
    #[arg(long)]
    batch: bool,

    /// Trained model artifact
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH, env = "ID_FORENSICS_MODEL")]
    model: PathBuf,

    /// Decision threshold on the real-class probability
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, env = "ID_FORENSICS_THRESHOLD")]
    threshold: f64,

    /// Print JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = DetectorConfig::default()
        .with_threshold(args.threshold)
        .with_model_path(&args.model);

    let service = DetectorService::new(config)?;
    service.load_default_model()?;

    if args.batch {
        let report = service.predict_batch(&args.input)?;
        if args.json {
            println!("{}", report.to_json()?);
        } else {
            print!("{}", render_batch(&report));
        }
    } else {
        let name = args.input.to_string_lossy();
        if !service.allowed_file(&name) {
            return Err(ForensicsError::UnsupportedFormat(format!(
                "{} does not have an allowed extension",
                name
            )));
        }

        let result = service.predict(&args.input)?;
        if args.json {
            println!("{}", result.to_json()?);
        } else {
            print!("{}", render_result(&name, &result));
        }
    }

    Ok(())
}
