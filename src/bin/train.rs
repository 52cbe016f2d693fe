//! Trains a document authenticity model from folders of real and forged scans.
//!
//! Run with: cargo run --bin id-forensics-train -- --real data/real --fake data/fake

use std::path::PathBuf;

use clap::Parser;
use id_forensics::{
    DetectorConfig, DetectorService, ForestConfig, ScoringModel, config::DEFAULT_MODEL_PATH,
    error::Result, loader::ImageLoader, report::render_training_summary,
};

#[derive(Parser, Debug)]
#[command(name = "id-forensics-train")]
#[command(about = "Train the document forgery detector")]
#[command(version)]
struct Args {
    /// Folder with authentic document images
    #[arg(long, default_value = "data/real", env = "ID_FORENSICS_REAL_DIR")]
    real: PathBuf,

    /// Folder with forged document images
    #[arg(long, default_value = "data/fake", env = "ID_FORENSICS_FAKE_DIR")]
    fake: PathBuf,

    /// Where to write the trained model
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH, env = "ID_FORENSICS_MODEL")]
    model: PathBuf,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Seed for bootstrap sampling and feature selection
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = DetectorConfig::default().with_model_path(&args.model);

    let real = ImageLoader::images_in_folder(&args.real, &config.allowed_extensions)?;
    let fake = ImageLoader::images_in_folder(&args.fake, &config.allowed_extensions)?;
    print!("{}", render_training_summary(real.len(), fake.len()));

    let forest = ForestConfig::default()
        .with_estimators(args.trees)
        .with_seed(args.seed);
    let service = DetectorService::with_model(config, ScoringModel::new(forest).into_shared())?;

    let summary = service.train(&real, &fake)?;
    if summary.skipped > 0 {
        log::warn!("{} images could not be read and were left out", summary.skipped);
    }

    service.save_model(&args.model)?;
    println!("Training completed. Model saved to: {}", args.model.display());

    Ok(())
}
