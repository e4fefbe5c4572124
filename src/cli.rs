//! Command-line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autolabel", version)]
#[command(about = "Bootstrap bounding-box labels and grow a labeled corpus by augmentation")]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate augmented image/label pairs from a labeled corpus
    Augment(AugmentArgs),
    /// Write a label file for the dominant object of every image
    Label(LabelArgs),
}

#[derive(Args, Debug, Default)]
pub struct AugmentArgs {
    /// Source image directory
    #[arg(long)]
    pub images: Option<PathBuf>,

    /// Source label directory
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Output directory for generated images
    #[arg(long)]
    pub out_images: Option<PathBuf>,

    /// Output directory for generated labels
    #[arg(long)]
    pub out_labels: Option<PathBuf>,

    /// Number of samples to generate
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Minimum visible fraction for a box to survive
    #[arg(long)]
    pub min_visibility: Option<f64>,

    /// Minimum normalized width and height of a kept box
    #[arg(long)]
    pub min_extent: Option<f64>,

    /// Give up after this many attempts
    #[arg(long)]
    pub max_attempts: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Prepare attempts on all cores (requires the `parallel` feature)
    #[arg(long)]
    pub parallel: bool,

    /// Write the run report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct LabelArgs {
    /// Directory of images to label
    #[arg(long)]
    pub images: Option<PathBuf>,

    /// Directory receiving the label files
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Class id written for every detection
    #[arg(long)]
    pub class_id: Option<u32>,

    /// Minimum contour area relative to the image
    #[arg(long)]
    pub min_area_ratio: Option<f64>,

    /// Save each edge map here for inspection
    #[arg(long)]
    pub edges_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_augment() {
        let cli = Cli::try_parse_from([
            "autolabel", "-vv", "augment", "--images", "in/img", "--labels", "in/lbl",
            "--out-images", "out/img", "--out-labels", "out/lbl", "-n", "25", "--seed", "4",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Augment(args) => {
                assert_eq!(args.images, Some(PathBuf::from("in/img")));
                assert_eq!(args.count, Some(25));
                assert_eq!(args.seed, Some(4));
                assert!(!args.parallel);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_label_with_global_config() {
        let cli = Cli::try_parse_from([
            "autolabel", "label", "--images", "raw", "--labels", "lbl", "--class-id", "3",
            "--config", "run.json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("run.json")));
        match cli.command {
            Command::Label(args) => {
                assert_eq!(args.class_id, Some(3));
                assert!(args.edges_dir.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
