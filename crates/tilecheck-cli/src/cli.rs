use clap::{Parser, Subcommand, ValueEnum};
use tilecheck_kernel::Toggle;

#[derive(Parser)]
#[command(
    name = "tilecheck",
    about = "Tilecheck: verify that a montaged microscopy acquisition is complete",
    version
)]
pub struct Cli {
    /// Diagnostic verbosity on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that every well × timepoint × channel × tile image is present exactly once
    Check {
        /// Folder containing the raw image files (scanned recursively)
        input_dir: String,

        /// Existing folder the missing/extra reports are written to
        output_dir: String,

        /// TOML run configuration; flags below override its values
        #[arg(long)]
        config: Option<String>,

        /// Token standard robo code: 0, 3, 4, or 1 to auto-detect
        #[arg(long)]
        robo: Option<i64>,

        /// Number of vertical images in the montage
        #[arg(long, requires = "cols")]
        rows: Option<u32>,

        /// Number of horizontal images in the montage
        #[arg(long, requires = "rows")]
        cols: Option<u32>,

        /// Whether `--wells` includes or excludes
        #[arg(long, value_enum, default_value = "include")]
        wells_toggle: ToggleArg,

        /// Wells to include or exclude (e.g. `A01-A06,B03`)
        #[arg(long)]
        wells: Option<String>,

        /// Whether `--timepoints` includes or excludes
        #[arg(long, value_enum, default_value = "include")]
        timepoints_toggle: ToggleArg,

        /// Timepoints to include or exclude (e.g. `T0-T4`)
        #[arg(long)]
        timepoints: Option<String>,

        /// Whether `--channels` includes or excludes
        #[arg(long, value_enum, default_value = "include")]
        channels_toggle: ToggleArg,

        /// Channels (or unique fragments) to include or exclude
        #[arg(long)]
        channels: Option<String>,

        /// Morphology channel; must remain among the selected channels
        #[arg(long)]
        morphology_channel: Option<String>,

        /// Experiment name used for report files (defaults to the filename token)
        #[arg(long)]
        experiment: Option<String>,

        /// Resolve inventory and selection only; skip the completeness check
        #[arg(long)]
        skip_check: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the tokenized records of every image file
    Tokenize {
        /// Folder containing the raw image files (scanned recursively)
        input_dir: String,

        /// Token standard robo code: 0, 3, 4, or 1 to auto-detect
        #[arg(long, default_value_t = 1)]
        robo: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ToggleArg {
    #[value(name = "include")]
    Include,
    #[value(name = "exclude")]
    Exclude,
}

impl From<ToggleArg> for Toggle {
    fn from(arg: ToggleArg) -> Self {
        match arg {
            ToggleArg::Include => Toggle::Include,
            ToggleArg::Exclude => Toggle::Exclude,
        }
    }
}
