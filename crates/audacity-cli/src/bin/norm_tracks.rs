//! norm_tracks: normalize tracks one label span at a time

use anyhow::Result;
use audacity_cli::CommonArgs;
use audacity_scripting::{NormalizeSettings, scripts};
use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(name = "norm_tracks", version, about = "Normalize tracks by label.")]
struct Args {
    /// Tracks to be normalized
    #[arg(required = true)]
    tracks: Vec<String>,

    /// PeakLevel for normalization
    #[arg(short, long, default_value_t = -1.0, allow_negative_numbers = true)]
    peak_level: f64,

    /// ApplyGain for normalization
    #[arg(short = 'g', long, default_value_t = true, action = ArgAction::Set)]
    apply_gain: bool,

    /// RemoveDcOffset for normalization
    #[arg(short = 'o', long, default_value_t = true, action = ArgAction::Set)]
    rem_dc_offset: bool,

    /// StereoIndependent for normalization
    #[arg(short, long, default_value_t = false, action = ArgAction::Set)]
    stereo_ind: bool,

    #[command(flatten)]
    common: CommonArgs,
}

impl Args {
    fn settings(&self) -> NormalizeSettings {
        NormalizeSettings {
            peak_level: self.peak_level,
            apply_gain: self.apply_gain,
            remove_dc_offset: self.rem_dc_offset,
            stereo_independent: self.stereo_ind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging()?;

    let mut scripting = args.common.connect().await?;
    scripts::normalize_tracks(&mut scripting, &args.tracks, args.settings()).await?;
    scripting.close();

    Ok(())
}
