//! mix_and_render: render mixes of two tracks at several gain settings

use anyhow::Result;
use audacity_cli::CommonArgs;
use audacity_scripting::scripts;
use clap::{ArgAction, Parser};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "mix_and_render", version, about = "Mix and render two tracks.")]
struct Args {
    /// Tracks to be mixed and rendered
    #[arg(num_args = 2, required = true, value_names = ["TRACK_A", "TRACK_B"])]
    track_names: Vec<String>,

    /// Gains in dB for one mix; repeat for more mixes
    #[arg(
        short = 'g',
        long,
        num_args = 2,
        value_names = ["GAIN_A", "GAIN_B"],
        action = ArgAction::Append,
        allow_negative_numbers = true
    )]
    track_gains: Vec<f64>,

    #[command(flatten)]
    common: CommonArgs,
}

impl Args {
    fn tracks(&self) -> [&str; 2] {
        [&self.track_names[0], &self.track_names[1]]
    }

    /// One pair per `-g`, or a single `0 0` mix when none is given
    fn gain_pairs(&self) -> Vec<(f64, f64)> {
        if self.track_gains.is_empty() {
            return vec![(0.0, 0.0)];
        }
        self.track_gains
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging()?;

    let mut scripting = args.common.connect().await?;
    let names = scripts::mix_and_render(&mut scripting, args.tracks(), &args.gain_pairs()).await?;
    scripting.close();

    for name in names {
        info!("New track: {}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gain_pair() {
        let args = Args::try_parse_from(["mix_and_render", "L - AT2050", "R - SM57"]).unwrap();
        assert_eq!(args.tracks(), ["L - AT2050", "R - SM57"]);
        assert_eq!(args.gain_pairs(), vec![(0.0, 0.0)]);
    }

    #[test]
    fn test_repeated_gains() {
        let args = Args::try_parse_from([
            "mix_and_render", "a", "b", "-g", "0", "-6", "-g", "-3", "-3",
        ])
        .unwrap();
        assert_eq!(args.gain_pairs(), vec![(0.0, -6.0), (-3.0, -3.0)]);
    }

    #[test]
    fn test_needs_two_tracks() {
        assert!(Args::try_parse_from(["mix_and_render", "a"]).is_err());
        assert!(Args::try_parse_from(["mix_and_render", "a", "b", "c"]).is_err());
    }
}
