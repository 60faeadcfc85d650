//! join_clips: join all clips on all tracks

use anyhow::Result;
use audacity_cli::CommonArgs;
use audacity_scripting::scripts;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "join_clips", version, about = "Join all clips on all tracks.")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging()?;

    let mut scripting = args.common.connect().await?;
    scripts::join_clips(&mut scripting).await?;
    scripting.close();

    Ok(())
}
