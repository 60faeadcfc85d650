//! audacity-cmd: send raw scripting commands to Audacity
//!
//! Each command is sent in order over one session; replies are printed to
//! stdout. Stops at the first command whose status is not OK.

use anyhow::{Context, Result};
use audacity_cli::CommonArgs;
use clap::Parser;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(
    name = "audacity-cmd",
    version,
    about = "Send scripting commands to Audacity",
    after_help = "Example: audacity-cmd 'SelectAll:' 'GetInfo: Type=Tracks' --json"
)]
struct Args {
    /// Commands, e.g. `Select: Start=0 End=10`
    #[arg(required = true)]
    commands: Vec<String>,

    /// Print the JSON payload, pretty-printed, instead of the raw reply
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.common.init_logging()?;

    let mut scripting = args.common.connect().await?;
    debug!("Commands end with {:?}", scripting.session().line_ending());
    for command in &args.commands {
        let response = scripting
            .run_command(command.as_str())
            .await
            .with_context(|| format!("{:?} failed", command))?;

        if args.json {
            let payload = response
                .json()
                .with_context(|| format!("{:?} returned no JSON", command))?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            print!("{}", response.as_str());
        }
    }

    scripting.close();
    info!("{} commands sent", args.commands.len());
    Ok(())
}
