//! bstatus - periodic status line for terminals and i3bar.
//!
//! Usage: `bstatus [CONFIG] [--log-level LEVEL]`
//!
//! The configuration defaults to `~/.bstatus/config.json5`.

use anyhow::Result;
use bstatus::{BstatusConfig, build, output};
use bstatus_framework::{StatusArgs, StatusConfig, StatusRunner};

#[tokio::main]
async fn main() -> Result<()> {
    let args = StatusArgs::parse();
    let config = BstatusConfig::load(args.config_path())?;

    let mut runner = StatusRunner::new_with_args("bstatus", config, Some(&args))?;

    let status = build(runner.config())?;
    for driver in status.drivers {
        runner.track(driver);
    }

    let mut program = status.program;
    if let Some(input) = program.set_output(output::from_config(&runner.config().output))? {
        runner.track(input);
    }

    runner.run(program).await?;
    Ok(())
}
