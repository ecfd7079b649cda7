use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::{Config, DeviceKind};
use crate::switch_device::Connector;
use crate::switcher::{switch_plug, PowerCommand, SwitchError};
use crate::threshold::command_for_reading;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE", env = "TAPOSWITCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Plug to switch
    #[arg(value_name = "temp|hum")]
    pub device: DeviceKind,

    /// Power state to set
    #[arg(
        value_name = "on|off",
        required_unless_present = "reading",
        conflicts_with = "reading"
    )]
    pub action: Option<PowerCommand>,

    /// Sensor reading; the plug is turned on above the configured threshold
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub reading: Option<f32>,
}

impl Args {
    pub fn command(&self, config: &Config) -> PowerCommand {
        match self.action {
            Some(action) => action,
            // clap requires `reading` whenever `action` is absent.
            None => command_for_reading(config, self.device, self.reading.unwrap_or_default()),
        }
    }
}

/// Exit status for an argument error. Help and version output are not failures.
pub fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Switches the plug selected by `args` and returns the process exit status.
pub async fn run<C>(args: &Args, config: &Config, connector: &C) -> u8
where
    C: Connector + ?Sized,
{
    let command = args.command(config);
    let addr = config.address_for(args.device);

    match switch_plug(connector, &config.device(addr), command).await {
        Ok(message) => {
            println!("{}", message);
            0
        }
        Err(e @ SwitchError::ConfigurationIncomplete { .. }) => {
            eprintln!("{}", e);
            1
        }
        // Already logged by switch_plug.
        Err(SwitchError::Device { .. }) => 1,
    }
}
