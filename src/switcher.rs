use std::fmt;

use thiserror::Error;

use crate::config::{Config, DeviceConfig};
use crate::switch_device::{Connector, PlugSession};

pub const SUCCESS_MESSAGE: &str = "Tapo plug switched successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    On,
    Off,
}

impl PowerCommand {
    pub fn is_on(self) -> bool {
        self == PowerCommand::On
    }
}

impl From<bool> for PowerCommand {
    fn from(turn_on: bool) -> Self {
        if turn_on {
            PowerCommand::On
        } else {
            PowerCommand::Off
        }
    }
}

impl std::str::FromStr for PowerCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(PowerCommand::On),
            "off" => Ok(PowerCommand::Off),
            other => Err(format!("invalid action '{other}', expected 'on' or 'off'")),
        }
    }
}

impl fmt::Display for PowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerCommand::On => "on",
            PowerCommand::Off => "off",
        })
    }
}

/// The stage of a switch operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Open,
    Handshake,
    Login,
    Command,
    Info,
    Close,
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStep::Open => "open",
            SessionStep::Handshake => "handshake",
            SessionStep::Login => "login",
            SessionStep::Command => "command",
            SessionStep::Info => "device info",
            SessionStep::Close => "close",
        })
    }
}

#[derive(Error, Debug)]
pub enum SwitchError {
    #[error("Tapo device configuration is incomplete (missing: {})", .missing.join(", "))]
    ConfigurationIncomplete { missing: Vec<&'static str> },
    #[error("Tapo {step} failed: {source:#}")]
    Device {
        step: SessionStep,
        source: anyhow::Error,
    },
}

impl SwitchError {
    /// Status an HTTP handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            SwitchError::ConfigurationIncomplete { .. } => 400,
            SwitchError::Device { .. } => 502,
        }
    }

    pub fn step(&self) -> Option<SessionStep> {
        match self {
            SwitchError::ConfigurationIncomplete { .. } => None,
            SwitchError::Device { step, .. } => Some(*step),
        }
    }
}

/// Opens a session with the plug at `config.address`, applies `command`
/// and closes the session again.
///
/// Nothing is opened when the config has an empty field. Once a session is
/// open it is closed whether or not the sequence succeeded.
pub async fn switch_plug<C>(
    connector: &C,
    config: &DeviceConfig,
    command: PowerCommand,
) -> Result<String, SwitchError>
where
    C: Connector + ?Sized,
{
    config.validate()?;

    let mut session = connector
        .open(config)
        .map_err(|source| device_error(SessionStep::Open, source))?;
    log::info!("Initializing Tapo plug at {}...", config.address);

    let result = run_sequence(&mut *session, command).await;

    let closed = session.close().await;
    match (result, closed) {
        (Ok(()), Ok(())) => Ok(SUCCESS_MESSAGE.to_string()),
        (Ok(()), Err(e)) => {
            log::warn!("Closing session failed: {:#}", e);
            Ok(SUCCESS_MESSAGE.to_string())
        }
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                log::warn!("Closing session failed: {:#}", close_err);
            }
            log::error!("An error occurred: {}", e);
            Err(e)
        }
    }
}

/// The single-plug variant: targets `Config::addr` (`TAPO_IP`).
pub async fn switch_tapo_plug<C>(
    connector: &C,
    config: &Config,
    turn_on: bool,
) -> Result<String, SwitchError>
where
    C: Connector + ?Sized,
{
    switch_plug(connector, &config.device(&config.addr), turn_on.into()).await
}

async fn run_sequence(
    session: &mut dyn PlugSession,
    command: PowerCommand,
) -> Result<(), SwitchError> {
    session
        .handshake()
        .await
        .map_err(|e| device_error(SessionStep::Handshake, e))?;
    log::info!("Handshake successful.");

    session
        .login()
        .await
        .map_err(|e| device_error(SessionStep::Login, e))?;
    log::info!("Login successful.");

    session
        .set_on_off(command.is_on())
        .await
        .map_err(|e| device_error(SessionStep::Command, e))?;
    log::info!("Turned {}", command);

    let info = session
        .device_info()
        .await
        .map_err(|e| device_error(SessionStep::Info, e))?;
    log::debug!("{:?}", info);

    let name = session
        .device_name()
        .await
        .map_err(|e| device_error(SessionStep::Info, e))?;
    log::info!("Device name: {}", name);

    Ok(())
}

fn device_error(step: SessionStep, source: anyhow::Error) -> SwitchError {
    SwitchError::Device { step, source }
}
