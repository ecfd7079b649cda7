//! Switches Tapo smart plugs on or off.
//!
//! The binary reads the plug address and account from the config file and
//! the environment; HTTP handlers and other callers can use [`switch_plug`]
//! or [`switch_tapo_plug`] directly.

pub mod cli;
pub mod config;
pub mod switch_device;
pub mod switcher;
pub mod threshold;

pub use config::{Config, DeviceConfig, DeviceKind};
pub use switch_device::tapo_plug::TapoConnector;
pub use switch_device::{Connector, DeviceInfo, PlugSession};
pub use switcher::{switch_plug, switch_tapo_plug, PowerCommand, SessionStep, SwitchError};
