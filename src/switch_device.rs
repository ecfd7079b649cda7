use anyhow::Result;

use crate::config::DeviceConfig;

pub mod tapo_plug;

/// Summary of what a plug reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub nickname: String,
    pub model: String,
    pub device_on: bool,
}

/// A live connection to one plug, owned by a single switch operation.
#[async_trait::async_trait]
pub trait PlugSession: Send {
    async fn handshake(&mut self) -> Result<()>;
    async fn login(&mut self) -> Result<()>;
    async fn set_on_off(&mut self, state: bool) -> Result<()>;
    async fn device_info(&mut self) -> Result<DeviceInfo>;
    async fn device_name(&mut self) -> Result<String>;
    async fn close(&mut self) -> Result<()>;
}

/// Opens sessions. Nothing touches the network until the session is used.
pub trait Connector {
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn PlugSession>>;
}
