//! Driver for Tapo P100-family plugs, backed by the `tapo` crate.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tapo::{ApiClient, PlugHandler};
use tokio::net::TcpStream;

use crate::config::DeviceConfig;

use super::{Connector, DeviceInfo, PlugSession};

// The local API is plain HTTP.
const HTTP_PORT: u16 = 80;

pub struct TapoConnector {
    timeout: Duration,
}

impl TapoConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Connector for TapoConnector {
    fn open(&self, config: &DeviceConfig) -> Result<Box<dyn PlugSession>> {
        Ok(Box::new(TapoPlug::new(config.clone(), self.timeout)))
    }
}

/// Represents one session with a Tapo plug.
/// Reference: https://github.com/mihai-dinculescu/tapo
pub struct TapoPlug {
    config: DeviceConfig,
    timeout: Duration,
    client: Option<ApiClient>,
    handler: Option<PlugHandler>,
    closed: bool,
}

impl TapoPlug {
    pub fn new(config: DeviceConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: None,
            handler: None,
            closed: false,
        }
    }

    async fn bounded<T, E, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| anyhow!("{} timed out after {:?}", what, self.timeout))?
            .with_context(|| format!("{} failed", what))
    }

    fn handler(&self) -> Result<&PlugHandler> {
        if self.closed {
            return Err(anyhow!("Session already closed"));
        }
        self.handler
            .as_ref()
            .ok_or(anyhow!("Session not logged in"))
    }
}

#[async_trait::async_trait]
impl PlugSession for TapoPlug {
    async fn handshake(&mut self) -> Result<()> {
        if self.closed {
            return Err(anyhow!("Session already closed"));
        }

        let address = self.config.address.clone();
        let stream = self
            .bounded(
                &format!("connecting to {}", address),
                TcpStream::connect((address.as_str(), HTTP_PORT)),
            )
            .await?;
        drop(stream);

        self.client = Some(ApiClient::new(
            self.config.account_email.clone(),
            self.config.account_password.clone(),
        ));

        Ok(())
    }

    async fn login(&mut self) -> Result<()> {
        if self.closed {
            return Err(anyhow!("Session already closed"));
        }

        let Some(client) = self.client.take() else {
            return Err(anyhow!("Handshake has not been performed"));
        };

        // The vendor library does its own key exchange and login here.
        let handler = self
            .bounded("login", client.p100(self.config.address.clone()))
            .await?;
        self.handler = Some(handler);

        Ok(())
    }

    async fn set_on_off(&mut self, state: bool) -> Result<()> {
        let handler = self.handler()?;
        if state {
            self.bounded("turning on", handler.on()).await
        } else {
            self.bounded("turning off", handler.off()).await
        }
    }

    async fn device_info(&mut self) -> Result<DeviceInfo> {
        let handler = self.handler()?;
        let info = self
            .bounded("reading device info", handler.get_device_info())
            .await?;

        Ok(DeviceInfo {
            nickname: info.nickname,
            model: info.model,
            device_on: info.device_on,
        })
    }

    async fn device_name(&mut self) -> Result<String> {
        Ok(self.device_info().await?.nickname)
    }

    async fn close(&mut self) -> Result<()> {
        // The local API has no logout; dropping the handler forgets the session key.
        self.client = None;
        self.handler = None;
        self.closed = true;
        Ok(())
    }
}
