//! DLNA renderer handle
//!
//! A [`Render`] pairs a UPnP device with its AVTransport service and exposes
//! the queries the DLNA media surface polls.

use crate::{
    config::{
        DLNA_ACTION_GET_POSITION_INFO, DLNA_ACTION_GET_TRANSPORT_INFO, NO_DEVICES_DISCOVERED_MSG,
        RENDER_NOT_FOUND_MSG,
    },
    dlna::actions::instance_payload,
    error::{Error, Result},
    utils::{format_device_with_service_description, retry_with_backoff},
};
use http::Uri;
use log::{debug, info};
use std::collections::HashMap;

use super::types::{PositionInfo, RenderSpec, TransportInfo};

/// A DLNA device which is capable of AVTransport actions.
#[derive(Debug, Clone)]
pub struct Render {
    /// The UPnP device
    pub device: rupnp::Device,
    /// The AVTransport service
    pub service: rupnp::Service,
}

impl Render {
    /// Create a new render from render device specification.
    pub async fn new(render_spec: RenderSpec) -> Result<Self> {
        let found = match &render_spec {
            RenderSpec::Location(device_url) => {
                info!("Render specified by location: {device_url}");
                Self::select_by_url(device_url).await?
            }
            RenderSpec::Query(timeout, device_query) => {
                info!("Render specified by query: {device_query}");
                Self::select_by_query(*timeout, device_query).await?
            }
            RenderSpec::First(timeout) => {
                info!("{RENDER_NOT_FOUND_MSG}");
                Self::discover(*timeout).await?.into_iter().next()
            }
        };

        found.ok_or_else(|| {
            let context = match &render_spec {
                RenderSpec::Location(_) => "Device not found at specified URL".to_string(),
                RenderSpec::Query(_, query) => format!("No device found matching query '{query}'"),
                RenderSpec::First(_) => NO_DEVICES_DISCOVERED_MSG.to_string(),
            };
            Error::RenderNotFound {
                spec: render_spec.clone(),
                context,
            }
        })
    }

    /// Returns the host of the render
    pub fn host(&self) -> String {
        self.device
            .url()
            .host()
            .map(str::to_string)
            .unwrap_or_default()
    }

    async fn select_by_url(url: &str) -> Result<Option<Self>> {
        debug!("Selecting device by url: {url}");
        let uri: Uri = url.parse().map_err(|e| Error::DeviceUrlParseError {
            url: url.to_owned(),
            reason: format!("Invalid URL format: {e}"),
        })?;

        let device = retry_with_backoff(
            || async { rupnp::Device::from_url(uri.clone()).await },
            &format!("Device creation from URL {url}"),
        )
        .await
        .map_err(|err| Error::DeviceCreationError {
            url: url.to_owned(),
            source: err,
        })?;

        Ok(Self::from_device(device).await)
    }

    /// Sends an AVTransport action and returns the raw response arguments
    pub async fn action(&self, action: &str, payload: &str) -> Result<HashMap<String, String>> {
        self.service
            .action(self.device.url(), action, payload)
            .await
            .map_err(|err| Error::DlnaActionFailed {
                action: action.to_string(),
                source: err,
            })
    }

    /// Gets current playback position information
    pub async fn get_position_info(&self) -> Result<PositionInfo> {
        let response = self
            .action(DLNA_ACTION_GET_POSITION_INFO, &instance_payload())
            .await?;

        PositionInfo::from_map(&response).map_err(|err| Error::DlnaResponseParseError {
            action: DLNA_ACTION_GET_POSITION_INFO.to_string(),
            error: err,
        })
    }

    /// Gets transport information (playing, paused, stopped)
    pub async fn get_transport_info(&self) -> Result<TransportInfo> {
        let response = self
            .action(DLNA_ACTION_GET_TRANSPORT_INFO, &instance_payload())
            .await?;

        TransportInfo::from_map(&response).map_err(|err| Error::DlnaResponseParseError {
            action: DLNA_ACTION_GET_TRANSPORT_INFO.to_string(),
            error: err,
        })
    }
}

impl std::fmt::Display for Render {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            format_device_with_service_description(
                &self.device.device_type().to_string(),
                &self.service.service_type().to_string(),
                self.device.friendly_name(),
                &self.device.url().to_string()
            )
        )
    }
}
