//! Renderer discovery over SSDP

use crate::{
    config::{SSDP_SEARCH_ATTEMPTS, SSDP_TTL},
    error::Result,
    utils::format_device_description,
};
use futures_util::stream::{Stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use rupnp::ssdp::{SearchTarget, URN};
use std::{collections::HashSet, time::Duration};

use super::render::Render;

/// UPnP service URN for AVTransport
pub const AV_TRANSPORT: URN = URN::service("schemas-upnp-org", "AVTransport", 1);

fn describe(device: &rupnp::Device) -> String {
    format_device_description(
        &device.device_type().to_string(),
        device.friendly_name(),
        &device.url().to_string(),
    )
}

impl Render {
    /// Discovers DLNA renderers with AVTransport on the network.
    pub async fn discover(duration_secs: u64) -> Result<Vec<Self>> {
        info!("Discovering devices in the network, waiting {duration_secs} seconds...");
        let search_target = SearchTarget::URN(AV_TRANSPORT);
        let devices = upnp_discover(
            &search_target,
            Duration::from_secs(duration_secs),
            SSDP_SEARCH_ATTEMPTS,
            SSDP_TTL,
        )
        .await?;
        let mut devices = std::pin::pin!(devices);

        let mut renders = Vec::new();
        let mut seen = HashSet::new();
        while let Some(result) = devices.next().await {
            match result {
                Ok(device) => {
                    if !seen.insert(device.url().to_string()) {
                        debug!("Skipping duplicate device: {}", describe(&device));
                        continue;
                    }
                    debug!("Found device: {}", describe(&device));
                    renders.extend(Self::from_device(device).await);
                }
                Err(e) => debug!("A device returned error while discovering it: {e}"),
            }
        }

        Ok(renders)
    }

    /// First renderer whose description contains `query`, ignoring case
    pub(super) async fn select_by_query(duration_secs: u64, query: &str) -> Result<Option<Self>> {
        debug!("Selecting device by query: '{query}'");
        let query = query.to_lowercase();
        Ok(Self::discover(duration_secs)
            .await?
            .into_iter()
            .find(|render| render.to_string().to_lowercase().contains(&query)))
    }

    /// Wraps a UPnP device when it carries an AVTransport service
    pub(super) async fn from_device(device: rupnp::Device) -> Option<Self> {
        match device.find_service(&AV_TRANSPORT).cloned() {
            Some(service) => Some(Self { device, service }),
            None => {
                warn!("No AVTransport service found on {}", device.friendly_name());
                None
            }
        }
    }
}

async fn upnp_discover(
    search_target: &SearchTarget,
    timeout: Duration,
    search_attempts: usize,
    ttl: Option<u32>,
) -> Result<impl Stream<Item = Result<rupnp::Device, rupnp::Error>>> {
    Ok(
        ssdp_client::search(search_target, timeout, search_attempts, ttl)
            .await?
            .map_err(rupnp::Error::SSDPError)
            .map(|res| Ok(res?.location().parse()?))
            .and_then(rupnp::Device::from_url),
    )
}
