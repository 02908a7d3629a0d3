//! AVTransport actions sent to a renderer
//!
//! Every mutating action is retried with backoff before it is reported as failed.

use crate::{
    config::{
        DLNA_ACTION_PAUSE, DLNA_ACTION_PLAY, DLNA_ACTION_SEEK, DLNA_ACTION_SET_AV_TRANSPORT_URI,
        DLNA_DEFAULT_SPEED, DLNA_INSTANCE_ID,
    },
    devices::Render,
    error::Result,
    utils::{format_dlna_time, retry_with_backoff},
};
use log::{debug, info};

/// Payload of actions that only address the transport instance
pub(crate) fn instance_payload() -> String {
    format!("<InstanceID>{DLNA_INSTANCE_ID}</InstanceID>")
}

fn play_payload(speed: u32) -> String {
    format!("<InstanceID>{DLNA_INSTANCE_ID}</InstanceID><Speed>{speed}</Speed>")
}

fn seek_payload(seconds: f64) -> String {
    format!(
        "<InstanceID>{DLNA_INSTANCE_ID}</InstanceID><Unit>REL_TIME</Unit><Target>{}</Target>",
        format_dlna_time(seconds)
    )
}

async fn send(render: &Render, action: &str, payload: &str) -> Result<()> {
    retry_with_backoff(|| render.action(action, payload), action).await?;
    Ok(())
}

/// Points the renderer at `payload`'s URI; built by [`super::metadata`]
pub async fn set_transport_uri(render: &Render, payload: &str) -> Result<()> {
    debug!("SetAVTransportURI payload: '{payload}'");
    send(render, DLNA_ACTION_SET_AV_TRANSPORT_URI, payload).await
}

/// Starts or resumes playback at normal speed
pub async fn play(render: &Render) -> Result<()> {
    send(render, DLNA_ACTION_PLAY, &play_payload(DLNA_DEFAULT_SPEED)).await?;
    info!("Renderer playing");
    Ok(())
}

pub async fn pause(render: &Render) -> Result<()> {
    send(render, DLNA_ACTION_PAUSE, &instance_payload()).await?;
    info!("Renderer paused");
    Ok(())
}

/// Seeks to `seconds`; renderers only take whole seconds
pub async fn seek(render: &Render, seconds: f64) -> Result<()> {
    send(render, DLNA_ACTION_SEEK, &seek_payload(seconds)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payloads() {
        assert_eq!(instance_payload(), "<InstanceID>0</InstanceID>");
        assert_eq!(
            play_payload(1),
            "<InstanceID>0</InstanceID><Speed>1</Speed>"
        );
        assert_eq!(
            seek_payload(3725.4),
            "<InstanceID>0</InstanceID><Unit>REL_TIME</Unit><Target>01:02:05</Target>"
        );
    }
}
