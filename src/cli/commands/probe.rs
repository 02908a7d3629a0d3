//! Probe command implementation for crab-party
//!
//! Resolves a source the way a session would and prints what it found: the
//! detected format and, for adaptive streams, the parsed manifest.

use crate::{
    config::{Config, USER_AGENT},
    error::{Error, Result},
    observer::LogObserver,
    protocol::{ActiveSource, StreamHeaders},
    resolver::{
        HttpManifestClient, HttpProbe, HttpStreamClientFactory, Manifest, ProxyEndpoint,
        ResolverConfig, StreamClient, StreamEvent, StreamResolver,
    },
    utils::format_duration,
};
use log::info;
use std::sync::Arc;

/// Probe command implementation
pub struct ProbeCommand<'a> {
    args: &'a super::super::Probe,
}

impl<'a> ProbeCommand<'a> {
    pub fn new(args: &'a super::super::Probe) -> Self {
        Self { args }
    }

    pub async fn run(&self) -> Result<()> {
        let config = Config::new()
            .with_server_url(&self.args.server)
            .with_proxy_enabled(!self.args.no_proxy);
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| Error::HttpClientBuildFailed { source })?;
        let resolver = StreamResolver::new(
            ResolverConfig::from(&config),
            ProxyEndpoint::new(&config.server_url)?,
            Arc::new(HttpProbe::new(client.clone(), config.probe_timeout())),
            Arc::new(HttpStreamClientFactory::new(client.clone())),
            Arc::new(LogObserver),
        );

        let source = self.source();
        info!("Probing {}", source.url);
        let format = resolver.resolve_format(&source).await;
        println!("Format: {format} ({})", format.mime_type());
        if !source.headers.is_empty() {
            println!("Upstream headers: {:?}", source.headers);
        }

        if format.is_adaptive() {
            let mut manifest_client = HttpManifestClient::new(client, source.headers.clone(), None);
            manifest_client.load_source(&source.url).await;
            match manifest_client.next_event().await {
                Some(StreamEvent::ManifestParsed(manifest)) => print_manifest(&manifest),
                Some(StreamEvent::Error { details, .. }) => println!("Manifest unusable: {details}"),
                None => println!("Manifest unusable: nothing loaded"),
            }
        }
        Ok(())
    }

    fn source(&self) -> ActiveSource {
        ActiveSource {
            url: self.args.url.trim().to_string(),
            format: self.args.format.clone(),
            headers: StreamHeaders::normalize(
                self.args.user_agent.as_deref(),
                self.args.referer.as_deref(),
                None,
            ),
            ..Default::default()
        }
    }
}

fn print_manifest(manifest: &Manifest) {
    if let Some(target) = manifest.target_duration {
        println!("Target duration: {target}s");
    }
    for variant in &manifest.variants {
        println!(
            "Variant: {} bandwidth={} resolution={}",
            variant.uri,
            variant
                .bandwidth
                .map_or_else(|| "?".to_string(), |b| b.to_string()),
            variant.resolution.as_deref().unwrap_or("?"),
        );
    }
    if !manifest.segments.is_empty() {
        println!("Segments: {}", manifest.segments.len());
    }
    if let Some(duration) = manifest.total_duration() {
        println!("Duration: {}", format_duration(duration));
    }
}
