//! One room connection
//!
//! A [`Session`] owns the transport, the stream resolver and the sync engine of
//! a single room and routes everything between them from one task: inbound room
//! messages, media surface signals, user commands and the interaction poll.

use crate::{
    config::{Config, MISSING_URL_MSG, USER_AGENT},
    engine::{EngineConfig, IntentPort, PlaybackState, SuppressionFlag, SyncEngine},
    error::{Error, Result},
    media::{MediaElement, MediaEventSink, ObservedMediaEvent},
    observer::{SessionObserver, ToastLevel},
    protocol::{ActiveSource, Inbound, Outbound, PlaybackSnapshot, VideoChanged},
    resolver::{
        HttpProbe, HttpStreamClientFactory, ProxyEndpoint, ResolverConfig, StreamResolver,
    },
    transport::{Transport, TransportConfig},
};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

/// What a local user can ask of the session
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    TogglePlay,
    /// Relative seek in seconds
    SeekBy(f64),
    /// The gesture that unblocks playback
    Interact,
    ChangeVideo(VideoRequest),
    RequestSync,
    Quit,
}

/// A user-initiated source change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoRequest {
    pub url: String,
    pub title: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub subtitle_url: Option<String>,
}

impl VideoRequest {
    /// The `video_change` message, `None` without a URL
    fn into_message(self) -> Option<Outbound> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Outbound::VideoChange {
            url: url.to_string(),
            title: self.title.unwrap_or_default(),
            user_agent: self.user_agent.unwrap_or_default(),
            referer: self.referer.unwrap_or_default(),
            subtitle_url: self.subtitle_url.unwrap_or_default(),
        })
    }
}

/// A source the session should move to, with the snapshot to apply once loaded
type LoadRequest = (ActiveSource, Option<PlaybackSnapshot>);

/// Transport, resolver and engine of one room
pub struct Session<M> {
    config: Config,
    endpoint: String,
    transport: Transport,
    intents: Arc<dyn IntentPort>,
    engine: SyncEngine<M>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    media_events: mpsc::UnboundedReceiver<ObservedMediaEvent>,
    observer: Arc<dyn SessionObserver>,
}

impl<M: MediaElement> Session<M> {
    /// Builds a session whose media surface is created by `build_media`
    pub fn new<F>(config: Config, observer: Arc<dyn SessionObserver>, build_media: F) -> Result<Self>
    where
        F: FnOnce(MediaEventSink) -> M,
    {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| Error::HttpClientBuildFailed { source })?;
        let resolver = StreamResolver::new(
            ResolverConfig::from(&config),
            ProxyEndpoint::new(&config.server_url)?,
            Arc::new(HttpProbe::new(client.clone(), config.probe_timeout())),
            Arc::new(HttpStreamClientFactory::new(client)),
            observer.clone(),
        );
        Ok(Self::with_resolver(config, observer, resolver, build_media))
    }

    /// Builds a session around an already configured resolver
    pub fn with_resolver<F>(
        config: Config,
        observer: Arc<dyn SessionObserver>,
        resolver: StreamResolver,
        build_media: F,
    ) -> Self
    where
        F: FnOnce(MediaEventSink) -> M,
    {
        let suppression = SuppressionFlag::new();
        let (sink, media_events) = MediaEventSink::channel(suppression.clone());
        let media = build_media(sink);

        let transport = Transport::new(TransportConfig::from(&config), observer.clone());
        let intents: Arc<dyn IntentPort> = Arc::new(transport.clone());
        let engine = SyncEngine::new(
            media,
            resolver,
            intents.clone(),
            suppression,
            observer.clone(),
            EngineConfig::from(&config),
        );

        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        for &message_type in Inbound::TYPES {
            let tx = inbound_tx.clone();
            transport.on_message(message_type, move |value| {
                match Inbound::decode(message_type, value) {
                    Ok(Some(message)) => {
                        let _ = tx.send(message);
                    }
                    Ok(None) => {}
                    Err(err) => warn!("{err}"),
                }
            });
        }

        transport.set_greeting(Outbound::Join {
            username: config.effective_username(),
            avatar: config.avatar.clone(),
        });
        let clock = engine.clock();
        transport.set_heartbeat_data_provider(move || clock.borrow().heartbeat_payload());

        Self {
            endpoint: config.room_endpoint(),
            config,
            transport,
            intents,
            engine,
            inbound,
            media_events,
            observer,
        }
    }

    pub fn engine(&self) -> &SyncEngine<M> {
        &self.engine
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Joins the room and runs until `Quit`, the command channel closes, or
    /// reconnection gives up
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<UserCommand>) -> Result<()> {
        info!(
            "Joining room '{}' as {}",
            self.config.room_id,
            self.config.effective_username()
        );
        self.transport.connect(&self.endpoint).await?;
        let result = self.drive(&mut commands).await;
        self.engine.shutdown();
        self.transport.disconnect();
        result
    }

    /// Dispatches every session input until quit or a transport failure
    async fn drive(&mut self, commands: &mut mpsc::UnboundedReceiver<UserCommand>) -> Result<()> {
        let mut poll = interval(self.config.interaction_poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let transport = self.transport.clone();
        let endpoint = self.endpoint.clone();
        let failed = transport.failed(&endpoint);
        tokio::pin!(failed);

        loop {
            let waiting = self.engine.state() == PlaybackState::WaitingInteraction;
            tokio::select! {
                error = &mut failed => return Err(error),
                Some(message) = self.inbound.recv() => self.handle_inbound(message).await,
                Some(event) = self.media_events.recv() => self.engine.on_media_event(event).await,
                command = commands.recv() => match command {
                    Some(UserCommand::Quit) | None => return Ok(()),
                    Some(command) => self.handle_command(command).await,
                },
                _ = poll.tick(), if waiting => {
                    debug!("Polling room state while waiting for interaction");
                    self.intents.request_sync();
                }
            }
        }
    }

    /// Asks the room to switch source; an empty URL is refused locally
    pub fn change_video(&self, request: VideoRequest) -> bool {
        match request.into_message() {
            Some(message) => self.transport.send(&message),
            None => {
                self.observer.toast(ToastLevel::Warning, MISSING_URL_MSG);
                false
            }
        }
    }

    async fn handle_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::TogglePlay => self.engine.user_toggle_play().await,
            UserCommand::SeekBy(delta) => self.engine.user_seek(delta).await,
            UserCommand::Interact => self.engine.user_interact().await,
            UserCommand::ChangeVideo(request) => {
                self.change_video(request);
            }
            UserCommand::RequestSync => self.intents.request_sync(),
            UserCommand::Quit => {}
        }
    }

    async fn handle_inbound(&mut self, message: Inbound) {
        match message {
            Inbound::RoomState(state) => {
                self.observer.roster_changed(&state.users);
                let snapshot = state.snapshot();
                match state.source() {
                    Some(source) if self.engine.needs_load(&source) => {
                        self.load((source, Some(snapshot))).await;
                    }
                    Some(_) => self.engine.apply_snapshot(snapshot).await,
                    None => debug!("Room has no video yet"),
                }
                if let Some(history) = &state.chat_messages {
                    self.observer.chat_history(history);
                }
            }
            Inbound::Sync(sync) => self.engine.handle_sync(&sync).await,
            Inbound::SyncCorrection(correction) => {
                self.engine.handle_sync_correction(&correction).await
            }
            Inbound::Seek(seek) => self.engine.handle_seek(&seek).await,
            Inbound::VideoChanged(changed) => {
                announce_change(self.observer.as_ref(), &changed);
                match changed.source() {
                    Some(source) if self.engine.needs_load(&source) => {
                        self.load((source, None)).await
                    }
                    Some(source) => debug!("{} is already loaded", source.url),
                    None => warn!("Ignoring video change without URL"),
                }
            }
            other => {
                relay(self.observer.as_ref(), &other);
            }
        }
    }

    /// Loads a source while still listening to the room.
    ///
    /// A source change for another URL cancels the running load and starts over;
    /// a snapshot for the same URL replaces the one to apply afterwards.
    async fn load(&mut self, request: LoadRequest) {
        let mut next = Some(request);
        while let Some((source, mut snapshot)) = next.take() {
            self.engine.begin_load(source.clone()).await;

            let outcome = {
                let load = self.engine.run_load();
                tokio::pin!(load);
                loop {
                    tokio::select! {
                        loaded = &mut load => break Ok(loaded),
                        Some(message) = self.inbound.recv() => {
                            if let Some(replacement) = triage_during_load(
                                self.observer.as_ref(),
                                &source,
                                message,
                                &mut snapshot,
                            ) {
                                break Err(replacement);
                            }
                        }
                    }
                }
            };

            // Signals raised while loading carry no intent
            while self.media_events.try_recv().is_ok() {}

            match outcome {
                Ok(true) => {
                    if let Some(snapshot) = snapshot {
                        self.engine.apply_snapshot(snapshot).await;
                    }
                }
                Ok(false) => debug!("Load of {} failed", source.url),
                Err(replacement) => {
                    info!("Source changed while loading, switching to {}", replacement.0.url);
                    self.engine.abandon_load().await;
                    next = Some(replacement);
                }
            }
        }
    }
}

fn announce_change(observer: &dyn SessionObserver, changed: &VideoChanged) {
    if let Some(changed_by) = &changed.changed_by {
        observer.toast(ToastLevel::Info, &format!("{changed_by} loaded a new video"));
    }
}

/// Hands roster, chat and server errors to the observer; false for anything else
fn relay(observer: &dyn SessionObserver, message: &Inbound) -> bool {
    match message {
        Inbound::UserJoined(change) | Inbound::UserLeft(change) => {
            observer.roster_changed(&change.users)
        }
        Inbound::Chat(chat) => observer.chat_received(chat),
        Inbound::Error(error) => observer.toast(ToastLevel::Error, &error.message),
        _ => return false,
    }
    true
}

/// Decides what a message means for a running load of `loading`.
///
/// Returns the request that supersedes the load, if any.
fn triage_during_load(
    observer: &dyn SessionObserver,
    loading: &ActiveSource,
    message: Inbound,
    snapshot: &mut Option<PlaybackSnapshot>,
) -> Option<LoadRequest> {
    match message {
        Inbound::RoomState(state) => {
            observer.roster_changed(&state.users);
            match state.source() {
                Some(source) if source.url != loading.url => {
                    return Some((source, Some(state.snapshot())));
                }
                Some(_) => *snapshot = Some(state.snapshot()),
                None => debug!("Ignoring empty room state while loading"),
            }
        }
        Inbound::VideoChanged(changed) => {
            announce_change(observer, &changed);
            match changed.source() {
                Some(source) if source.url != loading.url => return Some((source, None)),
                _ => debug!("Already loading {}", loading.url),
            }
        }
        other => {
            if !relay(observer, &other) {
                debug!("Dropping peer event while loading");
            }
        }
    }
    None
}
