//! Join command implementation for crab-party
//!
//! Connects to a room and follows it with either a DLNA renderer or the
//! built-in virtual player, optionally under keyboard control.

use crate::{
    config::AUTOLOAD_DELAY_MS,
    devices::{Render, RenderSpec},
    error::Result,
    keyboard::KeyboardHandler,
    media::{DlnaSurface, MediaElement, VirtualPlayer},
    observer::LogObserver,
    session::{Session, UserCommand, VideoRequest},
};
use log::{info, warn};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::{self, UnboundedSender};

/// Join command implementation
pub struct JoinCommand<'a> {
    args: &'a super::super::Join,
}

impl<'a> JoinCommand<'a> {
    pub fn new(args: &'a super::super::Join) -> Self {
        Self { args }
    }

    pub async fn run(&self, cli: &super::super::Cli) -> Result<()> {
        let config = self.args.build_config(cli.log_level);
        match self.args.render_spec(cli.timeout) {
            Some(spec) => {
                let render = select_render(spec).await?;
                info!("Playing on {render}");
                let session = Session::new(config, Arc::new(LogObserver), move |sink| {
                    DlnaSurface::new(render, sink)
                })?;
                self.follow(session).await
            }
            None => {
                info!("Playing on the virtual player");
                let autoplay_blocked = self.args.autoplay_blocked;
                let session = Session::new(config, Arc::new(LogObserver), move |sink| {
                    VirtualPlayer::new(sink).with_autoplay_blocked(autoplay_blocked)
                })?;
                self.follow(session).await
            }
        }
    }

    /// Runs the session with every command source wired up
    async fn follow<M: MediaElement>(&self, session: Session<M>) -> Result<()> {
        let (commands_tx, commands) = mpsc::unbounded_channel();

        let keyboard = self.args.interactive.then(|| {
            let tx = commands_tx.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = KeyboardHandler::new(tx).start() {
                    eprintln!("Interactive control error: {e}");
                }
            })
        });

        if let Some(request) = self.args.autoload() {
            spawn_autoload(commands_tx.clone(), request);
        }

        let quit = commands_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = quit.send(UserCommand::Quit);
            }
        });
        drop(commands_tx);

        let result = session.run(commands).await;
        if let Some(handle) = keyboard {
            // The handler exits on its own once the command channel is closed
            let _ = handle.await;
        }
        result
    }
}

async fn select_render(spec: RenderSpec) -> Result<Render> {
    info!("Selecting render");
    Render::new(spec).await
}

/// Announces `request` once the room had time to send its snapshot
fn spawn_autoload(commands: UnboundedSender<UserCommand>, request: VideoRequest) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(AUTOLOAD_DELAY_MS)).await;
        info!("Autoloading {}", request.url);
        if commands.send(UserCommand::ChangeVideo(request)).is_err() {
            warn!("Session ended before the video could be announced");
        }
    });
}
