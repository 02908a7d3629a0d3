//! Keyboard control of a running session
//!
//! Key presses are turned into [`UserCommand`]s and sent to the session. The
//! handler owns the terminal's raw mode for as long as it runs.

use crate::{
    error::{Error, Result},
    session::UserCommand,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Seconds moved by the arrow keys
pub const SEEK_STEP_SECS: f64 = 10.0;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Command(UserCommand),
    Help,
}

/// Maps a key press to the action it triggers
pub fn action_for_key(key_event: KeyEvent) -> Option<KeyAction> {
    // Only presses, not releases or repeats
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let command = match key_event.code {
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => UserCommand::TogglePlay,
        KeyCode::Left => UserCommand::SeekBy(-SEEK_STEP_SECS),
        KeyCode::Right => UserCommand::SeekBy(SEEK_STEP_SECS),
        KeyCode::Enter => UserCommand::Interact,
        KeyCode::Char('s') | KeyCode::Char('S') => UserCommand::RequestSync,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => UserCommand::Quit,
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => return Some(KeyAction::Help),
        _ => return None,
    };
    Some(KeyAction::Command(command))
}

/// Reads the terminal and forwards commands to a session
pub struct KeyboardHandler {
    commands: UnboundedSender<UserCommand>,
    active: bool,
}

impl KeyboardHandler {
    pub fn new(commands: UnboundedSender<UserCommand>) -> Self {
        Self {
            commands,
            active: false,
        }
    }

    /// Runs until quit is pressed or the session goes away.
    ///
    /// Blocks the calling thread; run it with `spawn_blocking`.
    pub fn start(&mut self) -> Result<()> {
        info!("Press SPACE to toggle play/pause, ←/→ to seek, ENTER to join playback, 'q' to quit");

        enable_raw_mode().map_err(|e| Error::KeyboardError {
            message: format!("Failed to enable raw mode: {e}"),
        })?;
        self.active = true;

        let result = self.event_loop();

        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {e}");
        }
        self.active = false;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        while self.active && !self.commands.is_closed() {
            match self.read_event() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => warn!("Error reading keyboard event: {e}"),
            }
        }
        Ok(())
    }

    /// Returns `Ok(false)` once the loop should end
    fn read_event(&self) -> Result<bool> {
        let ready = event::poll(POLL_INTERVAL).map_err(|e| Error::KeyboardError {
            message: format!("Failed to poll for events: {e}"),
        })?;
        if !ready {
            return Ok(true);
        }

        match event::read().map_err(|e| Error::KeyboardError {
            message: format!("Failed to read event: {e}"),
        })? {
            Event::Key(key_event) => Ok(self.handle_key_event(key_event)),
            Event::Resize(_, _) => {
                debug!("Terminal resized");
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn handle_key_event(&self, key_event: KeyEvent) -> bool {
        match action_for_key(key_event) {
            Some(KeyAction::Help) => {
                show_help();
                true
            }
            Some(KeyAction::Command(command)) => {
                let quit = command == UserCommand::Quit;
                debug!("Key {:?} -> {command:?}", key_event.code);
                self.commands.send(command).is_ok() && !quit
            }
            None => {
                debug!("Unhandled key: {:?}", key_event.code);
                true
            }
        }
    }
}

impl Drop for KeyboardHandler {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = disable_raw_mode() {
                eprintln!("Failed to disable raw mode in drop: {e}");
            }
        }
    }
}

fn show_help() {
    // Raw mode needs explicit carriage returns
    print!("\r\n=== Keyboard Controls ===\r\n");
    print!("SPACE / P  : Toggle play/pause\r\n");
    print!("← / →      : Seek -/+ {SEEK_STEP_SECS:.0}s\r\n");
    print!("ENTER      : Join playback\r\n");
    print!("S          : Resynchronize with the room\r\n");
    print!("Q / ESC    : Quit\r\n");
    print!("H / ?      : Show this help\r\n");
    print!("========================\r\n");
}
