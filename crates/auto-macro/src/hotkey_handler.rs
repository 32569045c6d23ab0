//! Global hotkey registration and dispatch.
//!
//! Registers three chords and turns their presses into [`AppCommand`]s:
//!
//! - `Ctrl+Shift+R` toggles recording
//! - `Ctrl+Shift+P` plays, pauses or resumes
//! - `Ctrl+Shift+X` stops playback

use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Ids of the registered hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBindings {
    /// Toggle recording.
    pub record: u32,
    /// Play, pause or resume.
    pub play: u32,
    /// Stop playback.
    pub stop: u32,
}

impl HotkeyBindings {
    /// The command a press of hotkey `id` should trigger.
    pub fn command_for(&self, id: u32) -> Option<AppCommand> {
        if id == self.record {
            Some(AppCommand::ToggleRecording {
                session_id: Uuid::new_v4(),
            })
        } else if id == self.play {
            Some(AppCommand::TogglePlayback {
                session_id: Uuid::new_v4(),
            })
        } else if id == self.stop {
            Some(AppCommand::StopPlayback)
        } else {
            None
        }
    }
}

/// Forwards hotkey presses to the application as commands.
pub struct HotkeyHandler {
    bindings: HotkeyBindings,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register the record, play and stop hotkeys.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkeys to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkeys() -> AppResult<(GlobalHotKeyManager, HotkeyBindings)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let chord = Some(Modifiers::CONTROL | Modifiers::SHIFT);
        let record = HotKey::new(chord, Code::KeyR);
        let play = HotKey::new(chord, Code::KeyP);
        let stop = HotKey::new(chord, Code::KeyX);

        for (hotkey, label) in [
            (record, "CTRL+SHIFT+R"),
            (play, "CTRL+SHIFT+P"),
            (stop, "CTRL+SHIFT+X"),
        ] {
            manager
                .register(hotkey)
                .map_err(|e| AppError::HotkeyRegistrationFailed {
                    reason: format!("Failed to register {}: {}", label, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            info!(hotkey = label, "Global hotkey registered");
        }

        let bindings = HotkeyBindings {
            record: record.id(),
            play: play.id(),
            stop: stop.id(),
        };

        Ok((manager, bindings))
    }

    /// Create a handler for previously registered hotkeys.
    ///
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(bindings: HotkeyBindings, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            bindings,
            command_tx,
        }
    }

    /// Run the hotkey handler event loop until a shutdown signal arrives.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a blocking crossbeam receiver, so
        // one blocking task forwards events. It exits on the first send after
        // event_rx is dropped.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if let Err(e) = self.handle_event(event).await {
                        warn!(error = ?e, "Failed to dispatch hotkey");
                    }
                }
            }
        }

        drop(event_rx);

        // The forwarder may be parked in recv() until the next hotkey event,
        // so do not wait for it indefinitely.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Dispatch one hotkey event. Releases and unknown ids are ignored.
    pub(crate) async fn handle_event(&self, event: GlobalHotKeyEvent) -> AppResult<()> {
        if event.state != HotKeyState::Pressed {
            return Ok(());
        }

        let Some(command) = self.bindings.command_for(event.id) else {
            return Ok(());
        };

        debug!(command = ?command, "Hotkey pressed");

        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send hotkey command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
