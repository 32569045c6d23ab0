use crate::{AppCommand, AppResult, TrayCommand, TrayIconState, config::Config};

use std::{path::PathBuf, sync::Arc, time::Duration};

use auto_macro_core::{
    CoreResult, MacroError, Notifier, SessionController, SessionState, notify_best_effort,
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::{MenuEvent, MenuId};
use uuid::Uuid;

/// How often the tray icon is reconciled with the session state.
///
/// Playback finishes on its own thread, so the icon cannot rely on command
/// handlers alone.
const TRAY_SYNC_INTERVAL: Duration = Duration::from_millis(200);

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray icon updates
/// back to the main thread via `tray_tx` because `TrayIcon` is `!Send`
/// and must remain on the UI thread.
pub struct App {
    pub(crate) session: Arc<SessionController>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) tray_tx: std::sync::mpsc::Sender<TrayCommand>,
    pub(crate) config: Arc<Mutex<Config>>,
    pub(crate) config_path: PathBuf,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) open_folder_menu_id: MenuId,
    pub(crate) exit_menu_id: MenuId,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Auto-Macro starting");

        // MenuEvent::receiver() is a blocking crossbeam receiver; one
        // blocking task forwards it and exits once tray_event_rx is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut shown = TrayIconState::Idle;
        let mut tray_sync = tokio::time::interval(TRAY_SYNC_INTERVAL);

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    if let Err(e) = self.handle_command(cmd).await {
                        error!(error = ?e, "Command failed");
                    }
                    self.sync_tray(&mut shown);
                }

                _ = tray_sync.tick() => {
                    self.sync_tray(&mut shown);
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        self.wind_down().await;

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        info!("Auto-Macro shut down successfully");

        Ok(())
    }

    /// Execute one non-shutdown command against the session.
    #[instrument(skip(self))]
    pub(crate) async fn handle_command(&self, command: AppCommand) -> AppResult<()> {
        match command {
            AppCommand::ToggleRecording { session_id } => self.toggle_recording(session_id).await,
            AppCommand::TogglePlayback { session_id } => self.toggle_playback(session_id).await,
            AppCommand::StopPlayback => self.stop_playback().await,
            AppCommand::Shutdown => Ok(()),
        }
    }

    async fn toggle_recording(&self, session_id: Uuid) -> AppResult<()> {
        match self.session.state() {
            SessionState::Idle => {
                let result = self.blocking(|session| session.record_start()).await;
                if let Err(e) = &result {
                    notify_best_effort(
                        self.notifier.as_ref(),
                        "Recording unavailable",
                        &e.to_string(),
                    );
                } else {
                    info!(session_id = %session_id, "Recording started");
                }
                result
            }
            SessionState::Recording => self.stop_and_save(session_id).await,
            state => {
                warn!(session_id = %session_id, state = ?state, "Cannot record during playback");
                Ok(())
            }
        }
    }

    /// Stop recording, strip the hotkey chords and persist the macro.
    async fn stop_and_save(&self, session_id: Uuid) -> AppResult<()> {
        let recorded = self
            .blocking(|session| {
                let mut recorded = session.record_stop()?;
                recorded.trim_leading_releases();
                recorded.trim_trailing_presses();
                if !recorded.is_empty() {
                    session.save_macro(&recorded)?;
                }
                Ok(recorded)
            })
            .await?;

        if recorded.is_empty() {
            info!(session_id = %session_id, "Recording was empty, nothing saved");
            notify_best_effort(self.notifier.as_ref(), "Nothing recorded", "No input was captured");
            return Ok(());
        }

        info!(
            session_id = %session_id,
            name = %recorded.name,
            event_count = recorded.len(),
            duration_ms = recorded.duration_ms(),
            "Macro saved"
        );

        {
            let mut cfg = self.config.lock().await;
            cfg.playback.last_macro = Some(recorded.name.clone());
            cfg.save_to(&self.config_path)?;
        }

        notify_best_effort(
            self.notifier.as_ref(),
            "Macro saved",
            &format!("{}: {} events", recorded.name, recorded.len()),
        );

        Ok(())
    }

    async fn toggle_playback(&self, session_id: Uuid) -> AppResult<()> {
        match self.session.state() {
            SessionState::Idle => {
                let last_macro = self.config.lock().await.playback.last_macro.clone();
                let Some(name) = last_macro else {
                    info!(session_id = %session_id, "No macro to play");
                    notify_best_effort(
                        self.notifier.as_ref(),
                        "Nothing to play",
                        "Record a macro with Ctrl+Shift+R first",
                    );
                    return Ok(());
                };

                let played = name.clone();
                let result = self
                    .blocking(move |session| session.play_default(&played))
                    .await;
                match &result {
                    Ok(()) => info!(session_id = %session_id, name = %name, "Playback started"),
                    Err(e) => notify_best_effort(
                        self.notifier.as_ref(),
                        "Playback failed",
                        &format!("{}: {}", name, e),
                    ),
                }
                result
            }
            SessionState::Playing => self.blocking(|session| session.pause()).await,
            SessionState::Paused => self.blocking(|session| session.resume()).await,
            SessionState::Recording => {
                warn!(session_id = %session_id, "Cannot play while recording");
                Ok(())
            }
        }
    }

    async fn stop_playback(&self) -> AppResult<()> {
        match self.session.state() {
            SessionState::Playing | SessionState::Paused => {
                self.blocking(|session| session.stop()).await
            }
            state => {
                debug!(state = ?state, "Nothing to stop");
                Ok(())
            }
        }
    }

    /// Leave the session idle before exit. An unfinished recording is
    /// discarded.
    async fn wind_down(&self) {
        let result = match self.session.state() {
            SessionState::Recording => {
                warn!("Discarding unfinished recording");
                self.blocking(|session| session.record_stop().map(|_| ())).await
            }
            SessionState::Playing | SessionState::Paused => {
                self.blocking(|session| session.stop()).await
            }
            SessionState::Idle => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = ?e, "Failed to idle the session before exit");
        }
    }

    /// Run a blocking session operation off the async runtime.
    async fn blocking<T, F>(&self, operation: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SessionController) -> CoreResult<T> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        let result: Result<T, MacroError> =
            tokio::task::spawn_blocking(move || operation(&session)).await?;
        Ok(result?)
    }

    /// Send the session state to the tray if it changed since last shown.
    /// An idle session whose last playback failed shows as failed.
    pub(crate) fn sync_tray(&self, shown: &mut TrayIconState) {
        let current = match self.session.state() {
            SessionState::Idle if self.session.last_failure().is_some() => TrayIconState::Failed,
            state => TrayIconState::from(state),
        };
        if current != *shown {
            *shown = current;
            let _ = self.tray_tx.send(TrayCommand::SetState(current));
        }
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;

        if *event_id == self.open_folder_menu_id {
            let dir = self.session.store().dir().to_path_buf();
            open::that(&dir)?;
            info!(macro_dir = ?dir, "Opened macros folder");
        } else if *event_id == self.exit_menu_id {
            info!("Exit requested from tray menu");
            let _ = self.tray_tx.send(TrayCommand::Shutdown);
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }

        Ok(())
    }
}
