//! Auto-Macro: record and replay mouse and keyboard macros from the tray.

mod app;
mod app_command;
mod config;
mod error;
mod hotkey_handler;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use auto_macro_core::{
    DesktopNotifier, MacroStore, Notifier, SessionController, SilentNotifier,
};
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "auto_macro=debug,auto_macro_core=debug";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Dropping the manager unregisters the hotkeys, so it lives in the closure.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config_path = match Config::config_path() {
                    Ok(p) => p,
                    Err(e) => {
                        error!("Failed to resolve config path: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let config = match Config::load_from(&config_path) {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let store = match config.macro_dir().and_then(|dir| Ok(MacroStore::open(dir)?)) {
                    Ok(s) => s,
                    Err(e) => {
                        error!("Failed to open macro store: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let notifications = config.notifications.enabled;
                let session = Arc::new(SessionController::desktop(
                    store,
                    config.session_settings(),
                    notifications,
                ));
                let notifier: Arc<dyn Notifier> = if notifications {
                    Arc::new(DesktopNotifier)
                } else {
                    Arc::new(SilentNotifier)
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let config = Arc::new(Mutex::new(config));
                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register hotkeys on the main thread: tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                let (manager, bindings) = match HotkeyHandler::register_hotkeys() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkeys: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                // App reports tray changes on a plain channel; forward them
                // into the event loop.
                let (tray_tx, tray_rx) = std::sync::mpsc::channel::<TrayCommand>();
                let tray_proxy = tray_proxy.clone();
                std::thread::spawn(move || {
                    while let Ok(cmd) = tray_rx.recv() {
                        if tray_proxy.send_event(cmd).is_err() {
                            break;
                        }
                    }
                });

                let open_folder_menu_id = tray_manager.open_folder_item_id().clone();
                let exit_menu_id = tray_manager.exit_item_id().clone();

                // Tokio runtime on its own thread. TrayManager and
                // hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(bindings, command_tx.clone());

                        let app = App {
                            session,
                            notifier,
                            tray_tx,
                            config,
                            config_path,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            open_folder_menu_id,
                            exit_menu_id,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        let _ = &hotkey_manager;
    });
}
