//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with four states (Idle, Recording, Playing,
//! Paused) and a context menu for opening the macro folder and exiting.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Edge length of the generated icons in pixels.
pub(crate) const ICON_SIZE: u32 = 32;

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    state: TrayIconState,
    open_folder_item_id: MenuId,
    exit_item_id: MenuId,
}

impl TrayManager {
    /// Create a new tray manager in the Idle state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let open_folder_item = MenuItem::new("Open Macros Folder", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let open_folder_id = open_folder_item.id().clone();
        let exit_id = exit_item.id().clone();

        menu.append(&open_folder_item)
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to add open folder menu: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        menu.append(&exit_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add exit menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let state = TrayIconState::Idle;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(state.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(Self::load_icon(state)?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            state,
            open_folder_item_id: open_folder_id,
            exit_item_id: exit_id,
        })
    }

    /// Update the tray icon state with new icon and tooltip.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        if state == self.state {
            return Ok(());
        }

        self.tray_icon
            .set_icon(Some(Self::load_icon(state)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.state = state;

        Ok(())
    }

    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let rgba = render_icon(state);
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Get the "Open Macros Folder" menu item ID.
    pub fn open_folder_item_id(&self) -> &MenuId {
        &self.open_folder_item_id
    }

    /// Get the exit menu item ID.
    pub fn exit_item_id(&self) -> &MenuId {
        &self.exit_item_id
    }
}

/// Draw the icon for `state`: a filled disc in the state colour on a
/// transparent background.
pub(crate) fn render_icon(state: TrayIconState) -> RgbaImage {
    let fill = Rgba(state.color());
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 1.0;

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if dx.hypot(dy) <= radius {
            fill
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
