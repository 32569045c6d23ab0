#[allow(clippy::module_inception)]
mod config;
mod notifications_config;
mod playback_config;
mod recorder_config;
mod storage_config;

pub(crate) use {
    config::Config, notifications_config::NotificationsConfig, playback_config::PlaybackConfig,
    recorder_config::RecorderConfig, storage_config::StorageConfig,
};

use auto_macro_core::{player::DEFAULT_PLAYBACK_SPEED, recorder::DEFAULT_MIN_MOVE_DELTA};

pub(crate) const DEFAULT_NOTIFICATIONS_ENABLED: bool = true;

pub(crate) fn default_min_move_delta() -> f64 {
    DEFAULT_MIN_MOVE_DELTA
}

pub(crate) fn default_speed() -> f64 {
    DEFAULT_PLAYBACK_SPEED
}

pub(crate) fn default_notifications_enabled() -> bool {
    DEFAULT_NOTIFICATIONS_ENABLED
}
