#![forbid(unsafe_code)]

pub mod achievement_engine;
pub mod context;
pub mod error;
pub mod insights;
pub mod progress_store;
pub mod tracker_services;

pub use devmap_core::Clock;

pub use achievement_engine::AchievementEngine;
pub use context::{
    ProgressContext, Toast, ToastSeverity, ToggleBookmarkOutcome, ToggleDoneOutcome,
};
pub use error::TrackerInitError;
pub use insights::TopicProgress;
pub use progress_store::{DoneToggle, ProgressStore};
pub use tracker_services::{TrackerServices, load_catalog_file};
