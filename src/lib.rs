//! Client-side core of a chat application: session list, message thread,
//! optimistic sends and voice turns, driven against a remote chat API.

pub mod api;
pub mod audio;
pub mod config;
pub mod controller;
pub mod errors;
pub mod models;
pub mod normalizer;

pub use api::{ChatApi, HttpChatApi};
pub use audio::{AudioPlayer, FileAudioPlayer};
pub use config::AppConfig;
pub use controller::{ChatController, ControllerState, Notification, NotificationLevel};
pub use errors::ChatError;
