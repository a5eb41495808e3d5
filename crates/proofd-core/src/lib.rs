pub mod api;
pub mod config;
pub mod error;
pub mod event;
pub mod position;
pub mod template;
pub mod time_format;
pub mod view;
