pub mod action_executor;
pub mod backend;
pub mod config;
pub mod contract;
pub mod controller;
pub mod debounce;
pub mod dispatcher;
pub mod hotkey;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod overlay_state;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod stream;
pub mod transport;
