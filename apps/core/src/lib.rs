pub mod action_executor;
pub mod action_registry;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod frecency;
pub mod icon_cache;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod runtime;
pub mod search;
