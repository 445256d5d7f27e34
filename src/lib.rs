// Library for tests to access modules

pub mod composer;
pub mod config;
pub mod counter_source;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod probes;
pub mod rate;
pub mod version;
pub mod worker;
