// Typed failures for OS reads and slow probes

use std::time::Duration;

/// Failure reading local OS state (counters, interface metadata, socket tables).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("network counters unavailable: {0}")]
    Unavailable(String),
    #[error("no network interfaces reported by the OS")]
    NoInterfaces,
    #[error("{table}: {source}")]
    Proc {
        table: &'static str,
        #[source]
        source: procfs::ProcError,
    },
    #[error("counter source lock poisoned")]
    Poisoned,
}

/// Failure of a single slow probe. Converted into the field's sentinel by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("no default gateway")]
    NoGateway,
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited unsuccessfully")]
    CommandFailed { command: &'static str },
    #[error("unexpected output: {0}")]
    Parse(String),
    #[error("name resolution failed: {0}")]
    Resolve(#[source] std::io::Error),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lookup service answered with status {0:?}")]
    LookupStatus(String),
}
