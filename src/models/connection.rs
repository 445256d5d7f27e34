// Open socket records

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Owner name used when the process lookup fails or no owner is known.
pub const UNKNOWN_PROCESS: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SocketState {
    Listen,
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Closing,
    /// Connectionless socket without a peer (unconnected UDP).
    None,
    Unknown,
}

impl SocketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listen => "LISTEN",
            Self::Established => "ESTABLISHED",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::FinWait1 => "FIN_WAIT1",
            Self::FinWait2 => "FIN_WAIT2",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Closing => "CLOSING",
            Self::None => "NONE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enumerated socket. Re-read every tick; carries no identity across ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub local_address: SocketAddr,
    /// Absent for listeners and sockets without a peer.
    pub remote_address: Option<SocketAddr>,
    pub protocol: Protocol,
    pub state: SocketState,
    pub owner_pid: Option<i32>,
    /// Filled in only for connections that make it into a snapshot.
    pub owner_process_name: Option<String>,
}
