// Socket enumeration from /proc/net/{tcp,tcp6,udp,udp6} with owner PIDs via /proc/<pid>/fd.

use std::collections::HashMap;
use std::net::SocketAddr;

use procfs::net::{TcpState, UdpState};
use procfs::process::{FDTarget, all_processes};
use tracing::debug;

use crate::error::SourceError;
use crate::models::{ConnectionRecord, Protocol, SocketState};

pub(super) fn map_tcp_state(state: &TcpState) -> SocketState {
    match state {
        TcpState::Established => SocketState::Established,
        TcpState::SynSent => SocketState::SynSent,
        TcpState::SynRecv => SocketState::SynRecv,
        TcpState::FinWait1 => SocketState::FinWait1,
        TcpState::FinWait2 => SocketState::FinWait2,
        TcpState::TimeWait => SocketState::TimeWait,
        TcpState::Close => SocketState::Close,
        TcpState::CloseWait => SocketState::CloseWait,
        TcpState::LastAck => SocketState::LastAck,
        TcpState::Listen => SocketState::Listen,
        TcpState::Closing => SocketState::Closing,
        #[allow(unreachable_patterns)]
        _ => SocketState::Unknown,
    }
}

/// Connected UDP sockets report ESTABLISHED; anything else has no peer.
pub(super) fn map_udp_state(state: &UdpState) -> SocketState {
    match state {
        UdpState::Established => SocketState::Established,
        _ => SocketState::None,
    }
}

/// Peer address, or None for the all-zero wildcard the kernel reports for unconnected sockets.
pub(super) fn remote_or_none(addr: SocketAddr) -> Option<SocketAddr> {
    if addr.ip().is_unspecified() && addr.port() == 0 {
        None
    } else {
        Some(addr)
    }
}

/// Socket inode -> owning PID, built by scanning every readable /proc/<pid>/fd.
///
/// Processes that vanish mid-scan or whose fds are not readable are skipped.
fn socket_owners() -> HashMap<u64, i32> {
    let mut owners = HashMap::new();
    let processes = match all_processes() {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, operation = "all_processes", "process scan unavailable");
            return owners;
        }
    };
    for process in processes.flatten() {
        let pid = process.pid();
        let Ok(fds) = process.fd() else { continue };
        for fd in fds.flatten() {
            if let FDTarget::Socket(inode) = fd.target {
                owners.entry(inode).or_insert(pid);
            }
        }
    }
    owners
}

struct RawSocket {
    local: SocketAddr,
    remote: SocketAddr,
    state: SocketState,
    inode: u64,
    protocol: Protocol,
}

/// Enumerates TCP/UDP sockets over IPv4 and IPv6 in kernel table order.
///
/// A table that cannot be read is skipped; the call fails only if none could be read.
pub(super) fn read_connections() -> Result<Vec<ConnectionRecord>, SourceError> {
    let mut raw: Vec<RawSocket> = Vec::new();
    let mut last_error = None;
    let mut tables_read = 0usize;

    let tcp_tables: [(&'static str, fn() -> procfs::ProcResult<Vec<procfs::net::TcpNetEntry>>); 2] =
        [("tcp", procfs::net::tcp), ("tcp6", procfs::net::tcp6)];
    for (table, read) in tcp_tables {
        match read() {
            Ok(entries) => {
                tables_read += 1;
                raw.extend(entries.into_iter().map(|e| RawSocket {
                    local: e.local_address,
                    remote: e.remote_address,
                    state: map_tcp_state(&e.state),
                    inode: e.inode,
                    protocol: Protocol::Tcp,
                }));
            }
            Err(source) => {
                debug!(error = %source, table, "socket table unavailable");
                last_error = Some(SourceError::Proc { table, source });
            }
        }
    }

    let udp_tables: [(&'static str, fn() -> procfs::ProcResult<Vec<procfs::net::UdpNetEntry>>); 2] =
        [("udp", procfs::net::udp), ("udp6", procfs::net::udp6)];
    for (table, read) in udp_tables {
        match read() {
            Ok(entries) => {
                tables_read += 1;
                raw.extend(entries.into_iter().map(|e| RawSocket {
                    local: e.local_address,
                    remote: e.remote_address,
                    state: map_udp_state(&e.state),
                    inode: e.inode,
                    protocol: Protocol::Udp,
                }));
            }
            Err(source) => {
                debug!(error = %source, table, "socket table unavailable");
                last_error = Some(SourceError::Proc { table, source });
            }
        }
    }

    if tables_read == 0
        && let Some(e) = last_error
    {
        return Err(e);
    }

    let owners = socket_owners();
    Ok(raw
        .into_iter()
        .map(|s| ConnectionRecord {
            local_address: s.local,
            remote_address: remote_or_none(s.remote),
            protocol: s.protocol,
            state: s.state,
            owner_pid: owners.get(&s.inode).copied(),
            owner_process_name: None,
        })
        .collect())
}

/// Process name for `pid`, None if the process is gone or unreadable.
pub(super) fn process_name(pid: i32) -> Option<String> {
    let process = procfs::process::Process::new(pid).ok()?;
    let stat = process.stat().ok()?;
    Some(stat.comm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_or_none_hides_wildcard_peer() {
        assert_eq!(remote_or_none("0.0.0.0:0".parse().unwrap()), None);
        assert_eq!(remote_or_none("[::]:0".parse().unwrap()), None);
        let peer: SocketAddr = "93.184.216.34:443".parse().unwrap();
        assert_eq!(remote_or_none(peer), Some(peer));
    }

    #[test]
    fn tcp_states_map_to_socket_states() {
        assert_eq!(map_tcp_state(&TcpState::Listen), SocketState::Listen);
        assert_eq!(map_tcp_state(&TcpState::Established), SocketState::Established);
        assert_eq!(map_tcp_state(&TcpState::TimeWait), SocketState::TimeWait);
    }

    #[test]
    fn unconnected_udp_has_no_state() {
        assert_eq!(map_udp_state(&UdpState::Close), SocketState::None);
        assert_eq!(map_udp_state(&UdpState::Established), SocketState::Established);
    }
}
