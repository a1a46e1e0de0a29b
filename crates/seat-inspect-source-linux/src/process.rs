//! Process liveness probing

use nix::errno::Errno;
use nix::sys::signal;
use nix::unistd::Pid;
use seat_inspect_api::Liveness;
use seat_inspect_source_api::ProcessProbe;
use tracing::debug;

/// Probe using `kill(pid, 0)`, which checks existence without signalling
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxProcessProbe;

impl LinuxProcessProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessProbe for LinuxProcessProbe {
    fn probe(&self, pid: u32) -> Liveness {
        // 0 would address our own process group; logind reports 0 for "no leader"
        let Ok(raw) = i32::try_from(pid) else {
            return Liveness::Unknown;
        };
        if raw <= 0 {
            return Liveness::Unknown;
        }

        match signal::kill(Pid::from_raw(raw), None) {
            Ok(()) => Liveness::Alive,
            // Exists, but owned by someone else
            Err(Errno::EPERM) => Liveness::Alive,
            Err(Errno::ESRCH) => Liveness::Dead,
            Err(e) => {
                debug!(pid = pid, error = %e, "Liveness probe inconclusive");
                Liveness::Unknown
            }
        }
    }
}
