use std::sync::{Mutex, OnceLock};

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// Point-in-time host memory figures, in megabytes.
#[derive(Debug, Clone, Copy)]
pub struct MemorySnapshot {
    pub used_mb: u64,
    pub avail_mb: u64,
}

static SYS: OnceLock<Mutex<System>> = OnceLock::new();

pub fn memory_snapshot() -> MemorySnapshot {
    let lock = SYS.get_or_init(|| {
        Mutex::new(System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        ))
    });
    let mut sys = match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    sys.refresh_memory();
    // sysinfo reports bytes in v0.37
    let total_mb = sys.total_memory() / (1024 * 1024);
    let avail_mb = sys.available_memory() / (1024 * 1024);
    MemorySnapshot {
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}
