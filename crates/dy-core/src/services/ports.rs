use std::collections::BTreeSet;

use crate::error::{PlatformError, Result};

/// Smallest port at or above `base` that is not in `used`.
pub fn next_available_port(used: &BTreeSet<u16>, base: u16) -> Result<u16> {
    let mut port = base;
    while used.contains(&port) {
        port = port.checked_add(1).ok_or_else(|| {
            PlatformError::PortAllocation(format!("every port from {base} upward is in use"))
        })?;
    }
    Ok(port)
}

/// Ports handed out during one session. The set only grows: a claimed port
/// stays claimed even after its container is gone.
pub struct PortAllocator {
    base: u16,
    used: BTreeSet<u16>,
}

impl PortAllocator {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            used: BTreeSet::new(),
        }
    }

    /// Peek at the port the next deployment would get. Does not claim it.
    pub fn next_available(&self) -> Result<u16> {
        next_available_port(&self.used, self.base)
    }

    pub fn claim(&mut self, port: u16) {
        self.used.insert(port);
    }

    pub fn is_used(&self, port: u16) -> bool {
        self.used.contains(&port)
    }

    /// Claimed ports in ascending order.
    pub fn used(&self) -> Vec<u16> {
        self.used.iter().copied().collect()
    }
}
