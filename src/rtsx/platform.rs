use core::time::Duration;

use crate::err::SdError;

/// Event a thread may block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitChannel {
    /// Transfer completion posted by the interrupt handler.
    Interrupt,
    /// Bus ownership released.
    HostBus,
}

/// Services the controller needs from the surrounding kernel.
pub trait Platform: Send + Sync {
    /// Busy-wait for `us` microseconds.
    fn delay_us(&self, us: u32);

    /// Monotonic time since boot.
    fn uptime(&self) -> Duration;

    /// Block the calling thread until `wakeup(chan)` or until `timeout`
    /// elapses. A wakeup posted after the caller last observed the state it
    /// waits on must not be lost. Spurious returns are allowed.
    fn sleep(&self, chan: WaitChannel, timeout: Option<Duration>);

    fn wakeup(&self, chan: WaitChannel);

    /// Queue `RtsxHost::card_task` on the deferred-work executor, either now
    /// or after `delay`. Scheduling while already pending keeps the pending
    /// run.
    fn schedule_card_task(&self, delay: Option<Duration>);

    /// Cancel pending runs of the card task and wait for a running one.
    fn drain_card_task(&self);

    /// Create and probe the child MMC bus device for a newly seated card.
    fn attach_mmc_bus(&self) -> Result<(), SdError>;

    /// Delete the child MMC bus device.
    fn detach_mmc_bus(&self) -> Result<(), SdError>;
}

#[derive(Debug, Clone)]
pub struct RtsxConfig {
    /// Bound on every completion wait, in seconds.
    pub request_timeout_secs: u32,
    /// Delay before an insertion is acted upon.
    pub card_debounce: Duration,
    /// LTR enable as found in the PCIe device control 2 register.
    pub pcie_ltr_enabled: bool,
}

impl Default for RtsxConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 2,
            card_debounce: Duration::from_secs(1),
            pcie_ltr_enabled: false,
        }
    }
}
