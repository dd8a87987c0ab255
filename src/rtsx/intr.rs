use core::sync::atomic::Ordering;
use core::time::Duration;

use log::{debug, info, warn};

use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::{Platform, WaitChannel};
use super::regs::RegisterSpace;
use super::RtsxHost;
use crate::err::SdError;

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    /// Interrupt entry point, called from the platform's interrupt dispatch.
    ///
    /// Acknowledges the pending bits, tracks write protect and card
    /// changes, and posts transfer completion to the waiting request. It
    /// never takes the controller lock.
    pub fn handle_interrupt(&self) {
        let enabled = self.bus.read4(RTSX_BIER);
        let status = self.bus.read4(RTSX_BIPR);
        debug!("Interrupt handler - enabled: {:#x}, status: {:#x}", enabled, status);

        // Write-to-clear was selected during init
        self.bus.write4(RTSX_BIPR, status);

        if enabled & status == 0 || status == 0xFFFF_FFFF {
            warn!("Spurious interrupt");
            return;
        }

        self.read_only
            .store(status & RTSX_SD_WRITE_PROTECT != 0, Ordering::Release);

        if status & RTSX_SD_INT != 0 {
            info!("Interrupt card inserted/removed");
            self.handle_card_present();
        }

        if !self.req_active.load(Ordering::Acquire) {
            return;
        }

        if status & (RTSX_TRANS_OK_INT | RTSX_TRANS_FAIL_INT) != 0 {
            self.intr_status.fetch_or(status, Ordering::AcqRel);
            self.platform.wakeup(WaitChannel::Interrupt);
        }
    }

    pub(crate) fn clear_intr_status(&self) {
        self.intr_status.store(0, Ordering::Release);
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.load(Ordering::Relaxed) as u64)
    }

    /// Block until one of `mask` (or a transfer failure) has been posted by
    /// the interrupt handler, or until `timeout` elapses.
    pub(crate) fn wait_intr(&self, mask: u32, timeout: Duration, opcode: u8) -> Result<(), SdError> {
        let mask = mask | RTSX_TRANS_FAIL_INT;
        let deadline = self.platform.uptime() + timeout;
        let mut result = Ok(());

        let mut status = self.intr_status.load(Ordering::Acquire) & mask;
        while status == 0 {
            let now = self.platform.uptime();
            if now >= deadline {
                warn!("Controller timeout for CMD{}", opcode);
                result = Err(SdError::Timeout);
                break;
            }
            self.platform.sleep(WaitChannel::Interrupt, Some(deadline - now));
            status = self.intr_status.load(Ordering::Acquire) & mask;
        }

        self.intr_status.fetch_and(!status, Ordering::AcqRel);

        // A removed card invalidates whatever was in flight.
        if !self.card_present.load(Ordering::Acquire) {
            return Err(SdError::InvalidState);
        }
        if result.is_ok() && status & RTSX_TRANS_FAIL_INT != 0 {
            return Err(SdError::TransferFailure);
        }
        result
    }

    /// Stop the command and DMA engines and clear the card error latches.
    /// Failures are logged only.
    pub(crate) fn soft_reset(&self) {
        info!("Soft reset");

        self.bus.write4(RTSX_HCBCTLR, RTSX_STOP_CMD);
        self.bus.write4(RTSX_HDBCTLR, RTSX_STOP_DMA);

        let steps = [
            (RTSX_DMACTL, RTSX_DMA_RST),
            (RTSX_RBCTL, RTSX_RB_FLUSH),
            (RTSX_CARD_STOP, RTSX_SD_STOP | RTSX_SD_CLR_ERR),
        ];
        for (addr, bits) in steps {
            if let Err(e) = self.bus.write(addr, bits, bits) {
                warn!("soft reset: write of {:#06x} failed: {}", addr, e);
            }
        }
    }
}
