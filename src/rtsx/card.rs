use core::sync::atomic::Ordering;

use log::{debug, error, info, warn};

use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::Platform;
use super::regs::RegisterSpace;
use super::RtsxHost;

cfg_if::cfg_if! {
    if #[cfg(feature = "inversion")] {
        // Card detect and write protect switches read active low
        pub(crate) const SENSE_INVERTED: bool = true;
    } else {
        pub(crate) const SENSE_INVERTED: bool = false;
    }
}

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    pub(crate) fn is_card_present(&self) -> bool {
        let status = self.bus.read4(RTSX_BIPR);
        (status & RTSX_SD_EXIST != 0) != SENSE_INVERTED
    }

    // Called from the interrupt handler on a card detect change.
    pub(crate) fn handle_card_present(&self) {
        let was_present = self.card_attached.load(Ordering::Acquire);
        let is_present = self.is_card_present();
        info!("Card {}", if is_present { "present" } else { "absent" });

        if !was_present && is_present {
            // The detect pin settles before the data pins make contact.
            self.platform
                .schedule_card_task(Some(self.config.card_debounce));
        } else if was_present && !is_present {
            self.platform.schedule_card_task(None);
        }
    }

    /// Deferred card presence check.
    ///
    /// Runs on the platform's work executor after a card change, and once
    /// from `init` to pick up a card inserted before boot. Attaches or
    /// detaches the child MMC bus to match the socket.
    pub fn card_task(&self) {
        if self.is_card_present() {
            self.card_present.store(true, Ordering::Release);

            if self
                .card_attached
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                debug!("Card inserted");
                if let Err(e) = self.platform.attach_mmc_bus() {
                    error!("Adding MMC bus failed: {}", e);
                    self.card_attached.store(false, Ordering::Release);
                }
            }
        } else {
            self.card_present.store(false, Ordering::Release);

            if self.card_attached.swap(false, Ordering::AcqRel) {
                debug!("Card removed");
                if let Err(e) = self.platform.detach_mmc_bus() {
                    warn!("Detaching MMC bus failed: {}", e);
                }
            }
        }
    }
}
