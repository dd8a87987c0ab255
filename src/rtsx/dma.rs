//! DMA-visible buffers owned by the controller.
//!
//! The controller keeps two long-lived buffers: the command descriptor
//! buffer and the bulk data buffer. Accesses from the CPU are bracketed by
//! `sync_for_device` / `sync_for_cpu` around each device phase.

/// A physically contiguous buffer the chip can reach by bus address.
pub trait DmaBuffer: Send {
    /// Device-visible address. The chip only decodes 32 bits.
    fn bus_addr(&self) -> u64;

    fn capacity(&self) -> usize;

    fn read_at(&self, offset: usize, dst: &mut [u8]);

    fn write_at(&mut self, offset: usize, src: &[u8]);

    /// Make CPU writes visible to the device before it is started.
    fn sync_for_device(&mut self) {}

    /// Make device writes visible to the CPU after completion.
    fn sync_for_cpu(&mut self) {}
}

cfg_if::cfg_if! {
    if #[cfg(feature = "dma")] {
        use dma_api::{DVec, Direction};

        use super::constant::{RTSX_DMA_ALIGN, RTSX_HOSTCMD_BUFSIZE};
        use crate::err::SdError;

        impl DmaBuffer for DVec<u8> {
            fn bus_addr(&self) -> u64 {
                DVec::bus_addr(self) as u64
            }

            fn capacity(&self) -> usize {
                self.len()
            }

            fn read_at(&self, offset: usize, dst: &mut [u8]) {
                for (i, byte) in dst.iter_mut().enumerate() {
                    *byte = self[offset + i];
                }
            }

            fn write_at(&mut self, offset: usize, src: &[u8]) {
                for (i, byte) in src.iter().enumerate() {
                    self.set(offset + i, *byte);
                }
            }
        }

        /// Allocate the command buffer and a bulk buffer of `data_size` bytes.
        pub fn alloc_buffers(data_size: usize) -> Result<(DVec<u8>, DVec<u8>), SdError> {
            let cmd = DVec::zeros(RTSX_HOSTCMD_BUFSIZE, RTSX_DMA_ALIGN, Direction::Bidirectional)
                .ok_or(SdError::MemoryError)?;
            let data = DVec::zeros(data_size, RTSX_DMA_ALIGN, Direction::Bidirectional)
                .ok_or(SdError::MemoryError)?;
            Ok((cmd, data))
        }
    }
}
