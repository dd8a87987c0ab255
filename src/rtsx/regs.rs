use log::{debug, warn};

use super::constant::*;
use crate::err::SdError;

const HAIMR_TRIES: u32 = 1024;
const PHY_TRIES: u32 = 100_000;
const CFG_TRIES: u32 = 1024;

/// 32-bit access to the controller's memory-mapped BAR.
pub trait RegisterSpace: Send + Sync {
    fn read32(&self, offset: u32) -> u32;
    fn write32(&self, offset: u32, value: u32);
}

/// Memory-mapped register window.
#[derive(Debug)]
pub struct Mmio {
    base_addr: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base_addr` must be the virtual address of the mapped controller BAR
    /// and stay mapped for the lifetime of the value.
    pub unsafe fn new(base_addr: usize) -> Self {
        Self { base_addr }
    }
}

impl RegisterSpace for Mmio {
    // Read a 32-bit register
    fn read32(&self, offset: u32) -> u32 {
        unsafe { core::ptr::read_volatile((self.base_addr + offset as usize) as *const u32) }
    }

    // Write a 32-bit register
    fn write32(&self, offset: u32, value: u32) {
        unsafe { core::ptr::write_volatile((self.base_addr + offset as usize) as *mut u32, value) }
    }
}

/// Indirect access to the chip's internal register file, its PHY and its
/// PCI configuration space. Every access is a bounded busy poll and never
/// sleeps, so it may run with the controller lock held.
pub struct ChipBus<R> {
    regs: R,
}

impl<R: RegisterSpace> ChipBus<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn read4(&self, offset: u32) -> u32 {
        self.regs.read32(offset)
    }

    pub fn write4(&self, offset: u32, value: u32) {
        self.regs.write32(offset, value)
    }

    pub fn read(&self, addr: u16) -> Result<u8, SdError> {
        self.write4(RTSX_HAIMR, RTSX_HAIMR_BUSY | ((addr as u32 & 0x3FFF) << 16));

        for _ in 0..HAIMR_TRIES {
            let reg = self.read4(RTSX_HAIMR);
            if reg & RTSX_HAIMR_BUSY == 0 {
                return Ok((reg & 0xFF) as u8);
            }
        }

        debug!("read of register {:#06x} timed out", addr);
        Err(SdError::Timeout)
    }

    pub fn write(&self, addr: u16, mask: u8, val: u8) -> Result<(), SdError> {
        self.write4(
            RTSX_HAIMR,
            RTSX_HAIMR_BUSY
                | RTSX_HAIMR_WRITE
                | ((addr as u32 & 0x3FFF) << 16)
                | ((mask as u32) << 8)
                | val as u32,
        );

        for _ in 0..HAIMR_TRIES {
            let reg = self.read4(RTSX_HAIMR);
            if reg & RTSX_HAIMR_BUSY == 0 {
                // Partial writes leave the other bits to the chip, only a
                // full-width write has a predictable readback.
                if mask == 0xFF && (reg & 0xFF) as u8 != val {
                    warn!(
                        "register {:#06x} reads back {:#04x}, wrote {:#04x}",
                        addr,
                        reg & 0xFF,
                        val
                    );
                    return Err(SdError::Inconsistent);
                }
                return Ok(());
            }
        }

        debug!("write of register {:#06x} timed out", addr);
        Err(SdError::Timeout)
    }

    pub fn set(&self, addr: u16, bits: u8) -> Result<(), SdError> {
        self.write(addr, bits, 0xFF)
    }

    pub fn clr(&self, addr: u16, bits: u8) -> Result<(), SdError> {
        self.write(addr, bits, 0x00)
    }

    pub fn bitop(&self, addr: u16, mask: u8, bits: u8) -> Result<(), SdError> {
        self.write(addr, mask, bits)
    }

    pub fn read_phy(&self, addr: u8) -> Result<u16, SdError> {
        self.write(RTSX_PHY_ADDR, 0xFF, addr)?;
        self.write(RTSX_PHY_RWCTL, 0xFF, RTSX_PHY_BUSY | RTSX_PHY_READ)?;
        self.wait_phy()?;

        let data0 = self.read(RTSX_PHY_DATA0)?;
        let data1 = self.read(RTSX_PHY_DATA1)?;
        Ok(u16::from(data1) << 8 | u16::from(data0))
    }

    pub fn write_phy(&self, addr: u8, val: u16) -> Result<(), SdError> {
        self.write(RTSX_PHY_DATA0, 0xFF, val as u8)?;
        self.write(RTSX_PHY_DATA1, 0xFF, (val >> 8) as u8)?;
        self.write(RTSX_PHY_ADDR, 0xFF, addr)?;
        self.write(RTSX_PHY_RWCTL, 0xFF, RTSX_PHY_BUSY | RTSX_PHY_WRITE)?;
        self.wait_phy()
    }

    fn wait_phy(&self) -> Result<(), SdError> {
        for _ in 0..PHY_TRIES {
            if self.read(RTSX_PHY_RWCTL)? & RTSX_PHY_BUSY == 0 {
                return Ok(());
            }
        }
        debug!("PHY access timed out");
        Err(SdError::Timeout)
    }

    /// Read a 32-bit word of the chip's own PCI configuration space for
    /// function `func`.
    pub fn read_cfg(&self, func: u8, addr: u16) -> Result<u32, SdError> {
        self.write(RTSX_CFGADDR0, 0xFF, addr as u8)?;
        self.write(RTSX_CFGADDR1, 0xFF, (addr >> 8) as u8)?;
        self.write(RTSX_CFGRWCTL, 0xFF, RTSX_CFG_BUSY | ((func & 0x03) << 4))?;

        let mut done = false;
        for _ in 0..CFG_TRIES {
            if self.read(RTSX_CFGRWCTL)? & RTSX_CFG_BUSY == 0 {
                done = true;
                break;
            }
        }
        if !done {
            debug!("config read of {:#05x} timed out", addr);
            return Err(SdError::Timeout);
        }

        let mut data = [0u8; 4];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = self.read(RTSX_CFGDATA0 + i as u16)?;
        }
        Ok(u32::from_le_bytes(data))
    }
}
