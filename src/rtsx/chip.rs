use core::fmt;

use bitflags::bitflags;
use log::{debug, warn};

use super::constant::*;
use crate::err::SdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    Rts5209,
    Rts5227,
    Rts5229,
    Rts522A,
    Rts525A,
    Rts5249,
    Rtl8402,
    Rtl8411,
    Rtl8411B,
}

bitflags! {
    /// Sub-capabilities found at attach time, orthogonal to the variant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChipFeatures: u8 {
        /// Silicon revision that needs the revision specific setup:
        /// version C of the 5229, version A of the 522A and 525A.
        const IC_REVISION = 1 << 0;
        /// 8411B in its QFN48 package.
        const QFN48 = 1 << 1;
        /// Socket mounted upside down on the board.
        const REVERSE_SOCKET = 1 << 2;
        /// Function 0 is SDIO capable.
        const SDIO = 1 << 3;
    }
}

/// Entry of the PCI probe table.
#[derive(Debug)]
pub struct RtsxDevice {
    pub vendor_id: u16,
    pub device_id: u16,
    pub variant: ChipVariant,
    pub desc: &'static str,
}

pub static RTSX_DEVICES: &[RtsxDevice] = &[
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5209,
        variant: ChipVariant::Rts5209,
        desc: "Realtek RTS5209 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5227,
        variant: ChipVariant::Rts5227,
        desc: "Realtek RTS5227 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5229,
        variant: ChipVariant::Rts5229,
        desc: "Realtek RTS5229 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x522A,
        variant: ChipVariant::Rts522A,
        desc: "Realtek RTS522A PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x525A,
        variant: ChipVariant::Rts525A,
        desc: "Realtek RTS525A PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5249,
        variant: ChipVariant::Rts5249,
        desc: "Realtek RTS5249 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5286,
        variant: ChipVariant::Rtl8402,
        desc: "Realtek RTL8402 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5289,
        variant: ChipVariant::Rtl8411,
        desc: "Realtek RTL8411 PCI MMC/SD Card Reader",
    },
    RtsxDevice {
        vendor_id: RTSX_PCI_VENDOR_REALTEK,
        device_id: 0x5287,
        variant: ChipVariant::Rtl8411B,
        desc: "Realtek RTL8411B PCI MMC/SD Card Reader",
    },
];

/// Look up a PCI function in the probe table.
pub fn probe(vendor_id: u16, device_id: u16) -> Option<&'static RtsxDevice> {
    RTSX_DEVICES
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.device_id == device_id)
}

// Maps a 2-bit factory selector to the SD 3.0 driver type
const MAP_SD_DRIVE: [u8; 4] = [
    RTSX_DRIVER_TYPE_D,
    RTSX_DRIVER_TYPE_C,
    RTSX_DRIVER_TYPE_A,
    RTSX_DRIVER_TYPE_B,
];

// (clk, cmd, dat) drive strength per driver type
const RTS5227_DRIVING_3V3: [[u8; 3]; 4] = [
    [0x13, 0x13, 0x13],
    [0x96, 0x96, 0x96],
    [0x7F, 0x7F, 0x7F],
    [0x96, 0x96, 0x96],
];

const RTS5249_DRIVING_3V3: [[u8; 3]; 4] = [
    [0x11, 0x11, 0x18],
    [0x55, 0x55, 0x5C],
    [0xFF, 0xFF, 0xFF],
    [0x96, 0x96, 0x96],
];

impl ChipVariant {
    /// BAR holding the register window.
    pub fn register_bar(&self) -> u8 {
        match self {
            ChipVariant::Rts525A => 1,
            _ => 0,
        }
    }

    pub fn supports_8bit(&self) -> bool {
        matches!(self, ChipVariant::Rts5209)
    }

    /// Family drive strength triple for a driver type selector.
    pub fn sd30_driving(&self, sel: u8) -> Option<[u8; 3]> {
        let table = match self {
            ChipVariant::Rts5227 | ChipVariant::Rts522A => &RTS5227_DRIVING_3V3,
            ChipVariant::Rts525A | ChipVariant::Rts5249 => &RTS5249_DRIVING_3V3,
            _ => return None,
        };
        Some(table[(sel & 0x03) as usize])
    }
}

impl fmt::Display for ChipVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChipVariant::Rts5209 => "RTS5209",
            ChipVariant::Rts5227 => "RTS5227",
            ChipVariant::Rts5229 => "RTS5229",
            ChipVariant::Rts522A => "RTS522A",
            ChipVariant::Rts525A => "RTS525A",
            ChipVariant::Rts5249 => "RTS5249",
            ChipVariant::Rtl8402 => "RTL8402",
            ChipVariant::Rtl8411 => "RTL8411",
            ChipVariant::Rtl8411B => "RTL8411B",
        };
        write!(f, "{}", name)
    }
}

/// Drive strength settings programmed into the chip by the board vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveSettings {
    pub card_drive_sel: u8,
    pub sd30_drive_sel_3v3: u8,
    pub reverse_socket: bool,
}

/// Decode the factory settings words of the vendor config area. `read_cfg`
/// returns the 32-bit word at a config-space offset.
pub fn vendor_settings<F>(variant: ChipVariant, mut read_cfg: F) -> Result<DriveSettings, SdError>
where
    F: FnMut(u16) -> Result<u32, SdError>,
{
    let mut s = DriveSettings {
        card_drive_sel: RTSX_CARD_DRIVE_DEFAULT,
        sd30_drive_sel_3v3: RTSX_DRIVER_TYPE_D,
        reverse_socket: false,
    };

    match variant {
        ChipVariant::Rts5209 => {
            s.card_drive_sel = RTSX_RTS5209_CARD_DRIVE_DEFAULT;
            let reg = read_cfg(RTSX_PCR_SETTING_REG2)?;
            debug!("SETTING_REG2: {:#010x}", reg);
            if reg & 0x80 == 0 {
                s.card_drive_sel = ((reg >> 8) & 0x3F) as u8;
                s.sd30_drive_sel_3v3 = (reg & 0x07) as u8;
            } else {
                warn!("factory settings not programmed");
            }
        }
        ChipVariant::Rts5227
        | ChipVariant::Rts522A
        | ChipVariant::Rts5229
        | ChipVariant::Rts525A
        | ChipVariant::Rts5249 => {
            let cfg_driver_type = !matches!(variant, ChipVariant::Rts5229);
            if cfg_driver_type {
                s.sd30_drive_sel_3v3 = RTSX_CFG_DRIVER_TYPE_B;
            }
            let reg = read_cfg(RTSX_PCR_SETTING_REG1)?;
            debug!("SETTING_REG1: {:#010x}", reg);
            // The valid bit has the opposite sense on the 525A family.
            let valid = match variant {
                ChipVariant::Rts525A | ChipVariant::Rts5249 => reg & 0x0100_0000 != 0,
                _ => reg & 0x0100_0000 == 0,
            };
            if !valid {
                warn!("factory settings not programmed");
                return Ok(s);
            }
            s.card_drive_sel &= 0x3F;
            s.card_drive_sel |= (((reg >> 25) & 0x01) << 6) as u8;

            let reg = read_cfg(RTSX_PCR_SETTING_REG2)?;
            debug!("SETTING_REG2: {:#010x}", reg);
            let sel = ((reg >> 5) & 0x03) as u8;
            if variant == ChipVariant::Rts5229 {
                s.sd30_drive_sel_3v3 = MAP_SD_DRIVE[sel as usize];
            } else {
                s.sd30_drive_sel_3v3 = sel;
                s.reverse_socket = reg & 0x4000 != 0;
            }
        }
        ChipVariant::Rtl8402 | ChipVariant::Rtl8411 => {
            s.card_drive_sel = RTSX_RTL8411_CARD_DRIVE_DEFAULT;
            let reg = read_cfg(RTSX_PCR_SETTING_REG1)?;
            debug!("SETTING_REG1: {:#010x}", reg);
            if reg & 0x0100_0000 != 0 {
                s.card_drive_sel &= 0x3F;
                s.card_drive_sel |= (((reg >> 25) & 0x01) << 6) as u8;
                let reg3 = read_cfg(RTSX_PCR_SETTING_REG3)? as u8;
                debug!("SETTING_REG3: {:#04x}", reg3);
                s.sd30_drive_sel_3v3 = (reg3 >> 5) & 0x07;
            } else {
                warn!("factory settings not programmed");
            }
        }
        ChipVariant::Rtl8411B => {
            s.card_drive_sel = RTSX_RTL8411_CARD_DRIVE_DEFAULT;
            let reg = read_cfg(RTSX_PCR_SETTING_REG1)?;
            debug!("SETTING_REG1: {:#010x}", reg);
            if reg & 0x0100_0000 == 0 {
                s.sd30_drive_sel_3v3 = MAP_SD_DRIVE[(reg & 0x03) as usize];
            } else {
                warn!("factory settings not programmed");
            }
        }
    }

    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(words: &[(u16, u32)]) -> impl FnMut(u16) -> Result<u32, SdError> + '_ {
        move |addr| {
            words
                .iter()
                .find(|(a, _)| *a == addr)
                .map(|(_, v)| *v)
                .ok_or(SdError::Timeout)
        }
    }

    #[test]
    fn probe_table() {
        let dev = probe(0x10EC, 0x525A).unwrap();
        assert_eq!(dev.variant, ChipVariant::Rts525A);
        assert_eq!(dev.variant.register_bar(), 1);
        assert_eq!(probe(0x10EC, 0x5287).unwrap().variant, ChipVariant::Rtl8411B);
        assert_eq!(probe(0x10EC, 0x5209).unwrap().variant.register_bar(), 0);
        assert!(probe(0x8086, 0x5209).is_none());
        assert!(probe(0x10EC, 0x5250).is_none());
        assert_eq!(RTSX_DEVICES.len(), 9);
    }

    #[test]
    fn rts5227_reverse_socket() {
        // valid (bit 24 clear), bit 25 set, selector 2, reversed socket
        let s = vendor_settings(
            ChipVariant::Rts5227,
            cfg(&[(RTSX_PCR_SETTING_REG1, 1 << 25), (RTSX_PCR_SETTING_REG2, (2 << 5) | 0x4000)]),
        )
        .unwrap();
        assert_eq!(s.card_drive_sel, (RTSX_CARD_DRIVE_DEFAULT & 0x3F) | 0x40);
        assert_eq!(s.sd30_drive_sel_3v3, 2);
        assert!(s.reverse_socket);
    }

    #[test]
    fn rts525a_valid_bit_is_inverted() {
        let s = vendor_settings(ChipVariant::Rts525A, cfg(&[(RTSX_PCR_SETTING_REG1, 0)])).unwrap();
        assert_eq!(s.sd30_drive_sel_3v3, RTSX_CFG_DRIVER_TYPE_B);
        assert!(!s.reverse_socket);

        let s = vendor_settings(
            ChipVariant::Rts525A,
            cfg(&[(RTSX_PCR_SETTING_REG1, 0x0100_0000), (RTSX_PCR_SETTING_REG2, 1 << 5)]),
        )
        .unwrap();
        assert_eq!(s.sd30_drive_sel_3v3, 1);
    }

    #[test]
    fn rts5229_maps_driver_type() {
        let s = vendor_settings(
            ChipVariant::Rts5229,
            cfg(&[(RTSX_PCR_SETTING_REG1, 0), (RTSX_PCR_SETTING_REG2, 3 << 5)]),
        )
        .unwrap();
        assert_eq!(s.sd30_drive_sel_3v3, RTSX_DRIVER_TYPE_B);
    }

    #[test]
    fn rtl8411_three_bit_selector() {
        let s = vendor_settings(
            ChipVariant::Rtl8411,
            cfg(&[(RTSX_PCR_SETTING_REG1, 0x0100_0000), (RTSX_PCR_SETTING_REG3, 0xE0)]),
        )
        .unwrap();
        assert_eq!(s.sd30_drive_sel_3v3, 7);
        assert_eq!(s.card_drive_sel, RTSX_RTL8411_CARD_DRIVE_DEFAULT & 0x3F);
    }

    #[test]
    fn rts5209_unprogrammed_keeps_defaults() {
        let s = vendor_settings(ChipVariant::Rts5209, cfg(&[(RTSX_PCR_SETTING_REG2, 0x80)])).unwrap();
        assert_eq!(s.card_drive_sel, RTSX_RTS5209_CARD_DRIVE_DEFAULT);
        assert_eq!(s.sd30_drive_sel_3v3, RTSX_DRIVER_TYPE_D);
    }

    #[test]
    fn driving_tables() {
        assert_eq!(ChipVariant::Rts522A.sd30_driving(0), Some([0x13, 0x13, 0x13]));
        assert_eq!(ChipVariant::Rts5249.sd30_driving(1), Some([0x55, 0x55, 0x5C]));
        assert_eq!(ChipVariant::Rtl8411.sd30_driving(1), None);
    }
}
