use log::{debug, info};

use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::Platform;
use super::regs::RegisterSpace;
use super::{HostInner, RtsxHost};
use crate::err::SdError;

/// SD bus timing modes the MMC layer may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmcTiming {
    Legacy,
    HighSpeed,
    UhsSdr12,
    UhsSdr25,
    UhsSdr50,
    UhsSdr104,
    UhsDdr50,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerMode {
    Off,
    Up,
    On,
}

/// I/O signalling voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vccq {
    V120,
    V180,
    V330,
}

/// SSC parameters of one supported card clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockParams {
    pub freq: u32,
    pub n: u8,
    pub div: u8,
    pub mcu: u8,
}

const CLOCKS: [ClockParams; 3] = [
    ClockParams { freq: RTSX_SDCLK_50MHZ, n: 100, div: RTSX_CLK_DIV_2, mcu: 7 },
    ClockParams { freq: RTSX_SDCLK_25MHZ, n: 100, div: RTSX_CLK_DIV_4, mcu: 7 },
    // n = 80 is the minimum the SSC accepts
    ClockParams { freq: RTSX_SDCLK_400KHZ, n: 80, div: RTSX_CLK_DIV_8, mcu: 7 },
];

/// Round `freq` down to a supported card clock. `None` means clock off.
pub fn select_clock(freq: u32) -> Option<ClockParams> {
    if freq == RTSX_SDCLK_OFF {
        return None;
    }
    CLOCKS
        .iter()
        .find(|c| freq >= c.freq)
        .or(CLOCKS.last())
        .copied()
}

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    pub(crate) fn set_sd_clock(&self, freq: u32) -> Result<(), SdError> {
        let Some(clk) = select_clock(freq) else {
            debug!("stopping SD clock");
            return self.stop_sd_clock();
        };
        info!("SD clock {} Hz (requested {})", clk.freq, freq);

        self.bus.clr(RTSX_SD_CFG1, RTSX_CLK_DIVIDE_MASK)?;
        self.switch_sd_clock(clk)
    }

    fn stop_sd_clock(&self) -> Result<(), SdError> {
        self.bus.clr(RTSX_CARD_CLK_EN, RTSX_CARD_CLK_EN_ALL)?;
        self.bus.set(RTSX_SD_BUS_STAT, RTSX_SD_CLK_FORCE_STOP)
    }

    fn switch_sd_clock(&self, clk: ClockParams) -> Result<(), SdError> {
        // SD 2.0 mode
        self.bus.clr(RTSX_SD_CFG1, RTSX_SD_MODE_MASK)?;

        self.bus.set(RTSX_CLK_CTL, RTSX_CLK_LOW_FREQ)?;

        self.bus.write(
            RTSX_CARD_CLK_SOURCE,
            0xFF,
            RTSX_CRC_FIX_CLK | RTSX_SD30_VAR_CLK0 | RTSX_SAMPLE_VAR_CLK1,
        )?;
        self.bus.clr(RTSX_SD_SAMPLE_POINT_CTL, RTSX_SD20_RX_SEL_MASK)?;
        self.bus.write(RTSX_SD_PUSH_POINT_CTL, 0xFF, RTSX_SD20_TX_NEG_EDGE)?;
        self.bus.write(RTSX_CLK_DIV, 0xFF, (clk.div << 4) | clk.mcu)?;
        self.bus.clr(RTSX_SSC_CTL1, RTSX_RSTB)?;
        self.bus.clr(RTSX_SSC_CTL2, RTSX_SSC_DEPTH_MASK)?;
        self.bus.write(RTSX_SSC_DIV_N_0, 0xFF, clk.n)?;
        self.bus.set(RTSX_SSC_CTL1, RTSX_RSTB)?;

        self.platform.delay_us(200);

        self.bus.clr(RTSX_CLK_CTL, RTSX_CLK_LOW_FREQ)
    }

    pub(crate) fn set_sd_timing(&self, timing: MmcTiming) -> Result<(), SdError> {
        debug!("SD timing {:?}", timing);

        self.bus.bitop(RTSX_SD_CFG1, 0x0C, RTSX_SD20_MODE)?;
        self.bus.bitop(RTSX_CLK_CTL, RTSX_CLK_LOW_FREQ, RTSX_CLK_LOW_FREQ)?;
        self.bus.bitop(
            RTSX_CARD_CLK_SOURCE,
            0xFF,
            RTSX_CRC_FIX_CLK | RTSX_SD30_VAR_CLK0 | RTSX_SAMPLE_VAR_CLK1,
        )?;
        self.bus.bitop(RTSX_CLK_CTL, RTSX_CLK_LOW_FREQ, 0x00)?;

        match timing {
            MmcTiming::HighSpeed => {
                self.bus
                    .bitop(RTSX_SD_PUSH_POINT_CTL, RTSX_SD20_TX_SEL_MASK, RTSX_SD20_TX_14_AHEAD)?;
                self.bus
                    .bitop(RTSX_SD_SAMPLE_POINT_CTL, RTSX_SD20_RX_SEL_MASK, RTSX_SD20_RX_14_DELAY)
            }
            _ => {
                self.bus.bitop(RTSX_SD_PUSH_POINT_CTL, 0xFF, RTSX_SD20_TX_NEG_EDGE)?;
                self.bus
                    .bitop(RTSX_SD_SAMPLE_POINT_CTL, RTSX_SD20_RX_SEL_MASK, RTSX_SD20_RX_POS_EDGE)
            }
        }
    }

    // The meaning of PWR_GATE_CTRL differs between families: the 5209
    // treats it as disabled gates, the later parts as enabled gates. The
    // per-variant tables keep each one as is.
    pub(crate) fn bus_power_off(&self, st: &HostInner) -> Result<(), SdError> {
        debug!("bus power off");
        let quirks = self.device.variant.quirks();

        self.stop_sd_clock()?;
        self.bus.clr(RTSX_CARD_CLK_EN, RTSX_SD_CLK_EN)?;
        self.bus.clr(RTSX_CARD_OE, RTSX_CARD_OUTPUT_EN)?;

        self.run_steps(st, quirks.power_off)?;
        self.run_steps(st, quirks.pull_off)
    }

    pub(crate) fn bus_power_on(&self, st: &HostInner) -> Result<(), SdError> {
        debug!("bus power on");
        let quirks = self.device.variant.quirks();

        self.bus.write(RTSX_CARD_SELECT, 0xFF, RTSX_SD_MOD_SEL)?;
        self.bus.write(RTSX_CARD_SHARE_MODE, 0xFF, RTSX_CARD_SHARE_48_SD)?;
        self.bus.set(RTSX_CARD_CLK_EN, RTSX_SD_CLK_EN)?;

        self.run_steps(st, quirks.pull_on)?;
        self.run_steps(st, quirks.power_ramp)?;

        self.bus.write(RTSX_CARD_OE, 0xFF, RTSX_SD_OUTPUT_EN)?;
        self.platform.delay_us(200);
        Ok(())
    }

    pub(crate) fn switch_vccq(&self, st: &HostInner, vccq: Vccq) -> Result<(), SdError> {
        // Only 3.3 V signalling is wired up.
        if vccq == Vccq::V330 {
            self.run_steps(st, self.device.variant.quirks().vccq_3v3)?;
            self.platform.delay_us(300);
        }
        debug!("vccq {:?}", vccq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_table() {
        let c = select_clock(400_000).unwrap();
        assert_eq!((c.n, c.div, c.mcu), (80, RTSX_CLK_DIV_8, 7));
        let c = select_clock(25_000_000).unwrap();
        assert_eq!((c.n, c.div, c.mcu), (100, RTSX_CLK_DIV_4, 7));
        let c = select_clock(50_000_000).unwrap();
        assert_eq!((c.n, c.div, c.mcu), (100, RTSX_CLK_DIV_2, 7));
    }

    #[test]
    fn clock_rounds_down() {
        assert_eq!(select_clock(208_000_000).unwrap().freq, RTSX_SDCLK_50MHZ);
        assert_eq!(select_clock(49_999_999).unwrap().freq, RTSX_SDCLK_25MHZ);
        assert_eq!(select_clock(24_000_000).unwrap().freq, RTSX_SDCLK_400KHZ);
        assert_eq!(select_clock(RTSX_SDCLK_250KHZ).unwrap().freq, RTSX_SDCLK_400KHZ);
        assert_eq!(select_clock(0), None);
    }
}
