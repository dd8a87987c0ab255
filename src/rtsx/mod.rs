//! Realtek rtsx PCI card reader, SD/MMC bridge side.
//!
//! The host sits between a generic MMC stack and the chip. Requests are
//! turned into batches of register descriptors that the chip's command
//! engine executes on its own; bulk data moves through a second DMA engine.

mod block;
mod card;
pub mod chip;
pub mod clock;
pub mod cmd;
pub mod constant;
pub mod dma;
mod intr;
pub mod platform;
mod quirks;
pub mod regs;

use core::fmt::{self, Display};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use bitflags::bitflags;
use log::{debug, info, warn};
use spin::Mutex;

pub use chip::{probe, ChipFeatures, ChipVariant, DriveSettings, RtsxDevice, RTSX_DEVICES};
pub use clock::{MmcTiming, PowerMode, Vccq};
pub use cmd::{DataBuffer, MmcCommand, MmcData, MmcRequest};
pub use dma::DmaBuffer;
pub use platform::{Platform, RtsxConfig, WaitChannel};
pub use regs::{Mmio, RegisterSpace};

use card::SENSE_INVERTED;
use chip::vendor_settings;
use cmd::CmdQueue;
use constant::*;
use quirks::COMMON_INIT;
use regs::ChipBus;

use crate::err::SdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusWidth {
    One,
    Four,
    Eight,
}

/// Bus settings requested by the MMC stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmcIos {
    pub bus_width: BusWidth,
    pub clock: u32,
    pub power_mode: PowerMode,
    pub timing: MmcTiming,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MmcCaps: u32 {
        const BUS_WIDTH_4 = 1 << 0;
        const BUS_WIDTH_8 = 1 << 1;
        const HSPEED = 1 << 2;
        const UHS_SDR12 = 1 << 3;
        const UHS_SDR25 = 1 << 4;
        const UHS_SDR50 = 1 << 5;
        const UHS_SDR104 = 1 << 6;
    }
}

/// What the host advertises to the MMC stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInfo {
    pub f_min: u32,
    pub f_max: u32,
    pub ocr: u32,
    pub caps: MmcCaps,
    /// Largest request in 512 byte blocks.
    pub max_blocks: usize,
}

// Last programmed bus settings. `None` forces the next setter through.
#[derive(Debug, Default, Clone, Copy)]
struct IosCache {
    bus_width: Option<BusWidth>,
    clock: Option<u32>,
    power_mode: Option<PowerMode>,
    timing: Option<MmcTiming>,
}

/// Chip settings, only touched with the controller lock held. The lock is
/// never held across a sleep.
pub(crate) struct HostInner {
    pub features: ChipFeatures,
    pub drive: DriveSettings,
    ios: IosCache,
}

/// Descriptor and bulk buffers of the request in flight.
pub(crate) struct XferState<D> {
    pub cmdq: CmdQueue<D>,
    pub data: D,
}

/// One controller instance.
///
/// The MMC stack serializes requests through `acquire`/`release`. The
/// settings lock guards against the card task, ios changes and power
/// management racing a request, and is dropped before a request blocks on
/// completion. The interrupt side is lock free.
pub struct RtsxHost<R, D, P> {
    device: &'static RtsxDevice,
    bus: ChipBus<R>,
    platform: P,
    config: RtsxConfig,
    inner: Mutex<HostInner>,
    // Only locked by the request that won `req_active`, so it never spins.
    bufs: Mutex<XferState<D>>,
    max_len: usize,
    // Completion bits posted by the interrupt handler.
    intr_status: AtomicU32,
    req_active: AtomicBool,
    card_present: AtomicBool,
    card_attached: AtomicBool,
    read_only: AtomicBool,
    bus_busy: AtomicU32,
    request_timeout_secs: AtomicU32,
}

impl<R, D, P> Display for RtsxHost<R, D, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{ id: {:04x}:{:04x}, card: {}, attached: {} }}",
            self.device.desc,
            self.device.vendor_id,
            self.device.device_id,
            self.card_present.load(Ordering::Relaxed),
            self.card_attached.load(Ordering::Relaxed)
        )
    }
}

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    /// Wrap a mapped controller. `cmd_buf` holds the descriptor batch and
    /// must fit `RTSX_HOSTCMD_BUFSIZE` bytes; `data_buf` bounds the size of
    /// a single request.
    pub fn new(
        regs: R,
        device: &'static RtsxDevice,
        cmd_buf: D,
        data_buf: D,
        platform: P,
        config: RtsxConfig,
    ) -> Result<Self, SdError> {
        if cmd_buf.capacity() < RTSX_HOSTCMD_BUFSIZE {
            warn!(
                "command buffer too small: {} < {}",
                cmd_buf.capacity(),
                RTSX_HOSTCMD_BUFSIZE
            );
            return Err(SdError::MemoryError);
        }
        if data_buf.capacity() < RTSX_MAX_DATA_BLKLEN {
            warn!("data buffer too small: {}", data_buf.capacity());
            return Err(SdError::MemoryError);
        }

        let timeout = config.request_timeout_secs;
        Ok(Self {
            device,
            bus: ChipBus::new(regs),
            platform,
            config,
            inner: Mutex::new(HostInner {
                features: ChipFeatures::empty(),
                drive: vendor_defaults(),
                ios: IosCache::default(),
            }),
            max_len: data_buf.capacity(),
            bufs: Mutex::new(XferState {
                cmdq: CmdQueue::new(cmd_buf),
                data: data_buf,
            }),
            intr_status: AtomicU32::new(0),
            req_active: AtomicBool::new(false),
            card_present: AtomicBool::new(false),
            card_attached: AtomicBool::new(false),
            read_only: AtomicBool::new(false),
            bus_busy: AtomicU32::new(0),
            request_timeout_secs: AtomicU32::new(timeout),
        })
    }

    pub fn device(&self) -> &'static RtsxDevice {
        self.device
    }

    /// Sub-capabilities detected by `init`.
    pub fn features(&self) -> ChipFeatures {
        self.inner.lock().features
    }

    /// Bring the chip up and look for a card already in the socket.
    ///
    /// The interrupt handler must be hooked up before this is called.
    pub fn init(&self) -> Result<(), SdError> {
        info!("Init {}", self);

        {
            let mut st = self.inner.lock();

            match self.bus.read_cfg(0, RTSX_SDIOCFG_REG) {
                Ok(cfg) if cfg & (RTSX_SDIOCFG_SDIO_ONLY | RTSX_SDIOCFG_HAVE_SDIO) != 0 => {
                    debug!("SDIO capable function 0");
                    st.features |= ChipFeatures::SDIO;
                }
                Ok(_) => {}
                Err(e) => debug!("SDIO config read failed: {}", e),
            }

            self.init_hw(&mut st)?;
        }

        self.platform.delay_us(500);
        let present = self.is_card_present();
        info!("Card {}", if present { "present" } else { "absent" });

        // A card seated before boot raised no interrupt.
        self.card_task();
        Ok(())
    }

    fn init_hw(&self, st: &mut HostInner) -> Result<(), SdError> {
        let variant = self.device.variant;
        st.features &= ChipFeatures::SDIO;

        match variant {
            ChipVariant::Rts5229 => {
                if self.bus.read(RTSX_DUMMY_REG)? & 0x0F == RTSX_IC_VERSION_C {
                    st.features |= ChipFeatures::IC_REVISION;
                }
            }
            ChipVariant::Rts522A | ChipVariant::Rts525A => {
                if self.bus.read(RTSX_DUMMY_REG)? & 0x0F == RTSX_IC_VERSION_A {
                    st.features |= ChipFeatures::IC_REVISION;
                }
            }
            ChipVariant::Rtl8411B => {
                if self.bus.read(RTSX_RTL8411B_PACKAGE)? & RTSX_RTL8411B_QFN48 != 0 {
                    st.features |= ChipFeatures::QFN48;
                }
            }
            _ => {}
        }

        st.drive = vendor_settings(variant, |addr| self.bus.read_cfg(0, addr))?;
        if st.drive.reverse_socket {
            st.features |= ChipFeatures::REVERSE_SOCKET;
        }
        debug!("{} features {:?}, drive {:?}", variant, st.features, st.drive);

        // Interrupt status is cleared by writing the pending bits back.
        self.bus.clr(RTSX_NFTS_TX_CTRL, RTSX_INT_READ_CLR)?;
        let pending = self.bus.read4(RTSX_BIPR);
        self.bus.write4(RTSX_BIPR, pending);
        self.bus.write4(
            RTSX_BIER,
            RTSX_TRANS_OK_INT_EN | RTSX_TRANS_FAIL_INT_EN | RTSX_SD_INT_EN,
        );

        // Power up the SSC clock
        self.bus.clr(RTSX_FPDCTL, RTSX_SSC_POWER_DOWN)?;
        self.platform.delay_us(200);

        let quirks = variant.quirks();
        self.run_steps(st, quirks.phy_init)?;
        self.run_steps(st, COMMON_INIT)?;
        for steps in quirks.init {
            self.run_steps(st, steps)?;
        }

        st.ios = IosCache::default();
        Ok(())
    }

    /// Execute one MMC request. The outcome is returned and also recorded
    /// in `req.cmd.error`.
    pub fn submit_request(&self, req: &mut MmcRequest<'_>) -> Result<(), SdError> {
        if self
            .req_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("CMD{} rejected, request in progress", req.cmd.opcode);
            return Err(SdError::Busy);
        }

        let features = self.inner.lock().features;
        let mut xs = self.bufs.lock();
        self.clear_intr_status();
        req.cmd.error = None;
        debug!(
            "CMD{} arg {:#010x} flags {:#x} data {}",
            req.cmd.opcode,
            req.cmd.arg,
            req.cmd.resp_type,
            req.cmd.data.as_ref().map_or(0, |d| d.buffer.len())
        );

        let res = self.dispatch(features, &mut xs, req);
        if let Err(e) = res {
            debug!("CMD{} failed: {}", req.cmd.opcode, e);
            if e.needs_reset() {
                self.soft_reset();
            }
        }
        req.cmd.error = res.err();

        drop(xs);
        self.req_active.store(false, Ordering::Release);
        res
    }

    fn dispatch(
        &self,
        features: ChipFeatures,
        st: &mut XferState<D>,
        req: &mut MmcRequest<'_>,
    ) -> Result<(), SdError> {
        if !self.card_present.load(Ordering::Acquire) {
            return Err(SdError::InvalidState);
        }
        if req.cmd.opcode == MMC_IO_SEND_OP_COND && !features.contains(ChipFeatures::SDIO) {
            debug!("no SDIO on this function");
            return Err(SdError::InvalidArgument);
        }

        let Some(len) = req.cmd.data.as_ref().map(|d| d.buffer.len()) else {
            self.platform.delay_us(200);
            return self.send_req_get_resp(&mut st.cmdq, &mut req.cmd);
        };

        if len > st.data.capacity() {
            warn!("request of {} bytes exceeds buffer of {}", len, st.data.capacity());
            return Err(SdError::InvalidArgument);
        }

        let res = if len <= RTSX_MAX_DATA_BLKLEN {
            self.xfer_short(&mut st.cmdq, &mut req.cmd)
        } else {
            self.xfer(st, &mut req.cmd, req.stop.as_mut())
        };

        match res {
            Err(e) if e != SdError::InvalidArgument && e != SdError::InvalidState => {
                // Tell a CRC failure apart from other transfer errors.
                match self.bus.read(RTSX_SD_STAT1) {
                    Ok(stat) if stat & RTSX_SD_CRC_ERR != 0 => {
                        warn!("CRC error");
                        Err(SdError::Crc)
                    }
                    _ => Err(e),
                }
            }
            res => res,
        }
    }

    pub fn set_bus_width(&self, width: BusWidth) -> Result<(), SdError> {
        let mut st = self.inner.lock();
        self.apply_bus_width(&mut st, width)
    }

    pub fn set_clock(&self, freq: u32) -> Result<(), SdError> {
        let mut st = self.inner.lock();
        self.apply_clock(&mut st, freq)
    }

    pub fn set_power_mode(&self, mode: PowerMode) -> Result<(), SdError> {
        let mut st = self.inner.lock();
        self.apply_power_mode(&mut st, mode)
    }

    pub fn set_timing(&self, timing: MmcTiming) -> Result<(), SdError> {
        let mut st = self.inner.lock();
        self.apply_timing(&mut st, timing)
    }

    /// Program every setting of `ios` that differs from the last one.
    pub fn update_ios(&self, ios: &MmcIos) -> Result<(), SdError> {
        let mut st = self.inner.lock();
        self.apply_bus_width(&mut st, ios.bus_width)?;
        self.apply_clock(&mut st, ios.clock)?;
        self.apply_power_mode(&mut st, ios.power_mode)?;
        self.apply_timing(&mut st, ios.timing)
    }

    pub fn set_signal_voltage(&self, vccq: Vccq) -> Result<(), SdError> {
        let st = self.inner.lock();
        self.switch_vccq(&st, vccq)
    }

    fn apply_bus_width(&self, st: &mut HostInner, width: BusWidth) -> Result<(), SdError> {
        if st.ios.bus_width == Some(width) {
            return Ok(());
        }
        let bits = match width {
            BusWidth::One => RTSX_BUS_WIDTH_1,
            BusWidth::Four => RTSX_BUS_WIDTH_4,
            BusWidth::Eight => RTSX_BUS_WIDTH_8,
        };
        self.bus.write(RTSX_SD_CFG1, RTSX_BUS_WIDTH_MASK, bits)?;
        info!("Setting bus width to {:?}", width);
        st.ios.bus_width = Some(width);
        Ok(())
    }

    fn apply_clock(&self, st: &mut HostInner, freq: u32) -> Result<(), SdError> {
        if st.ios.clock == Some(freq) {
            return Ok(());
        }
        self.set_sd_clock(freq)?;
        st.ios.clock = Some(freq);
        Ok(())
    }

    fn apply_power_mode(&self, st: &mut HostInner, mode: PowerMode) -> Result<(), SdError> {
        if st.ios.power_mode == Some(mode) {
            return Ok(());
        }
        match mode {
            PowerMode::Off => self.bus_power_off(st)?,
            PowerMode::Up | PowerMode::On => self.bus_power_on(st)?,
        }
        st.ios.power_mode = Some(mode);
        Ok(())
    }

    fn apply_timing(&self, st: &mut HostInner, timing: MmcTiming) -> Result<(), SdError> {
        if st.ios.timing == Some(timing) {
            return Ok(());
        }
        self.set_sd_timing(timing)?;
        st.ios.timing = Some(timing);
        Ok(())
    }

    /// Write protect switch as of the last interrupt.
    pub fn get_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire) != SENSE_INVERTED
    }

    /// Take exclusive ownership of the bus, sleeping until it is free.
    pub fn acquire(&self) {
        while self
            .bus_busy
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.platform.sleep(WaitChannel::HostBus, None);
        }
    }

    pub fn release(&self) {
        self.bus_busy.fetch_sub(1, Ordering::AcqRel);
        self.platform.wakeup(WaitChannel::HostBus);
    }

    pub fn host_info(&self) -> HostInfo {
        let mut caps = MmcCaps::BUS_WIDTH_4
            | MmcCaps::HSPEED
            | MmcCaps::UHS_SDR12
            | MmcCaps::UHS_SDR25
            | MmcCaps::UHS_SDR50
            | MmcCaps::UHS_SDR104;
        if self.device.variant.supports_8bit() {
            caps |= MmcCaps::BUS_WIDTH_8;
        }

        HostInfo {
            f_min: RTSX_SDCLK_250KHZ,
            f_max: RTSX_SDCLK_208MHZ,
            ocr: RTSX_SUPPORTED_VOLTAGE,
            caps,
            max_blocks: self.max_len / RTSX_MAX_DATA_BLKLEN,
        }
    }

    /// Sampling point tuning. The bridge runs fixed timings, so there is
    /// nothing to tune.
    pub fn tune(&self, hs400: bool) -> Result<(), SdError> {
        debug!("tune (hs400: {})", hs400);
        Ok(())
    }

    pub fn retune(&self, reset: bool) -> Result<(), SdError> {
        debug!("retune (reset: {})", reset);
        Ok(())
    }

    pub fn suspend(&self) -> Result<(), SdError> {
        if self.req_active.load(Ordering::Acquire) {
            warn!(
                "Suspend with request in progress: intr_status {:#x}",
                self.intr_status.load(Ordering::Relaxed)
            );
            return Err(SdError::Busy);
        }
        info!("Suspend");
        Ok(())
    }

    /// Re-run the chip setup after the device lost power.
    pub fn resume(&self) -> Result<(), SdError> {
        info!("Resume");
        let mut st = self.inner.lock();
        self.init_hw(&mut st)
    }

    /// Detach the card and stop the card task.
    pub fn shutdown(&self) {
        info!("Shutdown {}", self);
        if self.card_attached.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.platform.detach_mmc_bus() {
                warn!("Detaching MMC bus failed: {}", e);
            }
        }
        self.platform.drain_card_task();
    }

    pub fn set_request_timeout(&self, secs: u32) {
        debug!("request timeout {}s", secs);
        self.request_timeout_secs.store(secs, Ordering::Relaxed);
    }
}

fn vendor_defaults() -> DriveSettings {
    DriveSettings {
        card_drive_sel: RTSX_CARD_DRIVE_DEFAULT,
        sd30_drive_sel_3v3: RTSX_DRIVER_TYPE_D,
        reverse_socket: false,
    }
}
