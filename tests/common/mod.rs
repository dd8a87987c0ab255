//! Simulated rtsx chip for driving the host from ordinary `#[test]`s.
//!
//! The model covers what the host relies on: the HAIMR, PHY and config
//! indirect buses, the descriptor engine, the ping-pong buffer, the
//! ring-buffer DMA engine and the interrupt status register. Time is
//! virtual: it only moves through `delay_us` and unanswered sleeps.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rtsx::rtsx::constant::*;
use rtsx::rtsx::{probe, DmaBuffer, Platform, RegisterSpace, RtsxConfig, RtsxHost, WaitChannel};
use rtsx::SdError;

pub const CARD_SIZE: usize = 64 * 1024;
pub const CMD_BUF_ADDR: u64 = 0x1000;
pub const DATA_BUF_ADDR: u64 = 0x10_0000;

/// First 15 bytes of the R2 payload the card answers with.
pub const CID: [u8; 15] = [
    0x03, 0x53, 0x44, 0x53, 0x55, 0x33, 0x32, 0x47, 0x80, 0x12, 0x34, 0x56, 0x78, 0x01, 0x4A,
];

/// Card status word returned for every short response.
pub const CARD_STATUS: u32 = 0x0000_0900;

fn reg(addr: u16) -> usize {
    (addr & 0x3FFF) as usize
}

/// Bulk memory shared between a host buffer and the chip.
#[derive(Clone)]
pub struct FakeDma {
    addr: u64,
    mem: Arc<Mutex<Vec<u8>>>,
}

impl FakeDma {
    pub fn new(addr: u64, len: usize) -> Self {
        Self { addr, mem: Arc::new(Mutex::new(vec![0; len])) }
    }
}

impl DmaBuffer for FakeDma {
    fn bus_addr(&self) -> u64 {
        self.addr
    }

    fn capacity(&self) -> usize {
        self.mem.lock().unwrap().len()
    }

    fn read_at(&self, offset: usize, dst: &mut [u8]) {
        let mem = self.mem.lock().unwrap();
        dst.copy_from_slice(&mem[offset..offset + dst.len()]);
    }

    fn write_at(&mut self, offset: usize, src: &[u8]) {
        let mut mem = self.mem.lock().unwrap();
        mem[offset..offset + src.len()].copy_from_slice(src);
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingDma {
    from_card: bool,
    offset: usize,
}

struct ChipState {
    regs: Vec<u8>,
    haimr: u32,
    bier: u32,
    bipr: u32,
    hcbar: u32,
    hdbar: u32,
    inserted: bool,
    write_protect: bool,
    stalled: bool,
    crc_fault: bool,
    card: Vec<u8>,
    cfg: HashMap<u16, u32>,
    phy: HashMap<u8, u16>,
    dma: Vec<FakeDma>,
    pending: Option<PendingDma>,
    // Argument of the last command answered by the card.
    last_arg: u32,
    writes: Vec<(u16, u8, u8)>,
    batches: usize,
}

/// Register-level model of the card reader plus one inserted card.
pub struct FakeChip {
    state: Mutex<ChipState>,
    accesses: AtomicUsize,
}

impl FakeChip {
    pub fn new() -> Self {
        let mut card = vec![0u8; CARD_SIZE];
        for (i, b) in card.iter_mut().enumerate() {
            *b = (i * 7 + i / 512) as u8;
        }
        Self {
            state: Mutex::new(ChipState {
                regs: vec![0; 0x4000],
                haimr: 0,
                bier: 0,
                bipr: 0,
                hcbar: 0,
                hdbar: 0,
                inserted: true,
                write_protect: false,
                stalled: false,
                crc_fault: false,
                card,
                cfg: HashMap::new(),
                phy: HashMap::new(),
                dma: Vec::new(),
                pending: None,
                last_arg: 0,
                writes: Vec::new(),
                batches: 0,
            }),
            accesses: AtomicUsize::new(0),
        }
    }

    pub fn attach_dma(&self, buf: &FakeDma) {
        self.state.lock().unwrap().dma.push(buf.clone());
    }

    pub fn set_cfg(&self, addr: u16, val: u32) {
        self.state.lock().unwrap().cfg.insert(addr, val);
    }

    pub fn set_reg(&self, addr: u16, val: u8) {
        self.state.lock().unwrap().regs[reg(addr)] = val;
    }

    pub fn reg(&self, addr: u16) -> u8 {
        self.state.lock().unwrap().regs[reg(addr)]
    }

    pub fn phy(&self, addr: u8) -> Option<u16> {
        self.state.lock().unwrap().phy.get(&addr).copied()
    }

    /// Seat a card and latch the card-detect interrupt.
    pub fn insert(&self) {
        let mut st = self.state.lock().unwrap();
        st.inserted = true;
        st.bipr |= RTSX_SD_INT;
    }

    pub fn remove(&self) {
        let mut st = self.state.lock().unwrap();
        st.inserted = false;
        st.bipr |= RTSX_SD_INT;
    }

    pub fn set_write_protect(&self, on: bool) {
        self.state.lock().unwrap().write_protect = on;
    }

    /// A stalled chip accepts batches but never completes them.
    pub fn set_stalled(&self, on: bool) {
        self.state.lock().unwrap().stalled = on;
    }

    /// Fail the next data phase with a CRC16 error.
    pub fn inject_crc_fault(&self) {
        self.state.lock().unwrap().crc_fault = true;
    }

    pub fn card(&self, offset: usize, len: usize) -> Vec<u8> {
        self.state.lock().unwrap().card[offset..offset + len].to_vec()
    }

    /// Internal register writes in order, from both the HAIMR port and
    /// the descriptor engine.
    pub fn writes(&self) -> Vec<(u16, u8, u8)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    pub fn wrote(&self, addr: u16) -> bool {
        self.writes().iter().any(|(a, _, _)| *a & 0x3FFF == addr & 0x3FFF)
    }

    pub fn batches(&self) -> usize {
        self.state.lock().unwrap().batches
    }

    /// BAR accesses made by the host so far.
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    pub fn bier(&self) -> u32 {
        self.state.lock().unwrap().bier
    }

    pub fn irq_pending(&self) -> bool {
        let st = self.state.lock().unwrap();
        st.bipr & st.bier != 0
    }

    fn bipr(st: &ChipState) -> u32 {
        let mut v = st.bipr;
        if st.inserted {
            v |= RTSX_SD_EXIST;
        }
        if st.write_protect {
            v |= RTSX_SD_WRITE_PROTECT;
        }
        v
    }

    fn reg_write(st: &mut ChipState, addr: u16, mask: u8, val: u8) -> u8 {
        st.writes.push((addr | 0xC000, mask, val));
        let r = reg(addr);
        let new = (st.regs[r] & !mask) | (val & mask);
        st.regs[r] = new;
        new
    }

    // Side effects of a register write that completes immediately.
    fn settle(st: &mut ChipState, addr: u16) {
        let r = reg(addr);
        if r == reg(RTSX_PHY_RWCTL) && st.regs[r] & RTSX_PHY_BUSY != 0 {
            let pa = st.regs[reg(RTSX_PHY_ADDR)];
            if st.regs[r] & RTSX_PHY_WRITE != 0 {
                let v = u16::from(st.regs[reg(RTSX_PHY_DATA1)]) << 8
                    | u16::from(st.regs[reg(RTSX_PHY_DATA0)]);
                st.phy.insert(pa, v);
            } else {
                let v = st.phy.get(&pa).copied().unwrap_or(0);
                st.regs[reg(RTSX_PHY_DATA0)] = v as u8;
                st.regs[reg(RTSX_PHY_DATA1)] = (v >> 8) as u8;
            }
            st.regs[r] &= !RTSX_PHY_BUSY;
        } else if r == reg(RTSX_CFGRWCTL) && st.regs[r] & RTSX_CFG_BUSY != 0 {
            let ca = u16::from(st.regs[reg(RTSX_CFGADDR1)]) << 8
                | u16::from(st.regs[reg(RTSX_CFGADDR0)]);
            let v = st.cfg.get(&ca).copied().unwrap_or(0).to_le_bytes();
            for (i, b) in v.iter().enumerate() {
                st.regs[reg(RTSX_CFGDATA0) + i] = *b;
            }
            st.regs[r] &= !RTSX_CFG_BUSY;
        } else if r == reg(RTSX_SD_TRANSFER) && st.regs[r] & RTSX_SD_TRANSFER_START != 0 {
            Self::transfer(st);
        }
    }

    fn arg(st: &ChipState) -> u32 {
        u32::from_be_bytes([
            st.regs[reg(RTSX_SD_CMD1)],
            st.regs[reg(RTSX_SD_CMD2)],
            st.regs[reg(RTSX_SD_CMD3)],
            st.regs[reg(RTSX_SD_CMD4)],
        ])
    }

    fn data_len(st: &ChipState) -> usize {
        let bytes = usize::from(st.regs[reg(RTSX_SD_BYTE_CNT_H)]) << 8
            | usize::from(st.regs[reg(RTSX_SD_BYTE_CNT_L)]);
        let blocks = usize::from(st.regs[reg(RTSX_SD_BLOCK_CNT_H)]) << 8
            | usize::from(st.regs[reg(RTSX_SD_BLOCK_CNT_L)]);
        bytes * blocks
    }

    // Run the card side of SD_TRANSFER.
    fn transfer(st: &mut ChipState) {
        let r = reg(RTSX_SD_TRANSFER);
        let mode = st.regs[r] & RTSX_TM_MASK;
        let ppbuf = reg(RTSX_PPBUF_BASE2);
        // The response overwrites the command registers, so writes use the
        // address of the command that preceded them.
        if mode != RTSX_TM_AUTO_WRITE3 {
            st.last_arg = Self::arg(st);
        }
        let offset = st.last_arg as usize * 512;
        let ring = st.regs[reg(RTSX_CARD_DATA_SOURCE)] & 0x01 == RTSX_RING_BUFFER;

        match mode {
            RTSX_TM_CMD_RSP => {
                if st.regs[reg(RTSX_SD_CFG2)] == RTSX_SD_RSP_TYPE_R2 {
                    st.regs[ppbuf] = 0x3F;
                    st.regs[ppbuf + 1..ppbuf + 16].copy_from_slice(&CID);
                } else {
                    let status = CARD_STATUS.to_be_bytes();
                    st.regs[reg(RTSX_SD_CMD1)..=reg(RTSX_SD_CMD4)].copy_from_slice(&status);
                }
            }
            RTSX_TM_NORMAL_READ => {
                let len = Self::data_len(st);
                let (card, regs) = (&st.card, &mut st.regs);
                regs[ppbuf..ppbuf + len].copy_from_slice(&card[offset..offset + len]);
            }
            RTSX_TM_AUTO_WRITE3 if !ring => {
                let len = Self::data_len(st);
                let (card, regs) = (&mut st.card, &st.regs);
                card[offset..offset + len].copy_from_slice(&regs[ppbuf..ppbuf + len]);
            }
            RTSX_TM_AUTO_WRITE3 | RTSX_TM_AUTO_READ1 => {
                st.pending = Some(PendingDma { from_card: mode == RTSX_TM_AUTO_READ1, offset });
            }
            _ => {}
        }

        if st.crc_fault && mode != RTSX_TM_CMD_RSP {
            st.crc_fault = false;
            st.regs[reg(RTSX_SD_STAT1)] = RTSX_SD_CRC16_ERR;
            st.regs[r] &= !RTSX_SD_TRANSFER_START;
            return;
        }
        st.regs[r] = mode | RTSX_SD_TRANSFER_END | RTSX_SD_STAT_IDLE;
    }

    fn dma_buf(st: &ChipState, addr: u32) -> FakeDma {
        st.dma
            .iter()
            .find(|b| b.addr == u64::from(addr))
            .cloned()
            .expect("chip pointed at an unknown DMA buffer")
    }

    fn run_batch(st: &mut ChipState, len: usize) {
        st.batches += 1;
        if st.stalled {
            return;
        }

        let buf = Self::dma_buf(st, st.hcbar);
        let mut raw = vec![0u8; len];
        buf.read_at(0, &mut raw);

        let mut results = Vec::new();
        let mut failed = false;
        for word in raw.chunks_exact(4) {
            let w = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            let op = (w >> 30) as u8;
            let addr = ((w >> 16) & 0x3FFF) as u16;
            let mask = (w >> 8) as u8;
            let data = w as u8;
            match op {
                RTSX_READ_REG_CMD => results.push(st.regs[reg(addr)]),
                RTSX_WRITE_REG_CMD => {
                    Self::reg_write(st, addr, mask, data);
                    Self::settle(st, addr);
                }
                RTSX_CHECK_REG_CMD => {
                    let v = st.regs[reg(addr)];
                    failed |= v & mask != data;
                    results.push(v);
                }
                _ => {}
            }
        }

        let mut buf = buf;
        buf.write_at(0, &results);

        if failed {
            st.pending = None;
            st.bipr |= RTSX_TRANS_FAIL_INT;
        } else if st.pending.is_none() {
            st.bipr |= RTSX_TRANS_OK_INT;
        }
    }

    fn run_dma(st: &mut ChipState, ctl: u32) {
        let Some(pending) = st.pending.take() else {
            return;
        };
        let len = (ctl & 0x00FF_FFFF) as usize;
        assert_eq!(pending.from_card, ctl & RTSX_DMA_READ != 0, "DMA direction mismatch");

        let mut buf = Self::dma_buf(st, st.hdbar);
        let range = pending.offset..pending.offset + len;
        if pending.from_card {
            let data = st.card[range].to_vec();
            buf.write_at(0, &data);
        } else {
            let mut data = vec![0u8; len];
            buf.read_at(0, &mut data);
            st.card[range].copy_from_slice(&data);
        }
        st.bipr |= RTSX_TRANS_OK_INT;
    }
}

/// Host side handle of the simulated BAR.
pub struct ChipRegs(pub Arc<FakeChip>);

impl RegisterSpace for ChipRegs {
    fn read32(&self, offset: u32) -> u32 {
        let chip = &self.0;
        chip.accesses.fetch_add(1, Ordering::SeqCst);
        let st = chip.state.lock().unwrap();
        match offset {
            RTSX_HAIMR => st.haimr,
            RTSX_BIPR => FakeChip::bipr(&st),
            RTSX_BIER => st.bier,
            _ => 0,
        }
    }

    fn write32(&self, offset: u32, value: u32) {
        let chip = &self.0;
        chip.accesses.fetch_add(1, Ordering::SeqCst);
        let mut st = chip.state.lock().unwrap();
        match offset {
            RTSX_HAIMR => {
                let addr = ((value >> 16) & 0x3FFF) as u16;
                if value & RTSX_HAIMR_WRITE != 0 {
                    // The echo shows the value as written, side effects
                    // land in the register file afterwards.
                    let new = FakeChip::reg_write(&mut st, addr, (value >> 8) as u8, value as u8);
                    st.haimr = (u32::from(addr) << 16) | u32::from(new);
                    FakeChip::settle(&mut st, addr);
                } else {
                    st.haimr = (u32::from(addr) << 16) | u32::from(st.regs[reg(addr)]);
                }
            }
            RTSX_BIPR => st.bipr &= !value,
            RTSX_BIER => st.bier = value,
            RTSX_HCBAR => st.hcbar = value,
            RTSX_HCBCTLR if value & RTSX_START_CMD != 0 => {
                FakeChip::run_batch(&mut st, (value & 0x00FF_FFFF) as usize)
            }
            RTSX_HDBAR => st.hdbar = value,
            RTSX_HDBCTLR if value & RTSX_TRIG_DMA != 0 => FakeChip::run_dma(&mut st, value),
            _ => {}
        }
    }
}

type Hook = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct PlatformState {
    now_us: AtomicU64,
    interrupt: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    on_sleep: Mutex<Option<Hook>>,
    sleeps: Mutex<Vec<(WaitChannel, Option<Duration>)>>,
    scheduled: Mutex<Vec<Option<Duration>>>,
    wakeups: AtomicUsize,
    attached: AtomicUsize,
    detached: AtomicUsize,
    drained: AtomicUsize,
}

/// Kernel services for the host, backed by a virtual clock.
#[derive(Clone)]
pub struct TestPlatform {
    chip: Arc<FakeChip>,
    state: Arc<PlatformState>,
}

impl TestPlatform {
    pub fn new(chip: Arc<FakeChip>) -> Self {
        Self { chip, state: Arc::new(PlatformState::default()) }
    }

    /// Route pending chip interrupts to `f` whenever the host sleeps.
    pub fn connect_interrupt(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.state.interrupt.lock().unwrap() = Some(Box::new(f));
    }

    /// Run `f` on the next sleep, once.
    pub fn on_next_sleep(&self, f: impl FnMut() + Send + 'static) {
        *self.state.on_sleep.lock().unwrap() = Some(Box::new(f));
    }

    pub fn now(&self) -> Duration {
        Duration::from_micros(self.state.now_us.load(Ordering::SeqCst))
    }

    pub fn sleeps(&self) -> Vec<(WaitChannel, Option<Duration>)> {
        self.state.sleeps.lock().unwrap().clone()
    }

    pub fn scheduled(&self) -> Vec<Option<Duration>> {
        self.state.scheduled.lock().unwrap().clone()
    }

    pub fn attached(&self) -> usize {
        self.state.attached.load(Ordering::SeqCst)
    }

    pub fn detached(&self) -> usize {
        self.state.detached.load(Ordering::SeqCst)
    }

    pub fn drained(&self) -> usize {
        self.state.drained.load(Ordering::SeqCst)
    }

    pub fn wakeups(&self) -> usize {
        self.state.wakeups.load(Ordering::SeqCst)
    }

    fn advance(&self, by: Duration) {
        self.state.now_us.fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Platform for TestPlatform {
    fn delay_us(&self, us: u32) {
        self.advance(Duration::from_micros(u64::from(us)));
    }

    fn uptime(&self) -> Duration {
        self.now()
    }

    fn sleep(&self, chan: WaitChannel, timeout: Option<Duration>) {
        self.state.sleeps.lock().unwrap().push((chan, timeout));

        let hook = self.state.on_sleep.lock().unwrap().take();
        if let Some(mut hook) = hook {
            hook();
        }

        if chan == WaitChannel::Interrupt && self.chip.irq_pending() {
            if let Some(irq) = self.state.interrupt.lock().unwrap().as_ref() {
                irq();
                return;
            }
        }
        if let Some(t) = timeout {
            self.advance(t);
        }
    }

    fn wakeup(&self, _chan: WaitChannel) {
        self.state.wakeups.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_card_task(&self, delay: Option<Duration>) {
        self.state.scheduled.lock().unwrap().push(delay);
    }

    fn drain_card_task(&self) {
        self.state.drained.fetch_add(1, Ordering::SeqCst);
    }

    fn attach_mmc_bus(&self) -> Result<(), SdError> {
        self.state.attached.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn detach_mmc_bus(&self) -> Result<(), SdError> {
        self.state.detached.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub type TestHost = RtsxHost<ChipRegs, FakeDma, TestPlatform>;

pub struct Rig {
    pub host: Arc<TestHost>,
    pub chip: Arc<FakeChip>,
    pub platform: TestPlatform,
}

/// A host for `device_id` with a `data_len` byte bulk buffer, wired to a
/// simulated chip but not yet initialized.
pub fn rig_with(device_id: u16, data_len: usize, chip: FakeChip) -> Rig {
    let chip = Arc::new(chip);
    let cmd = FakeDma::new(CMD_BUF_ADDR, RTSX_HOSTCMD_BUFSIZE);
    let data = FakeDma::new(DATA_BUF_ADDR, data_len);
    chip.attach_dma(&cmd);
    chip.attach_dma(&data);

    let platform = TestPlatform::new(chip.clone());
    let device = probe(RTSX_PCI_VENDOR_REALTEK, device_id).expect("unknown device id");
    let host = Arc::new(
        RtsxHost::new(
            ChipRegs(chip.clone()),
            device,
            cmd,
            data,
            platform.clone(),
            RtsxConfig::default(),
        )
        .expect("host setup"),
    );

    let weak = Arc::downgrade(&host);
    platform.connect_interrupt(move || {
        if let Some(host) = weak.upgrade() {
            host.handle_interrupt();
        }
    });

    Rig { host, chip, platform }
}

/// An initialized RTS5227 host with a card seated.
pub fn rig() -> Rig {
    let rig = rig_with(0x5227, 16 * 1024, FakeChip::new());
    rig.host.init().expect("init");
    rig
}
