//! Per-variant register sequences.
//!
//! Each sequence is a list of steps replayed in order. The values come from
//! the vendor's reference drivers and have to be reproduced exactly.

use super::chip::{ChipFeatures, ChipVariant};
use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::Platform;
use super::regs::RegisterSpace;
use super::{HostInner, RtsxHost};
use crate::err::SdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InitOp {
    /// Masked write of an internal register.
    Write { addr: u16, mask: u8, val: u8 },
    /// PHY register write.
    Phy { addr: u8, val: u16 },
    /// PHY read-modify-write: keep the `keep` bits, then or in `set`.
    PhyUpdate { addr: u8, keep: u16, set: u16 },
    Delay(u32),
    /// CARD_DRIVE_SEL from the factory settings.
    CardDrive,
    /// SD30_CMD_DRIVE_SEL from the factory settings.
    CmdDrive,
    /// Same, limited to the drive select field.
    CmdDriveMasked,
    /// Family clk/cmd/dat drive strength triple for the factory selector.
    FillDriving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum When {
    Always,
    Has(ChipFeatures),
    Lacks(ChipFeatures),
    LtrEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    pub when: When,
    pub op: InitOp,
}

const fn always(op: InitOp) -> Step {
    Step { when: When::Always, op }
}

const fn write(addr: u16, val: u8) -> Step {
    always(InitOp::Write { addr, mask: 0xFF, val })
}

const fn bitop(addr: u16, mask: u8, val: u8) -> Step {
    always(InitOp::Write { addr, mask, val })
}

const fn set(addr: u16, bits: u8) -> Step {
    bitop(addr, bits, 0xFF)
}

const fn clr(addr: u16, bits: u8) -> Step {
    bitop(addr, bits, 0x00)
}

const fn phy(addr: u8, val: u16) -> Step {
    always(InitOp::Phy { addr, val })
}

const fn delay(us: u32) -> Step {
    always(InitOp::Delay(us))
}

const fn only(features: ChipFeatures, step: Step) -> Step {
    Step { when: When::Has(features), op: step.op }
}

const fn unless(features: ChipFeatures, step: Step) -> Step {
    Step { when: When::Lacks(features), op: step.op }
}

const CARD_DRIVE: Step = always(InitOp::CardDrive);
const CMD_DRIVE: Step = always(InitOp::CmdDrive);
const CMD_DRIVE_MASKED: Step = always(InitOp::CmdDriveMasked);
const FILL_DRIVING: Step = always(InitOp::FillDriving);

const REV: ChipFeatures = ChipFeatures::IC_REVISION;
const QFN48: ChipFeatures = ChipFeatures::QFN48;
const REVERSE: ChipFeatures = ChipFeatures::REVERSE_SOCKET;

// PHY setup

const RTS5209_PHY: &[Step] = &[phy(RTSX_PHY_PCR, 0xB966)];

const RTS5227_PHY: &[Step] = &[
    clr(RTSX_PM_CTRL3, RTSX_D3_DELINK_MODE_EN),
    // RX sensitivity
    phy(RTSX_PHY_PCR, 0xBA42),
];

const RTS5229_PHY: &[Step] = &[phy(RTSX_PHY_PCR, 0xBA42)];

const RTS522A_PHY: &[Step] = &[
    clr(RTSX_RTS522A_PM_CTRL3, RTSX_D3_DELINK_MODE_EN),
    only(REV, phy(RTSX_PHY_RCR2, RTSX_PHY_RCR2_INIT_27S)),
    phy(RTSX_PHY_RCR1, RTSX_PHY_RCR1_INIT_27S),
    phy(RTSX_PHY_FLD0, RTSX_PHY_FLD0_INIT_27S),
    phy(RTSX_PHY_FLD3, RTSX_PHY_FLD3_INIT_27S),
    phy(RTSX_PHY_FLD4, RTSX_PHY_FLD4_INIT_27S),
];

const RTS525A_PHY: &[Step] = &[
    phy(
        RTSX_PHY_FLD0_525A,
        RTSX_PHY_FLD0_CLK_REQ_20C
            | RTSX_PHY_FLD0_RX_IDLE_EN
            | RTSX_PHY_FLD0_BIT_ERR_RSTN
            | RTSX_PHY_FLD0_BER_COUNT
            | RTSX_PHY_FLD0_BER_TIMER
            | RTSX_PHY_FLD0_CHECK_EN,
    ),
    phy(
        RTSX_PHY_ANA03,
        RTSX_PHY_ANA03_TIMER_MAX | RTSX_PHY_ANA03_OOBS_DEB_EN | RTSX_PHY_CMU_DEBUG_EN,
    ),
    only(
        REV,
        phy(
            RTSX_PHY_REV0,
            RTSX_PHY_REV0_FILTER_OUT
                | RTSX_PHY_REV0_CDR_BYPASS_PFD
                | RTSX_PHY_REV0_CDR_RX_IDLE_BYPASS,
        ),
    ),
];

const RTS5249_PHY: &[Step] = &[
    clr(RTSX_RTS522A_PM_CTRL3, RTSX_D3_DELINK_MODE_EN),
    phy(
        RTSX_PHY_REV,
        RTSX_PHY_REV_RESV
            | RTSX_PHY_REV_RXIDLE_LATCHED
            | RTSX_PHY_REV_P1_EN
            | RTSX_PHY_REV_RXIDLE_EN
            | RTSX_PHY_REV_CLKREQ_TX_EN
            | RTSX_PHY_REV_RX_PWST
            | RTSX_PHY_REV_CLKREQ_DT_1_0
            | RTSX_PHY_REV_STOP_CLKRD
            | RTSX_PHY_REV_STOP_CLKWR,
    ),
    delay(10),
    phy(
        RTSX_PHY_BPCR,
        RTSX_PHY_BPCR_IBRXSEL
            | RTSX_PHY_BPCR_IBTXSEL
            | RTSX_PHY_BPCR_IB_FILTER
            | RTSX_PHY_BPCR_CMIRROR_EN,
    ),
    phy(
        RTSX_PHY_PCR,
        RTSX_PHY_PCR_FORCE_CODE
            | RTSX_PHY_PCR_OOBS_CALI_50
            | RTSX_PHY_PCR_OOBS_VCM_08
            | RTSX_PHY_PCR_OOBS_SEN_90
            | RTSX_PHY_PCR_RSSI_EN
            | RTSX_PHY_PCR_RX10K,
    ),
    phy(
        RTSX_PHY_RCR2,
        RTSX_PHY_RCR2_EMPHASE_EN
            | RTSX_PHY_RCR2_NADJR
            | RTSX_PHY_RCR2_CDR_SR_2
            | RTSX_PHY_RCR2_FREQSEL_12
            | RTSX_PHY_RCR2_CDR_SC_12P
            | RTSX_PHY_RCR2_CALIB_LATE,
    ),
    phy(
        RTSX_PHY_FLD4,
        RTSX_PHY_FLD4_FLDEN_SEL
            | RTSX_PHY_FLD4_REQ_REF
            | RTSX_PHY_FLD4_RXAMP_OFF
            | RTSX_PHY_FLD4_REQ_ADDA
            | RTSX_PHY_FLD4_BER_COUNT
            | RTSX_PHY_FLD4_BER_TIMER
            | RTSX_PHY_FLD4_BER_CHK_EN,
    ),
    phy(RTSX_PHY_RDR, RTSX_PHY_RDR_RXDSEL_1_9 | RTSX_PHY_SSC_AUTO_PWD),
    phy(RTSX_PHY_RCR1, RTSX_PHY_RCR1_ADP_TIME_4 | RTSX_PHY_RCR1_VCO_COARSE),
    phy(
        RTSX_PHY_FLD3,
        RTSX_PHY_FLD3_TIMER_4 | RTSX_PHY_FLD3_TIMER_6 | RTSX_PHY_FLD3_RXDELINK,
    ),
    phy(
        RTSX_PHY_TUNE,
        RTSX_PHY_TUNE_TUNEREF_1_0
            | RTSX_PHY_TUNE_VBGSEL_1252
            | RTSX_PHY_TUNE_SDBUS_33
            | RTSX_PHY_TUNE_TUNED18
            | RTSX_PHY_TUNE_TUNED12
            | RTSX_PHY_TUNE_TUNEA12,
    ),
];

/// Register block shared by every variant, run after the PHY setup.
pub(crate) const COMMON_INIT: &[Step] = &[
    // mcu_cnt 7 so data is sampled properly
    set(RTSX_CLK_DIV, 0x07),
    clr(RTSX_HOST_SLEEP_STATE, RTSX_HOST_ENTER_S1 | RTSX_HOST_ENTER_S3),
    clr(RTSX_CARD_CLK_EN, RTSX_CARD_CLK_EN_ALL),
    // reset delink mode
    clr(RTSX_CHANGE_LINK_STATE, RTSX_FORCE_RST_CORE_EN | RTSX_NON_STICKY_RST_N_DBG),
    CARD_DRIVE,
    write(RTSX_SSC_CTL1, RTSX_SSC_8X_EN | RTSX_SSC_SEL_4M),
    write(RTSX_SSC_CTL2, 0x12),
    // disable cd_pwr_save
    bitop(RTSX_CHANGE_LINK_STATE, 0x16, RTSX_MAC_PHY_RST_N_DBG),
    set(RTSX_IRQSTAT0, RTSX_LINK_READY_INT),
    // wider PERST# glitch window against bogus card interrupts
    write(RTSX_PERST_GLITCH_WIDTH, 0x80),
    // RC oscillator at 400K
    clr(RTSX_RCCTL, RTSX_RCCTL_F_2M),
];

// Variant specific init

const RTS5209_INIT: &[Step] = &[
    // LED off
    write(RTSX_CARD_GPIO, 0x03),
    clr(RTSX_ASPM_FORCE_CTL, RTSX_ASPM_FORCE_MASK),
    // drive CLKREQ# low to request clock
    bitop(RTSX_PETXCFG, 0x08, 0x08),
    write(RTSX_CARD_GPIO_DIR, 0x03),
    CMD_DRIVE,
];

const RTS5227_INIT: &[Step] = &[
    bitop(RTSX_GPIO_CTL, RTSX_GPIO_LED_ON, RTSX_GPIO_LED_ON),
    bitop(RTSX_ASPM_FORCE_CTL, RTSX_ASPM_FORCE_MASK, RTSX_FORCE_ASPM_NO_ASPM),
    // LDO3318 source from DV33 to 3V3
    clr(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33),
    bitop(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33, RTSX_LDO_PWR_SEL_3V3),
    bitop(RTSX_OLT_LED_CTL, 0x0F, RTSX_OLT_LED_PERIOD),
    Step {
        when: When::LtrEnabled,
        op: InitOp::Write { addr: RTSX_LTR_CTL, mask: 0xFF, val: 0xA3 },
    },
    bitop(RTSX_OBFF_CFG, RTSX_OBFF_EN_MASK, RTSX_OBFF_ENABLE),
    FILL_DRIVING,
    only(REVERSE, bitop(RTSX_PETXCFG, 0xB8, 0xB8)),
    unless(REVERSE, bitop(RTSX_PETXCFG, 0xB8, 0x88)),
    clr(RTSX_PM_CTRL3, 0x10),
];

const RTS5229_INIT: &[Step] = &[
    bitop(RTSX_GPIO_CTL, RTSX_GPIO_LED_ON, RTSX_GPIO_LED_ON),
    bitop(RTSX_ASPM_FORCE_CTL, RTSX_ASPM_FORCE_MASK, RTSX_FORCE_ASPM_NO_ASPM),
    bitop(RTSX_PETXCFG, 0x08, 0x08),
    clr(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33),
    bitop(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33, RTSX_LDO_PWR_SEL_3V3),
    bitop(RTSX_OLT_LED_CTL, 0x0F, RTSX_OLT_LED_PERIOD),
    CMD_DRIVE,
];

const RTS522A_INIT_TAIL: &[Step] = &[
    bitop(RTSX_FUNC_FORCE_CTL, RTSX_FUNC_FORCE_UPME_XMT_DBG, RTSX_FUNC_FORCE_UPME_XMT_DBG),
    bitop(RTSX_PCLK_CTL, 0x04, 0x04),
    bitop(RTSX_PM_EVENT_DEBUG, RTSX_PME_DEBUG_0, RTSX_PME_DEBUG_0),
    write(RTSX_PM_CLK_FORCE_CTL, 0x11),
];

const RTS5249_INIT: &[Step] = &[
    clr(RTSX_L1SUB_CONFIG3, 0xFF),
    bitop(RTSX_GPIO_CTL, RTSX_GPIO_LED_ON, RTSX_GPIO_LED_ON),
    bitop(RTSX_ASPM_FORCE_CTL, RTSX_ASPM_FORCE_MASK, RTSX_FORCE_ASPM_NO_ASPM),
    clr(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33),
    bitop(RTSX_LDO_PWR_SEL, RTSX_LDO_PWR_SEL_DV33, RTSX_LDO_PWR_SEL_3V3),
    bitop(RTSX_OLT_LED_CTL, 0x0F, RTSX_OLT_LED_PERIOD),
    FILL_DRIVING,
    only(REVERSE, bitop(RTSX_PETXCFG, 0xB0, 0xB0)),
    unless(REVERSE, bitop(RTSX_PETXCFG, 0xB0, 0x80)),
];

const RTS525A_INIT_TAIL: &[Step] = &[
    bitop(RTSX_PCLK_CTL, RTSX_PCLK_MODE_SEL, RTSX_PCLK_MODE_SEL),
    only(REV, write(RTSX_L1SUB_CONFIG2, RTSX_L1SUB_AUTO_CFG)),
    only(REV, bitop(RTSX_RREF_CFG, RTSX_RREF_VBGSEL_MASK, RTSX_RREF_VBGSEL_1V25)),
    only(REV, bitop(RTSX_LDO_VIO_CFG, RTSX_LDO_VIO_TUNE_MASK, RTSX_LDO_VIO_1V7)),
    only(REV, bitop(RTSX_LDO_DV12S_CFG, RTSX_LDO_D12_TUNE_MASK, RTSX_LDO_D12_TUNE_DF)),
    only(REV, bitop(RTSX_LDO_AV12S_CFG, RTSX_LDO_AV12S_TUNE_MASK, RTSX_LDO_AV12S_TUNE_DF)),
    only(REV, bitop(RTSX_LDO_VCC_CFG0, RTSX_LDO_VCC_LMTVTH_MASK, RTSX_LDO_VCC_LMTVTH_2A)),
    only(REV, bitop(RTSX_OOBS_CONFIG, RTSX_OOBS_AUTOK_DIS | RTSX_OOBS_VAL_MASK, 0x89)),
];

const RTL8411_INIT: &[Step] = &[
    CMD_DRIVE,
    bitop(RTSX_CARD_PAD_CTL, RTSX_CD_DISABLE_MASK | RTSX_CD_AUTO_DISABLE, RTSX_CD_ENABLE),
];

const RTL8411B_INIT: &[Step] = &[
    only(QFN48, write(RTSX_CARD_PULL_CTL3, 0xF5)),
    CMD_DRIVE,
    // SD interrupt
    bitop(RTSX_CARD_PAD_CTL, RTSX_CD_DISABLE_MASK | RTSX_CD_AUTO_DISABLE, RTSX_CD_ENABLE),
    bitop(RTSX_FUNC_FORCE_CTL, 0x06, 0x00),
];

// Power off

const PWR_OFF_5209: &[Step] = &[
    bitop(
        RTSX_CARD_PWR_CTL,
        RTSX_SD_PWR_MASK | RTSX_PMOS_STRG_MASK,
        RTSX_SD_PWR_OFF | RTSX_PMOS_STRG_400mA,
    ),
    set(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_OFF),
];

const PWR_OFF_5227: &[Step] = &[
    bitop(
        RTSX_CARD_PWR_CTL,
        RTSX_SD_PWR_MASK | RTSX_PMOS_STRG_MASK,
        RTSX_SD_PWR_OFF | RTSX_PMOS_STRG_400mA,
    ),
    clr(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK),
];

const PWR_OFF_BPP: &[Step] = &[
    bitop(RTSX_CARD_PWR_CTL, RTSX_BPP_POWER_MASK, RTSX_BPP_POWER_OFF),
    bitop(RTSX_LDO_CTL, RTSX_BPP_LDO_POWB, RTSX_BPP_LDO_SUSPEND),
];

const PWR_OFF_5249: &[Step] = &[
    clr(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK),
    set(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_OFF),
    clr(RTSX_CARD_PWR_CTL, RTSX_PMOS_STRG_800mA),
];

const PULL_OFF_5209: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, RTSX_PULL_CTL_DISABLE12),
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_DISABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_DISABLE3),
];

const PULL_OFF_5227: &[Step] = &[
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_DISABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_DISABLE3),
];

const PULL_OFF_5229: &[Step] = &[
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_DISABLE12),
    only(REV, write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_DISABLE3_TYPE_C)),
    unless(REV, write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_DISABLE3)),
];

const PULL_OFF_5249: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, 0x66),
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_DISABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_DISABLE3),
    write(RTSX_CARD_PULL_CTL4, 0x55),
];

const PULL_OFF_8411: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, 0x65),
    write(RTSX_CARD_PULL_CTL2, 0x55),
    write(RTSX_CARD_PULL_CTL3, 0x95),
    write(RTSX_CARD_PULL_CTL4, 0x09),
    write(RTSX_CARD_PULL_CTL5, 0x05),
    write(RTSX_CARD_PULL_CTL6, 0x04),
];

const PULL_OFF_8411B: &[Step] = &[
    only(QFN48, write(RTSX_CARD_PULL_CTL2, 0x55)),
    only(QFN48, write(RTSX_CARD_PULL_CTL3, 0xF5)),
    only(QFN48, write(RTSX_CARD_PULL_CTL6, 0x15)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL1, 0x65)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL2, 0x55)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL3, 0xD5)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL4, 0x59)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL5, 0x55)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL6, 0x15)),
];

// Power on

const PULL_ON_5209: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, RTSX_PULL_CTL_ENABLE12),
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_ENABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_ENABLE3),
];

const PULL_ON_5227: &[Step] = &[
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_ENABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_ENABLE3),
];

const PULL_ON_5229: &[Step] = &[
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_ENABLE12),
    only(REV, write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_ENABLE3_TYPE_C)),
    unless(REV, write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_ENABLE3)),
];

const PULL_ON_5249: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, 0x66),
    write(RTSX_CARD_PULL_CTL2, RTSX_PULL_CTL_ENABLE12),
    write(RTSX_CARD_PULL_CTL3, RTSX_PULL_CTL_ENABLE3),
    write(RTSX_CARD_PULL_CTL4, 0xAA),
];

const PULL_ON_8411: &[Step] = &[
    write(RTSX_CARD_PULL_CTL1, 0xAA),
    write(RTSX_CARD_PULL_CTL2, 0xAA),
    write(RTSX_CARD_PULL_CTL3, 0xA9),
    write(RTSX_CARD_PULL_CTL4, 0x09),
    write(RTSX_CARD_PULL_CTL5, 0x09),
    write(RTSX_CARD_PULL_CTL6, 0x04),
];

const PULL_ON_8411B: &[Step] = &[
    only(QFN48, write(RTSX_CARD_PULL_CTL2, 0xAA)),
    only(QFN48, write(RTSX_CARD_PULL_CTL3, 0xF9)),
    only(QFN48, write(RTSX_CARD_PULL_CTL6, 0x19)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL1, 0xAA)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL2, 0xAA)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL3, 0xD9)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL4, 0x59)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL5, 0x55)),
    unless(QFN48, write(RTSX_CARD_PULL_CTL6, 0x15)),
];

// The BPP FET would cause an inrush spike if switched fully on at once.
const RAMP_BPP: &[Step] = &[
    bitop(RTSX_CARD_PWR_CTL, RTSX_BPP_POWER_MASK, RTSX_BPP_POWER_5_PERCENT_ON),
    bitop(RTSX_LDO_CTL, RTSX_BPP_LDO_POWB, RTSX_BPP_LDO_SUSPEND),
    delay(150),
    bitop(RTSX_CARD_PWR_CTL, RTSX_BPP_POWER_MASK, RTSX_BPP_POWER_10_PERCENT_ON),
    delay(150),
    bitop(RTSX_CARD_PWR_CTL, RTSX_BPP_POWER_MASK, RTSX_BPP_POWER_15_PERCENT_ON),
    delay(150),
    bitop(RTSX_CARD_PWR_CTL, RTSX_BPP_POWER_MASK, RTSX_BPP_POWER_ON),
    bitop(RTSX_LDO_CTL, RTSX_BPP_LDO_POWB, RTSX_BPP_LDO_ON),
];

const RAMP_5209: &[Step] = &[
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PARTIAL_PWR_ON),
    bitop(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK, RTSX_LDO3318_VCC2),
    delay(200),
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PWR_ON),
    bitop(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK, RTSX_LDO3318_ON),
];

const RAMP_5227: &[Step] = &[
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PARTIAL_PWR_ON),
    bitop(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK, RTSX_LDO3318_VCC1),
    delay(200),
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PWR_ON),
    bitop(
        RTSX_PWR_GATE_CTRL,
        RTSX_LDO3318_PWR_MASK,
        RTSX_LDO3318_VCC1 | RTSX_LDO3318_VCC2,
    ),
];

const RAMP_525A: &[Step] = &[
    bitop(RTSX_LDO_VCC_CFG1, RTSX_LDO_VCC_TUNE_MASK, RTSX_LDO_VCC_3V3),
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PARTIAL_PWR_ON),
    bitop(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK, RTSX_LDO3318_VCC1),
    delay(200),
    bitop(RTSX_CARD_PWR_CTL, RTSX_SD_PWR_MASK, RTSX_SD_PWR_ON),
    bitop(
        RTSX_PWR_GATE_CTRL,
        RTSX_LDO3318_PWR_MASK,
        RTSX_LDO3318_VCC1 | RTSX_LDO3318_VCC2,
    ),
];

// VCCQ 3.3 V

const VCCQ_5227: &[Step] = &[phy(RTSX_PHY_TUNE, 0x4FE4), FILL_DRIVING];

const VCCQ_5229: &[Step] = &[CMD_DRIVE_MASKED, phy(RTSX_PHY_TUNE, 0x4FE4)];

const VCCQ_522A: &[Step] = &[phy(RTSX_PHY_TUNE, 0x57E4), FILL_DRIVING];

const VCCQ_525A: &[Step] = &[
    bitop(RTSX_LDO_CONFIG2, RTSX_LDO_D3318_MASK, RTSX_LDO_D3318_33V),
    bitop(RTSX_SD_PAD_CTL, RTSX_SD_IO_USING_1V8, 0),
    FILL_DRIVING,
];

const VCCQ_5249: &[Step] = &[
    always(InitOp::PhyUpdate {
        addr: RTSX_PHY_TUNE,
        keep: RTSX_PHY_TUNE_VOLTAGE_MASK,
        set: RTSX_PHY_TUNE_VOLTAGE_3V3,
    }),
    FILL_DRIVING,
];

const VCCQ_8402: &[Step] = &[
    CMD_DRIVE_MASKED,
    bitop(
        RTSX_LDO_CTL,
        (RTSX_BPP_ASIC_MASK << RTSX_BPP_SHIFT_8402) | RTSX_BPP_PAD_MASK,
        (RTSX_BPP_ASIC_3V3 << RTSX_BPP_SHIFT_8402) | RTSX_BPP_PAD_3V3,
    ),
];

const VCCQ_8411: &[Step] = &[
    CMD_DRIVE_MASKED,
    bitop(
        RTSX_LDO_CTL,
        (RTSX_BPP_ASIC_MASK << RTSX_BPP_SHIFT_8411) | RTSX_BPP_PAD_MASK,
        (RTSX_BPP_ASIC_3V3 << RTSX_BPP_SHIFT_8411) | RTSX_BPP_PAD_3V3,
    ),
];

/// Sequences of one variant, in the order they are applied.
pub(crate) struct Quirks {
    pub phy_init: &'static [Step],
    pub init: &'static [&'static [Step]],
    pub power_off: &'static [Step],
    pub pull_off: &'static [Step],
    pub pull_on: &'static [Step],
    pub power_ramp: &'static [Step],
    pub vccq_3v3: &'static [Step],
}

impl ChipVariant {
    pub(crate) fn quirks(&self) -> Quirks {
        match self {
            ChipVariant::Rts5209 => Quirks {
                phy_init: RTS5209_PHY,
                init: &[RTS5209_INIT],
                power_off: PWR_OFF_5209,
                pull_off: PULL_OFF_5209,
                pull_on: PULL_ON_5209,
                power_ramp: RAMP_5209,
                vccq_3v3: &[],
            },
            ChipVariant::Rts5227 => Quirks {
                phy_init: RTS5227_PHY,
                init: &[RTS5227_INIT],
                power_off: PWR_OFF_5227,
                pull_off: PULL_OFF_5227,
                pull_on: PULL_ON_5227,
                power_ramp: RAMP_5227,
                vccq_3v3: VCCQ_5227,
            },
            ChipVariant::Rts5229 => Quirks {
                phy_init: RTS5229_PHY,
                init: &[RTS5229_INIT],
                power_off: PWR_OFF_5227,
                pull_off: PULL_OFF_5229,
                pull_on: PULL_ON_5229,
                power_ramp: RAMP_5227,
                vccq_3v3: VCCQ_5229,
            },
            ChipVariant::Rts522A => Quirks {
                phy_init: RTS522A_PHY,
                init: &[RTS5227_INIT, RTS522A_INIT_TAIL],
                power_off: PWR_OFF_5227,
                pull_off: PULL_OFF_5227,
                pull_on: PULL_ON_5227,
                power_ramp: RAMP_5227,
                vccq_3v3: VCCQ_522A,
            },
            ChipVariant::Rts525A => Quirks {
                phy_init: RTS525A_PHY,
                init: &[RTS5249_INIT, RTS525A_INIT_TAIL],
                power_off: PWR_OFF_5249,
                pull_off: PULL_OFF_5249,
                pull_on: PULL_ON_5249,
                power_ramp: RAMP_525A,
                vccq_3v3: VCCQ_525A,
            },
            ChipVariant::Rts5249 => Quirks {
                phy_init: RTS5249_PHY,
                init: &[RTS5249_INIT],
                power_off: PWR_OFF_5249,
                pull_off: PULL_OFF_5249,
                pull_on: PULL_ON_5249,
                power_ramp: RAMP_5227,
                vccq_3v3: VCCQ_5249,
            },
            ChipVariant::Rtl8402 => Quirks {
                phy_init: &[],
                init: &[RTL8411_INIT],
                power_off: PWR_OFF_BPP,
                pull_off: PULL_OFF_8411,
                pull_on: PULL_ON_8411,
                power_ramp: RAMP_BPP,
                vccq_3v3: VCCQ_8402,
            },
            ChipVariant::Rtl8411 => Quirks {
                phy_init: &[],
                init: &[RTL8411_INIT],
                power_off: PWR_OFF_BPP,
                pull_off: PULL_OFF_8411,
                pull_on: PULL_ON_8411,
                power_ramp: RAMP_BPP,
                vccq_3v3: VCCQ_8411,
            },
            ChipVariant::Rtl8411B => Quirks {
                phy_init: &[],
                init: &[RTL8411B_INIT],
                power_off: PWR_OFF_BPP,
                pull_off: PULL_OFF_8411B,
                pull_on: PULL_ON_8411B,
                power_ramp: RAMP_BPP,
                vccq_3v3: VCCQ_8411,
            },
        }
    }
}

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    /// Replay `steps`, skipping the ones whose condition does not hold.
    pub(crate) fn run_steps(&self, st: &HostInner, steps: &[Step]) -> Result<(), SdError> {
        for step in steps {
            let apply = match step.when {
                When::Always => true,
                When::Has(f) => st.features.contains(f),
                When::Lacks(f) => !st.features.contains(f),
                When::LtrEnabled => self.config.pcie_ltr_enabled,
            };
            if !apply {
                continue;
            }

            match step.op {
                InitOp::Write { addr, mask, val } => self.bus.write(addr, mask, val)?,
                InitOp::Phy { addr, val } => self.bus.write_phy(addr, val)?,
                InitOp::PhyUpdate { addr, keep, set } => {
                    let val = self.bus.read_phy(addr)?;
                    self.bus.write_phy(addr, (val & keep) | set)?;
                }
                InitOp::Delay(us) => self.platform.delay_us(us),
                InitOp::CardDrive => {
                    self.bus.write(RTSX_CARD_DRIVE_SEL, 0xFF, st.drive.card_drive_sel)?
                }
                InitOp::CmdDrive => {
                    self.bus.write(RTSX_SD30_CMD_DRIVE_SEL, 0xFF, st.drive.sd30_drive_sel_3v3)?
                }
                InitOp::CmdDriveMasked => self.bus.write(
                    RTSX_SD30_CMD_DRIVE_SEL,
                    RTSX_SD30_DRIVE_SEL_MASK,
                    st.drive.sd30_drive_sel_3v3,
                )?,
                InitOp::FillDriving => {
                    if let Some([clk, cmd, dat]) =
                        self.device.variant.sd30_driving(st.drive.sd30_drive_sel_3v3)
                    {
                        self.bus.write(RTSX_SD30_CLK_DRIVE_SEL, 0xFF, clk)?;
                        self.bus.write(RTSX_SD30_CMD_DRIVE_SEL, 0xFF, cmd)?;
                        self.bus.write(RTSX_SD30_DAT_DRIVE_SEL, 0xFF, dat)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writes(steps: &[Step], features: ChipFeatures) -> Vec<(u16, u8, u8)> {
        steps
            .iter()
            .filter(|s| match s.when {
                When::Always => true,
                When::Has(f) => features.contains(f),
                When::Lacks(f) => !features.contains(f),
                When::LtrEnabled => false,
            })
            .filter_map(|s| match s.op {
                InitOp::Write { addr, mask, val } => Some((addr, mask, val)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bpp_ramp_is_four_stage() {
        let q = ChipVariant::Rtl8411B.quirks();
        let stages: Vec<u8> = writes(q.power_ramp, ChipFeatures::empty())
            .into_iter()
            .filter(|(addr, _, _)| *addr == RTSX_CARD_PWR_CTL)
            .map(|(_, _, val)| val)
            .collect();
        assert_eq!(
            stages,
            [
                RTSX_BPP_POWER_5_PERCENT_ON,
                RTSX_BPP_POWER_10_PERCENT_ON,
                RTSX_BPP_POWER_15_PERCENT_ON,
                RTSX_BPP_POWER_ON
            ]
        );
        let delays = q.power_ramp.iter().filter(|s| s.op == InitOp::Delay(150)).count();
        assert_eq!(delays, 3);
    }

    #[test]
    fn only_rtl84xx_switch_power_through_bpp() {
        let all = [
            ChipVariant::Rts5209,
            ChipVariant::Rts5227,
            ChipVariant::Rts5229,
            ChipVariant::Rts522A,
            ChipVariant::Rts525A,
            ChipVariant::Rts5249,
            ChipVariant::Rtl8402,
            ChipVariant::Rtl8411,
            ChipVariant::Rtl8411B,
        ];
        for v in all {
            let bpp = matches!(v, ChipVariant::Rtl8402 | ChipVariant::Rtl8411 | ChipVariant::Rtl8411B);
            assert_eq!(v.quirks().power_ramp == RAMP_BPP, bpp, "{}", v);
            assert_eq!(v.quirks().power_off == PWR_OFF_BPP, bpp, "{}", v);
        }
    }

    #[test]
    fn power_gate_polarity_differs_by_family() {
        let off_5209 = writes(ChipVariant::Rts5209.quirks().power_off, ChipFeatures::empty());
        assert!(off_5209.contains(&(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_OFF, 0xFF)));
        let off_5227 = writes(ChipVariant::Rts5227.quirks().power_off, ChipFeatures::empty());
        assert!(off_5227.contains(&(RTSX_PWR_GATE_CTRL, RTSX_LDO3318_PWR_MASK, 0x00)));
    }

    #[test]
    fn pull_tables_follow_sub_flags() {
        let q = ChipVariant::Rts5229.quirks();
        assert!(writes(q.pull_on, ChipFeatures::IC_REVISION)
            .contains(&(RTSX_CARD_PULL_CTL3, 0xFF, RTSX_PULL_CTL_ENABLE3_TYPE_C)));
        assert!(writes(q.pull_on, ChipFeatures::empty())
            .contains(&(RTSX_CARD_PULL_CTL3, 0xFF, RTSX_PULL_CTL_ENABLE3)));

        let q = ChipVariant::Rtl8411B.quirks();
        assert_eq!(writes(q.pull_off, ChipFeatures::QFN48).len(), 3);
        assert_eq!(writes(q.pull_off, ChipFeatures::empty()).len(), 6);
    }

    #[test]
    fn socket_orientation_selects_petxcfg() {
        let q = ChipVariant::Rts5227.quirks();
        let petx = |f| {
            writes(q.init[0], f)
                .into_iter()
                .filter(|(addr, _, _)| *addr == RTSX_PETXCFG)
                .collect::<Vec<_>>()
        };
        assert_eq!(petx(ChipFeatures::REVERSE_SOCKET), [(RTSX_PETXCFG, 0xB8, 0xB8)]);
        assert_eq!(petx(ChipFeatures::empty()), [(RTSX_PETXCFG, 0xB8, 0x88)]);
    }

    #[test]
    fn rtl84xx_has_no_phy_setup() {
        for v in [ChipVariant::Rtl8402, ChipVariant::Rtl8411, ChipVariant::Rtl8411B] {
            assert!(v.quirks().phy_init.is_empty());
        }
        assert_eq!(ChipVariant::Rts5209.quirks().phy_init, [phy(RTSX_PHY_PCR, 0xB966)]);
    }
}
