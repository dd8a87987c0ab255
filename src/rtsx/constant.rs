// Host-side registers, 32-bit, relative to the mapped BAR
pub const RTSX_HCBAR: u32 = 0x00;
pub const RTSX_HCBCTLR: u32 = 0x04;
pub const RTSX_START_CMD: u32 = 1 << 31;
pub const RTSX_HW_AUTO_RSP: u32 = 1 << 30;
pub const RTSX_STOP_CMD: u32 = 1 << 28;

pub const RTSX_HDBAR: u32 = 0x08;
pub const RTSX_HDBCTLR: u32 = 0x0C;
pub const RTSX_TRIG_DMA: u32 = 1 << 31;
pub const RTSX_DMA_READ: u32 = 1 << 29;
pub const RTSX_STOP_DMA: u32 = 1 << 28;

pub const RTSX_HAIMR: u32 = 0x10;
pub const RTSX_HAIMR_BUSY: u32 = 0x8000_0000;
pub const RTSX_HAIMR_WRITE: u32 = 0x4000_0000;

// Bus interrupt pending / enable registers
pub const RTSX_BIPR: u32 = 0x14;
pub const RTSX_BIER: u32 = 0x18;

pub const RTSX_TRANS_OK_INT: u32 = 1 << 29;
pub const RTSX_TRANS_FAIL_INT: u32 = 1 << 28;
pub const RTSX_SD_INT: u32 = 1 << 25;
pub const RTSX_SD_WRITE_PROTECT: u32 = 1 << 19;
pub const RTSX_SD_EXIST: u32 = 1 << 16;

pub const RTSX_TRANS_OK_INT_EN: u32 = 1 << 29;
pub const RTSX_TRANS_FAIL_INT_EN: u32 = 1 << 28;
pub const RTSX_SD_INT_EN: u32 = 1 << 25;

// Descriptor micro-operations
pub const RTSX_READ_REG_CMD: u8 = 0;
pub const RTSX_WRITE_REG_CMD: u8 = 1;
pub const RTSX_CHECK_REG_CMD: u8 = 2;

pub const RTSX_HOSTCMD_MAX: usize = 256;
pub const RTSX_HOSTCMD_BUFSIZE: usize = 4 * RTSX_HOSTCMD_MAX;
pub const RTSX_MAX_DATA_BLKLEN: usize = 512;
pub const RTSX_DMA_ALIGN: usize = 4;

// Internal ping-pong buffer window
pub const RTSX_PPBUF_BASE2: u16 = 0xFA00;

// Clock and SSC
pub const RTSX_FPDCTL: u16 = 0xFC00;
pub const RTSX_SSC_POWER_DOWN: u8 = 0x01;
pub const RTSX_CLK_CTL: u16 = 0xFC02;
pub const RTSX_CLK_LOW_FREQ: u8 = 0x01;
pub const RTSX_CLK_DIV: u16 = 0xFC03;
pub const RTSX_CLK_DIV_2: u8 = 0x02;
pub const RTSX_CLK_DIV_4: u8 = 0x03;
pub const RTSX_CLK_DIV_8: u8 = 0x04;
pub const RTSX_SSC_DIV_N_0: u16 = 0xFC0F;
pub const RTSX_SSC_CTL1: u16 = 0xFC11;
pub const RTSX_RSTB: u8 = 0x80;
pub const RTSX_SSC_8X_EN: u8 = 0x40;
pub const RTSX_SSC_SEL_4M: u8 = 0x10;
pub const RTSX_SSC_CTL2: u16 = 0xFC12;
pub const RTSX_SSC_DEPTH_MASK: u8 = 0x07;
pub const RTSX_RCCTL: u16 = 0xFC14;
pub const RTSX_RCCTL_F_2M: u8 = 0x01;
pub const RTSX_OLT_LED_CTL: u16 = 0xFC1E;
pub const RTSX_OLT_LED_PERIOD: u8 = 0x02;
pub const RTSX_GPIO_CTL: u16 = 0xFC1F;
pub const RTSX_GPIO_LED_ON: u8 = 0x02;
pub const RTSX_CARD_CLK_SOURCE: u16 = 0xFC2E;
pub const RTSX_CRC_FIX_CLK: u8 = 0x00;
pub const RTSX_SD30_VAR_CLK0: u8 = 0x04;
pub const RTSX_SAMPLE_VAR_CLK1: u8 = 0x20;
pub const RTSX_RTL8411B_PACKAGE: u16 = 0xFC35;
pub const RTSX_RTL8411B_QFN48: u8 = 0x02;

// LDO control shared by the RTL84xx BPP power switch
pub const RTSX_LDO_CTL: u16 = 0xFC1E;
pub const RTSX_BPP_ASIC_3V3: u8 = 0x07;
pub const RTSX_BPP_ASIC_MASK: u8 = 0x07;
pub const RTSX_BPP_PAD_3V3: u8 = 0x04;
pub const RTSX_BPP_PAD_MASK: u8 = 0x04;
pub const RTSX_BPP_LDO_POWB: u8 = 0x03;
pub const RTSX_BPP_LDO_ON: u8 = 0x00;
pub const RTSX_BPP_LDO_SUSPEND: u8 = 0x02;
pub const RTSX_BPP_SHIFT_8402: u8 = 5;
pub const RTSX_BPP_SHIFT_8411: u8 = 4;

// Card power and card selection
pub const RTSX_CARD_PWR_CTL: u16 = 0xFD50;
pub const RTSX_SD_PWR_ON: u8 = 0x00;
pub const RTSX_SD_PARTIAL_PWR_ON: u8 = 0x01;
pub const RTSX_SD_PWR_OFF: u8 = 0x03;
pub const RTSX_SD_PWR_MASK: u8 = 0x03;
pub const RTSX_PMOS_STRG_MASK: u8 = 0x10;
pub const RTSX_PMOS_STRG_400mA: u8 = 0x00;
pub const RTSX_PMOS_STRG_800mA: u8 = 0x10;
pub const RTSX_BPP_POWER_MASK: u8 = 0x0F;
pub const RTSX_BPP_POWER_5_PERCENT_ON: u8 = 0x0E;
pub const RTSX_BPP_POWER_10_PERCENT_ON: u8 = 0x0C;
pub const RTSX_BPP_POWER_15_PERCENT_ON: u8 = 0x08;
pub const RTSX_BPP_POWER_ON: u8 = 0x00;
pub const RTSX_BPP_POWER_OFF: u8 = 0x0F;
pub const RTSX_CARD_SHARE_MODE: u16 = 0xFD52;
pub const RTSX_CARD_SHARE_48_SD: u8 = 0x04;
pub const RTSX_CARD_DRIVE_SEL: u16 = 0xFD53;
pub const RTSX_CARD_STOP: u16 = 0xFD54;
pub const RTSX_SD_STOP: u8 = 0x04;
pub const RTSX_SD_CLR_ERR: u8 = 0x40;
pub const RTSX_CARD_OE: u16 = 0xFD55;
pub const RTSX_SD_OUTPUT_EN: u8 = 0x04;
pub const RTSX_CARD_OUTPUT_EN: u8 = 0x04;
pub const RTSX_CARD_GPIO_DIR: u16 = 0xFD57;
pub const RTSX_CARD_GPIO: u16 = 0xFD58;
pub const RTSX_SD30_CLK_DRIVE_SEL: u16 = 0xFD5A;
pub const RTSX_CARD_DATA_SOURCE: u16 = 0xFD5B;
pub const RTSX_RING_BUFFER: u8 = 0x00;
pub const RTSX_PINGPONG_BUFFER: u8 = 0x01;
pub const RTSX_CARD_SELECT: u16 = 0xFD5C;
pub const RTSX_SD_MOD_SEL: u8 = 0x02;
pub const RTSX_SD30_CMD_DRIVE_SEL: u16 = 0xFD5E;
pub const RTSX_SD30_DAT_DRIVE_SEL: u16 = 0xFD5F;
pub const RTSX_SD30_DRIVE_SEL_MASK: u8 = 0x07;
pub const RTSX_CARD_PULL_CTL1: u16 = 0xFD60;
pub const RTSX_CARD_PULL_CTL2: u16 = 0xFD61;
pub const RTSX_CARD_PULL_CTL3: u16 = 0xFD62;
pub const RTSX_CARD_PULL_CTL4: u16 = 0xFD63;
pub const RTSX_CARD_PULL_CTL5: u16 = 0xFD64;
pub const RTSX_CARD_PULL_CTL6: u16 = 0xFD65;
pub const RTSX_CARD_CLK_EN: u16 = 0xFD69;
pub const RTSX_SD_CLK_EN: u8 = 0x04;
pub const RTSX_CARD_CLK_EN_ALL: u8 = 0x1E;
pub const RTSX_CARD_PAD_CTL: u16 = 0xFD73;
pub const RTSX_CD_DISABLE_MASK: u8 = 0x07;
pub const RTSX_CD_AUTO_DISABLE: u8 = 0x40;
pub const RTSX_CD_ENABLE: u8 = 0x00;

// Pull resistor presets
pub const RTSX_PULL_CTL_DISABLE12: u8 = 0x55;
pub const RTSX_PULL_CTL_DISABLE3: u8 = 0xD5;
pub const RTSX_PULL_CTL_DISABLE3_TYPE_C: u8 = 0xE5;
pub const RTSX_PULL_CTL_ENABLE12: u8 = 0xAA;
pub const RTSX_PULL_CTL_ENABLE3: u8 = 0xE9;
pub const RTSX_PULL_CTL_ENABLE3_TYPE_C: u8 = 0xD9;

// SD engine
pub const RTSX_SD_CFG1: u16 = 0xFDA0;
pub const RTSX_CLK_DIVIDE_MASK: u8 = 0xC0;
pub const RTSX_SD20_MODE: u8 = 0x00;
pub const RTSX_SD_MODE_MASK: u8 = 0x0C;
pub const RTSX_BUS_WIDTH_1: u8 = 0x00;
pub const RTSX_BUS_WIDTH_4: u8 = 0x01;
pub const RTSX_BUS_WIDTH_8: u8 = 0x02;
pub const RTSX_BUS_WIDTH_MASK: u8 = 0x03;

pub const RTSX_SD_CFG2: u16 = 0xFDA1;
pub const RTSX_SD_CALCULATE_CRC7: u8 = 0x00;
pub const RTSX_SD_NO_CALCULATE_CRC7: u8 = 0x80;
pub const RTSX_SD_CHECK_CRC16: u8 = 0x00;
pub const RTSX_SD_NO_WAIT_BUSY_END: u8 = 0x00;
pub const RTSX_SD_CHECK_CRC7: u8 = 0x00;
pub const RTSX_SD_NO_CHECK_CRC7: u8 = 0x04;
pub const RTSX_SD_RSP_LEN_0: u8 = 0x00;
pub const RTSX_SD_RSP_LEN_6: u8 = 0x01;

// Response type codes programmed into SD_CFG2
pub const RTSX_SD_RSP_TYPE_R0: u8 = 0x04;
pub const RTSX_SD_RSP_TYPE_R1: u8 = 0x01;
pub const RTSX_SD_RSP_TYPE_R1B: u8 = 0x09;
pub const RTSX_SD_RSP_TYPE_R2: u8 = 0x02;
pub const RTSX_SD_RSP_TYPE_R3: u8 = 0x05;
pub const RTSX_SD_RSP_TYPE_R4: u8 = 0x05;
pub const RTSX_SD_RSP_TYPE_R5: u8 = 0x01;
pub const RTSX_SD_RSP_TYPE_R6: u8 = 0x01;
pub const RTSX_SD_RSP_TYPE_R7: u8 = 0x01;

pub const RTSX_SD_STAT1: u16 = 0xFDA3;
pub const RTSX_SD_CRC7_ERR: u8 = 0x80;
pub const RTSX_SD_CRC16_ERR: u8 = 0x40;
pub const RTSX_SD_CRC_WRITE_ERR: u8 = 0x20;
pub const RTSX_SD_CRC_ERR: u8 = RTSX_SD_CRC7_ERR | RTSX_SD_CRC16_ERR | RTSX_SD_CRC_WRITE_ERR;
pub const RTSX_SD_BUS_STAT: u16 = 0xFDA5;
pub const RTSX_SD_CLK_FORCE_STOP: u8 = 0x40;
pub const RTSX_SD_PAD_CTL: u16 = 0xFDA6;
pub const RTSX_SD_IO_USING_1V8: u8 = 0x80;
pub const RTSX_SD_SAMPLE_POINT_CTL: u16 = 0xFDA7;
pub const RTSX_SD20_RX_POS_EDGE: u8 = 0x00;
pub const RTSX_SD20_RX_14_DELAY: u8 = 0x08;
pub const RTSX_SD20_RX_SEL_MASK: u8 = 0x08;
pub const RTSX_SD_PUSH_POINT_CTL: u16 = 0xFDA8;
pub const RTSX_SD20_TX_NEG_EDGE: u8 = 0x00;
pub const RTSX_SD20_TX_14_AHEAD: u8 = 0x01;
pub const RTSX_SD20_TX_SEL_MASK: u8 = 0x01;
pub const RTSX_SD_CMD0: u16 = 0xFDA9;
pub const RTSX_SD_CMD_START: u8 = 0x40;
pub const RTSX_SD_CMD1: u16 = 0xFDAA;
pub const RTSX_SD_CMD2: u16 = 0xFDAB;
pub const RTSX_SD_CMD3: u16 = 0xFDAC;
pub const RTSX_SD_CMD4: u16 = 0xFDAD;
pub const RTSX_SD_BYTE_CNT_L: u16 = 0xFDAF;
pub const RTSX_SD_BYTE_CNT_H: u16 = 0xFDB0;
pub const RTSX_SD_BLOCK_CNT_L: u16 = 0xFDB1;
pub const RTSX_SD_BLOCK_CNT_H: u16 = 0xFDB2;
pub const RTSX_SD_TRANSFER: u16 = 0xFDB3;
pub const RTSX_SD_TRANSFER_START: u8 = 0x80;
pub const RTSX_SD_TRANSFER_END: u8 = 0x40;
pub const RTSX_SD_STAT_IDLE: u8 = 0x20;
pub const RTSX_TM_AUTO_WRITE3: u8 = 0x01;
pub const RTSX_TM_CMD_RSP: u8 = 0x08;
pub const RTSX_TM_NORMAL_READ: u8 = 0x0C;
pub const RTSX_TM_AUTO_READ1: u8 = 0x0D;
pub const RTSX_TM_MASK: u8 = 0x0F;

// IRQ, DMA and ring buffer
pub const RTSX_IRQSTAT0: u16 = 0xFE21;
pub const RTSX_DMA_DONE_INT: u8 = 0x80;
pub const RTSX_LINK_READY_INT: u8 = 0x20;
pub const RTSX_DMATC0: u16 = 0xFE28;
pub const RTSX_DMATC1: u16 = 0xFE29;
pub const RTSX_DMATC2: u16 = 0xFE2A;
pub const RTSX_DMATC3: u16 = 0xFE2B;
pub const RTSX_DMACTL: u16 = 0xFE2C;
pub const RTSX_DMA_EN: u8 = 0x01;
pub const RTSX_DMA_DIR: u8 = 0x02;
pub const RTSX_DMA_DIR_TO_CARD: u8 = 0x00;
pub const RTSX_DMA_DIR_FROM_CARD: u8 = 0x02;
pub const RTSX_DMA_PACK_SIZE_MASK: u8 = 0x30;
pub const RTSX_DMA_512: u8 = 0x20;
pub const RTSX_DMA_RST: u8 = 0x80;
pub const RTSX_RBCTL: u16 = 0xFE34;
pub const RTSX_RB_FLUSH: u8 = 0x80;

// PHY and configuration space access
pub const RTSX_PHY_RWCTL: u16 = 0xFE3C;
pub const RTSX_PHY_READ: u8 = 0x00;
pub const RTSX_PHY_WRITE: u8 = 0x01;
pub const RTSX_PHY_BUSY: u8 = 0x80;
pub const RTSX_PHY_DATA0: u16 = 0xFE3D;
pub const RTSX_PHY_DATA1: u16 = 0xFE3E;
pub const RTSX_PHY_ADDR: u16 = 0xFE3F;
pub const RTSX_CFGADDR0: u16 = 0xFE40;
pub const RTSX_CFGADDR1: u16 = 0xFE41;
pub const RTSX_CFGDATA0: u16 = 0xFE42;
pub const RTSX_CFGRWCTL: u16 = 0xFE46;
pub const RTSX_CFG_BUSY: u8 = 0x80;

// PCIe link and power management
pub const RTSX_PETXCFG: u16 = 0xFE49;
pub const RTSX_LTR_CTL: u16 = 0xFE4A;
pub const RTSX_OBFF_CFG: u16 = 0xFE4C;
pub const RTSX_OBFF_EN_MASK: u8 = 0x03;
pub const RTSX_OBFF_ENABLE: u8 = 0x03;
pub const RTSX_PCLK_CTL: u16 = 0xFE55;
pub const RTSX_PCLK_MODE_SEL: u8 = 0x20;
pub const RTSX_ASPM_FORCE_CTL: u16 = 0xFE57;
pub const RTSX_ASPM_FORCE_MASK: u8 = 0x3F;
pub const RTSX_FORCE_ASPM_NO_ASPM: u8 = 0x00;
pub const RTSX_PM_CLK_FORCE_CTL: u16 = 0xFE58;
pub const RTSX_CHANGE_LINK_STATE: u16 = 0xFE5B;
pub const RTSX_FORCE_RST_CORE_EN: u8 = 0x10;
pub const RTSX_NON_STICKY_RST_N_DBG: u8 = 0x08;
pub const RTSX_MAC_PHY_RST_N_DBG: u8 = 0x04;
pub const RTSX_PERST_GLITCH_WIDTH: u16 = 0xFE5C;
pub const RTSX_FUNC_FORCE_CTL: u16 = 0xFE5F;
pub const RTSX_FUNC_FORCE_UPME_XMT_DBG: u8 = 0x02;
pub const RTSX_HOST_SLEEP_STATE: u16 = 0xFE60;
pub const RTSX_HOST_ENTER_S1: u8 = 0x01;
pub const RTSX_HOST_ENTER_S3: u8 = 0x02;
pub const RTSX_PM_EVENT_DEBUG: u16 = 0xFE71;
pub const RTSX_PME_DEBUG_0: u8 = 0x08;
pub const RTSX_NFTS_TX_CTRL: u16 = 0xFE72;
pub const RTSX_INT_READ_CLR: u8 = 0x02;
pub const RTSX_PWR_GATE_CTRL: u16 = 0xFE75;
pub const RTSX_LDO3318_PWR_MASK: u8 = 0x06;
pub const RTSX_LDO3318_ON: u8 = 0x00;
pub const RTSX_LDO3318_VCC1: u8 = 0x02;
pub const RTSX_LDO3318_VCC2: u8 = 0x04;
pub const RTSX_LDO3318_OFF: u8 = 0x06;
pub const RTSX_LDO_PWR_SEL: u16 = 0xFE78;
pub const RTSX_LDO_PWR_SEL_3V3: u8 = 0x01;
pub const RTSX_LDO_PWR_SEL_DV33: u8 = 0x03;
pub const RTSX_L1SUB_CONFIG2: u16 = 0xFE8E;
pub const RTSX_L1SUB_AUTO_CFG: u8 = 0x02;
pub const RTSX_L1SUB_CONFIG3: u16 = 0xFE8F;
pub const RTSX_DUMMY_REG: u16 = 0xFE90;
pub const RTSX_IC_VERSION_A: u8 = 0x00;
pub const RTSX_IC_VERSION_C: u8 = 0x02;

// Analog block of the 525A / 5249 family
pub const RTSX_RREF_CFG: u16 = 0xFF6C;
pub const RTSX_RREF_VBGSEL_MASK: u8 = 0x38;
pub const RTSX_RREF_VBGSEL_1V25: u8 = 0x28;
pub const RTSX_OOBS_CONFIG: u16 = 0xFF6E;
pub const RTSX_OOBS_AUTOK_DIS: u8 = 0x80;
pub const RTSX_OOBS_VAL_MASK: u8 = 0x1F;
pub const RTSX_LDO_CONFIG2: u16 = 0xFF71;
pub const RTSX_LDO_D3318_MASK: u8 = 0x07;
pub const RTSX_LDO_D3318_33V: u8 = 0x07;
pub const RTSX_LDO_VCC_CFG0: u16 = 0xFF72;
pub const RTSX_LDO_VCC_LMTVTH_MASK: u8 = 0x30;
pub const RTSX_LDO_VCC_LMTVTH_2A: u8 = 0x10;
pub const RTSX_LDO_VCC_CFG1: u16 = 0xFF73;
pub const RTSX_LDO_VCC_TUNE_MASK: u8 = 0x30;
pub const RTSX_LDO_VCC_3V3: u8 = 0x10;
pub const RTSX_LDO_VIO_CFG: u16 = 0xFF75;
pub const RTSX_LDO_VIO_TUNE_MASK: u8 = 0x07;
pub const RTSX_LDO_VIO_1V7: u8 = 0x03;
pub const RTSX_LDO_DV12S_CFG: u16 = 0xFF76;
pub const RTSX_LDO_D12_TUNE_MASK: u8 = 0x18;
pub const RTSX_LDO_D12_TUNE_DF: u8 = 0x18;
pub const RTSX_LDO_AV12S_CFG: u16 = 0xFF77;
pub const RTSX_LDO_AV12S_TUNE_MASK: u8 = 0xC0;
pub const RTSX_LDO_AV12S_TUNE_DF: u8 = 0x40;
pub const RTSX_PM_CTRL3: u16 = 0xFF7E;
pub const RTSX_RTS522A_PM_CTRL3: u16 = 0xFF7E;
pub const RTSX_D3_DELINK_MODE_EN: u8 = 0x10;

// PHY registers, 16-bit, reached through the PHY bus
pub const RTSX_PHY_PCR: u8 = 0x00;
pub const RTSX_PHY_PCR_FORCE_CODE: u16 = 0xB000;
pub const RTSX_PHY_PCR_OOBS_CALI_50: u16 = 0x0800;
pub const RTSX_PHY_PCR_OOBS_VCM_08: u16 = 0x0200;
pub const RTSX_PHY_PCR_OOBS_SEN_90: u16 = 0x0040;
pub const RTSX_PHY_PCR_RSSI_EN: u16 = 0x0002;
pub const RTSX_PHY_PCR_RX10K: u16 = 0x0001;
pub const RTSX_PHY_RCR1: u8 = 0x02;
pub const RTSX_PHY_RCR1_ADP_TIME_4: u16 = 0x0400;
pub const RTSX_PHY_RCR1_VCO_COARSE: u16 = 0x001F;
pub const RTSX_PHY_RCR1_INIT_27S: u16 = 0x0A1F;
pub const RTSX_PHY_RCR2: u8 = 0x03;
pub const RTSX_PHY_RCR2_EMPHASE_EN: u16 = 0x8000;
pub const RTSX_PHY_RCR2_NADJR: u16 = 0x4000;
pub const RTSX_PHY_RCR2_CDR_SR_2: u16 = 0x0100;
pub const RTSX_PHY_RCR2_FREQSEL_12: u16 = 0x0040;
pub const RTSX_PHY_RCR2_CDR_SC_12P: u16 = 0x0010;
pub const RTSX_PHY_RCR2_CALIB_LATE: u16 = 0x0002;
pub const RTSX_PHY_RCR2_INIT_27S: u16 = 0xC152;
pub const RTSX_PHY_ANA03: u8 = 0x03;
pub const RTSX_PHY_ANA03_TIMER_MAX: u16 = 0x2700;
pub const RTSX_PHY_ANA03_OOBS_DEB_EN: u16 = 0x0040;
pub const RTSX_PHY_CMU_DEBUG_EN: u16 = 0x0008;
pub const RTSX_PHY_RDR: u8 = 0x05;
pub const RTSX_PHY_RDR_RXDSEL_1_9: u16 = 0x4000;
pub const RTSX_PHY_SSC_AUTO_PWD: u16 = 0x0600;
pub const RTSX_PHY_TUNE: u8 = 0x08;
pub const RTSX_PHY_TUNE_TUNEREF_1_0: u16 = 0x4000;
pub const RTSX_PHY_TUNE_VBGSEL_1252: u16 = 0x0C00;
pub const RTSX_PHY_TUNE_SDBUS_33: u16 = 0x0200;
pub const RTSX_PHY_TUNE_TUNED18: u16 = 0x01C0;
pub const RTSX_PHY_TUNE_TUNED12: u16 = 0x0020;
pub const RTSX_PHY_TUNE_TUNEA12: u16 = 0x0004;
pub const RTSX_PHY_TUNE_VOLTAGE_MASK: u16 = 0xFC3F;
pub const RTSX_PHY_TUNE_VOLTAGE_3V3: u16 = 0x03C0;
pub const RTSX_PHY_BPCR: u8 = 0x0A;
pub const RTSX_PHY_BPCR_IBRXSEL: u16 = 0x0400;
pub const RTSX_PHY_BPCR_IBTXSEL: u16 = 0x0100;
pub const RTSX_PHY_BPCR_IB_FILTER: u16 = 0x0080;
pub const RTSX_PHY_BPCR_CMIRROR_EN: u16 = 0x0040;
pub const RTSX_PHY_REV: u8 = 0x19;
pub const RTSX_PHY_REV_RESV: u16 = 0xE000;
pub const RTSX_PHY_REV_RXIDLE_LATCHED: u16 = 0x1000;
pub const RTSX_PHY_REV_P1_EN: u16 = 0x0800;
pub const RTSX_PHY_REV_RXIDLE_EN: u16 = 0x0400;
pub const RTSX_PHY_REV_CLKREQ_TX_EN: u16 = 0x0200;
pub const RTSX_PHY_REV_CLKREQ_DT_1_0: u16 = 0x0040;
pub const RTSX_PHY_REV_STOP_CLKRD: u16 = 0x0020;
pub const RTSX_PHY_REV_RX_PWST: u16 = 0x0008;
pub const RTSX_PHY_REV_STOP_CLKWR: u16 = 0x0004;
pub const RTSX_PHY_REV0: u8 = 0x19;
pub const RTSX_PHY_REV0_FILTER_OUT: u16 = 0x3800;
pub const RTSX_PHY_REV0_CDR_BYPASS_PFD: u16 = 0x0100;
pub const RTSX_PHY_REV0_CDR_RX_IDLE_BYPASS: u16 = 0x0002;
pub const RTSX_PHY_FLD0: u8 = 0x1A;
pub const RTSX_PHY_FLD0_INIT_27S: u16 = 0x2546;
pub const RTSX_PHY_FLD0_525A: u8 = 0x1D;
pub const RTSX_PHY_FLD0_CLK_REQ_20C: u16 = 0x8000;
pub const RTSX_PHY_FLD0_RX_IDLE_EN: u16 = 0x1000;
pub const RTSX_PHY_FLD0_BIT_ERR_RSTN: u16 = 0x0800;
pub const RTSX_PHY_FLD0_BER_COUNT: u16 = 0x01E0;
pub const RTSX_PHY_FLD0_BER_TIMER: u16 = 0x001E;
pub const RTSX_PHY_FLD0_CHECK_EN: u16 = 0x0001;
pub const RTSX_PHY_FLD3: u8 = 0x1D;
pub const RTSX_PHY_FLD3_TIMER_4: u16 = 0x0800;
pub const RTSX_PHY_FLD3_TIMER_6: u16 = 0x0020;
pub const RTSX_PHY_FLD3_RXDELINK: u16 = 0x0004;
pub const RTSX_PHY_FLD3_INIT_27S: u16 = 0x0004;
pub const RTSX_PHY_FLD4: u8 = 0x1E;
pub const RTSX_PHY_FLD4_FLDEN_SEL: u16 = 0x4000;
pub const RTSX_PHY_FLD4_REQ_REF: u16 = 0x2000;
pub const RTSX_PHY_FLD4_RXAMP_OFF: u16 = 0x1000;
pub const RTSX_PHY_FLD4_REQ_ADDA: u16 = 0x0800;
pub const RTSX_PHY_FLD4_BER_COUNT: u16 = 0x00E0;
pub const RTSX_PHY_FLD4_BER_TIMER: u16 = 0x000A;
pub const RTSX_PHY_FLD4_BER_CHK_EN: u16 = 0x0001;
pub const RTSX_PHY_FLD4_INIT_27S: u16 = 0x5C7F;

// PCI configuration space, vendor area
pub const RTSX_PCR_SETTING_REG1: u16 = 0x724;
pub const RTSX_PCR_SETTING_REG2: u16 = 0x814;
pub const RTSX_PCR_SETTING_REG3: u16 = 0x747;
pub const RTSX_SDIOCFG_REG: u16 = 0x724;
pub const RTSX_SDIOCFG_HAVE_SDIO: u32 = 0x04;
pub const RTSX_SDIOCFG_SDIO_ONLY: u32 = 0x80;

// Drive strength defaults
pub const RTSX_CARD_DRIVE_DEFAULT: u8 = 0x41;
pub const RTSX_RTS5209_CARD_DRIVE_DEFAULT: u8 = 0x00;
pub const RTSX_RTL8411_CARD_DRIVE_DEFAULT: u8 = 0x55;
pub const RTSX_DRIVER_TYPE_A: u8 = 0x05;
pub const RTSX_DRIVER_TYPE_B: u8 = 0x03;
pub const RTSX_DRIVER_TYPE_C: u8 = 0x02;
pub const RTSX_DRIVER_TYPE_D: u8 = 0x01;
pub const RTSX_CFG_DRIVER_TYPE_B: u8 = 0x03;

// Card clock frequencies in Hz
pub const RTSX_SDCLK_OFF: u32 = 0;
pub const RTSX_SDCLK_250KHZ: u32 = 250_000;
pub const RTSX_SDCLK_400KHZ: u32 = 400_000;
pub const RTSX_SDCLK_25MHZ: u32 = 25_000_000;
pub const RTSX_SDCLK_50MHZ: u32 = 50_000_000;
pub const RTSX_SDCLK_208MHZ: u32 = 208_000_000;

// Response types
pub const MMC_RSP_PRESENT: u32 = 1 << 0;
pub const MMC_RSP_136: u32 = 1 << 1; // 136-bit response
pub const MMC_RSP_CRC: u32 = 1 << 2; // Expect valid CRC
pub const MMC_RSP_BUSY: u32 = 1 << 3; // Card may send busy
pub const MMC_RSP_OPCODE: u32 = 1 << 4; // Response contains opcode

pub const MMC_RSP_NONE: u32 = 0;
pub const MMC_RSP_R1: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE;
pub const MMC_RSP_R1B: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE | MMC_RSP_BUSY;
pub const MMC_RSP_R2: u32 = MMC_RSP_PRESENT | MMC_RSP_136 | MMC_RSP_CRC;
pub const MMC_RSP_R3: u32 = MMC_RSP_PRESENT;
pub const MMC_RSP_R4: u32 = MMC_RSP_PRESENT;
pub const MMC_RSP_R5: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE;
pub const MMC_RSP_R6: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE;
pub const MMC_RSP_R7: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE;

// SD/MMC commands referenced by the bridge
pub const MMC_IO_SEND_OP_COND: u8 = 5;
pub const MMC_READ_SINGLE_BLOCK: u8 = 17;
pub const MMC_READ_MULTIPLE_BLOCK: u8 = 18;
pub const MMC_WRITE_BLOCK: u8 = 24;
pub const MMC_WRITE_MULTIPLE_BLOCK: u8 = 25;
pub const MMC_STOP_TRANSMISSION: u8 = 12;

// OCR bits for 3.0 - 3.4 V
pub const MMC_OCR_300_310: u32 = 1 << 18;
pub const MMC_OCR_310_320: u32 = 1 << 19;
pub const MMC_OCR_320_330: u32 = 1 << 20;
pub const MMC_OCR_330_340: u32 = 1 << 21;
pub const RTSX_SUPPORTED_VOLTAGE: u32 =
    MMC_OCR_300_310 | MMC_OCR_310_320 | MMC_OCR_320_330 | MMC_OCR_330_340;

pub const RTSX_PCI_VENDOR_REALTEK: u16 = 0x10EC;
