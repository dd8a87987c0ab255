use log::{debug, warn};

use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::Platform;
use super::regs::RegisterSpace;
use super::RtsxHost;
use crate::err::SdError;

/// Caller's side of a data phase.
#[derive(Debug)]
pub enum DataBuffer<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl DataBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            DataBuffer::Read(buf) => buf.len(),
            DataBuffer::Write(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_read(&self) -> bool {
        matches!(self, DataBuffer::Read(_))
    }
}

#[derive(Debug)]
pub struct MmcData<'a> {
    pub buffer: DataBuffer<'a>,
    /// Bytes per block, 0 lets the controller pick `min(len, 512)`.
    pub block_size: usize,
}

impl MmcData<'_> {
    pub(crate) fn block_len(&self) -> usize {
        if self.block_size == 0 {
            self.buffer.len().min(RTSX_MAX_DATA_BLKLEN)
        } else {
            self.block_size
        }
    }
}

#[derive(Debug)]
pub struct MmcCommand<'a> {
    pub opcode: u8,
    pub arg: u32,
    /// `MMC_RSP_*` shape of the expected reply.
    pub resp_type: u32,
    pub resp: [u32; 4],
    pub data: Option<MmcData<'a>>,
    pub error: Option<SdError>,
}

impl<'a> MmcCommand<'a> {
    pub fn new(opcode: u8, arg: u32, resp_type: u32) -> Self {
        Self {
            opcode,
            arg,
            resp_type,
            resp: [0; 4],
            data: None,
            error: None,
        }
    }

    pub fn with_data(mut self, buffer: DataBuffer<'a>, block_size: usize) -> Self {
        self.data = Some(MmcData { buffer, block_size });
        self
    }
}

/// One bus request: a command and, for multi-block writes, the stop command
/// sent after the data phase.
#[derive(Debug)]
pub struct MmcRequest<'a> {
    pub cmd: MmcCommand<'a>,
    pub stop: Option<MmcCommand<'a>>,
}

impl<'a> MmcRequest<'a> {
    pub fn new(cmd: MmcCommand<'a>) -> Self {
        Self { cmd, stop: None }
    }

    pub fn with_stop(mut self, stop: MmcCommand<'a>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Map an `MMC_RSP_*` shape to the response type code of SD_CFG2.
pub fn response_type(resp_type: u32) -> Option<u8> {
    const RSP_TYPES: [(u32, u8); 9] = [
        (MMC_RSP_NONE, RTSX_SD_RSP_TYPE_R0),
        (MMC_RSP_R1, RTSX_SD_RSP_TYPE_R1),
        (MMC_RSP_R1B, RTSX_SD_RSP_TYPE_R1B),
        (MMC_RSP_R2, RTSX_SD_RSP_TYPE_R2),
        (MMC_RSP_R3, RTSX_SD_RSP_TYPE_R3),
        (MMC_RSP_R4, RTSX_SD_RSP_TYPE_R4),
        (MMC_RSP_R5, RTSX_SD_RSP_TYPE_R5),
        (MMC_RSP_R6, RTSX_SD_RSP_TYPE_R6),
        (MMC_RSP_R7, RTSX_SD_RSP_TYPE_R7),
    ];

    RSP_TYPES
        .iter()
        .find(|(mmc, _)| *mmc == resp_type)
        .map(|(_, rtsx)| *rtsx)
}

/// Descriptor stream executed by the chip's command engine.
///
/// Each entry is one 32-bit little-endian word. READ and CHECK entries
/// each leave one result byte, stored from offset 0 of the same buffer in
/// the order they were queued.
pub(crate) struct CmdQueue<D> {
    buf: D,
    index: usize,
}

impl<D: DmaBuffer> CmdQueue<D> {
    pub fn new(buf: D) -> Self {
        Self { buf, index: 0 }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn len(&self) -> usize {
        self.index
    }

    pub fn push(&mut self, op: u8, reg: u16, mask: u8, data: u8) {
        assert!(
            self.index < RTSX_HOSTCMD_MAX,
            "too many host commands ({})",
            self.index
        );

        let word = ((op as u32 & 0x03) << 30)
            | ((reg as u32 & 0x3FFF) << 16)
            | ((mask as u32) << 8)
            | data as u32;
        self.buf.write_at(self.index * 4, &word.to_le_bytes());
        self.index += 1;
    }

    /// Start a batch with the command index and argument.
    pub fn init(&mut self, opcode: u8, arg: u32) {
        self.reset();
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_CMD0, 0xFF, RTSX_SD_CMD_START | opcode);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_CMD1, 0xFF, (arg >> 24) as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_CMD2, 0xFF, (arg >> 16) as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_CMD3, 0xFF, (arg >> 8) as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_CMD4, 0xFF, arg as u8);
    }

    /// Queue the byte count and block count of a data phase.
    pub fn push_counts(&mut self, len: usize, block_len: usize) {
        let blocks = len / block_len;
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_BYTE_CNT_L, 0xFF, block_len as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_BYTE_CNT_H, 0xFF, (block_len >> 8) as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_BLOCK_CNT_L, 0xFF, blocks as u8);
        self.push(RTSX_WRITE_REG_CMD, RTSX_SD_BLOCK_CNT_H, 0xFF, (blocks >> 8) as u8);
    }

    pub fn results(&self, dst: &mut [u8]) {
        self.buf.read_at(0, dst);
    }

    pub fn buffer(&self) -> &D {
        &self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut D {
        &mut self.buf
    }
}

/// Reassemble the response words from the result bytes of a
/// command/response batch.
///
/// Byte 0 is the CHECK echo. For R2 the 16 ping-pong bytes follow; the
/// chip swallows the final CRC7/end-bit byte, so it is synthesized as
/// `0x01`. Otherwise byte 1 is the echoed opcode and bytes 2..6 hold the
/// 32-bit card status.
pub(crate) fn decode_response(raw: &mut [u8; 18], rsp_type: u8, resp: &mut [u32; 4]) {
    if rsp_type == RTSX_SD_RSP_TYPE_R2 {
        raw[17] = 0x01;
        for (i, word) in resp.iter_mut().enumerate() {
            let at = 2 + i * 4;
            *word = u32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        }
    } else {
        resp[0] = u32::from_be_bytes([raw[2], raw[3], raw[4], raw[5]]);
    }
}

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    // Hand the queued batch to the command engine.
    pub(crate) fn send_cmd_nowait(&self, q: &mut CmdQueue<D>) {
        self.clear_intr_status();

        q.buffer_mut().sync_for_device();
        self.bus.write4(RTSX_HCBAR, q.buffer().bus_addr() as u32);
        self.bus.write4(
            RTSX_HCBCTLR,
            ((q.len() * 4) as u32 & 0x00FF_FFFF) | RTSX_START_CMD | RTSX_HW_AUTO_RSP,
        );
    }

    // Run the queued batch and wait for the chip to finish it.
    pub(crate) fn send_cmd(&self, q: &mut CmdQueue<D>, opcode: u8) -> Result<(), SdError> {
        self.send_cmd_nowait(q);
        self.wait_intr(RTSX_TRANS_OK_INT, self.request_timeout(), opcode)?;
        q.buffer_mut().sync_for_cpu();
        Ok(())
    }

    /// Send `cmd` without a data phase and collect its response.
    pub(crate) fn send_req_get_resp(
        &self,
        q: &mut CmdQueue<D>,
        cmd: &mut MmcCommand<'_>,
    ) -> Result<(), SdError> {
        let Some(rsp_type) = response_type(cmd.resp_type) else {
            warn!("Unknown response type {:#x}", cmd.resp_type);
            return Err(SdError::InvalidArgument);
        };

        q.init(cmd.opcode, cmd.arg);
        q.push(RTSX_WRITE_REG_CMD, RTSX_SD_CFG2, 0xFF, rsp_type);
        // No data, the ping-pong buffer carries the response
        q.push(RTSX_WRITE_REG_CMD, RTSX_CARD_DATA_SOURCE, 0x01, RTSX_PINGPONG_BUFFER);
        q.push(
            RTSX_WRITE_REG_CMD,
            RTSX_SD_TRANSFER,
            0xFF,
            RTSX_TM_CMD_RSP | RTSX_SD_TRANSFER_START,
        );
        q.push(
            RTSX_CHECK_REG_CMD,
            RTSX_SD_TRANSFER,
            RTSX_SD_TRANSFER_END | RTSX_SD_STAT_IDLE,
            RTSX_SD_TRANSFER_END | RTSX_SD_STAT_IDLE,
        );

        if rsp_type == RTSX_SD_RSP_TYPE_R2 {
            for reg in RTSX_PPBUF_BASE2..RTSX_PPBUF_BASE2 + 16 {
                q.push(RTSX_READ_REG_CMD, reg, 0, 0);
            }
        } else if rsp_type != RTSX_SD_RSP_TYPE_R0 {
            for reg in RTSX_SD_CMD0..=RTSX_SD_CMD4 {
                q.push(RTSX_READ_REG_CMD, reg, 0, 0);
            }
        }
        q.push(RTSX_READ_REG_CMD, RTSX_SD_STAT1, 0, 0);

        self.send_cmd(q, cmd.opcode)?;

        if cmd.resp_type & MMC_RSP_PRESENT != 0 {
            let mut raw = [0u8; 18];
            q.results(&mut raw);
            decode_response(&mut raw, rsp_type, &mut cmd.resp);
            debug!(
                "CMD{} resp = {:#010x} {:#010x} {:#010x} {:#010x}",
                cmd.opcode, cmd.resp[0], cmd.resp[1], cmd.resp[2], cmd.resp[3]
            );
        }

        Ok(())
    }
}
