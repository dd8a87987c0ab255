use log::{debug, warn};

use super::cmd::{response_type, CmdQueue, DataBuffer, MmcCommand, MmcData};
use super::constant::*;
use super::dma::DmaBuffer;
use super::platform::Platform;
use super::regs::RegisterSpace;
use super::{RtsxHost, XferState};
use crate::err::SdError;

impl<R: RegisterSpace, D: DmaBuffer, P: Platform> RtsxHost<R, D, P> {
    /// Data phase of at most 512 bytes through the chip's ping-pong buffer.
    pub(crate) fn xfer_short(
        &self,
        q: &mut CmdQueue<D>,
        cmd: &mut MmcCommand<'_>,
    ) -> Result<(), SdError> {
        let (len, block_len, read) = match &cmd.data {
            Some(data) if !data.buffer.is_empty() && data.block_len() != 0 => {
                (data.buffer.len(), data.block_len(), data.buffer.is_read())
            }
            _ => return Err(SdError::InvalidArgument),
        };

        debug!(
            "short {} xfer: {} bytes with block size {}",
            if read { "read" } else { "write" },
            len,
            block_len
        );

        if len > RTSX_MAX_DATA_BLKLEN {
            warn!("short xfer length too large: {} > {}", len, RTSX_MAX_DATA_BLKLEN);
            return Err(SdError::InvalidArgument);
        }
        if response_type(cmd.resp_type).is_none() {
            warn!("Unknown response type {:#x}", cmd.resp_type);
            return Err(SdError::InvalidArgument);
        }

        if read {
            q.init(cmd.opcode, cmd.arg);
            q.push_counts(len, block_len);
            q.push(
                RTSX_WRITE_REG_CMD,
                RTSX_SD_CFG2,
                0xFF,
                RTSX_SD_CALCULATE_CRC7
                    | RTSX_SD_CHECK_CRC16
                    | RTSX_SD_NO_WAIT_BUSY_END
                    | RTSX_SD_CHECK_CRC7
                    | RTSX_SD_RSP_LEN_6,
            );
            q.push(RTSX_WRITE_REG_CMD, RTSX_CARD_DATA_SOURCE, 0x01, RTSX_PINGPONG_BUFFER);
            q.push(
                RTSX_WRITE_REG_CMD,
                RTSX_SD_TRANSFER,
                0xFF,
                RTSX_TM_NORMAL_READ | RTSX_SD_TRANSFER_START,
            );
            q.push(
                RTSX_CHECK_REG_CMD,
                RTSX_SD_TRANSFER,
                RTSX_SD_TRANSFER_END,
                RTSX_SD_TRANSFER_END,
            );
            self.send_cmd(q, cmd.opcode)?;

            if let Some(MmcData { buffer: DataBuffer::Read(buf), .. }) = cmd.data.as_mut() {
                self.read_ppbuf(q, cmd.opcode, buf)?;
            }
        } else {
            // The card answers a write command before it accepts data.
            self.send_req_get_resp(q, cmd)?;

            if let Some(MmcData { buffer: DataBuffer::Write(buf), .. }) = cmd.data.as_ref() {
                self.write_ppbuf(q, cmd.opcode, buf)?;
            }

            q.reset();
            q.push_counts(len, block_len);
            q.push(
                RTSX_WRITE_REG_CMD,
                RTSX_SD_CFG2,
                0xFF,
                RTSX_SD_CALCULATE_CRC7
                    | RTSX_SD_CHECK_CRC16
                    | RTSX_SD_NO_WAIT_BUSY_END
                    | RTSX_SD_CHECK_CRC7
                    | RTSX_SD_RSP_LEN_0,
            );
            q.push(
                RTSX_WRITE_REG_CMD,
                RTSX_SD_TRANSFER,
                0xFF,
                RTSX_TM_AUTO_WRITE3 | RTSX_SD_TRANSFER_START,
            );
            q.push(
                RTSX_CHECK_REG_CMD,
                RTSX_SD_TRANSFER,
                RTSX_SD_TRANSFER_END,
                RTSX_SD_TRANSFER_END,
            );
            self.send_cmd(q, cmd.opcode)?;
        }

        Ok(())
    }

    // Drain the ping-pong buffer, one READ descriptor per byte.
    fn read_ppbuf(&self, q: &mut CmdQueue<D>, opcode: u8, dst: &mut [u8]) -> Result<(), SdError> {
        let mut reg = RTSX_PPBUF_BASE2;
        for chunk in dst.chunks_mut(RTSX_HOSTCMD_MAX) {
            q.reset();
            for _ in 0..chunk.len() {
                q.push(RTSX_READ_REG_CMD, reg, 0, 0);
                reg += 1;
            }
            self.send_cmd(q, opcode)?;
            q.results(chunk);
        }
        Ok(())
    }

    // Fill the ping-pong buffer, one WRITE descriptor per byte.
    fn write_ppbuf(&self, q: &mut CmdQueue<D>, opcode: u8, src: &[u8]) -> Result<(), SdError> {
        let mut reg = RTSX_PPBUF_BASE2;
        for chunk in src.chunks(RTSX_HOSTCMD_MAX) {
            q.reset();
            for byte in chunk {
                q.push(RTSX_WRITE_REG_CMD, reg, 0xFF, *byte);
                reg += 1;
            }
            self.send_cmd(q, opcode)?;
        }
        Ok(())
    }

    /// Data phase through the ring buffer and the bulk DMA buffer.
    ///
    /// Reads use AUTO_READ1, which issues the command itself and needs no
    /// stop command. Writes use AUTO_WRITE3, which expects the command to
    /// have been answered already and leaves the stop command to us.
    pub(crate) fn xfer(
        &self,
        st: &mut XferState<D>,
        cmd: &mut MmcCommand<'_>,
        stop: Option<&mut MmcCommand<'_>>,
    ) -> Result<(), SdError> {
        let (len, block_len, read) = match &cmd.data {
            Some(data) if !data.buffer.is_empty() && data.block_len() != 0 => {
                (data.buffer.len(), data.block_len(), data.buffer.is_read())
            }
            _ => return Err(SdError::InvalidArgument),
        };

        debug!(
            "{} xfer: {} bytes with block size {}",
            if read { "read" } else { "write" },
            len,
            block_len
        );

        if len > st.data.capacity() {
            warn!("xfer length too large: {} > {}", len, st.data.capacity());
            return Err(SdError::InvalidArgument);
        }

        if !read {
            self.send_req_get_resp(&mut st.cmdq, cmd)?;
        }

        let mut cfg2 = if cmd.opcode == MMC_READ_MULTIPLE_BLOCK {
            RTSX_SD_CHECK_CRC16 | RTSX_SD_NO_WAIT_BUSY_END | RTSX_SD_RSP_LEN_6
        } else {
            RTSX_SD_CHECK_CRC16 | RTSX_SD_NO_WAIT_BUSY_END | RTSX_SD_RSP_LEN_0
        };
        let q = &mut st.cmdq;
        let (dma_dir, tmode) = if read {
            cfg2 |= RTSX_SD_CALCULATE_CRC7 | RTSX_SD_CHECK_CRC7;
            q.init(cmd.opcode, cmd.arg);
            (RTSX_DMA_DIR_FROM_CARD, RTSX_TM_AUTO_READ1)
        } else {
            cfg2 |= RTSX_SD_NO_CALCULATE_CRC7 | RTSX_SD_NO_CHECK_CRC7;
            q.reset();
            (RTSX_DMA_DIR_TO_CARD, RTSX_TM_AUTO_WRITE3)
        };

        q.push_counts(len, block_len);

        q.push(RTSX_WRITE_REG_CMD, RTSX_IRQSTAT0, RTSX_DMA_DONE_INT, RTSX_DMA_DONE_INT);
        q.push(RTSX_WRITE_REG_CMD, RTSX_DMATC3, 0xFF, (len >> 24) as u8);
        q.push(RTSX_WRITE_REG_CMD, RTSX_DMATC2, 0xFF, (len >> 16) as u8);
        q.push(RTSX_WRITE_REG_CMD, RTSX_DMATC1, 0xFF, (len >> 8) as u8);
        q.push(RTSX_WRITE_REG_CMD, RTSX_DMATC0, 0xFF, len as u8);
        q.push(
            RTSX_WRITE_REG_CMD,
            RTSX_DMACTL,
            RTSX_DMA_EN | RTSX_DMA_DIR | RTSX_DMA_PACK_SIZE_MASK,
            RTSX_DMA_EN | dma_dir | RTSX_DMA_512,
        );
        q.push(RTSX_WRITE_REG_CMD, RTSX_CARD_DATA_SOURCE, 0x01, RTSX_RING_BUFFER);
        q.push(RTSX_WRITE_REG_CMD, RTSX_SD_CFG2, 0xFF, cfg2);
        q.push(RTSX_WRITE_REG_CMD, RTSX_SD_TRANSFER, 0xFF, tmode | RTSX_SD_TRANSFER_START);
        q.push(
            RTSX_CHECK_REG_CMD,
            RTSX_SD_TRANSFER,
            RTSX_SD_TRANSFER_END,
            RTSX_SD_TRANSFER_END,
        );

        // The transfer only finishes once the DMA below is running.
        self.send_cmd_nowait(q);
        self.clear_intr_status();

        if let Some(MmcData { buffer: DataBuffer::Write(buf), .. }) = cmd.data.as_ref() {
            st.data.write_at(0, buf);
        }
        st.data.sync_for_device();

        self.bus.write4(RTSX_HDBAR, st.data.bus_addr() as u32);
        self.bus.write4(
            RTSX_HDBCTLR,
            RTSX_TRIG_DMA | if read { RTSX_DMA_READ } else { 0 } | (len as u32 & 0x00FF_FFFF),
        );

        self.wait_intr(RTSX_TRANS_OK_INT, self.request_timeout(), cmd.opcode)?;
        st.data.sync_for_cpu();

        if let Some(MmcData { buffer: DataBuffer::Read(buf), .. }) = cmd.data.as_mut() {
            st.data.read_at(0, buf);
            return Ok(());
        }

        match stop {
            Some(stop) => {
                let res = self.send_req_get_resp(&mut st.cmdq, stop);
                stop.error = res.err();
                res
            }
            None => {
                warn!("CMD{} wrote {} bytes without a stop command", cmd.opcode, len);
                Ok(())
            }
        }
    }
}
