//! Hardware bindings for the two serial links this controller owns: the
//! RS-485 field bus (Modbus-style request/response to the sensor and
//! actuator boards) and the telemetry radio. Kept separate from
//! `main.rs` so the RTIC `#[app]` module itself stays a thin wiring
//! diagram.

use hal::{
    pac::{USART1, USART3},
    usart::{Usart, UsartInterrupt},
};

use ares_obc::bus::{BoardAddress, BusClient};
use ares_obc::error::{BusError, RadioError};
use ares_obc::radio::packet::PACKET_LEN;
use ares_obc::radio::RadioLink;

/// Function codes this controller's boards answer to. Only the subset
/// the field bus actually uses.
const FN_READ_INPUT_REGS: u8 = 0x04;
const FN_READ_COILS: u8 = 0x02;
const FN_WRITE_COIL: u8 = 0x05;

pub struct FieldBus {
    uart: Usart<USART3>,
}

impl FieldBus {
    pub fn new(uart: Usart<USART3>) -> Self {
        Self { uart }
    }

    fn transact(&mut self, request: &[u8], response: &mut [u8]) -> Result<(), BusError> {
        self.uart.write(request).map_err(|_| BusError::Timeout)?;
        self.uart.read(response).map_err(|_| BusError::Timeout)?;
        Ok(())
    }
}

impl BusClient for FieldBus {
    fn read_input_regs(&mut self, board: BoardAddress, start: u16, out: &mut [u16]) -> Result<(), BusError> {
        let count = out.len() as u16;
        let request = [
            board.slave_id(),
            FN_READ_INPUT_REGS,
            (start >> 8) as u8,
            start as u8,
            (count >> 8) as u8,
            count as u8,
        ];
        let mut response = [0u8; 64];
        let byte_count = count as usize * 2;
        self.transact(&request, &mut response[..byte_count])?;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = u16::from_be_bytes([response[i * 2], response[i * 2 + 1]]);
        }
        Ok(())
    }

    fn read_coils(&mut self, board: BoardAddress, start: u16, count: u16, out: &mut [u8]) -> Result<(), BusError> {
        let request = [
            board.slave_id(),
            FN_READ_COILS,
            (start >> 8) as u8,
            start as u8,
            (count >> 8) as u8,
            count as u8,
        ];
        let byte_count = ((count + 7) / 8) as usize;
        self.transact(&request, &mut out[..byte_count])
    }

    fn write_coil(&mut self, board: BoardAddress, coil: u16, value: bool) -> Result<(), BusError> {
        let on_value: u16 = if value { 0xff00 } else { 0x0000 };
        let request = [
            board.slave_id(),
            FN_WRITE_COIL,
            (coil >> 8) as u8,
            coil as u8,
            (on_value >> 8) as u8,
            on_value as u8,
        ];
        let mut response = [0u8; 8];
        self.transact(&request, &mut response)
    }
}

pub struct RadioUart {
    uart: Usart<USART1>,
}

impl RadioUart {
    pub fn new(uart: Usart<USART1>) -> Self {
        Self { uart }
    }

    /// Clear the line-idle interrupt flag that signals a complete frame
    /// has landed; called from the ISR before draining the frame itself.
    pub fn clear_rx_interrupt(&mut self) {
        self.uart.clear_interrupt(UsartInterrupt::Idle);
    }
}

impl RadioLink for RadioUart {
    fn send(&mut self, frame: &[u8; PACKET_LEN]) -> Result<(), RadioError> {
        self.uart.write(frame).map_err(|_| RadioError::SendFailed)
    }

    fn try_receive(&mut self) -> Result<[u8; PACKET_LEN], RadioError> {
        let mut frame = [0u8; PACKET_LEN];
        self.uart.read(&mut frame).map_err(|_| RadioError::NoFrame)?;
        Ok(frame)
    }
}
