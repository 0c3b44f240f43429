//! The fixed 128-byte radio packet: a 4-byte header plus a 124-byte
//! payload whose shape depends on `command_id`. Only the subset of
//! commands the HSM and status reporting actually need are modeled
//! beyond their bare `CommandId`; every other command's payload is
//! treated as an opaque byte slice and forwarded to the out-of-scope
//! manual-override handler.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use packed_struct::prelude::*;

use crate::actuators::ActuatorVector;
use crate::command::{Command, FillExecParams, FillProgram, ManualExec};
use crate::error::PacketError;
use crate::hsm::{FillingSubstate, FlightSubstate, MissionState};
use crate::status::MissionStatus;

pub const PACKET_LEN: usize = 128;
pub const HEADER_LEN: usize = 4;
pub const PAYLOAD_LEN: usize = PACKET_LEN - HEADER_LEN;

pub const SUPPORTED_PACKET_VERSION: u8 = 1;

/// The fourteen commands the radio link carries. `StatusReq`, `StatusRep`
/// and `Ack` are radio-protocol concerns with no HSM equivalent;
/// `LaunchOverride` has no HSM behavior defined either and is forwarded
/// the same way `ManualToggle` is; the rest mirror [`Command`]
/// one-for-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandId {
    StatusReq = 1,
    Abort = 2,
    Ready = 3,
    Arm = 4,
    Fire = 5,
    LaunchOverride = 6,
    Stop = 7,
    Pause = 8,
    Resume = 9,
    ManualToggle = 10,
    FillExec = 11,
    ManualExec = 12,
    StatusRep = 13,
    Ack = 14,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PackedStruct)]
#[packed_struct(endian = "msb")]
pub struct PacketHeader {
    pub packet_version: u8,
    pub sender_id: u8,
    pub target_id: u8,
    pub command_id: u8,
}

/// The `STATUS_REP` payload: the current mission triple, the actuator
/// vector, and the handful of sensor values worth including in every
/// periodic status broadcast rather than waiting on a full telemetry
/// dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PackedStruct)]
#[packed_struct(endian = "msb")]
pub struct StatusRepPayload {
    pub main_state: u8,
    /// 0 means "no filling substate active"; a real substate is its
    /// `FillingSubstate` discriminant plus one.
    pub filling_substate: u8,
    /// Same zero-means-absent convention as `filling_substate`.
    pub flight_substate: u8,
    pub actuators: u16,
    pub chamber_pressure: u16,
    pub n2o_tank_pressure: u16,
    pub chamber_temperature: i16,
}

impl StatusRepPayload {
    pub fn from_status(status: MissionStatus, actuators: ActuatorVector, chamber_pressure: u16, n2o_tank_pressure: u16, chamber_temperature: i16) -> Self {
        Self {
            main_state: status.main as u8,
            filling_substate: status.filling.map(|s| s as u8 + 1).unwrap_or(0),
            flight_substate: status.flight.map(|s| s as u8 + 1).unwrap_or(0),
            actuators: actuators.raw(),
            chamber_pressure,
            n2o_tank_pressure,
            chamber_temperature,
        }
    }

    pub fn status(&self) -> Result<MissionStatus, PacketError> {
        let main = match self.main_state {
            0 => MissionState::Idle,
            1 => MissionState::Fill,
            2 => MissionState::Ready,
            3 => MissionState::Armed,
            4 => MissionState::Flight,
            5 => MissionState::Abort,
            _ => return Err(PacketError::MalformedPayload),
        };
        let filling = if self.filling_substate == 0 {
            None
        } else {
            Some(decode_filling_substate(self.filling_substate - 1)?)
        };
        let flight = if self.flight_substate == 0 {
            None
        } else {
            Some(decode_flight_substate(self.flight_substate - 1)?)
        };
        Ok(MissionStatus { main, filling, flight })
    }
}

fn decode_filling_substate(raw: u8) -> Result<FillingSubstate, PacketError> {
    use FillingSubstate::*;
    Ok(match raw {
        0 => SafePauseIdle,
        1 => SafePauseVent,
        2 => FillN2Idle,
        3 => FillN2Fill,
        4 => FillN2Vent,
        5 => PrePressIdle,
        6 => PrePressVent,
        7 => PrePressFillN2,
        8 => FillN2OIdle,
        9 => FillN2OFill,
        10 => FillN2OVent,
        11 => PostPressIdle,
        12 => PostPressVent,
        13 => PostPressFillN2,
        _ => return Err(PacketError::MalformedPayload),
    })
}

fn decode_flight_substate(raw: u8) -> Result<FlightSubstate, PacketError> {
    use FlightSubstate::*;
    Ok(match raw {
        0 => Ignition,
        1 => Boost,
        2 => Coast,
        3 => Apogee,
        4 => DrogueChute,
        5 => MainChute,
        6 => Touchdown,
        _ => return Err(PacketError::MalformedPayload),
    })
}

/// A decoded packet: the header plus, where this crate understands the
/// command, a typed command ready for `CommandInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPacket {
    pub sender_id: u8,
    pub target_id: u8,
    pub command_id: CommandId,
    pub command: Option<Command>,
}

/// Decode a raw 128-byte frame, rejecting unsupported versions and
/// command ids outside `[1, 14]` before looking at the payload at all.
pub fn decode(frame: &[u8; PACKET_LEN]) -> Result<DecodedPacket, PacketError> {
    let header_bytes: [u8; HEADER_LEN] = frame[..HEADER_LEN].try_into().unwrap();
    let header = PacketHeader::unpack(&header_bytes).map_err(|_| PacketError::MalformedPayload)?;

    if header.packet_version != SUPPORTED_PACKET_VERSION {
        return Err(PacketError::UnsupportedVersion(header.packet_version));
    }

    let command_id = CommandId::try_from_primitive(header.command_id).map_err(|_| PacketError::InvalidCommandId(header.command_id))?;

    let payload = &frame[HEADER_LEN..];
    let command = decode_command(command_id, payload)?;

    Ok(DecodedPacket {
        sender_id: header.sender_id,
        target_id: header.target_id,
        command_id,
        command,
    })
}

fn decode_command(id: CommandId, payload: &[u8]) -> Result<Option<Command>, PacketError> {
    Ok(match id {
        CommandId::Stop => Some(Command::Stop),
        CommandId::Abort => Some(Command::Abort),
        CommandId::Pause => Some(Command::Pause),
        CommandId::Resume => Some(Command::Resume),
        CommandId::Ready => Some(Command::Ready),
        CommandId::Arm => Some(Command::Arm),
        CommandId::Fire => Some(Command::Fire),
        CommandId::LaunchOverride => Some(Command::LaunchOverride),
        CommandId::ManualToggle => Some(Command::ManualToggle),
        CommandId::FillExec => {
            if payload.len() < 5 {
                return Err(PacketError::MalformedPayload);
            }
            let program = FillProgram::from_u8(payload[0]).ok_or(PacketError::MalformedPayload)?;
            let target = u16::from_be_bytes([payload[1], payload[2]]);
            let trigger = u16::from_be_bytes([payload[3], payload[4]]);
            Some(Command::FillExec {
                program,
                params: FillExecParams { target, trigger },
            })
        }
        CommandId::ManualExec => {
            if payload.len() < 5 {
                return Err(PacketError::MalformedPayload);
            }
            let cmd_id = payload[0];
            let arg0 = u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]);
            Some(Command::ManualExec(ManualExec { cmd_id, arg0 }))
        }
        CommandId::StatusReq | CommandId::StatusRep | CommandId::Ack => None,
    })
}

/// Build a `STATUS_REP` frame addressed from `sender_id` to `target_id`.
pub fn encode_status_rep(sender_id: u8, target_id: u8, payload: StatusRepPayload) -> [u8; PACKET_LEN] {
    let header = PacketHeader {
        packet_version: SUPPORTED_PACKET_VERSION,
        sender_id,
        target_id,
        command_id: CommandId::StatusRep.into(),
    };
    let mut frame = [0u8; PACKET_LEN];
    frame[..HEADER_LEN].copy_from_slice(&header.pack().expect("fixed-width header always packs"));

    let packed = payload.pack().expect("fixed-width payload always packs");
    frame[HEADER_LEN..HEADER_LEN + packed.len()].copy_from_slice(&packed);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u8, command_id: u8) -> [u8; PACKET_LEN] {
        let mut frame = [0u8; PACKET_LEN];
        frame[0] = version;
        frame[1] = 9;
        frame[2] = 1;
        frame[3] = command_id;
        frame
    }

    #[test]
    fn rejects_unsupported_version() {
        let frame = header_bytes(2, CommandId::Stop.into());
        assert_eq!(decode(&frame), Err(PacketError::UnsupportedVersion(2)));
    }

    #[test]
    fn rejects_command_id_out_of_range() {
        let frame = header_bytes(1, 0);
        assert_eq!(decode(&frame), Err(PacketError::InvalidCommandId(0)));
        let frame = header_bytes(1, 15);
        assert_eq!(decode(&frame), Err(PacketError::InvalidCommandId(15)));
    }

    #[test]
    fn decodes_bare_commands() {
        let frame = header_bytes(1, CommandId::Abort.into());
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.command, Some(Command::Abort));
        assert_eq!(decoded.sender_id, 9);
        assert_eq!(decoded.target_id, 1);
    }

    #[test]
    fn decodes_fill_exec_with_params() {
        let mut frame = header_bytes(1, CommandId::FillExec.into());
        frame[HEADER_LEN] = 3; // N2O
        frame[HEADER_LEN + 1..HEADER_LEN + 3].copy_from_slice(&100u16.to_be_bytes());
        frame[HEADER_LEN + 3..HEADER_LEN + 5].copy_from_slice(&50u16.to_be_bytes());

        let decoded = decode(&frame).unwrap();
        assert_eq!(
            decoded.command,
            Some(Command::FillExec {
                program: FillProgram::N2O,
                params: FillExecParams { target: 100, trigger: 50 },
            })
        );
    }

    #[test]
    fn status_rep_round_trips() {
        let status = MissionStatus {
            main: MissionState::Fill,
            filling: Some(FillingSubstate::FillN2OFill),
            flight: None,
        };
        let actuators = ActuatorVector::from_open(&[crate::actuators::ActuatorId::N2oFill]);
        let payload = StatusRepPayload::from_status(status, actuators, 120, 55, 210);
        let frame = encode_status_rep(9, 1, payload);

        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.command_id, CommandId::StatusRep);
        assert_eq!(decoded.command, None);

        let header_bytes: [u8; HEADER_LEN] = frame[..HEADER_LEN].try_into().unwrap();
        let header = PacketHeader::unpack(&header_bytes).unwrap();
        assert_eq!(header.command_id, CommandId::StatusRep.into());

        const STATUS_REP_LEN: usize = 11;
        let payload_bytes: [u8; STATUS_REP_LEN] = frame[HEADER_LEN..HEADER_LEN + STATUS_REP_LEN].try_into().unwrap();
        let round_tripped = StatusRepPayload::unpack(&payload_bytes).unwrap();
        assert_eq!(round_tripped.status().unwrap(), status);
    }
}
