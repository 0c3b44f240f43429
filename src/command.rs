//! Mission commands and the latching wrapper around them.
//!
//! The original source polls a single bare `command_t` integer field in
//! each state's `run` callback. Here that becomes an explicit input
//! struct carrying the command plus its arrival timestamp, cleared by
//! the tick after evaluation so a command is never re-applied on a
//! later tick.

#[cfg(feature = "mcu")]
use defmt::Format;

/// Filling programs selectable by `FillExec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
#[repr(u8)]
pub enum FillProgram {
    N2 = 1,
    PrePress = 2,
    N2O = 3,
    PostPress = 4,
}

impl FillProgram {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::N2),
            2 => Some(Self::PrePress),
            3 => Some(Self::N2O),
            4 => Some(Self::PostPress),
            _ => None,
        }
    }
}

/// Parameters accompanying a `FillExec` command. Payload layout is
/// program-specific on the wire; decoded here into the one shape every
/// program's hysteresis rule actually consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct FillExecParams {
    pub target: u16,
    pub trigger: u16,
}

/// A manual-exec payload: opaque to the HSM, forwarded as-is to whatever
/// out-of-scope manual-override handler consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct ManualExec {
    pub cmd_id: u8,
    pub arg0: u32,
}

/// All commands the Controller may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub enum Command {
    Stop,
    Abort,
    Pause,
    Resume,
    Ready,
    FillExec {
        program: FillProgram,
        params: FillExecParams,
    },
    Arm,
    Fire,
    LaunchOverride,
    ManualToggle,
    ManualExec(ManualExec),
}

impl Command {
    /// True for the three commands that are handled "from every state as
    /// a root superstate".
    pub fn is_global(self) -> bool {
        matches!(self, Command::Stop | Command::Abort | Command::Pause)
    }
}

/// The most recent command plus its arrival timestamp (milliseconds
/// since boot). `take()` clears the slot so a tick never re-fires a
/// command it already evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct CommandInput {
    command: Option<Command>,
    arrived_at_ms: u64,
}

impl CommandInput {
    pub fn new(command: Command, arrived_at_ms: u64) -> Self {
        Self {
            command: Some(command),
            arrived_at_ms,
        }
    }

    pub fn empty() -> Self {
        Self {
            command: None,
            arrived_at_ms: 0,
        }
    }

    pub fn peek(&self) -> Option<Command> {
        self.command
    }

    pub fn arrived_at_ms(&self) -> u64 {
        self.arrived_at_ms
    }

    /// Consume the latched command, leaving the slot empty. The tick
    /// calls this exactly once per evaluated command.
    pub fn take(&mut self) -> Option<Command> {
        self.command.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_commands_are_classified() {
        assert!(Command::Stop.is_global());
        assert!(Command::Abort.is_global());
        assert!(Command::Pause.is_global());
        assert!(!Command::Resume.is_global());
        assert!(!Command::Arm.is_global());
    }

    #[test]
    fn take_clears_the_latch() {
        let mut input = CommandInput::new(Command::Fire, 1_000);
        assert_eq!(input.peek(), Some(Command::Fire));
        assert_eq!(input.take(), Some(Command::Fire));
        assert_eq!(input.take(), None);
        assert_eq!(input.peek(), None);
    }

    #[test]
    fn fill_program_round_trips_ids() {
        assert_eq!(FillProgram::from_u8(1), Some(FillProgram::N2));
        assert_eq!(FillProgram::from_u8(4), Some(FillProgram::PostPress));
        assert_eq!(FillProgram::from_u8(5), None);
    }
}
