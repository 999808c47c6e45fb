//! Remote command interpreter.
//!
//! Single-byte commands from race management software (GPRM custom timer
//! protocol). One byte is handled per tick; unknown bytes are ignored.

use crate::race::{RaceContext, TriggerState};
use crate::results::{race_results, ResultsText};

/// Protocol response lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Timer reset and gate closed.
    Ready,
    GateOpen,
    GateClosed,
    /// Heat started.
    Racing,
}

impl Response {
    pub fn as_str(self) -> &'static str {
        match self {
            Response::Ready => "READY",
            Response::GateOpen => "GATE OPEN",
            Response::GateClosed => "GATE CLOSED",
            Response::Racing => "RACING",
        }
    }
}

/// What a command sends back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Line(Response),
    /// Lanes were cleared; any shown results are stale.
    Reset(Response),
    Results(ResultsText),
}

/// Command descriptor
pub struct CommandDescriptor {
    pub byte: u8,
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: fn(&mut RaceContext, TriggerState) -> Reply,
}

/// All recognised commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { byte: b'G', name: "gate-check", brief: "Report start gate state", handler: cmd_gate_check },
    CommandDescriptor { byte: b'R', name: "timer-reset", brief: "Clear lanes for next heat", handler: cmd_timer_reset },
    CommandDescriptor { byte: b'F', name: "force-send", brief: "Send current results now", handler: cmd_force_send },
];

/// Look up the descriptor for `byte`.
pub fn find_command(byte: u8) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|c| c.byte == byte)
}

/// Interpret one inbound byte.
///
/// Returns `None` for unrecognised bytes, which leave all state untouched.
pub fn dispatch(byte: u8, race: &mut RaceContext, trigger: TriggerState) -> Option<Reply> {
    find_command(byte).map(|cmd| (cmd.handler)(race, trigger))
}

// --- Command Implementations ---

fn cmd_gate_check(_race: &mut RaceContext, trigger: TriggerState) -> Reply {
    match trigger {
        TriggerState::ReadyToRelease => Reply::Line(Response::GateClosed),
        TriggerState::Released => Reply::Line(Response::GateOpen),
    }
}

/// Idle bookkeeping only: race status and any running countdown are kept.
fn cmd_timer_reset(race: &mut RaceContext, trigger: TriggerState) -> Reply {
    race.lanes_mut().reset_for_idle();
    match trigger {
        TriggerState::ReadyToRelease => Reply::Reset(Response::Ready),
        TriggerState::Released => Reply::Reset(Response::GateOpen),
    }
}

/// Lanes still racing report their last known (possibly zero) time.
fn cmd_force_send(race: &mut RaceContext, _trigger: TriggerState) -> Reply {
    Reply::Results(race_results(race.lanes()))
}
