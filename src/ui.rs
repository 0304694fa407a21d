//! Autotuner-facing UI surface
//!
//! Menus, screensaver and rendering live in the application; this
//! module only defines the event types and the mapping from events to
//! host commands. Drawing works from the [`ChannelStatus`] snapshot.
//!
//! [`ChannelStatus`]: crate::channel::ChannelStatus

use crate::error::AutotuneError;
use crate::host::AutotunerHost;
use crate::settings::ChannelSettings;

/// Panel button events routed to the autotuner screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Up,
    Down,
    Left,
    Right,
}

/// Encoder motion, signed detents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderEvent {
    pub delta: i32,
}

/// Commands the autotuner accepts from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Arm,
    Run,
    Abort,
}

/// Map a button press to an autotuner command. Up arms, Right starts,
/// Down aborts; Left belongs to the surrounding menu.
pub fn command_for_button(event: ButtonEvent) -> Option<UiCommand> {
    match event {
        ButtonEvent::Up => Some(UiCommand::Arm),
        ButtonEvent::Right => Some(UiCommand::Run),
        ButtonEvent::Down => Some(UiCommand::Abort),
        ButtonEvent::Left => None,
    }
}

/// Apply a button press to the host.
pub fn handle_button(
    host: &mut AutotunerHost,
    channel: usize,
    event: ButtonEvent,
) -> Result<(), AutotuneError> {
    match command_for_button(event) {
        Some(UiCommand::Arm) => host.arm(channel),
        Some(UiCommand::Run) => host.run(channel),
        Some(UiCommand::Abort) => host.abort(channel),
        None => Ok(()),
    }
}

/// Scroll one settings slot with the encoder; out-of-range motion
/// clamps at the schema bounds.
pub fn handle_encoder(settings: &mut ChannelSettings, slot: usize, event: EncoderEvent) {
    let value = settings.value(slot) + event.delta;
    settings.set_value(slot, value);
}
