use crate::event::AlertState;

/// Maps an alert state to the card theme color.
///
/// The alerting pipeline owns the palette; transports only consume it.
pub trait StateColors {
    fn color_for_state(&self, state: AlertState) -> String;
}

/// Palette shared by the stock transports.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStateColors;

impl StateColors for DefaultStateColors {
    fn color_for_state(&self, state: AlertState) -> String {
        match state {
            AlertState::Clear => "#00FF00",
            AlertState::Active => "#FF0000",
            AlertState::Acknowledged => "#808080",
            AlertState::Worse => "#FFA500",
            AlertState::Better => "#FFFF00",
            AlertState::Changed => "#337AB7",
        }
        .to_string()
    }
}

impl<F> StateColors for F
where
    F: Fn(AlertState) -> String,
{
    fn color_for_state(&self, state: AlertState) -> String {
        self(state)
    }
}
