pub const SPACE_BAR: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(u32),
    ButtonClick,
}

impl InputEvent {
    /// Whether this input is bound to play/pause.
    pub fn is_play_pause(&self) -> bool {
        match self {
            InputEvent::Key(code) => *code == SPACE_BAR,
            InputEvent::ButtonClick => true,
        }
    }
}
