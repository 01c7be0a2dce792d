// Karacfg Key Type
// Key identifiers as understood by the remapping host

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Represents a single physical key.
///
/// The canonical string form is the host's `key_code` name. Parsing also
/// accepts the short aliases (`lshift`, `enter`, `left`, ...); the alias is
/// never written back out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Key {
    CapsLock,
    Escape,
    Fn,
    #[strum(to_string = "left_shift", serialize = "lshift")]
    LeftShift,
    #[strum(to_string = "left_control", serialize = "lctrl")]
    LeftControl,
    #[strum(to_string = "left_option", serialize = "lalt")]
    LeftOption,
    #[strum(to_string = "left_command", serialize = "lcmd")]
    LeftCommand,
    #[strum(to_string = "right_control", serialize = "rctrl")]
    RightControl,
    #[strum(to_string = "right_option", serialize = "ralt")]
    RightOption,
    #[strum(to_string = "right_command", serialize = "rcmd")]
    RightCommand,
    #[strum(to_string = "right_shift", serialize = "rshift")]
    RightShift,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    #[strum(to_string = "1", serialize = "n1")]
    N1,
    #[strum(to_string = "2", serialize = "n2")]
    N2,
    #[strum(to_string = "3", serialize = "n3")]
    N3,
    #[strum(to_string = "4", serialize = "n4")]
    N4,
    #[strum(to_string = "5", serialize = "n5")]
    N5,
    #[strum(to_string = "6", serialize = "n6")]
    N6,
    #[strum(to_string = "7", serialize = "n7")]
    N7,
    #[strum(to_string = "8", serialize = "n8")]
    N8,
    #[strum(to_string = "9", serialize = "n9")]
    N9,
    #[strum(to_string = "0", serialize = "n0")]
    N0,

    #[strum(to_string = "return_or_enter", serialize = "enter")]
    ReturnOrEnter,
    Tab,
    Spacebar,
    DeleteOrBackspace,
    DeleteForward,

    #[strum(to_string = "left_arrow", serialize = "left")]
    LeftArrow,
    #[strum(to_string = "right_arrow", serialize = "right")]
    RightArrow,
    #[strum(to_string = "up_arrow", serialize = "up")]
    UpArrow,
    #[strum(to_string = "down_arrow", serialize = "down")]
    DownArrow,

    PageUp,
    PageDown,
    Home,
    End,
    Insert,

    VolumeIncrement,
    VolumeDecrement,
    Mute,
    DisplayBrightnessIncrement,
    DisplayBrightnessDecrement,
    PlayOrPause,
    Fastforward,
    Rewind,
    Eject,

    GraveAccentAndTilde,
    Hyphen,
    EqualSign,
    OpenBracket,
    CloseBracket,
    Backslash,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,

    KeypadNumLock,
    KeypadSlash,
    KeypadAsterisk,
    KeypadHyphen,
    KeypadPlus,
    KeypadEnter,
    KeypadPeriod,
    #[strum(to_string = "keypad_0")]
    Keypad0,
    #[strum(to_string = "keypad_1")]
    Keypad1,
    #[strum(to_string = "keypad_2")]
    Keypad2,
    #[strum(to_string = "keypad_3")]
    Keypad3,
    #[strum(to_string = "keypad_4")]
    Keypad4,
    #[strum(to_string = "keypad_5")]
    Keypad5,
    #[strum(to_string = "keypad_6")]
    Keypad6,
    #[strum(to_string = "keypad_7")]
    Keypad7,
    #[strum(to_string = "keypad_8")]
    Keypad8,
    #[strum(to_string = "keypad_9")]
    Keypad9,
    KeypadEqualSign,

    PrintScreen,
    ScrollLock,
    Pause,
    Menu,
    Power,

    LeftGui,
    RightGui,
    LeftAlt,
    RightAlt,
}

impl Key {
    /// Get the wire name of this key
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether this key is also usable as a modifier
    pub fn is_modifier(self) -> bool {
        crate::Modifier::try_from(self).is_ok()
    }
}

impl serde::Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
