// Karacfg Destinations
// What a mapping sends, and how a declared target is classified

use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::DestinationError;
use crate::modifier::{Modifier, ModifierSet};
use crate::Key;

/// Pointing-device buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
pub enum MouseButton {
    #[strum(to_string = "button1", serialize = "left")]
    Left,
    #[strum(to_string = "button2", serialize = "right")]
    Right,
    #[strum(to_string = "button3", serialize = "middle")]
    Middle,
    #[strum(to_string = "button4")]
    Button4,
    #[strum(to_string = "button5")]
    Button5,
    #[strum(to_string = "button6")]
    Button6,
    #[strum(to_string = "button7")]
    Button7,
    #[strum(to_string = "button8")]
    Button8,
}

impl MouseButton {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A target as the user declared it, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Key(Key),
    Mouse(MouseButton),
    /// A key name, a button name or a shell command; resolved at compile time
    Text(String),
}

impl From<Key> for Target {
    fn from(key: Key) -> Self {
        Target::Key(key)
    }
}

impl From<MouseButton> for Target {
    fn from(button: MouseButton) -> Self {
        Target::Mouse(button)
    }
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        Target::Text(text.to_string())
    }
}

impl From<String> for Target {
    fn from(text: String) -> Self {
        Target::Text(text)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Key(key) => write!(f, "{}", key),
            Target::Mouse(button) => write!(f, "{}", button),
            Target::Text(text) => write!(f, "{}", text),
        }
    }
}

/// One declared destination: a target plus the modifiers to send with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    pub target: Target,
    pub modifiers: ModifierSet,
}

impl DestinationSpec {
    pub fn new(target: impl Into<Target>, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        Self {
            target: target.into(),
            modifiers: modifiers.into_iter().collect(),
        }
    }

    /// Resolve the declared target into an output event.
    ///
    /// Known key names become key events, known button names become pointing
    /// events and any other non-blank text is a shell command. The
    /// destination's own modifiers are independent of the source's.
    pub fn classify(&self) -> Result<Destination, DestinationError> {
        let destination = match &self.target {
            Target::Key(key) => Destination::Key {
                key: *key,
                modifiers: self.modifiers.clone(),
            },
            Target::Mouse(button) => Destination::Pointing(*button),
            Target::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(DestinationError::Blank);
                }
                if let Ok(key) = Key::from_str(trimmed) {
                    Destination::Key {
                        key,
                        modifiers: self.modifiers.clone(),
                    }
                } else if let Ok(button) = MouseButton::from_str(trimmed) {
                    Destination::Pointing(button)
                } else {
                    Destination::Shell(text.clone())
                }
            }
        };

        match &destination {
            Destination::Pointing(_) if !self.modifiers.is_empty() => {
                Err(DestinationError::ModifiersOnNonKey("pointing button"))
            }
            Destination::Shell(_) if !self.modifiers.is_empty() => {
                Err(DestinationError::ModifiersOnNonKey("shell command"))
            }
            _ => Ok(destination),
        }
    }
}

/// A classified destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Key { key: Key, modifiers: ModifierSet },
    Pointing(MouseButton),
    Shell(String),
}

/// `open -a '<app>'`
pub fn open_app_command(app: &str) -> String {
    format!("open -a '{}'", app)
}

/// Ask an application to open a URL through AppleScript
pub fn osa_open_command(app: &str, url: &str) -> String {
    format!(
        "osascript -e 'tell application \"{}\" to open location \"{}\"'",
        app, url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(target: impl Into<Target>) -> Result<Destination, DestinationError> {
        DestinationSpec::new(target, []).classify()
    }

    #[test]
    fn test_key_target() {
        let spec = DestinationSpec::new(Key::Hyphen, [Modifier::LeftShift]);
        assert_eq!(
            spec.classify(),
            Ok(Destination::Key {
                key: Key::Hyphen,
                modifiers: ModifierSet::from([Modifier::LeftShift]),
            })
        );
    }

    #[test]
    fn test_text_that_names_a_key() {
        assert_eq!(
            classify("up_arrow"),
            Ok(Destination::Key {
                key: Key::UpArrow,
                modifiers: ModifierSet::new(),
            })
        );
    }

    #[test]
    fn test_every_mouse_button_is_pointing() {
        assert_eq!(classify(MouseButton::Left), Ok(Destination::Pointing(MouseButton::Left)));
        assert_eq!(classify(MouseButton::Button6), Ok(Destination::Pointing(MouseButton::Button6)));
        assert_eq!(classify("button5"), Ok(Destination::Pointing(MouseButton::Button5)));
        assert_eq!(classify("middle"), Ok(Destination::Pointing(MouseButton::Middle)));
    }

    #[test]
    fn test_key_names_win_over_button_aliases() {
        assert_eq!(
            classify("left"),
            Ok(Destination::Key {
                key: Key::LeftArrow,
                modifiers: ModifierSet::new(),
            })
        );
        assert_eq!(MouseButton::from_str("left"), Ok(MouseButton::Left));
    }

    #[test]
    fn test_other_text_is_shell() {
        assert_eq!(
            classify("open -a 'Finder'"),
            Ok(Destination::Shell("open -a 'Finder'".to_string()))
        );
    }

    #[test]
    fn test_blank_is_rejected() {
        assert_eq!(classify(""), Err(DestinationError::Blank));
        assert_eq!(classify("   "), Err(DestinationError::Blank));
    }

    #[test]
    fn test_modifiers_on_shell_are_rejected() {
        let spec = DestinationSpec::new("say hi", [Modifier::LeftShift]);
        assert_eq!(
            spec.classify(),
            Err(DestinationError::ModifiersOnNonKey("shell command"))
        );
    }

    #[test]
    fn test_command_helpers() {
        assert_eq!(open_app_command("Finder"), "open -a 'Finder'");
        assert_eq!(
            osa_open_command("Raycast", "raycast://x"),
            "osascript -e 'tell application \"Raycast\" to open location \"raycast://x\"'"
        );
    }
}
