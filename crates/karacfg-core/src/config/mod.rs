// Karacfg Script API
// Declarative TOML scripts and the combo strings they are written in

pub mod combo_parser;
pub mod parser;

pub use combo_parser::{parse_combo_string, parse_destination, ComboParseError, ParsedCombo};
pub use parser::{Script, ScriptError};
