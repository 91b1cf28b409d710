//! Terminal emulation: decoder, screen buffer and palettes

pub mod palette;
pub mod parser;
pub mod state;

pub use palette::{Palette, Rgb};
pub use parser::{AnsiDecoder, Response, ScreenCommand};
pub use state::{AttrFlags, Cell, CellAttrs, Color, ScreenBuffer, SpanStyle, StyledLine, StyledSpan, TerminalModes};
