//! Styling helpers for terminal output.
//!
//! The [`ChatStyle`] trait provides convenience methods for applying ANSI
//! styling via the `colored` crate. Implementations for `&str` and `String`
//! are provided so string literals can be styled directly.

use colored::{ColoredString, Colorize};

/// Convenience trait for applying color and style to text output.
pub trait ChatStyle {
    fn error_style(&self) -> ColoredString;
    fn panel_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn character_style(&self) -> ColoredString;
    fn attr_style(&self) -> ColoredString;
    fn heading_style(&self) -> ColoredString;
    fn engine_style(&self) -> ColoredString;
}

impl ChatStyle for &str {
    fn error_style(&self) -> ColoredString {
        self.truecolor(255, 90, 90)
    }
    fn panel_style(&self) -> ColoredString {
        self.truecolor(200, 200, 200)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(120, 180, 255).bold()
    }
    fn character_style(&self) -> ColoredString {
        self.truecolor(13, 130, 60).underline()
    }
    fn attr_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn heading_style(&self) -> ColoredString {
        self.underline()
    }
    fn engine_style(&self) -> ColoredString {
        self.italic().truecolor(75, 180, 255)
    }
}

impl ChatStyle for String {
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn panel_style(&self) -> ColoredString {
        self.as_str().panel_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn character_style(&self) -> ColoredString {
        self.as_str().character_style()
    }
    fn attr_style(&self) -> ColoredString {
        self.as_str().attr_style()
    }
    fn heading_style(&self) -> ColoredString {
        self.as_str().heading_style()
    }
    fn engine_style(&self) -> ColoredString {
        self.as_str().engine_style()
    }
}
