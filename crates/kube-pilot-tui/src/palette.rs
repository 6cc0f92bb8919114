//! ANSI palette for fzf's `--ansi` mode

use crossterm::style::Stylize;
use kube_pilot_core::{ColorTag, Palette};

/// Maps semantic tags to terminal colors
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiPalette;

impl Palette for AnsiPalette {
    fn paint(&self, tag: ColorTag, text: &str) -> String {
        match tag {
            ColorTag::Ok => text.green().to_string(),
            ColorTag::Warn => text.yellow().to_string(),
            ColorTag::Alert => text.red().to_string(),
            ColorTag::Dim => text.dark_grey().to_string(),
            ColorTag::Header => text.cyan().bold().to_string(),
            ColorTag::Plain => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube_pilot_core::table::strip_ansi;

    #[test]
    fn test_plain_is_untouched() {
        assert_eq!(AnsiPalette.paint(ColorTag::Plain, "web  "), "web  ");
    }

    #[test]
    fn test_colors_wrap_text() {
        if std::env::var_os("NO_COLOR").is_some() {
            return;
        }
        for tag in [ColorTag::Ok, ColorTag::Warn, ColorTag::Alert, ColorTag::Dim, ColorTag::Header] {
            let painted = AnsiPalette.paint(tag, "Running ");
            assert!(painted.starts_with('\x1b'), "{} should be escaped", tag);
            assert_eq!(strip_ansi(&painted), "Running ");
        }
    }
}
