use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for schedule output
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Section titles and update banners
    pub title: Style,
    /// Stop names
    pub stop: Style,
    /// Arrival times and update counters
    pub clock: Style,
    pub ok: Style,
    pub failure: Style,
    /// Placeholder text such as "no arrivals"
    pub faint: Style,
}

impl Theme {
    /// Colored when `console` says colors are enabled (tty, `NO_COLOR`,
    /// `CLICOLOR_FORCE`), plain otherwise.
    pub fn detect() -> Self {
        if console::colors_enabled() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            stop: Style::new().yellow().bold(),
            clock: Style::new().green(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            faint: Style::new().bright_black().italic(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            title: none,
            stop: none,
            clock: none,
            ok: none,
            failure: none,
            faint: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let plain = Theme::plain();
        assert_eq!("Main St".style(plain.stop).to_string(), "Main St");
        assert_eq!("08:00".style(plain.clock).to_string(), "08:00");
    }

    #[test]
    fn test_colored_theme_styles_stops() {
        let styled = "Main St".style(Theme::colored().stop).to_string();
        assert!(styled.contains("Main St"));
        assert_ne!(styled, "Main St");
    }
}
