use ratatui::style::{Color, Modifier, Style};

const fn rgb(hex: u32) -> Color {
    Color::Rgb(
        ((hex >> 16) & 0xFF) as u8,
        ((hex >>  8) & 0xFF) as u8,
        ( hex        & 0xFF) as u8,
    )
}

// ── Theme variant selector ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeVariant {
    Default,
    Dracula,
    Gruvbox,
    Nord,
}

impl ThemeVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Dracula => "Dracula",
            Self::Gruvbox => "Gruvbox",
            Self::Nord    => "Nord",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Default => Self::Dracula,
            Self::Dracula => Self::Gruvbox,
            Self::Gruvbox => Self::Nord,
            Self::Nord    => Self::Default,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dracula" => Self::Dracula,
            "gruvbox" => Self::Gruvbox,
            "nord"    => Self::Nord,
            _         => Self::Default,
        }
    }

    fn palette(&self) -> Palette {
        match self {
            Self::Default => Palette {
                frame: Color::DarkGray, accent: Color::Cyan, fg: Color::White, dim: Color::DarkGray,
                select: Color::Cyan, base: Color::Black, bar: Color::Blue, status_bar: Color::DarkGray,
                ok: Color::Green, warn: Color::Yellow, crit: Color::Red,
            },
            Self::Dracula => Palette {
                frame: rgb(0x6272a4), accent: rgb(0xbd93f9), fg: rgb(0xf8f8f2), dim: rgb(0x6272a4),
                select: rgb(0xff79c6), base: rgb(0x282a36), bar: rgb(0x44475a), status_bar: rgb(0x44475a),
                ok: rgb(0x50fa7b), warn: rgb(0xf1fa8c), crit: rgb(0xff5555),
            },
            Self::Gruvbox => Palette {
                frame: rgb(0x504945), accent: rgb(0x83a598), fg: rgb(0xebdbb2), dim: rgb(0xa89984),
                select: rgb(0xd79921), base: rgb(0x282828), bar: rgb(0x504945), status_bar: rgb(0x3c3836),
                ok: rgb(0xb8bb26), warn: rgb(0xfabd2f), crit: rgb(0xfb4934),
            },
            Self::Nord => Palette {
                frame: rgb(0x4c566a), accent: rgb(0x88c0d0), fg: rgb(0xe5e9f0), dim: rgb(0x4c566a),
                select: rgb(0x88c0d0), base: rgb(0x2e3440), bar: rgb(0x3b4252), status_bar: rgb(0x3b4252),
                ok: rgb(0xa3be8c), warn: rgb(0xebcb8b), crit: rgb(0xbf616a),
            },
        }
    }
}

/// Raw colours of one variant; every style in [`Theme`] derives from these.
struct Palette {
    frame:      Color,
    accent:     Color,
    fg:         Color,
    dim:        Color,
    select:     Color,
    base:       Color,
    bar:        Color,
    status_bar: Color,
    ok:         Color,
    warn:       Color,
    crit:       Color,
}

// ── Theme struct ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Theme {
    pub border:         Style,
    pub border_focused: Style,
    pub title:          Style,
    pub text:           Style,
    pub text_dim:       Style,
    pub selected:       Style,
    pub header:         Style,
    pub ok:             Style,
    pub warn:           Style,
    pub crit:           Style,
    pub footer_bg:      Style,
    pub footer_key:     Style,
    pub footer_text:    Style,
}

impl Theme {
    pub fn for_variant(v: ThemeVariant) -> Self {
        let p = v.palette();
        // the default variant keeps the terminal's own header text colour
        let header_fg = if v == ThemeVariant::Default { p.base } else { p.fg };
        Self {
            border:         Style::default().fg(p.frame),
            border_focused: Style::default().fg(p.accent),
            title:          Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
            text:           Style::default().fg(p.fg),
            text_dim:       Style::default().fg(p.dim),
            selected:       Style::default().fg(p.base).bg(p.select),
            header:         Style::default().fg(header_fg).bg(p.bar).add_modifier(Modifier::BOLD),
            ok:             Style::default().fg(p.ok),
            warn:           Style::default().fg(p.warn),
            crit:           Style::default().fg(p.crit).add_modifier(Modifier::BOLD),
            footer_bg:      Style::default().bg(p.status_bar).fg(p.fg),
            footer_key:     Style::default().bg(p.status_bar).fg(p.accent).add_modifier(Modifier::BOLD),
            footer_text:    Style::default().bg(p.status_bar).fg(p.dim),
        }
    }

    /// Style for a free-space percentage: little room left is the alarming end.
    pub fn free_style(&self, free_pct: u8) -> Style {
        if      free_pct <= 5  { self.crit }
        else if free_pct <= 15 { self.warn }
        else                   { self.ok   }
    }

    pub fn service_style(&self, active: bool) -> Style {
        if active { self.ok } else { self.warn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_cycle_back_to_default() {
        let mut v = ThemeVariant::Default;
        for _ in 0..4 { v = v.next(); }
        assert_eq!(v, ThemeVariant::Default);
        assert_eq!(ThemeVariant::from_name("NORD"), ThemeVariant::Nord);
        assert_eq!(ThemeVariant::from_name("solarized"), ThemeVariant::Default);
    }

    #[test]
    fn low_free_space_is_critical() {
        let t = Theme::for_variant(ThemeVariant::Default);
        assert_eq!(t.free_style(3), t.crit);
        assert_eq!(t.free_style(10), t.warn);
        assert_eq!(t.free_style(60), t.ok);
    }

    #[test]
    fn inactive_service_is_a_warning() {
        let t = Theme::for_variant(ThemeVariant::Nord);
        assert_eq!(t.service_style(true), t.ok);
        assert_eq!(t.service_style(false), t.warn);
    }
}
