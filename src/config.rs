//! User configuration — keybindings and fade settings, with persistence.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/veil/config.toml` (default `~/.config/veil/config.toml`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions in the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    FadeIn,
    FadeOut,
    ToggleFade,
    ToggleClass,
    ToggleVisibility,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the status hint and config file).
    pub const ALL: &[Action] = &[
        Action::MoveUp,
        Action::MoveDown,
        Action::FadeIn,
        Action::FadeOut,
        Action::ToggleFade,
        Action::ToggleClass,
        Action::ToggleVisibility,
        Action::Quit,
    ];

    /// Key used in the config file.
    fn config_key(self) -> &'static str {
        match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::FadeIn => "fade_in",
            Action::FadeOut => "fade_out",
            Action::ToggleFade => "toggle_fade",
            Action::ToggleClass => "toggle_class",
            Action::ToggleVisibility => "toggle_visibility",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        match s {
            "move_up" => Some(Action::MoveUp),
            "move_down" => Some(Action::MoveDown),
            "fade_in" => Some(Action::FadeIn),
            "fade_out" => Some(Action::FadeOut),
            "toggle_fade" => Some(Action::ToggleFade),
            "toggle_class" => Some(Action::ToggleClass),
            "toggle_visibility" => Some(Action::ToggleVisibility),
            "quit" => Some(Action::Quit),
            _ => None,
        }
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding — key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Does this binding match a key event?  Only CTRL/ALT/SHIFT modifiers
    /// are compared (platform-specific modifiers like SUPER are ignored).
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mask = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// User-friendly display string (e.g. `"Alt+↑"`, `"Ctrl+c"`, `"q"`).
    pub fn display(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            other => format!("{other:?}"),
        });
        s
    }

    /// Serialise to config-file format (e.g. `"Alt+Up"`, `"Ctrl+c"`, `"q"`).
    fn to_config_string(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Left => "Left".into(),
            KeyCode::Right => "Right".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::Tab => "Tab".into(),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+c"`, `"Alt+Up"`, `"q"`, `"Enter"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Char(' '),
            s if s.len() == 1 => KeyCode::Char(s.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

// ───────────────────────────────────────── config ────────────

/// Application configuration — keybindings and fade settings.
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Default duration of a fade started from the keyboard.
    pub fade_duration_ms: u64,
    /// Frame cadence of the event loop (drives fade ticks).
    pub tick_ms: u64,
}

impl AppConfig {
    /// Hard-coded default keybindings.
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(MoveUp, vec![KeyBind::new(Up, n), KeyBind::new(Char('k'), n)]);
        m.insert(MoveDown, vec![KeyBind::new(Down, n), KeyBind::new(Char('j'), n)]);
        m.insert(FadeIn, vec![KeyBind::new(Char('i'), n)]);
        m.insert(FadeOut, vec![KeyBind::new(Char('o'), n)]);
        m.insert(ToggleFade, vec![KeyBind::new(Char(' '), n)]);
        m.insert(ToggleClass, vec![KeyBind::new(Char('c'), n)]);
        m.insert(ToggleVisibility, vec![KeyBind::new(Char('v'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When multiple bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    /// Default fade duration as a [`Duration`].
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Short display of the first binding only (for the status bar).
    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].display(),
            _ => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}: navigate | {}/{}: fade in/out | {}: toggle fade | {}: class | {}: visibility | {}: quit",
            self.short_binding(Action::MoveUp),
            self.short_binding(Action::FadeIn),
            self.short_binding(Action::FadeOut),
            self.short_binding(Action::ToggleFade),
            self.short_binding(Action::ToggleClass),
            self.short_binding(Action::ToggleVisibility),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                return Self::parse_config(&contents);
            }
        }
        Self::default()
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        Ok(())
    }

    fn parse_config(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            // Fade settings.
            match key {
                "fade_duration_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        // Keep this bounded for predictable UX.
                        config.fade_duration_ms = v.clamp(50, 10_000);
                    }
                    continue;
                }
                "tick_ms" => {
                    if let Ok(v) = value.parse::<u64>() {
                        config.tick_ms = v.clamp(8, 250);
                    }
                    continue;
                }
                _ => {}
            }

            let Some(action) = Action::from_config_key(key) else {
                continue;
            };

            let mut parsed = Vec::new();
            for part in value.split(',') {
                let part = part.trim().trim_matches('"');
                if let Some(bind) = KeyBind::parse(part) {
                    parsed.push(bind);
                }
            }
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        config
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# veil configuration".to_string(),
            String::new(),
            "# Fade settings".to_string(),
            format!("fade_duration_ms = {}", self.fade_duration_ms),
            format!("tick_ms = {}", self.tick_ms),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            fade_duration_ms: 400,
            tick_ms: 16,
        }
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/veil/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("veil").join("config.toml")
}

// ───────────────────────────────────────── tests ─────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keybind_parse_and_serialise_round_trip() {
        for raw in ["q", "Ctrl+c", "Alt+Up", "Space", "Enter"] {
            let bind = KeyBind::parse(raw).unwrap();
            assert_eq!(bind.to_config_string(), raw);
        }
        assert!(KeyBind::parse("Hyper+x").is_none());
        assert!(KeyBind::parse("nonsense").is_none());
    }

    #[test]
    fn parse_config_overrides_and_clamps() {
        let config = AppConfig::parse_config(
            "# comment\nfade_duration_ms = 5\ntick_ms = 1000\nquit = Ctrl+q\n",
        );
        assert_eq!(config.fade_duration_ms, 50); // clamped up
        assert_eq!(config.tick_ms, 250); // clamped down
        assert_eq!(
            config.bindings[&Action::Quit],
            vec![KeyBind::new(KeyCode::Char('q'), KeyModifiers::CONTROL)]
        );
        // Untouched actions keep their defaults.
        assert!(!config.bindings[&Action::MoveUp].is_empty());
    }

    #[test]
    fn config_serialise_parse_round_trip() {
        let mut config = AppConfig::default();
        config.fade_duration_ms = 750;
        config.tick_ms = 33;
        config.bindings.insert(
            Action::Quit,
            vec![
                KeyBind::new(KeyCode::Esc, KeyModifiers::NONE),
                KeyBind::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
            ],
        );

        let reloaded = AppConfig::parse_config(&config.serialise());
        assert_eq!(reloaded.fade_duration_ms, 750);
        assert_eq!(reloaded.tick_ms, 33);
        for &action in Action::ALL {
            assert_eq!(reloaded.bindings[&action], config.bindings[&action]);
        }
    }

    #[test]
    fn match_key_respects_modifiers() {
        let mut config = AppConfig::default();
        config.bindings.insert(
            Action::FadeIn,
            vec![KeyBind::new(KeyCode::Char('i'), KeyModifiers::NONE)],
        );
        config.bindings.insert(
            Action::FadeOut,
            vec![KeyBind::new(KeyCode::Char('i'), KeyModifiers::CONTROL)],
        );

        let plain = KeyEvent::new(KeyCode::Char('i'), KeyModifiers::NONE);
        let ctrl = KeyEvent::new(KeyCode::Char('i'), KeyModifiers::CONTROL);
        assert_eq!(config.match_key(plain), Some(Action::FadeIn));
        assert_eq!(config.match_key(ctrl), Some(Action::FadeOut));
    }
}
