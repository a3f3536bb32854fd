//! Level and death counter display.

/// Receives the HUD text every time the level or the death count changes.
pub trait HudSink {
    fn show(&mut self, text: &str);
}

pub fn hud_text(level: usize, deaths: u32) -> String {
    format!("Level {} | Deaths {}", level + 1, deaths)
}

pub fn complete_text(deaths: u32) -> String {
    format!("All levels complete | Deaths {}", deaths)
}

/// Writes the HUD to the log. Used when there is no window.
#[derive(Debug, Default)]
pub struct LogHud;

impl HudSink for LogHud {
    fn show(&mut self, text: &str) {
        log::info!("{}", text);
    }
}

/// Keeps every message; the last one is what a player would see.
#[derive(Debug, Default, Clone)]
pub struct MemoryHud {
    pub messages: Vec<String>,
}

impl MemoryHud {
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl HudSink for MemoryHud {
    fn show(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}
