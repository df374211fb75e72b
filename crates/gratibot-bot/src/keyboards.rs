//! Reply keyboards and the button labels the router matches on.

use gratibot_core::types::Keyboard;

pub const BTN_SHOW_GRATITUDE: &str = "📝 Show Gratitude";
pub const BTN_STATISTICS: &str = "📊 Statistics";
pub const BTN_SETTINGS: &str = "⚙️ Settings";
pub const BTN_REMINDER_SETTINGS: &str = "🔔 Reminder Settings";
pub const BTN_ENABLE_REMINDERS: &str = "🔔 Enable Reminders";
pub const BTN_DISABLE_REMINDERS: &str = "🔕 Disable Reminders";
pub const BTN_CHANGE_TIMEZONE: &str = "🌍 Change Timezone";
pub const BTN_TODAY_TIME: &str = "🕐 Today's Reminder Time";
pub const BTN_SEND_NOW: &str = "📅 Send Reminder Now";
pub const BTN_SKIP: &str = "⏭️ Skip for now";
pub const BTN_GO_BACK: &str = "↩️ Go Back";

/// Button label and IANA name for each timezone the menu offers.
pub const TIMEZONE_OPTIONS: &[(&str, &str)] = &[
    ("🇬🇧 London (UTC+0)", "Europe/London"),
    ("🇵🇱 Warsaw (UTC+1)", "Europe/Warsaw"),
    ("🇰🇿 Astana (UTC+6)", "Asia/Almaty"),
];

pub fn main_menu() -> Keyboard {
    Keyboard::new(vec![
        vec![BTN_SHOW_GRATITUDE],
        vec![BTN_REMINDER_SETTINGS],
        vec![BTN_STATISTICS, BTN_SETTINGS],
    ])
}

pub fn gratitude_mode() -> Keyboard {
    Keyboard::new(vec![vec![BTN_GO_BACK]])
}

/// Shown under the daily reminder prompt.
pub fn reminder_reply() -> Keyboard {
    Keyboard::new(vec![vec![BTN_SKIP]])
}

pub fn reminder_settings(enabled: bool) -> Keyboard {
    let toggle = if enabled {
        BTN_DISABLE_REMINDERS
    } else {
        BTN_ENABLE_REMINDERS
    };
    Keyboard::new(vec![
        vec![toggle],
        vec![BTN_TODAY_TIME, BTN_SEND_NOW],
        vec![BTN_CHANGE_TIMEZONE],
        vec![BTN_GO_BACK],
    ])
}

pub fn timezone_selection() -> Keyboard {
    let mut rows: Vec<Vec<&str>> = TIMEZONE_OPTIONS
        .iter()
        .map(|(label, _)| vec![*label])
        .collect();
    rows.push(vec![BTN_GO_BACK]);
    Keyboard::new(rows)
}

/// The IANA timezone a button label selects, if any.
pub fn timezone_for_button(text: &str) -> Option<&'static str> {
    TIMEZONE_OPTIONS
        .iter()
        .find(|(label, _)| *label == text)
        .map(|(_, tz)| *tz)
}

/// The button label for a stored timezone, falling back to the raw name.
pub fn timezone_display_name(timezone: &str) -> &str {
    TIMEZONE_OPTIONS
        .iter()
        .find(|(_, tz)| *tz == timezone)
        .map(|(label, _)| *label)
        .unwrap_or(timezone)
}
