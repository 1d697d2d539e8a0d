use std::fmt;
use std::str::FromStr;

/// One slide of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Briefing,
    Timetable,
    Chat,
    Announcements,
    TodoList,
    WeeklySchedule,
    Quote,
}

impl Panel {
    /// Slideshow order.
    pub const ALL: [Panel; 7] = [
        Panel::Briefing,
        Panel::Timetable,
        Panel::Chat,
        Panel::Announcements,
        Panel::TodoList,
        Panel::WeeklySchedule,
        Panel::Quote,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Briefing => "今日のブリーフィング",
            Panel::Timetable => "本日の時間割",
            Panel::Chat => "AIアシスタント",
            Panel::Announcements => "お知らせ",
            Panel::TodoList => "メンバー状況 & ToDo",
            Panel::WeeklySchedule => "週間予定",
            Panel::Quote => "今日の言葉",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Panel::Briefing => "briefing",
            Panel::Timetable => "timetable",
            Panel::Chat => "chat",
            Panel::Announcements => "announcements",
            Panel::TodoList => "todo",
            Panel::WeeklySchedule => "schedule",
            Panel::Quote => "quote",
        }
    }

    /// Panels that call the text generator when rendered.
    pub fn needs_assistant(self) -> bool {
        matches!(self, Panel::Briefing | Panel::Quote)
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "briefing" | "dailybriefing" => Ok(Panel::Briefing),
            "timetable" => Ok(Panel::Timetable),
            "chat" | "aichat" => Ok(Panel::Chat),
            "announcements" | "announcement" => Ok(Panel::Announcements),
            "todo" | "todolist" | "tasks" => Ok(Panel::TodoList),
            "schedule" | "weeklyschedule" => Ok(Panel::WeeklySchedule),
            "quote" | "aiquote" => Ok(Panel::Quote),
            _ => Err(format!(
                "unknown panel '{}' (expected one of: {})",
                raw.trim(),
                Panel::ALL.map(Panel::slug).join(", ")
            )),
        }
    }
}
