//! Plain-text rendering of the dashboard panels and the settings tables.

use realize_core::config::Palette;
use realize_core::dashboard::Dashboard;
use realize_core::model::{
    Announcement, AnnouncementKind, AuthenticatedUser, Member, ScheduleEvent, Task, TimeSlot,
};
use realize_core::panel::Panel;
use std::fmt::Write as _;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::{OffsetDateTime, UtcOffset, Weekday};

pub const CHAT_GREETING: &str =
    "こんにちは！AIアシスタントです。メンバーの予定やタスクについて質問があれば、何でも聞いてください。";
const NO_ANNOUNCEMENTS: &str = "現在、新しいお知らせはありません。";
const NO_EVENTS: &str = "今週と来週の予定はありません。";
const NO_TASKS: &str = "No tasks assigned.";

/// Text produced by the assistant for the panels that need it.
#[derive(Debug, Default, Clone)]
pub struct GeneratedText {
    pub briefing: Option<String>,
    pub quote: Option<String>,
}

fn short_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "月",
        Weekday::Tuesday => "火",
        Weekday::Wednesday => "水",
        Weekday::Thursday => "木",
        Weekday::Friday => "金",
        Weekday::Saturday => "土",
        Weekday::Sunday => "日",
    }
}

pub fn format_day(at: OffsetDateTime) -> String {
    format!(
        "{:02}/{:02}({})",
        u8::from(at.month()),
        at.day(),
        short_weekday(at.weekday())
    )
}

pub fn format_clock(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

fn format_event_when(event: &ScheduleEvent, offset: UtcOffset) -> String {
    let start = event.start.to_offset(offset);
    let end = event.end.to_offset(offset);
    if event.is_all_day {
        if start.date() == end.date() {
            format!("{} 終日", format_day(start))
        } else {
            format!("{} - {} 終日", format_day(start), format_day(end))
        }
    } else {
        format!(
            "{} {} - {}",
            format_day(start),
            format_clock(start),
            format_clock(end)
        )
    }
}

pub fn render_header(user: &AuthenticatedUser, now: OffsetDateTime, palette: &Palette) -> String {
    format!(
        "{}  {}  {}  {}",
        palette.accentize("realize"),
        palette.mutedize("職員室ダッシュボード"),
        user.name,
        format_clock(now)
    )
}

/// One dot per panel, the active one filled.
pub fn render_position(active: usize, len: usize, palette: &Palette) -> String {
    (0..len)
        .map(|index| {
            if index == active {
                palette.accentize("●")
            } else {
                palette.mutedize("○")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_panel(
    panel: Panel,
    dashboard: &Dashboard,
    generated: &GeneratedText,
    now: OffsetDateTime,
    palette: &Palette,
) -> String {
    let body = match panel {
        Panel::Briefing => generated.briefing.clone().unwrap_or_default(),
        Panel::Timetable => render_timetables(dashboard, palette),
        Panel::Chat => format!(
            "{}\n\n{}",
            CHAT_GREETING,
            palette.mutedize("realize chat \"<質問>\" で質問できます。")
        ),
        Panel::Announcements => render_announcements(dashboard.announcements(), palette),
        Panel::TodoList => render_todo(dashboard, palette),
        Panel::WeeklySchedule => render_weekly_schedule(dashboard, now, palette),
        Panel::Quote => generated.quote.clone().unwrap_or_default(),
    };

    format!("{}\n\n{}", palette.accentize(panel.title()), body.trim_end())
}

fn render_timetables(dashboard: &Dashboard, palette: &Palette) -> String {
    let mut out = String::new();
    for entry in dashboard.timetables() {
        let _ = writeln!(out, "{}", palette.accentize(dashboard.member_name(&entry.member_id)));
        for slot in &entry.timetable {
            let _ = writeln!(
                out,
                "  {}限  [{}]  {}  {}",
                slot.period,
                slot.time,
                slot.subject,
                palette.mutedize(&slot.class)
            );
        }
        out.push('\n');
    }
    out
}

/// Important announcements first, otherwise in stored order.
pub fn sorted_announcements(announcements: &[Announcement]) -> Vec<&Announcement> {
    let mut sorted: Vec<&Announcement> = announcements.iter().collect();
    sorted.sort_by_key(|item| item.kind != AnnouncementKind::Important);
    sorted
}

fn render_announcements(announcements: &[Announcement], palette: &Palette) -> String {
    if announcements.is_empty() {
        return palette.mutedize(NO_ANNOUNCEMENTS);
    }

    let mut out = String::new();
    for item in sorted_announcements(announcements) {
        let marker = match item.kind {
            AnnouncementKind::Important => "!",
            AnnouncementKind::Event => "*",
            AnnouncementKind::Normal => "-",
        };
        let _ = writeln!(out, "{marker} {}", palette.accentize(&item.title));
        let _ = writeln!(out, "  {}", item.content);
    }
    out
}

fn render_todo(dashboard: &Dashboard, palette: &Palette) -> String {
    let mut out = String::new();
    for member in dashboard.members() {
        let _ = writeln!(
            out,
            "{}  [{}]",
            palette.accentize(&member.name),
            member.status
        );
        let tasks = dashboard.tasks_for(&member.id);
        if tasks.is_empty() {
            let _ = writeln!(out, "  {}", palette.mutedize(NO_TASKS));
        }
        for task in tasks {
            if task.completed {
                let _ = writeln!(out, "  [x] {}", palette.mutedize(&task.text));
            } else {
                let _ = writeln!(out, "  [ ] {}", task.text);
            }
        }
        out.push('\n');
    }
    out
}

fn render_weekly_schedule(dashboard: &Dashboard, now: OffsetDateTime, palette: &Palette) -> String {
    let events = dashboard.upcoming_events(now);
    if events.is_empty() {
        return palette.mutedize(NO_EVENTS);
    }

    let mut out = String::new();
    for event in events {
        let start = event.start.to_offset(now.offset());
        let when = if event.is_all_day {
            "終日".to_string()
        } else {
            format!(
                "{} - {}",
                format_clock(start),
                format_clock(event.end.to_offset(now.offset()))
            )
        };
        let _ = writeln!(
            out,
            "{}  {}  {}",
            palette.accentize(&format_day(start)),
            event.title,
            palette.mutedize(&when)
        );
    }
    out
}

#[derive(Tabled)]
struct MemberRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Tasks")]
    tasks: usize,
}

#[derive(Tabled)]
struct TaskRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: &'a str,
    #[tabled(rename = "Member")]
    member: &'a str,
}

#[derive(Tabled)]
struct SlotRow<'a> {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Period")]
    period: &'a str,
    #[tabled(rename = "Time")]
    time: &'a str,
    #[tabled(rename = "Subject")]
    subject: &'a str,
    #[tabled(rename = "Class")]
    class: &'a str,
}

#[derive(Tabled)]
struct AnnouncementRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Title")]
    title: &'a str,
    #[tabled(rename = "Content")]
    content: &'a str,
}

#[derive(Tabled)]
struct EventRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Title")]
    title: &'a str,
    #[tabled(rename = "When")]
    when: String,
}

fn table<R: Tabled>(rows: Vec<R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn members_table(dashboard: &Dashboard) -> String {
    table(
        dashboard
            .members()
            .iter()
            .map(|member| MemberRow {
                id: &member.id,
                name: &member.name,
                status: member.status.label(),
                tasks: dashboard.tasks_for(&member.id).len(),
            })
            .collect(),
    )
}

pub fn tasks_table(dashboard: &Dashboard, tasks: &[&Task]) -> String {
    table(
        tasks
            .iter()
            .map(|task| TaskRow {
                id: &task.id,
                done: if task.completed { "x" } else { "" },
                text: &task.text,
                member: dashboard.member_name(&task.member_id),
            })
            .collect(),
    )
}

pub fn slots_table(slots: &[TimeSlot]) -> String {
    table(
        slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotRow {
                index: index + 1,
                period: &slot.period,
                time: &slot.time,
                subject: &slot.subject,
                class: &slot.class,
            })
            .collect(),
    )
}

pub fn announcements_table(announcements: &[Announcement]) -> String {
    table(
        announcements
            .iter()
            .map(|item| AnnouncementRow {
                id: &item.id,
                kind: item.kind.label(),
                title: &item.title,
                content: &item.content,
            })
            .collect(),
    )
}

pub fn events_table(events: &[&ScheduleEvent], offset: UtcOffset) -> String {
    table(
        events
            .iter()
            .map(|event| EventRow {
                id: &event.id,
                title: &event.title,
                when: format_event_when(event, offset),
            })
            .collect(),
    )
}

pub fn member_line(member: &Member) -> String {
    format!("{} ({}) [{}]", member.name, member.id, member.status)
}
