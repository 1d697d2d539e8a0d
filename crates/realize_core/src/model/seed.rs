//! Collections a fresh dashboard starts with.

use super::{
    Announcement, AnnouncementKind, Member, MemberStatus, ScheduleEvent, Task, TimeSlot,
    TimetableEntry,
};
use time::{Duration, OffsetDateTime, Time};

fn member(id: &str, name: &str, handle: &str, status: MemberStatus) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        avatar: format!("https://i.pravatar.cc/150?u={handle}"),
        status,
    }
}

pub fn members() -> Vec<Member> {
    vec![
        member("1", "佐藤 健太", "sato", MemberStatus::Available),
        member("2", "鈴木 優子", "suzuki", MemberStatus::Meeting),
        member("3", "高橋 涼介", "takahashi", MemberStatus::ClubActivity),
        member("4", "田中 美咲", "tanaka", MemberStatus::BusinessTrip),
    ]
}

fn task(id: &str, text: &str, completed: bool, member_id: &str) -> Task {
    Task {
        id: id.to_string(),
        text: text.to_string(),
        completed,
        member_id: member_id.to_string(),
    }
}

pub fn tasks() -> Vec<Task> {
    vec![
        task("t1", "Prepare for next week's science experiment", false, "1"),
        task("t2", "Grade midterm exams", true, "1"),
        task("t3", "Update parent contact list", false, "2"),
        task("t4", "Plan for the upcoming school festival", false, "3"),
        task("t5", "Finalize basketball club tournament entry", true, "3"),
        task("t6", "Submit budget report", false, "4"),
    ]
}

const PERIOD_TIMES: [&str; 4] = [
    "09:00 - 09:50",
    "10:00 - 10:50",
    "11:00 - 11:50",
    "12:00 - 12:50",
];

fn timetable(member_id: &str, lessons: [(&str, &str); 4]) -> TimetableEntry {
    TimetableEntry {
        member_id: member_id.to_string(),
        timetable: lessons
            .iter()
            .zip(PERIOD_TIMES)
            .enumerate()
            .map(|(index, ((subject, class), time))| TimeSlot {
                period: (index + 1).to_string(),
                time: time.to_string(),
                subject: subject.to_string(),
                class: class.to_string(),
            })
            .collect(),
    }
}

pub fn timetables() -> Vec<TimetableEntry> {
    vec![
        timetable(
            "1",
            [
                ("Science", "Class 2-A"),
                ("Prep Time", ""),
                ("Science", "Class 2-C"),
                ("Science Lab", "Class 2-A"),
            ],
        ),
        timetable(
            "2",
            [
                ("Japanese", "Class 1-B"),
                ("Japanese", "Class 1-C"),
                ("Prep Time", ""),
                ("Japanese", "Class 1-A"),
            ],
        ),
        timetable(
            "3",
            [
                ("P.E.", "Class 3-A"),
                ("P.E.", "Class 3-B"),
                ("Prep Time", ""),
                ("Health", "Class 3-C"),
            ],
        ),
        timetable(
            "4",
            [
                ("English", "Class 2-B"),
                ("English", "Class 2-D"),
                ("English", "Class 2-A"),
                ("Prep Time", ""),
            ],
        ),
    ]
}

fn event(
    id: &str,
    title: &str,
    start: OffsetDateTime,
    end: OffsetDateTime,
    is_all_day: bool,
) -> ScheduleEvent {
    ScheduleEvent {
        id: id.to_string(),
        title: title.to_string(),
        start,
        end,
        is_all_day,
    }
}

/// Seed events are placed relative to `now` so a fresh dashboard always has
/// something in the coming week.
pub fn schedule_events(now: OffsetDateTime) -> Vec<ScheduleEvent> {
    let at = |hour: u8| {
        Time::from_hms(hour, 0, 0)
            .map(|time| now.replace_time(time))
            .unwrap_or(now)
    };
    let in_days = |days: i64| now + Duration::days(days);

    vec![
        event("e1", "Department Meeting", at(16), at(17), false),
        event(
            "e2",
            "Parent-Teacher Conferences",
            in_days(2),
            in_days(2),
            true,
        ),
        event("e3", "Midterm Grading Deadline", in_days(4), in_days(4), true),
        event("e4", "Faculty Training Workshop", in_days(8), in_days(8), false),
        event("e5", "School Sports Festival", in_days(10), in_days(11), true),
    ]
}

fn announcement(id: &str, title: &str, content: &str, kind: AnnouncementKind) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        kind,
    }
}

pub fn announcements() -> Vec<Announcement> {
    vec![
        announcement(
            "a1",
            "職員会議のお知らせ",
            "来週月曜日の16:00から第1会議室にて定例の職員会議を行います。",
            AnnouncementKind::Normal,
        ),
        announcement(
            "a2",
            "【重要】避難訓練の実施について",
            "明日10:00より、全校一斉の避難訓練を実施します。指定された避難経路を確認してください。",
            AnnouncementKind::Important,
        ),
        announcement(
            "a3",
            "球技大会の参加チーム募集",
            "来月開催される球技大会の参加チームを募集します。詳細は体育科の高橋先生まで。",
            AnnouncementKind::Event,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{members, schedule_events, tasks, timetables};
    use time::macros::datetime;

    #[test]
    fn every_seed_member_has_a_timetable() {
        let members = members();
        let timetables = timetables();

        assert_eq!(members.len(), timetables.len());
        for member in &members {
            assert!(timetables.iter().any(|entry| entry.member_id == member.id));
        }
        assert!(tasks().iter().all(|task| members.iter().any(|m| m.id == task.member_id)));
    }

    #[test]
    fn seed_events_are_relative_to_now() {
        let now = datetime!(2025-06-04 10:30 UTC);
        let events = schedule_events(now);

        assert_eq!(events[0].start, datetime!(2025-06-04 16:00 UTC));
        assert_eq!(events[0].end, datetime!(2025-06-04 17:00 UTC));
        assert_eq!(events[4].start, datetime!(2025-06-14 10:30 UTC));
        assert_eq!(events[4].end, datetime!(2025-06-15 10:30 UTC));
    }
}
