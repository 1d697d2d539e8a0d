use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::model::{
    Announcement, AnnouncementKind, Member, MemberStatus, ScheduleEvent, Task, TimeSlot,
    TimetableEntry,
};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, UtcOffset};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub content: String,
    pub kind: AnnouncementKind,
}

impl From<&Announcement> for AnnouncementDraft {
    fn from(announcement: &Announcement) -> Self {
        Self {
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            kind: announcement.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start_date: Date,
    pub start_time: Option<Time>,
    pub end_date: Option<Date>,
    pub end_time: Option<Time>,
    pub is_all_day: bool,
}

impl EventDraft {
    pub fn from_event(event: &ScheduleEvent, offset: UtcOffset) -> Self {
        let start = event.start.to_offset(offset);
        let end = event.end.to_offset(offset);
        Self {
            title: event.title.clone(),
            start_date: start.date(),
            start_time: Some(start.time()),
            end_date: Some(end.date()),
            end_time: Some(end.time()),
            is_all_day: event.is_all_day,
        }
    }

    /// All-day events run from 00:00:00 on the start date to 23:59:59 on the
    /// end date. Otherwise a missing start time means midnight and a missing
    /// end time repeats the start time. A missing end date repeats the start
    /// date.
    pub fn resolve(&self, offset: UtcOffset) -> (OffsetDateTime, OffsetDateTime) {
        let end_date = self.end_date.unwrap_or(self.start_date);
        let (start_time, end_time) = if self.is_all_day {
            (Time::MIDNIGHT, end_of_day())
        } else {
            let start_time = self.start_time.unwrap_or(Time::MIDNIGHT);
            (start_time, self.end_time.unwrap_or(start_time))
        };

        (
            self.start_date.with_time(start_time).assume_offset(offset),
            end_date.with_time(end_time).assume_offset(offset),
        )
    }
}

fn end_of_day() -> Time {
    Time::from_hms(23, 59, 59).unwrap_or(Time::MIDNIGHT)
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input(format!("date must be YYYY-MM-DD, got '{trimmed}'")))
}

pub fn parse_time(raw: &str) -> Result<Time, AppError> {
    let trimmed = raw.trim();
    Time::parse(trimmed, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(trimmed, format_description!("[hour]:[minute]")))
        .map_err(|_| AppError::invalid_input(format!("time must be HH:MM, got '{trimmed}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    Period,
    Time,
    Subject,
    Class,
}

impl FromStr for SlotField {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "period" => Ok(SlotField::Period),
            "time" => Ok(SlotField::Time),
            "subject" => Ok(SlotField::Subject),
            "class" => Ok(SlotField::Class),
            other => Err(format!(
                "unknown slot field '{other}' (expected period, time, subject or class)"
            )),
        }
    }
}

impl fmt::Display for SlotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotField::Period => "period",
            SlotField::Time => "time",
            SlotField::Subject => "subject",
            SlotField::Class => "class",
        })
    }
}

fn fresh_id<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    let mut stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    loop {
        let id = format!("{prefix}{stamp}");
        if !taken.contains(id.as_str()) {
            return id;
        }
        stamp += 1;
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn replace_by<T: Clone>(items: &[T], updated: &T, matches: impl Fn(&T) -> bool) -> Vec<T> {
    items
        .iter()
        .map(|item| {
            if matches(item) {
                updated.clone()
            } else {
                item.clone()
            }
        })
        .collect()
}

fn without<T: Clone>(items: &[T], matches: impl Fn(&T) -> bool) -> Vec<T> {
    items.iter().filter(|item| !matches(item)).cloned().collect()
}

impl Dashboard {
    /// Adds a member with an empty timetable.
    pub fn add_member(&mut self, name: &str) -> Result<Member, AppError> {
        let name = required(name, "name")?;
        let id = fresh_id("", self.members().iter().map(|member| member.id.as_str()));
        let member = Member {
            avatar: format!("https://i.pravatar.cc/150?u={id}"),
            id: id.clone(),
            name: name.to_string(),
            status: MemberStatus::Available,
        };

        self.members.update(|members| {
            let mut next = members.clone();
            next.push(member.clone());
            next
        })?;
        self.timetables.update(|timetables| {
            let mut next = timetables.clone();
            next.push(TimetableEntry {
                member_id: id,
                timetable: Vec::new(),
            });
            next
        })?;

        tracing::info!(member_id = %member.id, "member added");
        Ok(member)
    }

    pub fn update_member(&mut self, id: &str, update: MemberUpdate) -> Result<Member, AppError> {
        let id = required(id, "id")?;
        let mut member = self
            .member(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("member not found"))?;
        if let Some(name) = update.name.as_deref() {
            member.name = required(name, "name")?.to_string();
        }
        if let Some(status) = update.status {
            member.status = status;
        }

        self.members
            .update(|members| replace_by(members, &member, |m| m.id == id))?;
        Ok(member)
    }

    /// Removes the member together with their tasks and timetable.
    pub fn delete_member(&mut self, id: &str) -> Result<Member, AppError> {
        let id = required(id, "id")?;
        let member = self
            .member(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("member not found"))?;

        let members = without(self.members(), |m| m.id == id);
        let tasks = without(self.tasks(), |task| task.member_id == id);
        let timetables = without(self.timetables(), |entry| entry.member_id == id);

        // Dependents are written before the member itself.
        self.tasks.set(tasks)?;
        self.timetables.set(timetables)?;
        self.members.set(members)?;

        tracing::info!(member_id = %id, "member deleted with tasks and timetable");
        Ok(member)
    }

    pub fn add_task(&mut self, text: &str, member_id: &str) -> Result<Task, AppError> {
        let text = required(text, "text")?;
        let member_id = required(member_id, "member id")?;
        if self.member(member_id).is_none() {
            return Err(AppError::not_found("member not found"));
        }

        let task = Task {
            id: fresh_id("t", self.tasks().iter().map(|task| task.id.as_str())),
            text: text.to_string(),
            completed: false,
            member_id: member_id.to_string(),
        };
        self.tasks.update(|tasks| {
            let mut next = tasks.clone();
            next.push(task.clone());
            next
        })?;
        Ok(task)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<Task, AppError> {
        let id = required(id, "id")?;
        let mut task = self
            .tasks()
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("task not found"))?;
        task.completed = !task.completed;

        self.tasks
            .update(|tasks| replace_by(tasks, &task, |t| t.id == id))?;
        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, AppError> {
        let id = required(id, "id")?;
        let task = self
            .tasks()
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("task not found"))?;

        self.tasks.update(|tasks| without(tasks, |t| t.id == id))?;
        Ok(task)
    }

    pub fn add_announcement(&mut self, draft: AnnouncementDraft) -> Result<Announcement, AppError> {
        let title = required(&draft.title, "title")?;
        let announcement = Announcement {
            id: fresh_id(
                "a",
                self.announcements().iter().map(|item| item.id.as_str()),
            ),
            title: title.to_string(),
            content: draft.content,
            kind: draft.kind,
        };

        self.announcements.update(|announcements| {
            let mut next = announcements.clone();
            next.push(announcement.clone());
            next
        })?;
        Ok(announcement)
    }

    pub fn update_announcement(
        &mut self,
        id: &str,
        draft: AnnouncementDraft,
    ) -> Result<Announcement, AppError> {
        let id = required(id, "id")?;
        let title = required(&draft.title, "title")?;
        if !self.announcements().iter().any(|item| item.id == id) {
            return Err(AppError::not_found("announcement not found"));
        }

        let announcement = Announcement {
            id: id.to_string(),
            title: title.to_string(),
            content: draft.content,
            kind: draft.kind,
        };
        self.announcements
            .update(|announcements| replace_by(announcements, &announcement, |a| a.id == id))?;
        Ok(announcement)
    }

    pub fn delete_announcement(&mut self, id: &str) -> Result<Announcement, AppError> {
        let id = required(id, "id")?;
        let announcement = self
            .announcements()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("announcement not found"))?;

        self.announcements
            .update(|announcements| without(announcements, |a| a.id == id))?;
        Ok(announcement)
    }

    pub fn add_event(
        &mut self,
        draft: &EventDraft,
        offset: UtcOffset,
    ) -> Result<ScheduleEvent, AppError> {
        let title = required(&draft.title, "title")?;
        let (start, end) = draft.resolve(offset);
        let event = ScheduleEvent {
            id: fresh_id("e", self.schedule_events().iter().map(|e| e.id.as_str())),
            title: title.to_string(),
            start,
            end,
            is_all_day: draft.is_all_day,
        };

        self.schedule.update(|events| {
            let mut next = events.clone();
            next.push(event.clone());
            next
        })?;
        Ok(event)
    }

    pub fn update_event(
        &mut self,
        id: &str,
        draft: &EventDraft,
        offset: UtcOffset,
    ) -> Result<ScheduleEvent, AppError> {
        let id = required(id, "id")?;
        let title = required(&draft.title, "title")?;
        if !self.schedule_events().iter().any(|event| event.id == id) {
            return Err(AppError::not_found("event not found"));
        }

        let (start, end) = draft.resolve(offset);
        let event = ScheduleEvent {
            id: id.to_string(),
            title: title.to_string(),
            start,
            end,
            is_all_day: draft.is_all_day,
        };
        self.schedule
            .update(|events| replace_by(events, &event, |e| e.id == id))?;
        Ok(event)
    }

    pub fn delete_event(&mut self, id: &str) -> Result<ScheduleEvent, AppError> {
        let id = required(id, "id")?;
        let event = self
            .schedule_events()
            .iter()
            .find(|event| event.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("event not found"))?;

        self.schedule.update(|events| without(events, |e| e.id == id))?;
        Ok(event)
    }

    fn edit_timetable<R>(
        &mut self,
        member_id: &str,
        edit: impl FnOnce(&mut Vec<TimeSlot>) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let member_id = required(member_id, "member id")?;
        let mut entry = self
            .timetable_for(member_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("timetable not found"))?;
        let result = edit(&mut entry.timetable)?;

        self.timetables
            .update(|timetables| replace_by(timetables, &entry, |e| e.member_id == member_id))?;
        Ok(result)
    }

    /// Appends an empty slot numbered after the existing ones.
    pub fn add_timetable_slot(&mut self, member_id: &str) -> Result<TimeSlot, AppError> {
        self.edit_timetable(member_id, |slots| {
            let slot = TimeSlot {
                period: (slots.len() + 1).to_string(),
                ..TimeSlot::default()
            };
            slots.push(slot.clone());
            Ok(slot)
        })
    }

    pub fn set_timetable_slot(
        &mut self,
        member_id: &str,
        index: usize,
        field: SlotField,
        value: &str,
    ) -> Result<TimeSlot, AppError> {
        self.edit_timetable(member_id, |slots| {
            let slot = slots
                .get_mut(index)
                .ok_or_else(|| AppError::not_found(format!("slot {index} not found")))?;
            let target = match field {
                SlotField::Period => &mut slot.period,
                SlotField::Time => &mut slot.time,
                SlotField::Subject => &mut slot.subject,
                SlotField::Class => &mut slot.class,
            };
            *target = value.to_string();
            Ok(slot.clone())
        })
    }

    pub fn delete_timetable_slot(
        &mut self,
        member_id: &str,
        index: usize,
    ) -> Result<TimeSlot, AppError> {
        self.edit_timetable(member_id, |slots| {
            if index >= slots.len() {
                return Err(AppError::not_found(format!("slot {index} not found")));
            }
            Ok(slots.remove(index))
        })
    }
}
