use crate::error::AppError;
use crate::model::{
    Announcement, Member, ScheduleEvent, Task, TimetableEntry, events_for_day, seed,
    upcoming_events,
};
use crate::storage::{
    ANNOUNCEMENTS_KEY, DurableState, JsonCodec, MEMBERS_KEY, SCHEDULE_KEY, ScheduleCodec,
    SharedStore, TASKS_KEY, TIMETABLES_KEY,
};
use time::OffsetDateTime;

/// The five persisted collections behind the dashboard panels and the
/// settings commands.
pub struct Dashboard {
    pub(crate) members: DurableState<Vec<Member>>,
    pub(crate) tasks: DurableState<Vec<Task>>,
    pub(crate) timetables: DurableState<Vec<TimetableEntry>>,
    pub(crate) announcements: DurableState<Vec<Announcement>>,
    pub(crate) schedule: DurableState<Vec<ScheduleEvent>, ScheduleCodec>,
}

impl Dashboard {
    /// Opens every collection, seeding the ones that have nothing stored.
    /// `now` anchors the seeded schedule.
    pub fn load(store: SharedStore, now: OffsetDateTime) -> Result<Self, AppError> {
        let members =
            DurableState::initialize(store.clone(), MEMBERS_KEY, seed::members(), JsonCodec::new())?;
        let tasks =
            DurableState::initialize(store.clone(), TASKS_KEY, seed::tasks(), JsonCodec::new())?;
        let timetables = DurableState::initialize(
            store.clone(),
            TIMETABLES_KEY,
            seed::timetables(),
            JsonCodec::new(),
        )?;
        let announcements = DurableState::initialize(
            store.clone(),
            ANNOUNCEMENTS_KEY,
            seed::announcements(),
            JsonCodec::new(),
        )?;
        let schedule = DurableState::initialize(
            store,
            SCHEDULE_KEY,
            seed::schedule_events(now),
            ScheduleCodec,
        )?;

        tracing::debug!(
            members = members.get().len(),
            tasks = tasks.get().len(),
            timetables = timetables.get().len(),
            announcements = announcements.get().len(),
            events = schedule.get().len(),
            "dashboard loaded"
        );

        Ok(Self {
            members,
            tasks,
            timetables,
            announcements,
            schedule,
        })
    }

    pub fn members(&self) -> &[Member] {
        self.members.get()
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.get()
    }

    pub fn timetables(&self) -> &[TimetableEntry] {
        self.timetables.get()
    }

    pub fn announcements(&self) -> &[Announcement] {
        self.announcements.get()
    }

    pub fn schedule_events(&self) -> &[ScheduleEvent] {
        self.schedule.get()
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members().iter().find(|member| member.id == id)
    }

    /// Display name for a possibly dangling member reference.
    pub fn member_name(&self, id: &str) -> &str {
        self.member(id)
            .map(|member| member.name.as_str())
            .unwrap_or("Unknown")
    }

    pub fn tasks_for(&self, member_id: &str) -> Vec<&Task> {
        self.tasks()
            .iter()
            .filter(|task| task.member_id == member_id)
            .collect()
    }

    pub fn timetable_for(&self, member_id: &str) -> Option<&TimetableEntry> {
        self.timetables()
            .iter()
            .find(|entry| entry.member_id == member_id)
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks().iter().filter(|task| !task.completed).count()
    }

    pub fn events_today(&self, now: OffsetDateTime) -> Vec<&ScheduleEvent> {
        events_for_day(self.schedule_events(), now.date(), now.offset())
    }

    pub fn upcoming_events(&self, now: OffsetDateTime) -> Vec<&ScheduleEvent> {
        upcoming_events(self.schedule_events(), now)
    }

    /// Schedule events ordered by start, as the settings list shows them.
    pub fn events_by_start(&self) -> Vec<&ScheduleEvent> {
        let mut events: Vec<&ScheduleEvent> = self.schedule_events().iter().collect();
        events.sort_by_key(|event| event.start);
        events
    }
}
