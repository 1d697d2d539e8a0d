mod announcement;
mod member;
mod schedule;
pub mod seed;
mod task;
mod timetable;
mod user;

pub use announcement::{Announcement, AnnouncementKind};
pub use member::{Member, MemberStatus};
pub use schedule::{ScheduleEvent, events_for_day, upcoming_events};
pub use task::Task;
pub use timetable::{TimeSlot, TimetableEntry};
pub use user::AuthenticatedUser;
