mod blob;
mod codec;
mod durable;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore, SharedStore, store_dir};
pub use codec::{Codec, JsonCodec, ScheduleCodec};
pub use durable::DurableState;

pub const MEMBERS_KEY: &str = "realize-members";
pub const TASKS_KEY: &str = "realize-tasks";
pub const TIMETABLES_KEY: &str = "realize-timetables";
pub const ANNOUNCEMENTS_KEY: &str = "realize-announcements";
pub const SCHEDULE_KEY: &str = "realize-schedule";
pub const USER_KEY: &str = "realize-user";
