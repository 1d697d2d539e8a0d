use super::blob::SharedStore;
use super::codec::{Codec, JsonCodec};
use crate::error::AppError;

/// An in-memory value mirrored into one store key.
///
/// The stored blob is read once, when the state is initialized. Every update
/// afterwards replaces the whole value and writes it back before returning.
pub struct DurableState<T, C = JsonCodec<T>> {
    key: String,
    value: T,
    codec: C,
    store: SharedStore,
}

impl<T, C: Codec<T>> DurableState<T, C> {
    /// Loads `key`, falling back to `default` when nothing is stored or the
    /// stored blob cannot be read back. The resulting value is written to the
    /// key straight away; only that write can fail.
    pub fn initialize<K: Into<String>>(
        store: SharedStore,
        key: K,
        default: T,
        codec: C,
    ) -> Result<Self, AppError> {
        let key = key.into();
        let value = match store.get(&key) {
            Ok(Some(blob)) => match codec.decode(&blob) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "failed to decode stored value, using default");
                    default
                }
            },
            Ok(None) => {
                tracing::debug!(key = %key, "no stored value, using default");
                default
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to read stored value, using default");
                default
            }
        };

        let state = Self {
            key,
            value,
            codec,
            store,
        };
        state.persist()?;
        Ok(state)
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) -> Result<(), AppError> {
        self.value = value;
        self.persist()
    }

    pub fn update<F>(&mut self, next: F) -> Result<(), AppError>
    where
        F: FnOnce(&T) -> T,
    {
        let value = next(&self.value);
        self.set(value)
    }

    fn persist(&self) -> Result<(), AppError> {
        let blob = self.codec.encode(&self.value)?;
        self.store.set(&self.key, &blob)
    }
}

#[cfg(test)]
mod tests {
    use super::DurableState;
    use crate::error::AppError;
    use crate::model::{
        Announcement, AnnouncementKind, Member, MemberStatus, ScheduleEvent, Task, TimeSlot,
        TimetableEntry, seed,
    };
    use crate::storage::{
        BlobStore, FileBlobStore, JsonCodec, MemoryBlobStore, ScheduleCodec, SharedStore,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::macros::datetime;

    fn memory_store() -> SharedStore {
        Arc::new(MemoryBlobStore::new())
    }

    fn reopen<T>(store: &SharedStore, key: &str, default: T) -> T
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        DurableState::initialize(store.clone(), key, default, JsonCodec::new())
            .unwrap()
            .value
    }

    #[test]
    fn absent_key_yields_default_unchanged() {
        let store = memory_store();
        let state =
            DurableState::initialize(store, "realize-members", seed::members(), JsonCodec::new())
                .unwrap();

        assert_eq!(state.get(), &seed::members());
    }

    #[test]
    fn initialize_writes_the_value_back() {
        let store = memory_store();
        DurableState::initialize(store.clone(), "realize-tasks", seed::tasks(), JsonCodec::new())
            .unwrap();

        assert!(store.get("realize-tasks").unwrap().is_some());
    }

    #[test]
    fn collections_round_trip_through_reload() {
        let store = memory_store();
        let members = vec![Member {
            id: "9".into(),
            name: "伊藤 翼".into(),
            avatar: "https://i.pravatar.cc/150?u=9".into(),
            status: MemberStatus::OnBreak,
        }];
        let tasks = vec![Task {
            id: "t9".into(),
            text: "Collect forms".into(),
            completed: true,
            member_id: "9".into(),
        }];
        let timetables = vec![TimetableEntry {
            member_id: "9".into(),
            timetable: vec![TimeSlot {
                period: "1".into(),
                time: "09:00 - 09:50".into(),
                subject: "Music".into(),
                class: "Class 1-A".into(),
            }],
        }];
        let announcements = vec![Announcement {
            id: "a9".into(),
            title: "Choir".into(),
            content: "Practice moved to Friday".into(),
            kind: AnnouncementKind::Event,
        }];

        let mut state = DurableState::initialize(
            store.clone(),
            "m",
            Vec::<Member>::new(),
            JsonCodec::new(),
        )
        .unwrap();
        state.set(members.clone()).unwrap();
        let mut state = DurableState::initialize(
            store.clone(),
            "t",
            Vec::<Task>::new(),
            JsonCodec::new(),
        )
        .unwrap();
        state.set(tasks.clone()).unwrap();
        let mut state = DurableState::initialize(
            store.clone(),
            "tt",
            Vec::<TimetableEntry>::new(),
            JsonCodec::new(),
        )
        .unwrap();
        state.set(timetables.clone()).unwrap();
        let mut state = DurableState::initialize(
            store.clone(),
            "a",
            Vec::<Announcement>::new(),
            JsonCodec::new(),
        )
        .unwrap();
        state.set(announcements.clone()).unwrap();

        assert_eq!(reopen(&store, "m", Vec::<Member>::new()), members);
        assert_eq!(reopen(&store, "t", Vec::<Task>::new()), tasks);
        assert_eq!(reopen(&store, "tt", Vec::<TimetableEntry>::new()), timetables);
        assert_eq!(reopen(&store, "a", Vec::<Announcement>::new()), announcements);
    }

    #[test]
    fn schedule_events_revive_as_datetimes() {
        let store = memory_store();
        let events = seed::schedule_events(datetime!(2025-06-04 10:30 +09:00));
        DurableState::initialize(store.clone(), "realize-schedule", events.clone(), ScheduleCodec)
            .unwrap();

        let reloaded: DurableState<Vec<ScheduleEvent>, ScheduleCodec> =
            DurableState::initialize(store, "realize-schedule", Vec::new(), ScheduleCodec).unwrap();

        assert_eq!(reloaded.get().len(), events.len());
        for (revived, original) in reloaded.get().iter().zip(&events) {
            assert_eq!(revived.start, original.start);
            assert_eq!(revived.end, original.end);
            assert_eq!(revived, original);
        }
    }

    #[test]
    fn corrupt_blob_falls_back_to_default() {
        let store = memory_store();
        store.set("realize-tasks", "{ not json").unwrap();

        let state =
            DurableState::initialize(store.clone(), "realize-tasks", seed::tasks(), JsonCodec::new())
                .unwrap();

        assert_eq!(state.get(), &seed::tasks());
        let rewritten: Vec<Task> =
            serde_json::from_str(&store.get("realize-tasks").unwrap().unwrap()).unwrap();
        assert_eq!(rewritten, seed::tasks());
    }

    #[test]
    fn incompatible_shape_falls_back_to_default() {
        let store = memory_store();
        store
            .set("realize-members", r#"{"members": "everyone"}"#)
            .unwrap();

        let state = DurableState::initialize(
            store,
            "realize-members",
            seed::members(),
            JsonCodec::new(),
        )
        .unwrap();

        assert_eq!(state.get(), &seed::members());
    }

    #[test]
    fn unreadable_schedule_dates_fall_back_to_default() {
        let store = memory_store();
        store
            .set(
                "realize-schedule",
                r#"[{"id":"e1","title":"x","start":"soon","end":"later","isAllDay":false}]"#,
            )
            .unwrap();

        let state =
            DurableState::initialize(store, "realize-schedule", Vec::new(), ScheduleCodec).unwrap();

        assert!(state.get().is_empty());
    }

    #[test]
    fn update_derives_from_previous_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store: SharedStore = Arc::new(FileBlobStore::new(dir.path()));
        let mut state =
            DurableState::initialize(store.clone(), "realize-tasks", seed::tasks(), JsonCodec::new())
                .unwrap();

        state
            .update(|tasks| {
                tasks
                    .iter()
                    .filter(|task| task.id != "t1")
                    .cloned()
                    .collect()
            })
            .unwrap();

        assert_eq!(state.get().len(), 5);
        let reloaded = reopen(&store, "realize-tasks", Vec::<Task>::new());
        assert_eq!(&reloaded, state.get());
    }

    struct CountingStore {
        inner: MemoryBlobStore,
        writes: AtomicUsize,
    }

    impl BlobStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), AppError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn one_write_per_update() {
        let store = Arc::new(CountingStore {
            inner: MemoryBlobStore::new(),
            writes: AtomicUsize::new(0),
        });
        let mut state =
            DurableState::initialize(store.clone(), "n", vec![1_u32], JsonCodec::new()).unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        state.update(|values| values.iter().map(|v| v + 1).collect()).unwrap();
        state
            .update(|values| {
                let mut next = values.clone();
                next.push(7);
                next
            })
            .unwrap();

        assert_eq!(state.get(), &vec![2, 7]);
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::io("disk unavailable"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::io("quota exceeded"))
        }

        fn remove(&self, _key: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_surface_to_the_caller() {
        let err = DurableState::initialize(
            Arc::new(FailingStore),
            "realize-tasks",
            seed::tasks(),
            JsonCodec::new(),
        )
        .err()
        .unwrap();

        assert_eq!(err.code(), "io_error");
    }
}
