use crate::error::AppError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

/// Advances an index once per period over a list of `len` entries, wrapping
/// to 0. Lists shorter than two never get a timer.
pub struct Rotation {
    len: usize,
    period: Duration,
    index: Arc<watch::Sender<usize>>,
    generation: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
}

fn validate_period(period: Duration) -> Result<(), AppError> {
    if period.is_zero() {
        return Err(AppError::invalid_input("rotation period must be positive"));
    }
    Ok(())
}

impl Rotation {
    /// Must be called inside a tokio runtime when `len >= 2`.
    pub fn start(len: usize, period: Duration) -> Result<Self, AppError> {
        validate_period(period)?;
        let (index, _) = watch::channel(0);
        let mut rotation = Self {
            len,
            period,
            index: Arc::new(index),
            generation: Arc::new(AtomicU64::new(0)),
            ticker: None,
        };
        rotation.arm();
        Ok(rotation)
    }

    pub fn index(&self) -> usize {
        *self.index.borrow()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_rotating(&self) -> bool {
        self.ticker.is_some()
    }

    /// A receiver that is notified every time the index moves.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.subscribe()
    }

    /// The index is kept, reduced modulo the new length.
    pub fn reconfigure(&mut self, len: usize, period: Duration) -> Result<(), AppError> {
        validate_period(period)?;
        if len == self.len && period == self.period {
            return Ok(());
        }

        self.stop();
        self.len = len;
        self.period = period;
        self.index.send_if_modified(|index| {
            let reduced = if len == 0 { 0 } else { *index % len };
            if reduced == *index {
                return false;
            }
            *index = reduced;
            true
        });
        self.arm();
        Ok(())
    }

    pub fn stop(&mut self) {
        let Some(ticker) = self.ticker.take() else {
            return;
        };
        // Bumped under the channel lock: a tick already past its await on
        // another worker either lands before this or sees the new generation.
        let generation = &self.generation;
        self.index.send_if_modified(|_| {
            generation.fetch_add(1, Ordering::SeqCst);
            false
        });
        ticker.abort();
        tracing::debug!("rotation timer stopped");
    }

    fn arm(&mut self) {
        if self.len < 2 {
            return;
        }

        let len = self.len;
        let period = self.period;
        let index = Arc::clone(&self.index);
        let generation = Arc::clone(&self.generation);
        let armed = generation.load(Ordering::SeqCst);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let advanced = index.send_if_modified(|index| {
                    if generation.load(Ordering::SeqCst) != armed {
                        return false;
                    }
                    *index = (*index + 1) % len;
                    true
                });
                if !advanced {
                    break;
                }
            }
        }));
        tracing::debug!(len, period_ms = period.as_millis() as u64, "rotation timer armed");
    }
}

impl Drop for Rotation {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct Slideshow<T> {
    items: Vec<T>,
    rotation: Rotation,
}

impl<T> Slideshow<T> {
    pub fn start(items: Vec<T>, period: Duration) -> Result<Self, AppError> {
        let rotation = Rotation::start(items.len(), period)?;
        Ok(Self { items, rotation })
    }

    /// The focused item and its position, or `None` for an empty list.
    pub fn active(&self) -> Option<(&T, usize)> {
        let index = self.rotation.index();
        self.items.get(index).map(|item| (item, index))
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.rotation.subscribe()
    }

    pub fn replace_items(&mut self, items: Vec<T>) -> Result<(), AppError> {
        let period = self.rotation.period();
        self.rotation.reconfigure(items.len(), period)?;
        self.items = items;
        Ok(())
    }

    pub fn set_period(&mut self, period: Duration) -> Result<(), AppError> {
        self.rotation.reconfigure(self.items.len(), period)
    }

    pub fn stop(&mut self) {
        self.rotation.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{Rotation, Slideshow};
    use tokio::time::{self, Duration, Instant};

    const PERIOD: Duration = Duration::from_secs(15);

    #[test]
    fn zero_period_is_rejected() {
        let err = Rotation::start(3, Duration::ZERO).err().unwrap();
        assert_eq!(err.code(), "invalid_input");
    }

    #[tokio::test(start_paused = true)]
    async fn wraps_around_after_a_full_cycle() {
        let rotation = Rotation::start(3, PERIOD).unwrap();
        let mut changes = rotation.subscribe();
        let started = Instant::now();

        assert_eq!(rotation.index(), 0);
        for expected in [1, 2, 0] {
            changes.changed().await.unwrap();
            assert_eq!(*changes.borrow(), expected);
        }
        assert_eq!(started.elapsed(), PERIOD * 3);

        changes.changed().await.unwrap();
        assert_eq!(rotation.index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_item_never_schedules_a_timer() {
        let rotation = Rotation::start(1, PERIOD).unwrap();
        let changes = rotation.subscribe();

        assert!(!rotation.is_rotating());
        time::sleep(PERIOD * 40).await;

        assert_eq!(rotation.index(), 0);
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_slideshow_has_no_active_item() {
        let slideshow = Slideshow::<&str>::start(Vec::new(), PERIOD).unwrap();

        time::sleep(PERIOD * 3).await;

        assert!(slideshow.active().is_none());
        assert!(!slideshow.rotation().is_rotating());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_advances() {
        let mut rotation = Rotation::start(4, PERIOD).unwrap();
        let mut changes = rotation.subscribe();
        changes.changed().await.unwrap();
        assert_eq!(rotation.index(), 1);

        rotation.stop();
        time::sleep(PERIOD * 10).await;

        assert!(!rotation.is_rotating());
        assert_eq!(rotation.index(), 1);
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_the_timer() {
        let rotation = Rotation::start(2, PERIOD).unwrap();
        let mut changes = rotation.subscribe();

        drop(rotation);

        assert!(changes.changed().await.is_err());
        assert_eq!(*changes.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_replaces_the_timer() {
        let mut rotation = Rotation::start(5, PERIOD).unwrap();
        let mut changes = rotation.subscribe();
        for _ in 0..4 {
            changes.changed().await.unwrap();
        }
        assert_eq!(rotation.index(), 4);

        rotation.reconfigure(3, PERIOD).unwrap();
        assert_eq!(*changes.borrow_and_update(), 1);

        let before = Instant::now();
        changes.changed().await.unwrap();
        assert_eq!(before.elapsed(), PERIOD);
        assert_eq!(*changes.borrow_and_update(), 2);

        time::sleep(PERIOD / 2).await;
        assert_eq!(rotation.index(), 2);
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn crossing_the_two_item_boundary_toggles_the_timer() {
        let mut slideshow = Slideshow::start(vec!["briefing", "quote"], PERIOD).unwrap();
        assert!(slideshow.rotation().is_rotating());

        slideshow.replace_items(vec!["briefing"]).unwrap();
        assert!(!slideshow.rotation().is_rotating());
        time::sleep(PERIOD * 3).await;
        assert_eq!(slideshow.active(), Some((&"briefing", 0)));

        slideshow
            .replace_items(vec!["briefing", "quote", "chat"])
            .unwrap();
        assert!(slideshow.rotation().is_rotating());
        let mut changes = slideshow.subscribe();
        changes.changed().await.unwrap();
        assert_eq!(slideshow.active(), Some((&"quote", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn period_change_restarts_the_countdown() {
        let mut slideshow = Slideshow::start(vec![1, 2, 3], PERIOD).unwrap();
        let mut changes = slideshow.subscribe();
        time::sleep(PERIOD - Duration::from_secs(1)).await;

        slideshow.set_period(Duration::from_secs(60)).unwrap();
        let before = Instant::now();
        changes.changed().await.unwrap();

        assert_eq!(before.elapsed(), Duration::from_secs(60));
        assert_eq!(slideshow.active(), Some((&2, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_without_moving_the_index_stays_quiet() {
        let mut slideshow = Slideshow::start(vec![1, 2, 3], PERIOD).unwrap();
        let changes = slideshow.subscribe();

        slideshow.replace_items(vec![1, 2, 3, 4]).unwrap();
        slideshow.set_period(PERIOD * 2).unwrap();

        assert!(!changes.has_changed().unwrap());
        assert_eq!(slideshow.active(), Some((&1, 0)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stopped_rotation_never_moves_again() {
        for _ in 0..50 {
            let mut rotation = Rotation::start(2, Duration::from_millis(1)).unwrap();
            time::sleep(Duration::from_millis(3)).await;

            rotation.stop();
            let stopped_at = rotation.index();
            time::sleep(Duration::from_millis(3)).await;

            assert_eq!(rotation.index(), stopped_at);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shrinking_keeps_the_index_in_range() {
        for _ in 0..50 {
            let mut slideshow =
                Slideshow::start(vec![1, 2, 3, 4, 5], Duration::from_millis(1)).unwrap();
            time::sleep(Duration::from_millis(3)).await;

            slideshow.replace_items(vec![1, 2]).unwrap();
            for _ in 0..3 {
                assert!(slideshow.active().is_some());
                time::sleep(Duration::from_millis(1)).await;
            }
        }
    }
}
