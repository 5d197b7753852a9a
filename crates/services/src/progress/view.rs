use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use nihongo_core::animate::PercentSweep;
use nihongo_core::model::{LessonId, ProgressRaise, QuizSheet, UserId};

use crate::error::ProgressError;
use crate::progress::service::{ProgressService, QuizOutcome};
use crate::progress::tracker::LessonViewTracker;

/// On-page seconds are counted once per tick.
const TICK_PERIOD: Duration = Duration::from_secs(1);

/// The displayed percentage moves one sweep step per frame.
const SWEEP_FRAME: Duration = Duration::from_millis(20);

struct ViewState {
    tracker: LessonViewTracker,
    sweep: PercentSweep,
}

/// One open lesson page for one signed-in user.
///
/// Opening the view loads (or creates) the lesson stats and starts two
/// timers: a one-second tick feeding the time counter and a frame tick
/// advancing the displayed-progress sweep. Playback reports and quiz
/// submissions funnel through here so the sweep retargets the moment a
/// milestone raises progress. Closing the view stops the timers and
/// flushes the accumulated seconds.
pub struct ActiveLessonView {
    user: UserId,
    lesson: LessonId,
    progress: ProgressService,
    state: Arc<Mutex<ViewState>>,
    ticker: JoinHandle<()>,
}

impl ActiveLessonView {
    /// Opens the lesson for viewing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if loading or creating the stats fails.
    pub async fn open(
        progress: ProgressService,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Self, ProgressError> {
        let stats = progress.open_lesson_stats(&user, &lesson).await?;

        let mut tracker = LessonViewTracker::new();
        if stats.video_watched() {
            tracker.latch_watched();
        }
        let state = Arc::new(Mutex::new(ViewState {
            tracker,
            sweep: PercentSweep::new(stats.lesson_progress()),
        }));
        let ticker = tokio::spawn(run_timers(Arc::clone(&state), Instant::now()));

        Ok(Self {
            user,
            lesson,
            progress,
            state,
            ticker,
        })
    }

    /// Feeds one playback position report from the player.
    ///
    /// The first report past the watch threshold persists the milestone and
    /// retargets the progress sweep; later reports are absorbed by the
    /// tracker latch without touching storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if persisting the milestone fails.
    pub async fn report_playback(
        &self,
        position_secs: f64,
        duration_secs: f64,
    ) -> Result<(), ProgressError> {
        let fired = self
            .lock_state()
            .tracker
            .observe_playback(position_secs, duration_secs);
        if !fired {
            return Ok(());
        }

        if let Some(raise) = self
            .progress
            .mark_video_watched(&self.user, &self.lesson)
            .await?
        {
            self.retarget(raise);
        }
        Ok(())
    }

    /// Grades the sheet and records the attempt.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if persisting the attempt fails.
    pub async fn submit_quiz(&self, sheet: &mut QuizSheet) -> Result<QuizOutcome, ProgressError> {
        let score = sheet.submit();
        let outcome = self
            .progress
            .record_quiz(&self.user, &self.lesson, score)
            .await?;
        if let Some(raise) = outcome.raise {
            self.retarget(raise);
        }
        Ok(outcome)
    }

    /// The percentage the progress bar shows right now. Trails the stored
    /// value while a sweep is in flight.
    #[must_use]
    pub fn displayed_progress(&self) -> f64 {
        self.lock_state().sweep.displayed()
    }

    #[must_use]
    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    /// Stops the timers and flushes the unpersisted on-page seconds.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the flush fails.
    pub async fn close(self) -> Result<(), ProgressError> {
        self.ticker.abort();
        let pending = self.lock_state().tracker.take_pending_secs();
        self.progress
            .flush_time(&self.user, &self.lesson, pending)
            .await
    }

    fn retarget(&self, raise: ProgressRaise) {
        self.lock_state().sweep.retarget(raise.to);
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ActiveLessonView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveLessonView")
            .field("user", &self.user)
            .field("lesson", &self.lesson)
            .finish_non_exhaustive()
    }
}

impl Drop for ActiveLessonView {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

/// Drives both page timers until the view is dropped or closed.
///
/// Ticks are anchored at the moment the view opened, so seconds spent
/// before this task first runs are still counted.
async fn run_timers(state: Arc<Mutex<ViewState>>, start: Instant) {
    let mut seconds = time::interval_at(start + TICK_PERIOD, TICK_PERIOD);
    let mut frames = time::interval_at(start + SWEEP_FRAME, SWEEP_FRAME);
    loop {
        tokio::select! {
            _ = seconds.tick() => {
                lock(&state).tracker.tick_second();
            }
            _ = frames.tick() => {
                lock(&state).sweep.tick();
            }
        }
    }
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
