//! Per-user sliding-window admission control for fax submissions.
//!
//! Every known user has a history of accepted submissions. Before each
//! decision the history is pruned to the trailing window; the attempt is
//! rejected when the pruned count is already above the limit, otherwise it
//! is admitted and recorded.
//!
//! The check is `uses > limit` on the history *before* recording, so a user
//! gets `limit + 1` submissions per window before the first rejection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, error};

/// Default trailing window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Over the limit; `uses` is the count in the current window.
    Limited { uses: usize },
    /// The user is not in the user table.
    UnknownUser,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

pub struct RateLimiter {
    /// Accepted submissions per minute; 0 disables limiting.
    limit: usize,
    window: Duration,
    /// user -> timestamps of accepted submissions, oldest first
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new<I, S>(users: I, limit: usize, window: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let history = users
            .into_iter()
            .map(|user| (user.into(), VecDeque::new()))
            .collect();
        Self {
            limit,
            window,
            history: Mutex::new(history),
        }
    }

    pub fn is_known(&self, user: &str) -> bool {
        self.lock().contains_key(user)
    }

    /// Admit `user` now.
    pub fn admit(&self, user: &str) -> bool {
        self.check_at(user, Instant::now()).is_admitted()
    }

    /// Admission decision at `now`, recording the use when admitted.
    pub fn check_at(&self, user: &str, now: Instant) -> Admission {
        let mut history = self.lock();

        let Some(uses) = history.get_mut(user) else {
            error!(user, "rate check for unknown user");
            return Admission::UnknownUser;
        };

        let window = self.window;
        uses.retain(|&t| now.saturating_duration_since(t) < window);

        if self.limit == 0 {
            return Admission::Admitted;
        }

        let count = uses.len();
        if count > self.limit {
            debug!(user, uses = count, "user is spamming");
            return Admission::Limited { uses: count };
        }

        uses.push_back(now);
        Admission::Admitted
    }

    /// Accepted submissions for `user` inside the window ending at `now`.
    pub fn uses_at(&self, user: &str, now: Instant) -> usize {
        self.lock().get(user).map_or(0, |uses| {
            uses.iter()
                .filter(|&&t| now.saturating_duration_since(t) < self.window)
                .count()
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
