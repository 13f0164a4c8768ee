use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Process lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Stopping,
}

impl LifecycleState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopping => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Starting,
            2 => Self::Running,
            _ => Self::Stopping,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Shared handle to the process lifecycle state.
///
/// Clones observe and mutate the same state. The only mutation paths are
/// [`Lifecycle::try_transition_to_running`] and
/// [`Lifecycle::transition_to_stopping`]; Stopping is terminal.
#[derive(Clone)]
pub struct Lifecycle {
    state: Arc<AtomicU8>,
}

impl Lifecycle {
    /// Create a lifecycle in the Starting state
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(LifecycleState::Starting.as_u8())),
        }
    }

    /// Current state, never blocks
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn is_stopping(&self) -> bool {
        self.state() == LifecycleState::Stopping
    }

    /// Move Starting -> Running.
    ///
    /// Returns false without changing anything when the current state is not
    /// Starting, so a shutdown that lands before bind completes is never
    /// overwritten.
    pub fn try_transition_to_running(&self) -> bool {
        let swapped = self
            .state
            .compare_exchange(
                LifecycleState::Starting.as_u8(),
                LifecycleState::Running.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if swapped {
            debug!("Lifecycle state changed to: running");
        } else {
            debug!("Rejected transition to running from: {}", self.state());
        }
        swapped
    }

    /// Move Starting|Running -> Stopping. Idempotent.
    pub fn transition_to_stopping(&self) {
        let previous =
            LifecycleState::from_u8(self.state.swap(LifecycleState::Stopping.as_u8(), Ordering::SeqCst));
        if previous != LifecycleState::Stopping {
            debug!("Lifecycle state changed from {} to: stopping", previous);
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_starts_in_starting() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Starting);
        assert!(!lifecycle.is_running());
    }

    #[test]
    fn test_regular_lifecycle_transitions() {
        let lifecycle = Lifecycle::new();

        assert!(lifecycle.try_transition_to_running());
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        // Only once
        assert!(!lifecycle.try_transition_to_running());
        assert_eq!(lifecycle.state(), LifecycleState::Running);

        lifecycle.transition_to_stopping();
        assert_eq!(lifecycle.state(), LifecycleState::Stopping);

        lifecycle.transition_to_stopping();
        assert_eq!(lifecycle.state(), LifecycleState::Stopping);

        assert!(!lifecycle.try_transition_to_running());
        assert_eq!(lifecycle.state(), LifecycleState::Stopping);
    }

    #[test]
    fn test_starting_to_stopping_transitions() {
        let lifecycle = Lifecycle::new();

        lifecycle.transition_to_stopping();
        assert!(lifecycle.is_stopping());

        assert!(!lifecycle.try_transition_to_running());
        assert!(lifecycle.is_stopping());
    }

    #[test]
    fn test_clones_share_state() {
        let lifecycle = Lifecycle::new();
        let observer = lifecycle.clone();

        lifecycle.try_transition_to_running();
        assert_eq!(observer.state(), LifecycleState::Running);
    }

    #[test]
    fn test_concurrent_forward_transition_succeeds_exactly_once() {
        let lifecycle = Lifecycle::new();
        let winners = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let lifecycle = lifecycle.clone();
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if lifecycle.try_transition_to_running() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }

    #[test]
    fn test_stopping_is_sticky_under_contention() {
        let lifecycle = Lifecycle::new();

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let lifecycle = lifecycle.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        lifecycle.transition_to_stopping();
                    } else {
                        lifecycle.try_transition_to_running();
                    }
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(lifecycle.state(), LifecycleState::Stopping);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(LifecycleState::Starting.to_string(), "starting");
        assert_eq!(LifecycleState::Running.to_string(), "running");
        assert_eq!(LifecycleState::Stopping.to_string(), "stopping");
    }
}
