//! Observable application state.
//!
//! Each piece of UI-facing state is a [`Signal`]: a single-value holder
//! backed by a tokio watch channel. Presentation layers read the current
//! value or subscribe for change notifications; the adapter client writes.

use std::fmt;

use tokio::sync::watch;

use crate::content::TransformedContent;
use crate::profile::CognitiveProfile;

/// A watchable single-value holder.
pub struct Signal<T> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone> Signal<T> {
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Replace the value, notifying all subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Modify the value in place, notifying all subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Register an observer. The receiver resolves whenever the value
    /// changes after subscription.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.get()).finish()
    }
}

/// The screen the presentation layer should show next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    ProfileSelection,
    Input,
    Output,
}

/// Shared UI state: selected profile, in-flight flag, last error, last
/// transformed content, and the pending navigation target.
#[derive(Debug, Default)]
pub struct AppState {
    pub selected_profile: Signal<Option<CognitiveProfile>>,
    pub input_text: Signal<String>,
    pub transformed_content: Signal<Option<TransformedContent>>,
    pub is_loading: Signal<bool>,
    pub error: Signal<Option<String>>,
    pub route: Signal<Route>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signal_get_set() {
        let signal = Signal::new(0u32);
        assert_eq!(signal.get(), 0);
        signal.set(7);
        assert_eq!(signal.get(), 7);
        signal.update(|v| *v += 1);
        assert_eq!(signal.get(), 8);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let signal = Signal::new("idle".to_string());
        let mut observer = signal.subscribe();

        signal.set("busy".to_string());
        observer.changed().await.unwrap();
        assert_eq!(*observer.borrow(), "busy");
    }

    #[test]
    fn app_state_defaults_are_empty() {
        let state = AppState::new();
        assert_eq!(state.selected_profile.get(), None);
        assert_eq!(state.is_loading.get(), false);
        assert_eq!(state.error.get(), None);
        assert_eq!(state.route.get(), Route::ProfileSelection);
        assert!(state.transformed_content.get().is_none());
    }
}
