// Navigation observation
//
// The tracker never patches navigation APIs itself; it depends on a single
// route-change callback. HistoryObserver is the concrete implementation an
// embedder drives from its history layer: the navigation itself completes
// first, and listeners are notified on a deferred task so tracking can never
// delay a route change.

use std::sync::{Arc, Mutex};

/// Callback invoked with the new path after a route change
pub type RouteListener = Arc<dyn Fn(String) + Send + Sync>;

/// Seam between the tracker and whatever drives navigation
pub trait NavigationObserver: Send + Sync {
    /// Register a listener for route changes. Listeners are invoked after
    /// the navigation has taken effect, never synchronously within it.
    fn on_route_change(&self, listener: RouteListener);
}

/// Route-change source driven by history push/replace/pop notifications
#[derive(Clone, Default)]
pub struct HistoryObserver {
    current: Arc<Mutex<String>>,
    listeners: Arc<Mutex<Vec<RouteListener>>>,
}

impl HistoryObserver {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial_path.into())),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Path of the current view
    pub fn current_path(&self) -> String {
        self.current.lock().expect("observer poisoned").clone()
    }

    /// A pushState-style navigation: commit the new path, then notify
    pub fn push(&self, path: impl Into<String>) {
        self.navigate(path.into());
    }

    /// A replaceState-style navigation
    pub fn replace(&self, path: impl Into<String>) {
        self.navigate(path.into());
    }

    /// A popstate/hashchange-style navigation
    pub fn pop(&self, path: impl Into<String>) {
        self.navigate(path.into());
    }

    fn navigate(&self, path: String) {
        // The navigation commits before anyone observes it
        *self.current.lock().expect("observer poisoned") = path.clone();

        let listeners = self.listeners.lock().expect("observer poisoned").clone();
        if listeners.is_empty() {
            return;
        }
        // Deferred so tracking never sits on the navigation path
        tokio::spawn(async move {
            for listener in listeners {
                listener(path.clone());
            }
        });
    }
}

impl NavigationObserver for HistoryObserver {
    fn on_route_change(&self, listener: RouteListener) {
        self.listeners
            .lock()
            .expect("observer poisoned")
            .push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_listener_sees_committed_path() {
        let observer = HistoryObserver::new("/");
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();

        let sink = seen.clone();
        observer.on_route_change(Arc::new(move |path| {
            sink.lock().unwrap().push(path);
        }));

        observer.push("/pricing");
        // The path is committed synchronously...
        assert_eq!(observer.current_path(), "/pricing");
        // ...but the notification is deferred
        assert!(seen.lock().unwrap().is_empty());

        tokio::task::yield_now().await;
        assert_eq!(seen.lock().unwrap().as_slice(), ["/pricing".to_string()]);
    }

    #[tokio::test]
    async fn test_all_navigation_kinds_notify() {
        let observer = HistoryObserver::new("/");
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        observer.on_route_change(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        observer.push("/a");
        observer.replace("/b");
        observer.pop("/c");
        tokio::task::yield_now().await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(observer.current_path(), "/c");
    }
}
