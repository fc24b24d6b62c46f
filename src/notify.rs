// src/notify.rs
use std::sync::Arc;

use crate::models::product::LOW_STOCK_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// Notification sink. Delivery is fire-and-forget: implementations must not
/// fail the calling request, so the method is infallible from the caller's
/// side and implementations swallow their own errors.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, severity: Severity);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Default sink: structured log events via tracing.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(title, body, "notification"),
            Severity::Warning => tracing::warn!(title, body, "notification"),
            Severity::Danger => tracing::error!(title, body, "notification"),
        }
    }
}

/// Evaluates the low-stock rule for a product's new stock value.
///
/// Emits exactly one danger notification when stock is strictly below the
/// threshold, nothing otherwise. Runs on every stock edit, including edits
/// that leave an already-low value unchanged; callers must not debounce.
pub fn check_low_stock(notifier: &dyn Notifier, product_name: &str, stock: i32) {
    if stock < LOW_STOCK_THRESHOLD {
        notifier.notify(
            "Low stock",
            &format!(
                "Product '{product_name}' has fewer than {LOW_STOCK_THRESHOLD} units available."
            ),
            Severity::Danger,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, Severity)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, body: &str, severity: Severity) {
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string(), severity));
        }
    }

    #[test]
    fn stock_below_threshold_emits_one_danger_notification() {
        let sink = RecordingNotifier::default();
        check_low_stock(&sink, "Blue Widget", 3);

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (title, body, severity) = &sent[0];
        assert_eq!(title, "Low stock");
        assert_eq!(
            body,
            "Product 'Blue Widget' has fewer than 5 units available."
        );
        assert_eq!(*severity, Severity::Danger);
    }

    #[test]
    fn stock_at_threshold_emits_nothing() {
        let sink = RecordingNotifier::default();
        check_low_stock(&sink, "Blue Widget", 5);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn stock_above_threshold_emits_nothing() {
        let sink = RecordingNotifier::default();
        check_low_stock(&sink, "Blue Widget", 7);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn repeated_low_stock_edits_fire_every_time() {
        let sink = RecordingNotifier::default();
        check_low_stock(&sink, "Blue Widget", 3);
        check_low_stock(&sink, "Blue Widget", 3);
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }
}
