//! Notifier port - the user-visible notification surface.

use crate::domain::notification::Notification;

/// Shows notifications to the user.
///
/// Presentation (toasts, banners, sounds) is up to the implementation; the
/// notification already says how urgent it is.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
