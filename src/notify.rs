//! Desktop reminders for project tasks due today.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::ProjectTask;
use crate::views::due_on;

const APP_NAME: &str = "TaskFlow";
pub const REMINDER_TITLE: &str = "Delivery reminder";

/// Delivers a notification to the user.
pub trait NotificationBackend {
    /// Whether the backend can show notifications at all.
    fn is_available(&self) -> bool;
    fn show(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

/// OS notification center via `notify-rust`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopBackend;

impl NotificationBackend for DesktopBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn show(&self, title: &str, body: &str) -> anyhow::Result<()> {
        notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{e}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

/// Sends notifications only once permission has been granted.
pub struct Notifier<B: NotificationBackend> {
    backend: B,
    enabled: bool,
    permission: Permission,
}

impl<B: NotificationBackend> Notifier<B> {
    /// `enabled` is the user setting; a disabled notifier denies every request.
    pub fn new(backend: B, enabled: bool) -> Self {
        Self {
            backend,
            enabled,
            permission: Permission::Default,
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Asks for permission. Once denied, later requests stay denied.
    pub fn request_permission(&mut self) -> bool {
        match self.permission {
            Permission::Granted => return true,
            Permission::Denied => return false,
            Permission::Default => {}
        }
        self.permission = if self.enabled && self.backend.is_available() {
            Permission::Granted
        } else {
            Permission::Denied
        };
        debug!(permission = ?self.permission, "notification permission resolved");
        self.permission == Permission::Granted
    }

    /// Shows a notification if permitted. Returns whether one was shown.
    pub fn notify(&self, title: &str, body: &str) -> bool {
        if self.permission != Permission::Granted {
            return false;
        }
        match self.backend.show(title, body) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to show notification");
                false
            }
        }
    }

    /// Sends one reminder per task due on `today`. Returns how many were shown.
    pub fn check_upcoming(&self, tasks: &[ProjectTask], today: NaiveDate) -> usize {
        due_on(tasks, today)
            .into_iter()
            .filter(|t| self.notify(REMINDER_TITLE, &reminder_body(t)))
            .count()
    }
}

pub fn reminder_body(task: &ProjectTask) -> String {
    format!(
        "\"{}\" in project \"{}\" is due today!",
        task.task_name, task.project_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        shown: RefCell<Vec<(String, String)>>,
    }

    impl NotificationBackend for &Recorder {
        fn is_available(&self) -> bool {
            true
        }

        fn show(&self, title: &str, body: &str) -> anyhow::Result<()> {
            self.shown.borrow_mut().push((title.into(), body.into()));
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    #[test]
    fn nothing_is_sent_before_permission() {
        let rec = Recorder::default();
        let notifier = Notifier::new(&rec, true);
        assert!(!notifier.notify("t", "b"));
        assert!(rec.shown.borrow().is_empty());
    }

    #[test]
    fn disabled_setting_denies_permission_for_good() {
        let rec = Recorder::default();
        let mut notifier = Notifier::new(&rec, false);
        assert!(!notifier.request_permission());
        notifier.enabled = true;
        assert!(!notifier.request_permission());
        assert_eq!(notifier.permission(), Permission::Denied);
    }

    #[test]
    fn one_reminder_per_task_due_today() {
        let rec = Recorder::default();
        let mut notifier = Notifier::new(&rec, true);
        assert!(notifier.request_permission());

        let mut due = ProjectTask::new("Launch", "Send invites");
        due.delivery_date = Some(today());
        let mut due_too = ProjectTask::new("Launch", "Book venue");
        due_too.delivery_date = Some(today());
        let mut later = ProjectTask::new("Launch", "Follow up");
        later.delivery_date = today().succ_opt();
        let undated = ProjectTask::new("Launch", "Someday");

        let sent = notifier.check_upcoming(&[due, later, undated, due_too], today());
        assert_eq!(sent, 2);
        let shown = rec.shown.borrow();
        assert_eq!(shown[0].0, REMINDER_TITLE);
        assert!(shown[0].1.contains("Send invites"));
        assert!(shown[1].1.contains("Book venue"));
    }
}
