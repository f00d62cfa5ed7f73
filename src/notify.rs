//! Notification dispatch.
//!
//! The real system posts transactional email through an external provider.
//! Here the seam is a trait; dispatch is fire-and-forget everywhere. A
//! failed send is logged at `warn` and never fails the calling command or
//! unwinds store state.

use tracing::{info, warn};

use crate::error::Error;

pub trait Notifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// Default notifier: writes the notification to the log instead of a wire.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), Error> {
        info!(recipient, subject, body, "notification dispatched");
        Ok(())
    }
}

/// Send without letting a downstream failure surface. Returns whether the
/// send succeeded, for bookkeeping like the reminder flag.
pub fn dispatch_fire_and_forget(
    notifier: &dyn Notifier,
    recipient: &str,
    subject: &str,
    body: &str,
) -> bool {
    match notifier.send(recipient, subject, body) {
        Ok(()) => true,
        Err(e) => {
            warn!(recipient, subject, error = %e, "notification failed, continuing");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording {
        sent: RefCell<Vec<(String, String)>>,
        fail: bool,
    }

    impl Notifier for Recording {
        fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Provider("smtp unavailable".into()));
            }
            self.sent
                .borrow_mut()
                .push((recipient.to_string(), subject.to_string()));
            Ok(())
        }
    }

    #[test]
    fn successful_dispatch_is_recorded() {
        let n = Recording {
            sent: RefCell::new(vec![]),
            fail: false,
        };
        assert!(dispatch_fire_and_forget(&n, "a@b.c", "Reminder", "body"));
        assert_eq!(n.sent.borrow().len(), 1);
    }

    #[test]
    fn failed_dispatch_does_not_panic_or_error() {
        let n = Recording {
            sent: RefCell::new(vec![]),
            fail: true,
        };
        assert!(!dispatch_fire_and_forget(&n, "a@b.c", "Reminder", "body"));
    }
}
