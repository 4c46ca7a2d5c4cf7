//! Course update notifications, delivered off the request path.

mod dispatcher;
mod mailer;
mod queue;

pub use dispatcher::{ChangeKind, NotificationDispatcher};
pub use mailer::{LogMailer, MailMessage, Mailer, RelayMailer};
pub use queue::{NotificationJob, NotificationQueue, spawn_worker};
