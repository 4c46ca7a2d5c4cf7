use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::mailer::{MailMessage, Mailer};
use crate::error::Result;
use crate::store::Store;
use crate::types::Course;

/// What changed inside a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Course,
    Lesson,
}

pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    from_address: String,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, from_address: String) -> Self {
        Self {
            store,
            mailer,
            from_address,
        }
    }

    /// Sends one message per active subscriber and returns how many sends
    /// were attempted. Individual send failures are logged and skipped.
    pub async fn notify_course_update(
        &self,
        course_id: &str,
        kind: ChangeKind,
        changed_id: &str,
    ) -> Result<usize> {
        let Some(course) = self.store.get_course(course_id)? else {
            tracing::debug!(course = course_id, "course gone before notification ran");
            return Ok(0);
        };

        let emails = self.store.list_active_subscriber_emails(course_id)?;
        if emails.is_empty() {
            return Ok(0);
        }

        let subject = format!("Course update: {}", course.title);
        let body = self.body_for(&course, kind, changed_id)?;

        let mut attempted = 0;
        for email in emails {
            let message = MailMessage {
                from: self.from_address.clone(),
                to: email,
                subject: subject.clone(),
                body: body.clone(),
            };

            attempted += 1;
            if let Err(e) = self.mailer.send(&message).await {
                tracing::warn!(to = %message.to, course = course_id, "notification not delivered: {e}");
            }
        }

        tracing::info!(course = course_id, ?kind, attempted, "course update notifications sent");
        Ok(attempted)
    }

    fn body_for(&self, course: &Course, kind: ChangeKind, changed_id: &str) -> Result<String> {
        let body = match kind {
            ChangeKind::Course => format!("The course \"{}\" has been updated.", course.title),
            ChangeKind::Lesson => match self.store.get_lesson(changed_id)? {
                Some(lesson) => format!(
                    "A lesson was updated in the course \"{}\": {}.",
                    course.title, lesson.title
                ),
                None => format!("Materials in the course \"{}\" have been updated.", course.title),
            },
        };
        Ok(body)
    }
}
