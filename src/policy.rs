//! Access decisions for owned resources.
//!
//! Every check is a pure predicate over the acting user, the resource and the
//! kind of operation. Reads only need an authenticated, active actor. Owners
//! may do anything to their own resources. Moderators may update resources
//! owned by others but are never allowed to create or delete on their behalf.

use crate::error::{Error, Result};
use crate::types::{Capability, Course, Lesson, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// A resource with a single, immutable owner.
pub trait Owned {
    /// Name used in denial messages.
    const KIND: &'static str;

    fn owner_id(&self) -> &str;

    /// Capability that lets a non-owner update this kind of resource.
    fn moderation_capability() -> Capability;
}

impl Owned for Course {
    const KIND: &'static str = "course";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn moderation_capability() -> Capability {
        Capability::COURSE_MODERATE
    }
}

impl Owned for Lesson {
    const KIND: &'static str = "lesson";

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn moderation_capability() -> Capability {
        Capability::LESSON_MODERATE
    }
}

fn is_owner<R: Owned>(actor: &User, resource: &R) -> bool {
    resource.owner_id() == actor.id
}

pub fn can_read<R: Owned>(actor: &User, _resource: &R) -> bool {
    actor.is_active
}

/// Update permission. Moderation is granted per resource kind and does not
/// look at who owns the object.
pub fn can_write<R: Owned>(actor: &User, resource: &R) -> bool {
    actor.is_active
        && (is_owner(actor, resource) || actor.capabilities.has(R::moderation_capability()))
}

pub fn can_delete<R: Owned>(actor: &User, resource: &R) -> bool {
    actor.is_active && is_owner(actor, resource)
}

/// Creation is only allowed when the actor is the owner of the new resource.
pub fn can_create<R: Owned>(actor: &User, resource: &R) -> bool {
    actor.is_active && is_owner(actor, resource)
}

pub fn permits<R: Owned>(actor: &User, resource: &R, operation: Operation) -> bool {
    match operation {
        Operation::Read => can_read(actor, resource),
        Operation::Create => can_create(actor, resource),
        Operation::Update => can_write(actor, resource),
        Operation::Delete => can_delete(actor, resource),
    }
}

pub fn authorize<R: Owned>(actor: &User, resource: &R, operation: Operation) -> Result<()> {
    if permits(actor, resource, operation) {
        return Ok(());
    }

    tracing::debug!(
        actor = %actor.id,
        owner = %resource.owner_id(),
        kind = R::KIND,
        ?operation,
        "access denied"
    );

    Err(Error::Forbidden(match operation {
        Operation::Read => "not allowed to read this resource",
        Operation::Create => "resources can only be created for yourself",
        Operation::Update => "only the owner or a moderator may change this resource",
        Operation::Delete => "only the owner may delete this resource",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: &str, capabilities: Capability) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            first_name: None,
            last_name: None,
            phone: None,
            city: None,
            password_hash: None,
            capabilities,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(owner_id: &str) -> Course {
        let now = Utc::now();
        Course {
            id: "course-1".to_string(),
            title: "Rust".to_string(),
            description: String::new(),
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn lesson(owner_id: &str) -> Lesson {
        let now = Utc::now();
        Lesson {
            id: "lesson-1".to_string(),
            course_id: "course-1".to_string(),
            title: "Ownership".to_string(),
            description: String::new(),
            video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_has_full_control() {
        let owner = user("owner", Capability::default());
        let course = course("owner");

        for op in [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ] {
            assert!(permits(&owner, &course, op), "{op:?}");
        }
    }

    #[test]
    fn test_stranger_can_only_read() {
        let stranger = user("stranger", Capability::default());
        let course = course("owner");

        assert!(can_read(&stranger, &course));
        assert!(!can_write(&stranger, &course));
        assert!(!can_delete(&stranger, &course));
        assert!(!can_create(&stranger, &course));
    }

    #[test]
    fn test_moderator_updates_any_resource_regardless_of_owner() {
        // Pins the blanket update grant: moderation ignores ownership.
        let moderator = user("mod", Capability::moderator());

        assert!(can_write(&moderator, &course("someone-else")));
        assert!(can_write(&moderator, &lesson("another-person")));
    }

    #[test]
    fn test_moderator_cannot_create_or_delete_for_others() {
        let moderator = user("mod", Capability::moderator());
        let course = course("owner");

        assert!(!can_create(&moderator, &course));
        assert!(!can_delete(&moderator, &course));
        assert!(matches!(
            authorize(&moderator, &course, Operation::Delete),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_moderation_is_per_resource_kind() {
        let course_mod = user("cm", Capability::COURSE_MODERATE);

        assert!(can_write(&course_mod, &course("owner")));
        assert!(!can_write(&course_mod, &lesson("owner")));
    }

    #[test]
    fn test_inactive_actor_is_denied() {
        let mut owner = user("owner", Capability::moderator());
        owner.is_active = false;

        assert!(!can_read(&owner, &course("owner")));
        assert!(!can_write(&owner, &course("owner")));
    }
}
