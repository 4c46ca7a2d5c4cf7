use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability represents a bitmask of cross-owner powers held by a user.
///
/// Ownership is never expressed here: owners always have full control of
/// their own courses and lessons. Capabilities only widen what a user may do
/// to resources owned by somebody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(u32);

impl Capability {
    pub const COURSE_MODERATE: Capability = Capability(1 << 0); // 1
    pub const LESSON_MODERATE: Capability = Capability(1 << 1); // 2

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if this bitmask contains the required capability.
    #[must_use]
    pub const fn has(self, required: Capability) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: Capability) -> Capability {
        Capability(self.0 | other.0)
    }

    #[must_use]
    pub const fn difference(self, other: Capability) -> Capability {
        Capability(self.0 & !other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The capability set of the moderators group: update any course and
    /// any lesson, never create or delete on someone else's behalf.
    #[must_use]
    pub const fn moderator() -> Capability {
        Capability(Self::COURSE_MODERATE.0 | Self::LESSON_MODERATE.0)
    }

    pub fn parse(s: &str) -> Option<Capability> {
        match s {
            "course:moderate" => Some(Self::COURSE_MODERATE),
            "lesson:moderate" => Some(Self::LESSON_MODERATE),
            "moderator" => Some(Self::moderator()),
            _ => None,
        }
    }

    pub fn parse_many<S: AsRef<str>>(strs: &[S]) -> Option<Capability> {
        let mut result = Capability::default();
        for s in strs {
            result = result.union(Self::parse(s.as_ref())?);
        }
        Some(result)
    }

    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut caps = Vec::new();
        if self.has(Self::COURSE_MODERATE) {
            caps.push("course:moderate");
        }
        if self.has(Self::LESSON_MODERATE) {
            caps.push("lesson:moderate");
        }
        caps
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

impl From<i64> for Capability {
    fn from(bits: i64) -> Self {
        Self(bits as u32)
    }
}

impl From<Capability> for i64 {
    fn from(c: Capability) -> Self {
        c.0 as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderator_has_both() {
        let m = Capability::moderator();
        assert!(m.has(Capability::COURSE_MODERATE));
        assert!(m.has(Capability::LESSON_MODERATE));
        assert!(!Capability::default().has(Capability::COURSE_MODERATE));
    }

    #[test]
    fn test_parse_many() {
        let caps = Capability::parse_many(&["course:moderate"]).unwrap();
        assert!(caps.has(Capability::COURSE_MODERATE));
        assert!(!caps.has(Capability::LESSON_MODERATE));

        assert_eq!(Capability::parse_many(&["moderator"]), Some(Capability::moderator()));
        assert_eq!(Capability::parse_many(&["course:moderate", "bogus"]), None);
    }

    #[test]
    fn test_difference_revokes() {
        let caps = Capability::moderator().difference(Capability::LESSON_MODERATE);
        assert_eq!(caps.to_strings(), vec!["course:moderate"]);
    }
}
