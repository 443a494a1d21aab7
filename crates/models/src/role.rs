use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::{BitAnd, BitOr, BitOrAssign},
};
use strum::{AsRefStr, EnumString};
use thiserror::Error;

/// Role attribute supplied by the identity provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Capabilities granted to every principal holding this role
    pub fn capabilities(self) -> CapabilitySet {
        match self {
            Self::Teacher => {
                CapabilitySet::MANAGE_COURSES
                    | CapabilitySet::MANAGE_CATALOG
                    | CapabilitySet::VIEW_TEACHER_STATS
            }
            Self::Student => CapabilitySet::ENROLL | CapabilitySet::TRACK_PROGRESS,
        }
    }
}

/// A single permission that an operation can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Create, edit and delete own courses and their lessons
    ManageCourses,
    /// Create, edit and delete categories
    ManageCatalog,
    /// Read aggregate numbers about own courses
    ViewTeacherStats,
    /// Enroll in published courses
    Enroll,
    /// Complete lessons and manage own enrollments
    TrackProgress,
}

impl Capability {
    const ALL: [Self; 5] = [
        Self::ManageCourses,
        Self::ManageCatalog,
        Self::ViewTeacherStats,
        Self::Enroll,
        Self::TrackProgress,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::ManageCourses => 1 << 0,
            Self::ManageCatalog => 1 << 1,
            Self::ViewTeacherStats => 1 << 2,
            Self::Enroll => 1 << 3,
            Self::TrackProgress => 1 << 4,
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_ref())
    }
}

/// Set of capabilities, computed once per request from the caller's role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[repr(transparent)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const NONE: Self = CapabilitySet(0);
    pub const MANAGE_COURSES: Self = CapabilitySet(Capability::ManageCourses.bit());
    pub const MANAGE_CATALOG: Self = CapabilitySet(Capability::ManageCatalog.bit());
    pub const VIEW_TEACHER_STATS: Self = CapabilitySet(Capability::ViewTeacherStats.bit());
    pub const ENROLL: Self = CapabilitySet(Capability::Enroll.bit());
    pub const TRACK_PROGRESS: Self = CapabilitySet(Capability::TrackProgress.bit());

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl BitOr for CapabilitySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        CapabilitySet(self.0 | rhs.0)
    }
}

impl BitAnd for CapabilitySet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        CapabilitySet(self.0 & rhs.0)
    }
}

impl BitOrAssign for CapabilitySet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{role} accounts cannot {capability}")]
    MissingCapability { role: String, capability: Capability },

    #[error("{0} does not belong to the current user")]
    NotOwner(&'static str),
}

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    capabilities: CapabilitySet,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            capabilities: role.capabilities(),
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Fails unless the principal holds `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AccessError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AccessError::MissingCapability {
                role: self.role.as_str().to_owned(),
                capability,
            })
        }
    }

    /// Fails unless the principal holds `capability` and is the owner of the resource
    pub fn require_owner(
        &self,
        capability: Capability,
        owner_id: &str,
        resource: &'static str,
    ) -> Result<(), AccessError> {
        self.require(capability)?;
        if self.user_id != owner_id {
            return Err(AccessError::NotOwner(resource));
        }
        Ok(())
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("teacher").unwrap(), Role::Teacher);
        assert_eq!(Role::from_str("Student").unwrap(), Role::Student);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn test_role_deserialize() {
        let role: Role = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(role, Role::Student);
        assert!(serde_json::from_str::<Role>("\"janitor\"").is_err());
    }

    #[test]
    fn test_teacher_capabilities() {
        let caps = Role::Teacher.capabilities();
        assert!(caps.contains(Capability::ManageCourses));
        assert!(caps.contains(Capability::ManageCatalog));
        assert!(caps.contains(Capability::ViewTeacherStats));
        assert!(!caps.contains(Capability::Enroll));
        assert!(!caps.contains(Capability::TrackProgress));
    }

    #[test]
    fn test_student_capabilities() {
        let caps: Vec<_> = Role::Student.capabilities().iter().collect();
        assert_eq!(caps, vec![Capability::Enroll, Capability::TrackProgress]);
    }

    #[test]
    fn test_capability_set_insert() {
        let mut caps = CapabilitySet::NONE;
        assert!(!caps.contains(Capability::Enroll));

        caps.insert(Capability::Enroll);
        assert!(caps.contains(Capability::Enroll));
        assert_eq!(caps, CapabilitySet::ENROLL);
        assert_eq!(caps & CapabilitySet::MANAGE_COURSES, CapabilitySet::NONE);
    }

    #[test]
    fn test_principal_require() {
        let student = Principal::new("alice", Role::Student);
        assert!(student.require(Capability::Enroll).is_ok());

        let err = student.require(Capability::ManageCourses).unwrap_err();
        assert_eq!(err.to_string(), "student accounts cannot manage_courses");
    }

    #[test]
    fn test_principal_require_owner() {
        let teacher = Principal::new("bob", Role::Teacher);
        assert!(
            teacher
                .require_owner(Capability::ManageCourses, "bob", "course")
                .is_ok()
        );
        assert_eq!(
            teacher.require_owner(Capability::ManageCourses, "carol", "course"),
            Err(AccessError::NotOwner("course"))
        );
    }
}
