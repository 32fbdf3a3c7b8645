pub use super::admin_profiles::Entity as AdminProfiles;
pub use super::attendance::Entity as Attendance;
pub use super::classrooms::Entity as Classrooms;
pub use super::fee_structures::Entity as FeeStructures;
pub use super::grades::Entity as Grades;
pub use super::payments::Entity as Payments;
pub use super::principals::Entity as Principals;
pub use super::students::Entity as Students;
