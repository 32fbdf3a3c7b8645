pub mod admin_profile;
pub mod attendance;
pub mod classroom;
pub mod fee_structure;
pub mod grade;
pub mod payment;
pub mod principal;
pub mod student;
