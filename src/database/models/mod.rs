pub mod appointment;
pub mod caregiver;
pub mod intake_event;
pub mod invite;
pub mod medication;
pub mod patient;
pub mod permission;
pub mod push_subscription;
pub mod treatment;
pub mod user;
