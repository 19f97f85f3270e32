// Protected handlers (JWT authentication required)
//
// Route prefix: /api/*
// Middleware: JWT validation + AuthUser extension

pub mod appointments;
pub mod auth;
pub mod caregivers;
pub mod intake_events;
pub mod medications;
pub mod patients;
pub mod permissions;
pub mod subscriptions;
pub mod treatments;
