//! API handlers for taskgate.
//!
//! `auth` owns signup/login/logout, CSRF and the identity guard; `users` and
//! `tasks` are the protected resources that sit behind it.

pub mod auth;
pub mod error;
pub mod health;
pub mod tasks;
pub mod users;
