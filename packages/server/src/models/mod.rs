pub mod admin;
pub mod announcement;
pub mod auth;
pub mod event;
pub mod leaderboard;
pub mod payment;
pub mod shared;
