pub mod admin;
pub mod admin_auth;
pub mod ballot;
pub mod candidate;
pub mod migrations;
pub mod optout;
pub mod verify;
pub mod vote;
