pub mod health;
pub mod info;
pub mod members;
pub mod projects;
pub mod tasks;
