pub mod board;
pub mod error;
pub mod invite;
pub mod member;
pub mod project;
