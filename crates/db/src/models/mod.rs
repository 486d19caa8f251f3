pub mod board;
pub mod ids;
pub mod member;
pub mod project;
pub mod project_member;
pub mod task;
