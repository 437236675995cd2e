pub mod domain;
pub mod event;
pub mod gate;
pub mod infrastructure;
