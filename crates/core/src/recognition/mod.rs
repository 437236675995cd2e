pub mod bootstrap;
pub mod gallery;
pub mod matcher;
