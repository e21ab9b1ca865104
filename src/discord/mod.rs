mod bot;
mod commands;
pub mod notifier;
pub mod roles;

pub use bot::{Data, create_framework};
