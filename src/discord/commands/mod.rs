mod adminregister;
mod deleterank;
mod history;
mod notify;
mod rank;
mod register;
mod sync;
mod unregister;

pub use adminregister::adminregister;
pub use deleterank::deleterank;
pub use history::history;
pub use notify::notify;
pub use rank::rank;
pub use register::register;
pub use sync::sync;
pub use unregister::unregister;
