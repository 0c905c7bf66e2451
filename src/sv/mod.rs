pub mod channel;
pub mod goal;
pub mod history;
pub mod reset;
pub mod session;

pub use channel::Channel;
pub use goal::Goal;
pub use history::History;
pub use reset::Reset;
pub use session::Session;
