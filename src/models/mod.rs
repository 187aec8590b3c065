pub mod agent;
pub mod chain;
pub mod feedback;

pub use agent::*;
pub use chain::*;
pub use feedback::*;
