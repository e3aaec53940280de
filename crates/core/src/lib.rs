pub mod bridge;
pub mod errors;
pub mod inbound;
pub mod mapping;
pub mod models;
pub mod panel;
pub mod settings;
pub mod timers;
pub mod traits;

pub use bridge::*;
pub use errors::*;
pub use inbound::*;
pub use mapping::*;
pub use models::*;
pub use panel::*;
pub use settings::*;
pub use timers::*;
pub use traits::*;
