pub mod corporate_action;
pub mod response;
pub mod stock;

pub use corporate_action::*;
pub use response::*;
pub use stock::*;
