pub mod market;
pub mod portfolio;
pub mod risk;
pub mod signals;
pub mod technical;

pub use market::*;
pub use portfolio::*;
pub use risk::*;
pub use signals::*;
pub use technical::*;
