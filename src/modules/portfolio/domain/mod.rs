pub mod entities;
pub mod period;
pub mod policies;
pub mod portfolio_set;
