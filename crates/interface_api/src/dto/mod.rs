//! Request and response bodies

pub mod bills;
pub mod currencies;
pub mod items;
pub mod parties;
pub mod rates;
