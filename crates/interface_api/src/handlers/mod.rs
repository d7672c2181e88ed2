//! Request handlers

pub mod bills;
pub mod currencies;
pub mod health;
pub mod items;
pub mod parties;
pub mod rates;
