pub mod cards;
pub mod decks;
pub mod quiz;
pub mod results;
