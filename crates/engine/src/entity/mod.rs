//! Arena entities.
//!
//! Player-controlled blobs and the food particles they eat.

mod food;
mod player;

pub use food::Food;
pub use player::Entity;
