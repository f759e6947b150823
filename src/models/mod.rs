pub mod movement;

pub use movement::{GroupId, Movement, MovementState, Period};
