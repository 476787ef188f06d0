pub mod blend;
pub mod flocking;
pub mod neighbors;
pub mod predator;
pub mod scheduler;
pub mod steering;
