pub mod lookup;
pub mod mastery;
pub mod pos;
pub mod quiz;
pub mod scheduler;
