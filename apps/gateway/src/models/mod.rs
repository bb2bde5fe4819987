pub mod assessment;
pub mod course;
pub mod persona;
pub mod practice;
pub mod progress;
