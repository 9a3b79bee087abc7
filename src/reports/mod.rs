pub mod demographics;
pub mod enrollment;
pub mod intake;
pub mod occupancy;
pub mod table;
pub mod violence;
pub mod visits;
