pub mod blink;
pub mod ear;
pub mod hrv;
pub mod rppg;
pub mod stress;
