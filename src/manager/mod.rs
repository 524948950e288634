pub mod anemometer;
pub mod atmospheric;
pub mod clock;
pub mod counter;
pub mod direction;
pub mod manager;
pub mod observation;
pub mod publisher;
pub mod rain;
pub mod soil;
pub mod vane;
pub mod wind;
