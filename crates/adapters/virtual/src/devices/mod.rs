//! Virtual device descriptors — weather station, air-conditioner.

mod air_conditioner;
mod weather_station;

pub use air_conditioner::VirtualAirConditioner;
pub use weather_station::{VirtualWeatherStation, WEATHER_STATION_ID};
