mod client;

pub use client::WaterQualityClient;
