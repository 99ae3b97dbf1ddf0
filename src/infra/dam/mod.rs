mod client;

pub use client::{DamAuth, DamClient};
