//! Domain models for the feasibility intake system.

mod client;
mod lookup;
mod parameter;
mod request;

pub use client::*;
pub use lookup::*;
pub use parameter::*;
pub use request::*;
