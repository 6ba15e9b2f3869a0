//! # Example Actors
//!
//! Concrete reducers built on the effector runtime:
//!
//! - [`CounterActor`] - integer counter driven by `INCREMENT`/`DECREMENT`/`RESET`/`ADD`
//! - [`ControllerActor`] - forwards `DISPATCH` commands to counters and tracks acknowledgements

pub mod controller;
pub mod counter;

pub use controller::{ControllerActor, ControllerReducer, ControllerState};
pub use counter::{CounterActor, CounterReducer, CounterState};
