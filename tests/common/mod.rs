pub mod actor_test_harness;

pub use actor_test_harness::*;
