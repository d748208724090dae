//! sf-testkit
//!
//! In-memory fakes for scenario tests: an `OrderStore` backed by Vecs and
//! recording fakes for the checkout / rates / mail providers. The daemon's
//! integration tests compose the real router against these, so routes are
//! exercised end to end without Postgres or the network.

mod fakes;
mod memory_store;

pub use fakes::{FakeCheckout, FakeMail, FakeRates};
pub use memory_store::MemoryOrderStore;
