//! Policy-gated, cache-fronted access to the remote store.
//!
//! ```text
//! caller ──get──▶ policy ──▶ TtlCache ──miss──▶ SingleFlight ──▶ RemoteStore
//!        ──mutate─▶ policy ──▶ RemoteStore ──▶ invalidate collection
//! ```

mod error;
mod facade;
mod search;
mod single_flight;
mod ttl;

pub use error::DataAccessError;
pub use facade::{DataAccessFacade, FacadeOptions};
pub use search::{DebouncedSearch, SearchOutcome};
pub use single_flight::SingleFlight;
pub use ttl::TtlPolicy;
