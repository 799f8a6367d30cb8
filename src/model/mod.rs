//! Feature types ingested from AIXM/NASR sources
//!
//! Each type declares its relational shape through
//! [`Record`](crate::schema::Record). The parsing layer that populates
//! these lives outside this crate; aerodb only persists and queries them.
//!
//! Runways belong to their airport, so dropping an airport cascades to its
//! runways. Navaids stand alone.

mod airport;
mod navaid;
mod runway;

pub use airport::Airport;
pub use navaid::Navaid;
pub use runway::Runway;
