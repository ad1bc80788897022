//! Hand-rolled tree search: alpha-beta with a PVS-style null-window
//! re-search, and an MTD(f) driver built on top of the same routine.
//!
//! Both split the root's move list across a thread pool instead of relying
//! on a single-threaded recursive walk, mirroring the original engine's
//! OpenMP `parallel for` with a critical section guarding the shared
//! alpha/best-move pair.

mod alphabeta;
mod mtdf;

pub use alphabeta::{alphabeta_root, SearchOutcome};
pub(crate) use alphabeta::pass_estimate;
pub use mtdf::mtdf_root;
