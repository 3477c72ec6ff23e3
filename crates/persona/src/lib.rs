//! Wallet persona engine: turns on-chain activity into a classified,
//! scored and narrated profile.

pub mod classification;
pub mod journey;
pub mod mock;
pub mod narrative;
pub mod profile;
pub mod recommendations;
pub mod scoring;
pub mod stats;

pub use classification::{Archetype, PersonaCategory};
pub use profile::{analyze_ledger, analyze_report, Persona};
