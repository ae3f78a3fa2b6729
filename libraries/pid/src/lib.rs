mod cascade;

pub use cascade::{CascadeController, CascadeGains, PidError, PidTerms};
