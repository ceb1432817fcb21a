pub mod domain;
pub mod stats;
pub mod verification;
