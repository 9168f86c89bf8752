pub mod carrier;
pub mod strict;

pub use carrier::{CarrierDetector, CarrierMatch};
pub use strict::ExpressScorer;
