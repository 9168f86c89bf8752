pub mod cache;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod extractor;
pub mod message;
pub mod rules;

pub use cache::ExtractionCache;
pub use classifier::{Category, SmsClassifier};
pub use config::Config;
pub use detection::{CarrierDetector, CarrierMatch, ExpressScorer};
pub use extractor::{ExpressExtractor, ExpressRecord, PickupStatus};
pub use message::SmsMessage;
pub use rules::{Rule, RuleEngine, RuleResult, RuleType};
