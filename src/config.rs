use crate::rules::{Rule, RuleType};
use serde::{Deserialize, Serialize};

/// On-disk configuration: the operator rule set plus engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rules: vec![
                Rule {
                    id: "unit-code".to_string(),
                    name: "单位码提取".to_string(),
                    tag_name: "单位码".to_string(),
                    rule_type: RuleType::Content,
                    condition: "单位码".to_string(),
                    extract_anchor: "单位码".to_string(),
                    extract_length: 4,
                    enabled: true,
                    priority: 10,
                },
                Rule {
                    id: "bank-sender".to_string(),
                    name: "银行短信打标".to_string(),
                    tag_name: "银行".to_string(),
                    rule_type: RuleType::Sender,
                    condition: "startsWith|95".to_string(),
                    extract_anchor: "余额".to_string(),
                    extract_length: 10,
                    enabled: true,
                    priority: 5,
                },
            ],
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_rules_are_valid() {
        use crate::rules::RuleEngine;
        let config = Config::default();
        assert!(config.rules.iter().all(|r| RuleEngine::validate_rule(r)));
        assert_eq!(config.cache_ttl_seconds, 300);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.rules.len(), config.rules.len());
        assert_eq!(parsed.rules[0].condition, "单位码");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: Config = serde_yaml::from_str("rules: []").unwrap();
        assert!(parsed.rules.is_empty());
        assert_eq!(parsed.cache_ttl_seconds, 300);
    }
}
