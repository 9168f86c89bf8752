use serde::{Deserialize, Serialize};

/// Which message field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Sender,
    Content,
}

/// An operator-authored tagging rule. Rules are read-only to the engine;
/// it never creates, edits, or deletes them.
///
/// Sender rules encode their condition as `"conditionType|keyword"` with
/// conditionType one of contains / startsWith / endsWith. Content rules use
/// the condition as a plain substring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub tag_name: String,
    pub rule_type: RuleType,
    pub condition: String,
    pub extract_anchor: String,
    pub extract_length: usize,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_enabled() -> bool {
    true
}

/// Outcome of one matched rule. Non-matching rules produce no result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub matched: bool,
    pub extracted_value: String,
    pub tag_name: String,
}

// Connectives that sit between an anchor and the value it announces.
const ANCHOR_CONNECTIVES: &[char] = &['：', ':', '为', '是', ' ', '\t'];

/// Evaluates operator rules against a message.
pub struct RuleEngine;

impl RuleEngine {
    /// Run every enabled, valid rule against the message, highest priority
    /// first (ties keep input order). Only matches are returned.
    pub fn execute_rules(sender: &str, content: &str, rules: &[Rule]) -> Vec<RuleResult> {
        let mut candidates: Vec<&Rule> = rules
            .iter()
            .filter(|rule| rule.enabled && Self::validate_rule(rule))
            .collect();
        // Stable sort, so equal priorities keep their input order.
        candidates.sort_by_key(|rule| std::cmp::Reverse(rule.priority));

        candidates
            .into_iter()
            .filter_map(|rule| match rule.rule_type {
                RuleType::Sender => Self::execute_sender_rule(sender, rule),
                RuleType::Content => Self::execute_content_rule(content, rule),
            })
            .collect()
    }

    /// A rule is usable when every text field is non-blank and the extract
    /// window has positive length.
    pub fn validate_rule(rule: &Rule) -> bool {
        !rule.name.trim().is_empty()
            && !rule.tag_name.trim().is_empty()
            && !rule.condition.trim().is_empty()
            && !rule.extract_anchor.trim().is_empty()
            && rule.extract_length > 0
    }

    fn execute_sender_rule(sender: &str, rule: &Rule) -> Option<RuleResult> {
        // "conditionType|keyword"; anything else never matches.
        let (condition_type, keyword) = rule.condition.split_once('|')?;
        let sender_lower = sender.to_lowercase();
        let keyword_lower = keyword.to_lowercase();

        let matched = match condition_type.to_lowercase().as_str() {
            "contains" => sender_lower.contains(&keyword_lower),
            "startswith" => sender_lower.starts_with(&keyword_lower),
            "endswith" => sender_lower.ends_with(&keyword_lower),
            _ => false,
        };
        if !matched {
            return None;
        }

        Some(RuleResult {
            matched: true,
            extracted_value: Self::extract_value(sender, &rule.extract_anchor, rule.extract_length),
            tag_name: rule.tag_name.clone(),
        })
    }

    fn execute_content_rule(content: &str, rule: &Rule) -> Option<RuleResult> {
        if find_ignore_case(content, &rule.condition).is_none() {
            return None;
        }

        Some(RuleResult {
            matched: true,
            extracted_value: Self::extract_value(
                content,
                &rule.extract_anchor,
                rule.extract_length,
            ),
            tag_name: rule.tag_name.clone(),
        })
    }

    // Take `length` characters after the anchor, skipping the connective
    // that usually separates anchor from value, clamped to the end of the
    // text. A missing anchor extracts nothing but the rule still matched.
    fn extract_value(text: &str, anchor: &str, length: usize) -> String {
        let Some((_, anchor_end)) = find_ignore_case(text, anchor) else {
            return String::new();
        };

        let tail = &text[anchor_end..];
        let value: String = tail
            .chars()
            .skip_while(|c| ANCHOR_CONNECTIVES.contains(c))
            .take(length)
            .collect();
        value.trim().to_string()
    }
}

// Case-insensitive substring search returning the byte range of the first
// occurrence. Comparison is per-character so multi-byte text indexes stay
// valid.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let needle_chars: Vec<char> = needle
        .chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect();
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();

    for start in 0..hay.len() {
        if start + needle_chars.len() > hay.len() {
            break;
        }
        let matches = needle_chars.iter().enumerate().all(|(offset, &nc)| {
            let hc = hay[start + offset].1;
            hc.to_lowercase().next().unwrap_or(hc) == nc
        });
        if matches {
            let begin = hay[start].0;
            let end = hay
                .get(start + needle_chars.len())
                .map(|&(idx, _)| idx)
                .unwrap_or(haystack.len());
            return Some((begin, end));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_rule(condition: &str, anchor: &str, length: usize, priority: i32) -> Rule {
        Rule {
            id: String::new(),
            name: "test".to_string(),
            tag_name: format!("tag-{condition}"),
            rule_type: RuleType::Content,
            condition: condition.to_string(),
            extract_anchor: anchor.to_string(),
            extract_length: length,
            enabled: true,
            priority,
        }
    }

    #[test]
    fn test_content_rule_extracts_after_anchor() {
        let rules = vec![content_rule("单位码", "单位码", 4, 0)];
        let results = RuleEngine::execute_rules("10086", "您的单位码为8821，请妥善保管", &rules);
        assert_eq!(results.len(), 1);
        assert!(results[0].matched);
        assert_eq!(results[0].extracted_value, "8821");
    }

    #[test]
    fn test_priority_order_is_descending_and_stable() {
        let mut low = content_rule("包裹", "包裹", 2, 5);
        low.tag_name = "low".to_string();
        let mut high = content_rule("包裹", "包裹", 2, 10);
        high.tag_name = "high".to_string();
        let mut also_low = content_rule("包裹", "包裹", 2, 5);
        also_low.tag_name = "also-low".to_string();

        let rules = vec![low, high, also_low];
        let results = RuleEngine::execute_rules("", "您的包裹已到站", &rules);
        let tags: Vec<&str> = results.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["high", "low", "also-low"]);
    }

    #[test]
    fn test_sender_rule_condition_encoding() {
        let mut rule = content_rule("startsWith|106", "106", 4, 0);
        rule.rule_type = RuleType::Sender;

        let results = RuleEngine::execute_rules("10684001", "anything", &[rule.clone()]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].extracted_value, "8400");

        // Non-matching sender.
        assert!(RuleEngine::execute_rules("95338", "anything", &[rule.clone()]).is_empty());

        // Malformed encoding (no separator) never matches.
        rule.condition = "106".to_string();
        assert!(RuleEngine::execute_rules("10684001", "anything", &[rule]).is_empty());
    }

    #[test]
    fn test_sender_condition_type_is_case_insensitive() {
        let mut rule = content_rule("ENDSWITH|338", "95", 3, 0);
        rule.rule_type = RuleType::Sender;
        let results = RuleEngine::execute_rules("95338", "x", &[rule]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].extracted_value, "338");
    }

    #[test]
    fn test_invalid_rules_never_appear() {
        let mut blank_anchor = content_rule("包裹", "", 4, 0);
        blank_anchor.extract_anchor = " ".to_string();
        let zero_length = content_rule("包裹", "包裹", 0, 0);
        let mut disabled = content_rule("包裹", "包裹", 4, 0);
        disabled.enabled = false;

        let results =
            RuleEngine::execute_rules("", "您的包裹已到站", &[blank_anchor, zero_length, disabled]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_anchor_still_matches_with_empty_value() {
        let rules = vec![content_rule("包裹", "取件码", 4, 0)];
        let results = RuleEngine::execute_rules("", "您的包裹已到站", &rules);
        assert_eq!(results.len(), 1);
        assert!(results[0].matched);
        assert_eq!(results[0].extracted_value, "");
    }

    #[test]
    fn test_extraction_clamps_to_text_end() {
        let rules = vec![content_rule("码", "码", 20, 0)];
        let results = RuleEngine::execute_rules("", "取件码88", &rules);
        assert_eq!(results[0].extracted_value, "88");
    }

    #[test]
    fn test_content_match_is_case_insensitive() {
        let rules = vec![content_rule("VIP", "VIP", 2, 0)];
        let results = RuleEngine::execute_rules("", "您的vip等级为A1", &rules);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].extracted_value, "等级");
    }

    #[test]
    fn test_validate_rule() {
        assert!(RuleEngine::validate_rule(&content_rule("a", "b", 1, 0)));
        assert!(!RuleEngine::validate_rule(&content_rule("", "b", 1, 0)));
        assert!(!RuleEngine::validate_rule(&content_rule("a", "b", 0, 0)));
        let mut rule = content_rule("a", "b", 1, 0);
        rule.tag_name = "  ".to_string();
        assert!(!RuleEngine::validate_rule(&rule));
    }
}
