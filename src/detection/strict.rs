use crate::message::SmsMessage;
use lazy_static::lazy_static;
use regex::Regex;

// Brand words recognized by the scorer; compared lower-cased.
const EXPRESS_BRANDS: &[&str] = &[
    "顺丰", "中通", "圆通", "韵达", "申通", "极兔", "菜鸟", "京东", "邮政", "ems",
];

// A qualifying message must pair one action word with one scene word.
const ACTION_WORDS: &[&str] = &["取件", "取件码", "凭码", "领取", "提货", "取货", "领取码"];

const LOCATION_WORDS: &[&str] = &["快递柜", "驿站", "菜鸟", "丰巢", "代收点", "柜机", "站点"];

const SENDER_BRAND_SCORE: i32 = 40;
const SENDER_PORT_SCORE: i32 = 20;
const ACTION_WORD_SCORE: i32 = 30;
const LOCATION_WORD_SCORE: i32 = 20;
const CODE_PROXIMITY_SCORE: i32 = 40;
const CODE_FORMAT_SCORE: i32 = 20;
const DIGIT_GROUP_PENALTY: i32 = -30;
const EXPRESS_THRESHOLD: i32 = 80;

// Window, in characters, searched around a code candidate for an action word.
const PROXIMITY_WINDOW: usize = 15;

// More than this many bare 4-6 digit runs reads as a bank/marketing blast.
const MAX_BARE_DIGIT_GROUPS: usize = 2;

lazy_static! {
    static ref HYPHEN_CODE: Regex = Regex::new(r"[0-9]+-[0-9]+-[0-9]{1,8}(?:-[0-9]+)?").unwrap();
    static ref DATE_SHAPE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref DIGIT_RUN_4_6: Regex = Regex::new(r"[0-9]{4,6}").unwrap();
    static ref MOBILE_NUMBER: Regex = Regex::new(r"^1[3-9]\d{9}$").unwrap();
    static ref PORT_10: Regex = Regex::new(r"^10\d{4}$").unwrap();
    static ref PORT_1069: Regex = Regex::new(r"^1069\d{6}$").unwrap();
    static ref PORT_95: Regex = Regex::new(r"^95\d{3}$").unwrap();
}

/// High-precision delivery-notice filter. Four additive signals; the sender
/// and semantic signals are mandatory and short-circuit the whole score to
/// zero when absent. A message qualifies at a total of 80 or more.
pub struct ExpressScorer;

impl ExpressScorer {
    /// Returns `(is_express, total_score)`. Deterministic and pure.
    pub fn score(message: &SmsMessage) -> (bool, i32) {
        let sender = &message.sender;
        let content = &message.content;

        let sender_score = Self::sender_signal(sender, content);
        if sender_score == 0 {
            return (false, 0);
        }
        let mut score = sender_score;

        let semantic_score = Self::semantic_signal(content);
        if semantic_score == 0 {
            return (false, 0);
        }
        score += semantic_score;

        score += Self::code_format_signal(content);
        score += Self::digit_group_penalty(content);

        let is_express = score >= EXPRESS_THRESHOLD;
        if is_express {
            log::debug!("express accepted: score={score} sender={sender}");
        } else {
            log::debug!("express rejected: score={score} sender={sender}");
        }
        (is_express, score)
    }

    // Signal 1: the sender must look like a carrier. Brand word in sender or
    // body scores 40; an enterprise short-code sender scores 20. Neither
    // disqualifies the message outright.
    fn sender_signal(sender: &str, content: &str) -> i32 {
        let mut score = 0;
        let sender_lower = sender.to_lowercase();
        let content_lower = content.to_lowercase();

        let has_brand = EXPRESS_BRANDS
            .iter()
            .any(|brand| sender_lower.contains(brand) || content_lower.contains(brand));
        if has_brand {
            score += SENDER_BRAND_SCORE;
            log::debug!("sender signal: brand word +{SENDER_BRAND_SCORE}");
        }

        if Self::is_enterprise_port(sender) {
            score += SENDER_PORT_SCORE;
            log::debug!("sender signal: enterprise port +{SENDER_PORT_SCORE}");
        }

        score
    }

    // Enterprise SMS ports: 10xxxx, 1069xxxxxx, 95xxx, any 106-prefixed
    // code, or an LB virtual-operator prefix. An ordinary 11-digit mobile
    // number never qualifies.
    fn is_enterprise_port(sender: &str) -> bool {
        if MOBILE_NUMBER.is_match(sender) {
            return false;
        }
        PORT_10.is_match(sender)
            || PORT_1069.is_match(sender)
            || PORT_95.is_match(sender)
            || sender.starts_with("106")
            || sender.to_uppercase().starts_with("LB")
    }

    // Signal 2: the body must pair an action word with a scene word. Either
    // one missing zeroes the signal, which aborts the whole score.
    fn semantic_signal(content: &str) -> i32 {
        let lower = content.to_lowercase();

        if !ACTION_WORDS.iter().any(|word| lower.contains(word)) {
            return 0;
        }
        if !LOCATION_WORDS.iter().any(|word| lower.contains(word)) {
            return 0;
        }

        log::debug!(
            "semantic signal: action +{ACTION_WORD_SCORE}, scene +{LOCATION_WORD_SCORE}"
        );
        ACTION_WORD_SCORE + LOCATION_WORD_SCORE
    }

    // Signal 3: a pickup-code shape with an action word nearby. Hyphenated
    // codes are preferred over bare digit runs; the first candidate with an
    // action word in its window settles the signal.
    fn code_format_signal(content: &str) -> i32 {
        for m in HYPHEN_CODE.find_iter(content) {
            if DATE_SHAPE.is_match(m.as_str()) {
                continue;
            }
            if Self::action_word_nearby(content, m.start(), m.end()) {
                log::debug!("code signal: hyphenated {} +60", m.as_str());
                return CODE_PROXIMITY_SCORE + CODE_FORMAT_SCORE;
            }
        }

        for m in DIGIT_RUN_4_6.find_iter(content) {
            if Self::action_word_nearby(content, m.start(), m.end()) {
                log::debug!("code signal: digit run {} +60", m.as_str());
                return CODE_PROXIMITY_SCORE + CODE_FORMAT_SCORE;
            }
        }

        0
    }

    // Signal 4: too many standalone digit groups. Runs inside hyphenated
    // codes or date shapes are not counted.
    fn digit_group_penalty(content: &str) -> i32 {
        let excluded: Vec<(usize, usize)> = HYPHEN_CODE
            .find_iter(content)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut count = 0;
        for m in DIGIT_RUN_4_6.find_iter(content) {
            let overlaps = excluded
                .iter()
                .any(|&(ex_start, ex_end)| m.start() < ex_end && m.end() > ex_start);
            if overlaps {
                continue;
            }
            count += 1;
            if count > MAX_BARE_DIGIT_GROUPS {
                log::debug!("digit penalty: {count} bare groups {DIGIT_GROUP_PENALTY}");
                return DIGIT_GROUP_PENALTY;
            }
        }

        0
    }

    // The window is measured in characters, not bytes, so CJK text counts
    // the same as ASCII.
    fn action_word_nearby(content: &str, start: usize, end: usize) -> bool {
        let window = char_window(content, start, end, PROXIMITY_WINDOW).to_lowercase();
        ACTION_WORDS.iter().any(|word| window.contains(word))
    }
}

fn char_window(content: &str, start: usize, end: usize, radius: usize) -> String {
    let chars_before = content[..start].chars().count();
    let chars_in_match = content[start..end].chars().count();
    let from = chars_before.saturating_sub(radius);
    let take = (chars_before - from) + chars_in_match + radius;
    content.chars().skip(from).take(take).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, content: &str) -> SmsMessage {
        SmsMessage::new(sender, content, "2025-11-05T12:42:25")
    }

    #[test]
    fn test_full_signal_stack() {
        // port +20, action +30, scene +20, code near action +60
        let (is_express, score) = ExpressScorer::score(&msg(
            "10684xxxxx",
            "您有未读包裹快递柜取件码1234请尽快取件",
        ));
        assert!(is_express);
        assert_eq!(score, 130);
    }

    #[test]
    fn test_missing_sender_signal_aborts() {
        // No brand anywhere and a plain mobile sender: score must be 0 even
        // though the body is a perfect delivery notice.
        let (is_express, score) = ExpressScorer::score(&msg(
            "13812345678",
            "您的包裹到快递柜了，凭取件码8821领取",
        ));
        assert!(!is_express);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_missing_action_or_scene_aborts() {
        // Scene word but no action word.
        let (_, score) = ExpressScorer::score(&msg("95338", "顺丰包裹已放入快递柜"));
        assert_eq!(score, 0);
        // Action word but no scene word.
        let (_, score) = ExpressScorer::score(&msg("95338", "顺丰包裹请凭码领取"));
        assert_eq!(score, 0);
    }

    #[test]
    fn test_marketing_blast_scores_zero() {
        let (is_express, score) = ExpressScorer::score(&msg("10690001", "全场五折优惠促销活动"));
        assert!(!is_express);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_enterprise_port_shapes() {
        assert!(ExpressScorer::is_enterprise_port("10684"));
        assert!(ExpressScorer::is_enterprise_port("1069558800"));
        assert!(ExpressScorer::is_enterprise_port("95338"));
        assert!(ExpressScorer::is_enterprise_port("1068412345"));
        assert!(ExpressScorer::is_enterprise_port("LB10086"));
        // Ordinary mobile numbers are excluded even though they start with 1.
        assert!(!ExpressScorer::is_enterprise_port("13812345678"));
        assert!(!ExpressScorer::is_enterprise_port("hello"));
    }

    #[test]
    fn test_hyphenated_code_preferred_and_dates_skipped() {
        // 2025-11-20 is date-shaped and must not satisfy the code signal;
        // the station code after 凭 must.
        let (is_express, score) = ExpressScorer::score(&msg(
            "10684000",
            "截止2025-11-20，凭9-5-5038到菜鸟驿站取件",
        ));
        assert!(is_express);
        // port 20 + brand 40 + action 30 + scene 20 + code 60 = 170
        assert_eq!(score, 170);
    }

    #[test]
    fn test_digit_group_penalty_is_exactly_thirty() {
        // Two bare digit groups: no penalty.
        let base = msg("95338", "顺丰快递柜取件码1234，订单5678，请尽快取件");
        let (_, base_score) = ExpressScorer::score(&base);
        // Three bare digit groups: exactly 30 less.
        let penalized = msg("95338", "顺丰快递柜取件码1234，订单5678，金额9012，请尽快取件");
        let (_, penalized_score) = ExpressScorer::score(&penalized);
        assert_eq!(base_score - penalized_score, 30);
    }

    #[test]
    fn test_hyphen_code_digits_not_counted_as_groups() {
        // The three digit runs inside 6-5-3002 style codes belong to the
        // codes and must not trip the penalty.
        let (is_express, score) = ExpressScorer::score(&msg(
            "10684000",
            "【菜鸟驿站】您有2个包裹在店，凭6-5-3002, 6-2-3006取件",
        ));
        assert!(is_express);
        // brand 40 + port 20 + action 30 + scene 20 + code 60 = 170
        assert_eq!(score, 170);
    }

    #[test]
    fn test_score_is_pure() {
        let m = msg("95338", "顺丰驿站取件码1234请取件");
        assert_eq!(ExpressScorer::score(&m), ExpressScorer::score(&m));
    }
}
