/// Carrier identified for a message, with the display name used by callers
/// and the short type key used for grouping and icons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierMatch {
    pub display_name: String,
    pub kind: String,
}

// Sender tokens are matched against the upper-cased sender id. Table order
// is the tie-break: the first entry with any matching token wins.
const SENDER_RULES: &[(&str, &[&str])] = &[
    ("sf", &["SF", "95338"]),
    ("jd", &["JD", "950618", "106550618"]),
    ("zto", &["ZTO", "95311"]),
    ("yto", &["YTO", "95554"]),
    ("sto", &["STO", "95543"]),
    ("cainiao", &["CAINIAO", "95188"]),
    ("ems", &["EMS", "11185"]),
];

// Content keywords are matched against the lower-cased body, again in table
// order.
const KEYWORD_RULES: &[(&str, &[&str])] = &[
    ("sf", &["顺丰", "sf", "已投柜", "派送员"]),
    ("jd", &["京东", "jd", "京东快递"]),
    ("zto", &["中通", "zto"]),
    ("yto", &["圆通", "yto"]),
    ("sto", &["申通", "sto"]),
    ("cainiao", &["菜鸟", "菜鸟驿站"]),
    ("fengchao", &["丰巢"]),
    ("ems", &["邮政", "ems", "中国邮政"]),
];

// Generic delivery vocabulary; enough to call the message a parcel notice
// without naming a carrier.
const GENERAL_KEYWORDS: &[&str] = &[
    "取件码", "取货码", "提货码", "快递", "包裹", "驿站", "自提柜",
];

fn display_name(kind: &str) -> &'static str {
    match kind {
        "sf" => "顺丰速运",
        "jd" => "京东物流",
        "zto" => "中通快递",
        "yto" => "圆通速递",
        "sto" => "申通快递",
        "cainiao" => "菜鸟驿站",
        "fengchao" => "丰巢柜",
        "ems" => "中国邮政",
        _ => "包裹",
    }
}

/// Maps a sender id and/or message body to a known carrier.
pub struct CarrierDetector;

impl CarrierDetector {
    /// Sender tokens take precedence over content keywords; the generic
    /// vocabulary is the last resort and yields the `default` kind.
    pub fn detect(sender: Option<&str>, content: &str) -> Option<CarrierMatch> {
        let kind = Self::detect_kind(sender, content)?;
        Some(CarrierMatch {
            display_name: display_name(kind).to_string(),
            kind: kind.to_string(),
        })
    }

    fn detect_kind(sender: Option<&str>, content: &str) -> Option<&'static str> {
        if let Some(sender) = sender {
            let normalized = sender.to_uppercase();
            if !normalized.is_empty() {
                for (kind, tokens) in SENDER_RULES {
                    if tokens.iter().any(|token| normalized.contains(token)) {
                        return Some(kind);
                    }
                }
            }
        }

        let normalized = content.to_lowercase();
        for (kind, keywords) in KEYWORD_RULES {
            if keywords.iter().any(|kw| normalized.contains(kw)) {
                return Some(kind);
            }
        }

        if GENERAL_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
            return Some("default");
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_token_match() {
        let result = CarrierDetector::detect(Some("95338"), "您的包裹已到柜").unwrap();
        assert_eq!(result.kind, "sf");
        assert_eq!(result.display_name, "顺丰速运");

        // Token matching is case-insensitive on the sender side.
        let result = CarrierDetector::detect(Some("sf-express"), "").unwrap();
        assert_eq!(result.kind, "sf");
    }

    #[test]
    fn test_sender_beats_content() {
        // Sender says JD even though the body mentions 中通.
        let result = CarrierDetector::detect(Some("950618"), "中通快递提醒您").unwrap();
        assert_eq!(result.kind, "jd");
    }

    #[test]
    fn test_content_keyword_match() {
        let result =
            CarrierDetector::detect(None, "【中通快递】您的包裹已到XX驿站，取件码：1234").unwrap();
        assert_eq!(result.kind, "zto");
        assert_eq!(result.display_name, "中通快递");

        let result = CarrierDetector::detect(Some("10690000"), "丰巢提醒：包裹已存入").unwrap();
        assert_eq!(result.kind, "fengchao");
    }

    #[test]
    fn test_generic_keyword_fallback() {
        let result = CarrierDetector::detect(Some("10684xxxx"), "您有快递到自提柜，取货码5678")
            .unwrap();
        assert_eq!(result.kind, "default");
        assert_eq!(result.display_name, "包裹");
    }

    #[test]
    fn test_no_match_is_none() {
        assert!(CarrierDetector::detect(Some("10086"), "您本月流量已用尽").is_none());
        assert!(CarrierDetector::detect(None, "hello world").is_none());
    }
}
