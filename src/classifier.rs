use crate::message::SmsMessage;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category label assigned to a message. Exactly one per message; a message
/// matching no rule is `Unknown`, never unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    VerificationCode,
    Express,
    Bank,
    Marketing,
    Notification,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::VerificationCode => "verification_code",
            Category::Express => "express",
            Category::Bank => "bank",
            Category::Marketing => "marketing",
            Category::Notification => "notification",
            Category::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const VERIFICATION_KEYWORDS: &[&str] = &["验证码", "code", "otp", "verification", "动态码", "确认码"];

const BANK_KEYWORDS: &[&str] = &[
    "银行", "余额", "交易", "转账", "信用卡", "debit", "credit", "alipay", "wechat pay",
    "微信支付", "支付宝", "消费", "入账", "出账",
];

// Includes pickup-notice phrasing so delivery notices never fall through to
// the generic notification bucket.
const EXPRESS_KEYWORDS: &[&str] = &[
    "快递", "包裹", "物流", "签收", "派送", "ems", "sf express", "jd logistics", "取件码",
    "运单", "菜鸟", "驿站", "取件通知", "待取件",
];

const MARKETING_KEYWORDS: &[&str] = &[
    "优惠", "促销", "折扣", "特价", "活动", "coupon", "sale", "广告", "推广",
];

const NOTIFICATION_KEYWORDS: &[&str] = &[
    "通知", "提醒", "预约", "更新", "会议", "alert", "notice", "reminder", "中国移动",
    "中国联通", "中国电信", "停车", "积分", "流量", "话费",
];

lazy_static! {
    static ref DIGIT_RUN_4_6: Regex = Regex::new(r"\d{4,6}").unwrap();
}

/// Keyword-driven message classifier. Rules are evaluated in a fixed order
/// and the first match wins; that order is the tie-break policy.
pub struct SmsClassifier;

impl SmsClassifier {
    /// Classify a single message body. Pure and total; case-insensitive.
    pub fn classify(content: &str) -> Category {
        let lower = content.to_lowercase();
        let lower = lower.trim();

        if Self::is_verification_code(lower) {
            return Category::VerificationCode;
        }

        // Express before Notification, so "取件通知" lands here.
        if Self::is_express(lower) {
            return Category::Express;
        }

        if Self::is_bank(lower) {
            return Category::Bank;
        }

        if Self::is_marketing(lower) {
            return Category::Marketing;
        }

        // Fallback bucket; the express check is repeated because the two
        // keyword sets overlap on 通知.
        if Self::is_notification(lower) && !Self::is_express(lower) {
            return Category::Notification;
        }

        Category::Unknown
    }

    /// Group a batch by category. Input order is preserved within each group.
    pub fn classify_batch(messages: &[SmsMessage]) -> HashMap<Category, Vec<SmsMessage>> {
        let mut groups: HashMap<Category, Vec<SmsMessage>> = HashMap::new();
        for message in messages {
            groups
                .entry(Self::classify(&message.content))
                .or_default()
                .push(message.clone());
        }
        groups
    }

    // A verification keyword alone is not enough; the message must also
    // carry a 4-6 digit run.
    fn is_verification_code(content: &str) -> bool {
        let has_keyword = VERIFICATION_KEYWORDS.iter().any(|kw| content.contains(kw));
        has_keyword && DIGIT_RUN_4_6.is_match(content)
    }

    fn is_express(content: &str) -> bool {
        EXPRESS_KEYWORDS.iter().any(|kw| content.contains(kw))
    }

    fn is_bank(content: &str) -> bool {
        BANK_KEYWORDS.iter().any(|kw| content.contains(kw))
    }

    fn is_marketing(content: &str) -> bool {
        MARKETING_KEYWORDS.iter().any(|kw| content.contains(kw))
    }

    fn is_notification(content: &str) -> bool {
        NOTIFICATION_KEYWORDS.iter().any(|kw| content.contains(kw))
    }
}
