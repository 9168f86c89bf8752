use crate::detection::carrier::CarrierDetector;
use crate::detection::strict::ExpressScorer;
use crate::message::SmsMessage;
use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pickup state inferred from the message text at extraction time. This is
/// a point-in-time snapshot; live status is tracked by the caller against
/// `pickup_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupStatus {
    Pending,
    Picked,
    Expired,
}

/// One structured pickup parsed out of a message. A message carrying N
/// codes yields N records that differ only in `pickup_code`. Records are
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressRecord {
    pub company: String,
    pub express_type: String,
    pub pickup_code: String,
    pub location: Option<String>,
    pub sender: String,
    pub received_at: String,
    pub full_content: String,
    pub status: PickupStatus,
    pub date: String,
}

lazy_static! {
    static ref HYPHEN_CODE: Regex =
        Regex::new(r"([0-9]+-[0-9]+-[0-9]{1,8}(?:-[0-9]+)?)").unwrap();
    static ref DATE_SHAPE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref BARE_DIGITS_4_8: Regex = Regex::new(r"([0-9]{4,8})").unwrap();

    // Ordered general pickup-code patterns. The scan stops at the first
    // pattern that yields a match, so the specific anchored forms always
    // beat the bare digit fallback.
    static ref GENERAL_CODE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"货([0-9]+-[0-9]+-[0-9]+)").unwrap(),
        Regex::new(r"取件码[：:为是]?\s*([A-Za-z0-9]{4,8})").unwrap(),
        Regex::new(r"提货码[：:为是]?\s*([A-Za-z0-9]{4,8})").unwrap(),
        Regex::new(r"验证码[：:为是]?\s*([A-Za-z0-9]{4,8})").unwrap(),
        Regex::new(r"取货码[：:为是]?\s*([A-Za-z0-9]{4,8})").unwrap(),
        Regex::new(r"取件\s*[码号][：:为是]?\s*([A-Za-z0-9]{4,8})").unwrap(),
        Regex::new(r"\[([A-Za-z0-9]{4,8})\]").unwrap(),
        Regex::new(r"【([A-Za-z0-9]{4,8})】").unwrap(),
        Regex::new(r"([0-9]{4,8})").unwrap(),
    ];

    // Locker chains print hyphenated alphanumeric codes like 00-7956.
    static ref LOCKER_ANCHORED: Regex =
        Regex::new(r"取件码[为:：]\s*([0-9A-Za-z]+-[0-9A-Za-z]+(?:-[0-9A-Za-z]+)*)").unwrap();
    static ref LOCKER_CUE: Regex =
        Regex::new(r"凭\s*([0-9A-Za-z]+-[0-9A-Za-z]+(?:-[0-9A-Za-z]+)*)").unwrap();
    static ref LOCKER_BARE: Regex =
        Regex::new(r"([0-9A-Za-z]{2,}-[0-9A-Za-z]{2,}(?:-[0-9A-Za-z]{2,})*)").unwrap();

    static ref LOCATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"到([^，。,]*?(?:小区|楼|店|驿站|超市|便利店|快递柜)[^，。,]*)").unwrap(),
        Regex::new(r"在([^，。,]*?(?:小区|楼|店|驿站|超市|便利店|快递柜)[^，。,]*)").unwrap(),
        Regex::new(r"(菜鸟驿站[^，。,\s]{0,30})").unwrap(),
        Regex::new(r"(丰巢[^，。,\s]{0,30})").unwrap(),
        Regex::new(r"(.*?超市)").unwrap(),
        Regex::new(r"(.*?便利店)").unwrap(),
        Regex::new(r"(.*?驿站)").unwrap(),
        Regex::new(r"(.*?快递柜)").unwrap(),
    ];
    static ref OWNED_PARCEL_PREFIX: Regex = Regex::new(r"您有.*?在").unwrap();

    static ref FULL_DATE: Regex = Regex::new(r"(\d{4})[-年](\d{1,2})[-月](\d{1,2})").unwrap();
    static ref STATION_DATE: Regex = Regex::new(r"凭\s*([0-9]+)-([0-9]+)-[0-9]+").unwrap();
    static ref LEGACY_DATE: Regex = Regex::new(r"货(\d+)-(\d+)-(\d+)").unwrap();
    static ref MONTH_DAY: Regex = Regex::new(r"(\d{1,2})[-月](\d{1,2})").unwrap();
    static ref DAY_ONLY: Regex = Regex::new(r"(\d{1,2})日").unwrap();
    static ref RELATIVE_DAY: Regex = Regex::new(r"(今天|明天|后天)").unwrap();
}

/// Turns qualifying messages into structured pickup records. Every message
/// is vetted by [`ExpressScorer`] before any pattern runs, so the
/// high-recall digit fallback never fires on unvetted content.
pub struct ExpressExtractor;

impl ExpressExtractor {
    /// Extract every pickup record from a batch. A message with N codes
    /// yields N records; non-qualifying messages yield none.
    pub fn extract_all(messages: &[SmsMessage]) -> Vec<ExpressRecord> {
        let mut records = Vec::new();
        for message in messages {
            records.extend(Self::extract(message));
        }
        log::info!(
            "extracted {} pickup records from {} messages",
            records.len(),
            messages.len()
        );
        records
    }

    /// Extract the pickup records of a single message.
    pub fn extract(message: &SmsMessage) -> Vec<ExpressRecord> {
        let (is_express, score) = ExpressScorer::score(message);
        if !is_express {
            log::debug!("skipping non-express message (score={score})");
            return Vec::new();
        }

        let Some(carrier) =
            CarrierDetector::detect(Some(message.sender.as_str()), &message.content)
        else {
            log::debug!("no carrier match for sender {}", message.sender);
            return Vec::new();
        };

        let codes = Self::pickup_codes(&message.content);
        if codes.is_empty() {
            log::debug!("no pickup code found in qualifying message");
            return Vec::new();
        }

        let location = Self::location(&message.content);
        let date = Self::date_from_received(&message.received_at);
        let status = Self::status(&message.content);

        codes
            .into_iter()
            .map(|pickup_code| ExpressRecord {
                company: carrier.display_name.clone(),
                express_type: carrier.kind.clone(),
                pickup_code,
                location: location.clone(),
                sender: message.sender.clone(),
                received_at: message.received_at.clone(),
                full_content: message.content.clone(),
                status,
                date: date.clone(),
            })
            .collect()
    }

    /// All pickup codes in a message body, in extraction order.
    pub fn pickup_codes(content: &str) -> Vec<String> {
        if content.contains("【菜鸟驿站】") || content.contains("[菜鸟驿站]") {
            let codes = Self::station_codes(content);
            if !codes.is_empty() {
                return codes;
            }
        }

        if content.contains("兔喜生活") {
            let codes = Self::locker_codes(content);
            if !codes.is_empty() {
                return codes;
            }
        }

        for pattern in GENERAL_CODE_PATTERNS.iter() {
            let codes: Vec<String> = pattern
                .captures_iter(content)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .collect();
            if !codes.is_empty() {
                return codes;
            }
        }

        Vec::new()
    }

    // Station notices put the codes after a cue: 凭, or failing that
    // 取件码为. The tail after the cue holds one or many hyphenated codes,
    // comma-separated; bare 4-8 digit runs are the fallback.
    fn station_codes(content: &str) -> Vec<String> {
        let tail = if let Some(idx) = content.find('凭') {
            &content[idx + '凭'.len_utf8()..]
        } else if let Some(idx) = content.find("取件码为") {
            &content[idx + "取件码为".len()..]
        } else {
            return Vec::new();
        };

        let mut codes = Vec::new();
        for caps in HYPHEN_CODE.captures_iter(tail) {
            let code = caps[1].trim();
            if code.is_empty() || DATE_SHAPE.is_match(code) {
                continue;
            }
            if !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        if !codes.is_empty() {
            return codes;
        }

        for caps in BARE_DIGITS_4_8.captures_iter(tail) {
            let code = caps[1].trim().to_string();
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    // Locker-chain notices (兔喜生活) use hyphenated alphanumeric codes such
    // as 00-7956, anchored by 取件码为 or 凭.
    fn locker_codes(content: &str) -> Vec<String> {
        for pattern in [&*LOCKER_ANCHORED, &*LOCKER_CUE, &*LOCKER_BARE] {
            let mut codes: Vec<String> = Vec::new();
            for caps in pattern.captures_iter(content) {
                let code = caps[1].trim();
                if code.is_empty() || DATE_SHAPE.is_match(code) {
                    continue;
                }
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
            if !codes.is_empty() {
                return codes;
            }
        }
        Vec::new()
    }

    /// Pickup location, if the message names one.
    pub fn location(content: &str) -> Option<String> {
        for pattern in LOCATION_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(content) {
                let raw = caps.get(1)?.as_str();
                let cleaned = raw
                    .replace("【菜鸟驿站】", "")
                    .replace("[菜鸟驿站]", "")
                    .replace("菜鸟驿站", "");
                let cleaned = OWNED_PARCEL_PREFIX.replace_all(&cleaned, "");
                let cleaned = cleaned.trim();
                if !cleaned.is_empty() {
                    return Some(cleaned.to_string());
                }
            }
        }
        None
    }

    /// Record date: the date portion of the receipt timestamp.
    pub fn date_from_received(received_at: &str) -> String {
        received_at.chars().take(10).collect()
    }

    /// Display date parsed from the body. Precedence: full date, station
    /// 凭M-D-code cue (current year), legacy 货M-D-YYYY, then bare
    /// month-day / day / relative words. Empty when nothing matches.
    pub fn display_date(content: &str) -> String {
        if let Some(caps) = FULL_DATE.captures(content) {
            return format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
        }

        if let Some(caps) = STATION_DATE.captures(content) {
            let year = chrono::Local::now().year();
            return format!("{}-{}-{}", year, &caps[1], &caps[2]);
        }

        if let Some(caps) = LEGACY_DATE.captures(content) {
            return format!("{}-{}-{}", &caps[3], &caps[1], &caps[2]);
        }

        for pattern in [&*MONTH_DAY, &*DAY_ONLY, &*RELATIVE_DAY] {
            if let Some(m) = pattern.find(content) {
                return m.as_str().to_string();
            }
        }

        String::new()
    }

    /// Pickup status keywords; pending is the default.
    pub fn status(content: &str) -> PickupStatus {
        if content.contains("已取") || content.contains("已领取") || content.contains("已取件") {
            PickupStatus::Picked
        } else if content.contains("已过期")
            || content.contains("已失效")
            || content.contains("已超期")
        {
            PickupStatus::Expired
        } else {
            PickupStatus::Pending
        }
    }
}
