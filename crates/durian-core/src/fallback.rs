//! Static campaign content used when generation fails.
//!
//! Both variants share the same three taglines. The idea text differs so the
//! two failure paths stay distinguishable downstream.

use serde::{Deserialize, Serialize};

use crate::types::CampaignResult;

/// Taglines shared by every fallback.
pub const FALLBACK_TAGLINES: [&str; 3] = [
    "ราชาแห่งรสชาติ สดใหม่จากสวน",
    "หวาน มัน หอม — คัดพิเศษ",
    "คุ้มทุกคำ ส่งไวถึงบ้าน",
];

/// Idea used when the model answered but its output could not be parsed.
pub const PARSE_FAILURE_IDEA: &str =
    "แคมเปญโปรโมททุเรียนคุณภาพพรีเมียม พร้อมบริการจัดส่งถึงบ้าน";

/// Idea used when the model could not be reached at all.
pub const UNAVAILABLE_IDEA: &str =
    "(โหมดสำรอง) ตั้งค่า GEMINI_API_KEY เพื่อให้ AI เขียนแคมเปญตามจริง";

/// Why fallback content was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Reachable model, unusable output
    Unparseable,

    /// Transport failure, timeout or missing credential
    Unavailable,
}

/// Deterministic substitute campaign content.
pub struct CampaignFallbackPolicy;

impl CampaignFallbackPolicy {
    /// Fallback content for the given reason.
    pub fn content(reason: FallbackReason) -> CampaignResult {
        let idea = match reason {
            FallbackReason::Unparseable => PARSE_FAILURE_IDEA,
            FallbackReason::Unavailable => UNAVAILABLE_IDEA,
        };
        CampaignResult {
            taglines: FALLBACK_TAGLINES.iter().map(|t| t.to_string()).collect(),
            idea: idea.to_string(),
        }
    }

    /// Used inside the campaign adapter on a parse failure.
    pub fn for_parse_failure() -> CampaignResult {
        Self::content(FallbackReason::Unparseable)
    }

    /// Used by the caller when the campaign call itself failed.
    pub fn for_unavailable() -> CampaignResult {
        Self::content(FallbackReason::Unavailable)
    }

    /// Which fallback produced `result`, if any.
    pub fn classify(result: &CampaignResult) -> Option<FallbackReason> {
        if result.taglines.iter().map(String::as_str).ne(FALLBACK_TAGLINES) {
            return None;
        }
        match result.idea.as_str() {
            PARSE_FAILURE_IDEA => Some(FallbackReason::Unparseable),
            UNAVAILABLE_IDEA => Some(FallbackReason::Unavailable),
            _ => None,
        }
    }
}
