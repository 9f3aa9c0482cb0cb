//! Prompt templates for the two generative calls.
//!
//! Both prompts ask for JSON only. Models do not always comply, which is
//! why every reply goes through the extractor regardless.

use durian_core::Polarity;

/// Keywords beyond this many are not sent to the campaign prompt.
pub const MAX_CAMPAIGN_KEYWORDS: usize = 10;

/// Fixed instructions for the sentiment judge. The review text is spliced in
/// after the first two lines.
const JUDGE_PREAMBLE: [&str; 2] = [
    "คุณเป็นผู้เชี่ยวชาญการวิเคราะห์ความรู้สึกสำหรับโดเมนทุเรียนและผลไม้",
    "วิเคราะห์ข้อความต่อไปนี้และตอบในรูปแบบ JSON เท่านั้น:",
];

const JUDGE_GUIDANCE: [&str; 7] = [
    "คำแนะนำการวิเคราะห์:",
    "- positive: อร่อย, หอม, หวาน, มัน, ดี, ชอบ, แนะนำ, คุ้มค่า, สด, คุณภาพดี",
    "- negative: ไม่อร่อย, เหม็น, เน่า, แย่, ไม่ชอบ, ไม่แนะนำ, ไม่คุ้ม, บูด, คุณภาพแย่",
    "- neutral: ข้อมูลทั่วไป, คำถาม, ไม่แสดงความรู้สึกชัดเจน",
    "",
    "รูปแบบ JSON:",
    r#"{"label":"positive|negative|neutral","confidence":0.0-1.0,"reason":"เหตุผลสั้นๆ","keywords":["คำสำคัญ1","คำสำคัญ2"]}"#,
];

const CAMPAIGN_INTRO: &str =
    "คุณคือ Copywriter โปรโมททุเรียน ช่วยเขียนไอเดียแคมเปญสั้น ๆ (ภาษาไทย)";

const CAMPAIGN_FORMAT: [&str; 2] = [
    "กรุณาตอบในรูปแบบ JSON เท่านั้น โดยไม่มีข้อความอื่น:",
    r#"{"taglines":["ข้อความโปรโมท 1","ข้อความโปรโมท 2","ข้อความโปรโมท 3"],"idea":"ไอเดียแคมเปญหลัก"}"#,
];

/// Build the judge prompt for one review.
pub fn build_judge_prompt(text: &str) -> String {
    let mut lines: Vec<String> = JUDGE_PREAMBLE.iter().map(|l| l.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("ข้อความ: {}", text));
    lines.push(String::new());
    lines.extend(JUDGE_GUIDANCE.iter().map(|l| l.to_string()));
    lines.join("\n")
}

/// Build the campaign prompt from a verdict and its keyword evidence.
pub fn build_campaign_prompt(polarity: Polarity, keywords: &[String]) -> String {
    let keywords = keywords
        .iter()
        .take(MAX_CAMPAIGN_KEYWORDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        CAMPAIGN_INTRO.to_string(),
        format!("Polarity: {} ({})", polarity.thai_label(), polarity),
        format!("Keywords: {}", keywords),
    ];
    lines.extend(CAMPAIGN_FORMAT.iter().map(|l| l.to_string()));
    lines.join("\n")
}
