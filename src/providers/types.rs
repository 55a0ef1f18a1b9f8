use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn new(prompt: String, max_tokens: u32) -> Self {
        Self {
            prompt,
            max_tokens,
            temperature: 0.3,
        }
    }
}

/// Structured output of meeting summarization. Parsing is tolerant: any
/// missing list defaults to empty so a sparse model reply still stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<Value>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Shared prompt for transcript analysis; both providers ask for the same
/// JSON keys so the stored shape is provider-independent.
pub fn summary_prompt(transcript: &str) -> String {
    format!(
        "Analyze this meeting transcript and extract:\n\
         - A concise summary\n\
         - Key discussion points\n\
         - Action items with assignees and due dates\n\
         - Decisions made\n\
         - Relevant tags\n\n\
         Return a JSON object with these keys: summary, key_points, action_items, decisions, tags\n\n\
         Transcript:\n{}",
        transcript
    )
}
