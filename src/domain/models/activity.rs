#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub persona_id: String,
    pub activity_type: String,
    #[serde(default)]
    pub detail: serde_json::Value,
    #[serde(default = "default_trigger")]
    pub triggered_by: String,
    pub created_at: String,
}

fn default_trigger() -> String {
    return "manual".to_string();
}

impl ActivityLog {
    /// The `detail.content` text, when the activity produced one.
    pub fn summary(&self) -> Option<&str> {
        return self
            .detail
            .get("content")
            .and_then(|content| return content.as_str())
            .filter(|content| return !content.is_empty());
    }

    pub fn icon(&self) -> &'static str {
        match self.activity_type.as_str() {
            "post" => return "📝",
            "like" => return "❤️",
            "comment" => return "💬",
            "follow" => return "👤",
            "react" => return "⚡",
            "free" => return "🎯",
            _ => return "•",
        }
    }
}

/// Filters and cursor for `GET /api/persona/{id}/activity-logs`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub limit: u32,
    pub cursor: Option<String>,
    pub activity_type: Option<String>,
    pub triggered_by: Option<String>,
}

impl ActivityQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.to_string()));
        }
        if let Some(activity_type) = self.activity_type.as_ref().filter(|e| return !e.is_empty()) {
            params.push(("activity_type", activity_type.to_string()));
        }
        if let Some(triggered_by) = self.triggered_by.as_ref().filter(|e| return !e.is_empty()) {
            params.push(("triggered_by", triggered_by.to_string()));
        }

        return params;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub activity_type: String,
    pub content: String,
    #[serde(default)]
    pub target_post_id: Option<String>,
    #[serde(default)]
    pub target_persona_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub result: serde_json::Value,
}

/// Renders a timestamp relative to `now`: `just now`, `5m ago`, `3h ago`,
/// `2d ago`, then a plain date after a week. Unparseable input is returned
/// unchanged.
pub fn format_relative(created_at: &str, now: DateTime<Utc>) -> String {
    let date = match DateTime::parse_from_rfc3339(created_at) {
        Ok(date) => date.with_timezone(&Utc),
        Err(_) => return created_at.to_string(),
    };

    let diff_min = (now - date).num_minutes();
    if diff_min < 1 {
        return "just now".to_string();
    }
    if diff_min < 60 {
        return format!("{diff_min}m ago");
    }
    let diff_h = diff_min / 60;
    if diff_h < 24 {
        return format!("{diff_h}h ago");
    }
    let diff_d = diff_h / 24;
    if diff_d < 7 {
        return format!("{diff_d}d ago");
    }

    return date.format("%Y-%m-%d").to_string();
}
