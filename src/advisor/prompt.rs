//! Advisor prompt and response schema

use serde_json::{Value, json};

use super::AdvisorRequest;
use crate::sim::{DangerIndicator, TargetCandidate};

/// Everything the transport sends for one request
#[derive(Debug, Clone)]
pub struct AdvisorPrompt {
    pub text: String,
    /// PNG bytes of the current render, sent inline when present
    pub screenshot: Option<Vec<u8>>,
    /// JSON schema the model must answer with
    pub schema: Value,
}

/// One line per candidate, ready for the prompt
pub fn describe_candidate(candidate: &TargetCandidate) -> String {
    if candidate.is_bomb() {
        return format!(
            "- BOMB at row {}, col {} (clears its surroundings, about {} points)",
            candidate.row,
            candidate.col,
            candidate.score()
        );
    }
    let wildcard = if candidate.is_rainbow() {
        ", contains a rainbow wildcard"
    } else {
        ""
    };
    format!(
        "- {} group of {} at row {}, col {} ({} points per bubble, {} total{})",
        candidate.color.as_str(),
        candidate.size,
        candidate.row,
        candidate.col,
        candidate.points_per_bubble,
        candidate.score(),
        wildcard
    )
}

fn describe_danger(danger: &DangerIndicator) -> String {
    let lowest = match danger.max_row {
        Some(row) => format!("The lowest bubble sits in row {row}"),
        None => "The board is empty".to_string(),
    };
    let urgency = if danger.critical {
        " The board is about to reach the danger line: prioritize clearing low rows."
    } else {
        ""
    };
    format!(
        "{lowest}; the game ends at row {}.{urgency}",
        danger.danger_row
    )
}

/// JSON schema for the structured reply
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "message": { "type": "STRING" },
            "rationale": { "type": "STRING" },
            "targetRow": { "type": "INTEGER" },
            "targetCol": { "type": "INTEGER" },
            "recommendedColor": {
                "type": "STRING",
                "enum": ["red", "orange", "yellow", "green", "blue", "purple"]
            }
        },
        "required": ["message", "rationale", "targetRow", "targetCol", "recommendedColor"]
    })
}

/// Build the prompt for a board snapshot
pub fn build_prompt(request: &AdvisorRequest) -> AdvisorPrompt {
    let mut text = String::from(
        "You are coaching a player in a hex-grid bubble shooter. \
         Three or more touching bubbles of one color pop. \
         Rainbow bubbles match any color and bombs clear everything nearby.\n\n",
    );
    text.push_str(&describe_danger(&request.danger));
    text.push_str("\n\n");

    if request.candidates.is_empty() {
        text.push_str("No target has a clear line of sight from the shooter.\n");
    } else {
        text.push_str("Reachable targets:\n");
        for candidate in &request.candidates {
            text.push_str(&describe_candidate(candidate));
            text.push('\n');
        }
    }

    text.push_str(
        "\nPick exactly one target from the list. Reply with a short message for the player, \
         a one-sentence rationale, the target's row and column, and the color to shoot.",
    );

    AdvisorPrompt {
        text,
        screenshot: request.screenshot.clone(),
        schema: response_schema(),
    }
}
