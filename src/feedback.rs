use crate::models::{LearningItem, ProfileState};
use crate::session::{normalize, AnswerOutcome, SessionSummary};

pub struct FeedbackGenerator;

impl FeedbackGenerator {
    /// Message for a scored answer. `items` are the other items in play, used
    /// to spot a response that belongs to a different prompt.
    pub fn answer_message(outcome: &AnswerOutcome, response: &str, items: &[LearningItem]) -> String {
        if outcome.was_correct {
            return format!("Correct! +{} XP", outcome.reward_points);
        }

        let trimmed = response.trim();
        let mut msg = format!(
            "Not quite. The answer is '{}'. Keep going!",
            outcome.expected_answer
        );

        if !trimmed.is_empty() {
            let confused = items
                .iter()
                .find(|it| it.id != outcome.item_id && normalize(&it.answer) == normalize(trimmed));
            if let Some(item) = confused {
                msg.push_str(&format!("\n'{}' is the answer to '{}'.", trimmed, item.prompt));
            }
        }

        msg
    }

    pub fn summary_message(summary: &SessionSummary, profile: &ProfileState) -> String {
        format!(
            "Lesson complete! You got {}/{} correct.\nStreak: {}  XP: {}",
            summary.correct_count,
            summary.total_count,
            profile.streak_count.unwrap_or(0),
            profile.total_xp
        )
    }
}
