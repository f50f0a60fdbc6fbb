//! Prompt construction for the three quiz intents.
//!
//! Question prompts vary the covered categories, a session identifier and
//! the sampling parameters on every call so repeated requests for the same
//! tool are less likely to produce the same question. Nothing here checks
//! for repeats; the model is only asked not to repeat itself.

use super::api_client::{ChatRequest, Message};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

pub const QUESTION_CATEGORIES: [&str; 12] = [
    "creating/configuring",
    "managing",
    "inspecting",
    "modifying",
    "troubleshooting",
    "advanced usage",
    "optimization",
    "automation",
    "security",
    "networking",
    "resource management",
    "cleanup tasks",
];

pub const CATEGORY_COUNT: RangeInclusive<usize> = 3..=5;
pub const QUESTION_TEMPERATURE: RangeInclusive<f64> = 0.8..=1.0;
pub const QUESTION_TOP_P: RangeInclusive<f64> = 0.9..=1.0;
pub const QUESTION_PENALTY: RangeInclusive<f64> = 0.4..=0.8;
pub const REVIEW_TEMPERATURE: f64 = 0.3;

/// Timestamp plus random integer; only used as prompt text.
pub fn session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        rng.gen_range(0..1_000_000u32)
    )
}

pub(crate) fn question_request<R: Rng + ?Sized>(
    model: &str,
    tool_name: &str,
    rng: &mut R,
) -> ChatRequest {
    let count = rng.gen_range(CATEGORY_COUNT);
    let categories: Vec<&str> = QUESTION_CATEGORIES
        .choose_multiple(rng, count)
        .copied()
        .collect();
    let session = session_id(rng);

    let system = format!(
        "You are a command line tutor. Session {session}. \
         Every question you write must be new: never repeat a question from an earlier session \
         and never reuse the wording of a previous question."
    );
    let prompt = format!(
        "Session {session}. You are helping a user learn {tool} commands. \
         Generate one practical question that asks the user to provide a specific {tool} command. \
         Pick the task from one of these areas: {areas}. \
         Do not repeat any question you have asked before. \
         Format your response as a clear, concise question only. \
         Do not provide the answer or any hints.",
        tool = tool_name,
        areas = categories.join(", "),
    );

    ChatRequest {
        model: model.to_string(),
        messages: vec![Message::system(system), Message::user(prompt)],
        temperature: rng.gen_range(QUESTION_TEMPERATURE),
        top_p: Some(rng.gen_range(QUESTION_TOP_P)),
        frequency_penalty: Some(rng.gen_range(QUESTION_PENALTY)),
        presence_penalty: Some(rng.gen_range(QUESTION_PENALTY)),
    }
}

pub(crate) fn evaluation_request(
    model: &str,
    tool_name: &str,
    question: &str,
    user_answer: &str,
) -> ChatRequest {
    let prompt = format!(
        "Question about {tool_name}: \"{question}\"\n\n\
         User's answer: \"{user_answer}\"\n\n\
         Evaluate if this command correctly solves the task. Respond with:\n\
         1. Whether the answer is CORRECT or INCORRECT\n\
         2. A brief explanation of why\n\
         3. If incorrect, the proper command\n\
         4. A tip for remembering this command"
    );
    fixed_request(model, prompt)
}

pub(crate) fn explanation_request(model: &str, tool_name: &str, command: &str) -> ChatRequest {
    let prompt = format!(
        "Explain the following {tool_name} command in detail:\n\n\
         {command}\n\n\
         Include:\n\
         1. What this command does\n\
         2. Breakdown of each part/flag\n\
         3. Common use cases\n\
         4. Any potential gotchas or warnings\n\
         Format as a concise explanation."
    );
    fixed_request(model, prompt)
}

fn fixed_request(model: &str, prompt: String) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![Message::user(prompt)],
        temperature: REVIEW_TEMPERATURE,
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chosen_categories(request: &ChatRequest) -> Vec<&'static str> {
        let prompt = &request.messages[1].content;
        QUESTION_CATEGORIES
            .iter()
            .copied()
            .filter(|c| prompt.contains(c))
            .collect()
    }

    #[test]
    fn test_question_parameters_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let request = question_request("m", "git", &mut rng);
            assert!(QUESTION_TEMPERATURE.contains(&request.temperature));
            assert!(QUESTION_TOP_P.contains(&request.top_p.unwrap()));
            assert!(QUESTION_PENALTY.contains(&request.frequency_penalty.unwrap()));
            assert!(QUESTION_PENALTY.contains(&request.presence_penalty.unwrap()));

            let categories = chosen_categories(&request);
            assert!(
                CATEGORY_COUNT.contains(&categories.len()),
                "unexpected category count {}",
                categories.len()
            );
        }
    }

    #[test]
    fn test_question_mentions_tool_and_session() {
        let mut rng = StdRng::seed_from_u64(1);
        let request = question_request("llama", "docker", &mut rng);
        assert_eq!(request.model, "llama");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1].content.contains("docker command"));

        let system = &request.messages[0].content;
        let session = system
            .split("Session ")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .unwrap();
        assert!(request.messages[1].content.contains(session));
        assert!(system.contains("never repeat"));
    }

    #[test]
    fn test_consecutive_questions_differ() {
        let mut rng = rand::thread_rng();
        let first = question_request("m", "git", &mut rng);
        let second = question_request("m", "git", &mut rng);
        assert_ne!(first.messages, second.messages);
    }

    #[test]
    fn test_review_requests_use_fixed_temperature() {
        for _ in 0..3 {
            let eval = evaluation_request("m", "git", "How do you list branches?", "git branch");
            let explain = explanation_request("m", "git", "git branch -a");
            for request in [eval, explain] {
                assert_eq!(request.temperature, REVIEW_TEMPERATURE);
                assert_eq!(request.top_p, None);
                assert_eq!(request.frequency_penalty, None);
                assert_eq!(request.presence_penalty, None);
                assert_eq!(request.messages.len(), 1);
            }
        }
    }

    #[test]
    fn test_evaluation_prompt_contents() {
        let request = evaluation_request("m", "git", "How do you list branches?", "git branch");
        let prompt = &request.messages[0].content;
        assert!(prompt.contains("Question about git: \"How do you list branches?\""));
        assert!(prompt.contains("User's answer: \"git branch\""));
        assert!(prompt.contains("CORRECT or INCORRECT"));
        assert!(prompt.contains("tip for remembering"));
    }

    #[test]
    fn test_fixed_request_omits_optional_fields_on_the_wire() {
        let request = explanation_request("m", "tar", "tar -xzf a.tgz");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.3);
        assert!(json.get("top_p").is_none());
        assert!(json.get("presence_penalty").is_none());
        assert!(json["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("tar -xzf a.tgz"));
    }
}
