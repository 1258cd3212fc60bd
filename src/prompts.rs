/// Example symptom descriptions offered on the welcome screen and via `/example N`.
pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "I have a headache and fever",
    "I'm experiencing chest pain",
    "I have a persistent cough",
    "I feel dizzy and nauseous",
];

/// Shown at the top of every new chat. Display only: it is never part of the
/// conversation log, so it is never sent back as history.
pub const GREETING: &str = r#"Hello! I'm your AI Medical Assistant. 👋

I'm here to help you understand your symptoms and provide general health guidance. Please describe what you're experiencing, and I'll do my best to assist you.

**Remember:** This is for informational purposes only. Always consult a healthcare professional for medical advice."#;

pub const DISCLAIMER: &str =
    "This is an AI assistant for informational purposes only. Always consult a healthcare professional for medical advice.";

pub const COMPOSER_PLACEHOLDER: &str = "Describe your symptoms...";

pub const RESET_CONFIRMATION: &str =
    "Start a new consultation? Your current conversation will be cleared. Type /new again to confirm.";

/// Look up an example prompt by its 1-based position.
pub fn example_prompt(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|index| EXAMPLE_PROMPTS.get(index).copied())
}

/// Error text for a non-2xx chat answer.
pub fn server_error(detail: Option<&str>) -> String {
    format!("Server error: {}", detail.unwrap_or("Unknown error"))
}

/// Error text for when no answer was reachable at all.
pub fn unreachable_guidance(backend_location: &str) -> String {
    format!(
        "Sorry, I encountered an error. Please make sure the backend server is running on {}",
        backend_location
    )
}
