/// First question sent once an analyzer is ready; its answer opens the chat.
pub const WELCOME_PROMPT: &str = "Give me a short overview of this repository: what it does, \
which languages and frameworks it uses, and how the code is organized. \
Finish by suggesting a few questions I could ask about it.";

pub const ANALYSIS_ERROR: &str =
    "I encountered an error analyzing that repository. Please check the URL and try again.";

pub const QUESTION_ERROR: &str =
    "I encountered an error processing your question. Please try asking in a different way.";

/// What `fetch_answer` returns when the question could not be answered.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't get an answer from the analyzer in time. Please try again.";
