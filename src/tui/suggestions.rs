//! Starter prompts shown in empty states.

/// A suggestion card: what the card says, and the prompt it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub title: &'static str,
    pub text: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        title: "Compare Perspectives",
        text: "What are the pros and cons of remote work vs. office work?",
        prompt: "Compare the pros and cons of remote work versus working from an office. \
                 Provide a balanced analysis.",
    },
    Suggestion {
        title: "Creative Writing",
        text: "Write a short sci-fi story about a robot who learns to paint.",
        prompt: "Write a short science fiction story about a robot who discovers a passion \
                 for painting and what happens when it tries to express emotions.",
    },
    Suggestion {
        title: "Code Review",
        text: "Explain the difference between async tasks and OS threads.",
        prompt: "Explain the key differences between async tasks and OS threads for \
                 concurrent programs, and when to use each.",
    },
    Suggestion {
        title: "Complex Analysis",
        text: "Analyze the economic impact of renewable energy transition.",
        prompt: "Analyze the potential economic impacts of a global transition to renewable \
                 energy sources over the next 20 years.",
    },
];
