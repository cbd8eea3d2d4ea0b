use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const NO_THINK_PREFIX: &str = "/no_think \n\n";

const ONE_SHOT_EXAMPLES: &str = "\
Example:
User Question: Which books were published before 1950?
SQL: SELECT title FROM books WHERE year < 1950;
";

const FEW_SHOT_EXAMPLES: &str = "\
Examples:
User Question: Which books were published before 1950?
SQL: SELECT title FROM books WHERE year < 1950;

User Question: How many books has each author written?
SQL: SELECT a.name, COUNT(b.id) AS total_books FROM authors a JOIN books b ON b.author_id = a.id GROUP BY a.id, a.name;

User Question: Which members currently have a loan that has not been returned?
SQL: SELECT DISTINCT m.name FROM members m JOIN loans l ON l.member_id = m.id WHERE l.returned_at IS NULL;
";

/// How many worked examples are embedded in the system prompt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PromptTechnique {
    #[default]
    ZeroShot,
    OneShot,
    FewShot,
}

impl PromptTechnique {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroShot => "zero-shot",
            Self::OneShot => "one-shot",
            Self::FewShot => "few-shot",
        }
    }

    #[must_use]
    pub const fn examples(self) -> &'static str {
        match self {
            Self::ZeroShot => "",
            Self::OneShot => ONE_SHOT_EXAMPLES,
            Self::FewShot => FEW_SHOT_EXAMPLES,
        }
    }
}

impl std::fmt::Display for PromptTechnique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub use_system_prompt: bool,
    pub reasoning: bool,
    pub technique: PromptTechnique,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            use_system_prompt: true,
            reasoning: true,
            technique: PromptTechnique::ZeroShot,
        }
    }
}

/// Schema, instructions and examples combined into the prompt shared by
/// every case and model of a run.
#[must_use]
pub fn build_system_prompt(schema: &str, options: &PromptOptions) -> String {
    let mut prompt = String::new();

    if !options.reasoning {
        prompt.push_str(NO_THINK_PREFIX);
    }

    if options.use_system_prompt {
        prompt.push_str(&format!(
            "You are an expert SQL developer. Given the following database schema:\n\n{schema}\n\n"
        ));
        prompt.push_str(
            "Generate a single, syntactically correct SQLite query for the user's question. \
             Your response must begin directly with 'SELECT', 'WITH', or another SQL keyword. \
             Return ONLY the SQL code, with no explanations or markdown formatting. ",
        );
    } else {
        prompt.push_str(&format!(
            "Given the following database schema:\n\n{schema}\n\n"
        ));
    }

    prompt.push_str("\n\n");
    prompt.push_str(options.technique.examples());
    prompt
}

#[must_use]
pub fn build_user_prompt(question: &str) -> String {
    format!("User Question: {question}\n\n")
}

#[cfg(test)]
mod tests {
    use super::{
        NO_THINK_PREFIX, PromptOptions, PromptTechnique, build_system_prompt, build_user_prompt,
    };

    const SCHEMA: &str = "Table: books\n  - title (TEXT)\n";

    #[test]
    fn instructional_prompt_embeds_schema_without_examples() {
        let prompt = build_system_prompt(SCHEMA, &PromptOptions::default());
        assert!(prompt.starts_with("You are an expert SQL developer."));
        assert!(prompt.contains(SCHEMA));
        assert!(prompt.contains("Return ONLY the SQL code"));
        assert!(prompt.ends_with("\n\n"));
        assert!(!prompt.contains(NO_THINK_PREFIX));
    }

    #[test]
    fn bare_prompt_for_non_reasoning_models_gets_no_think_prefix() {
        let prompt = build_system_prompt(
            SCHEMA,
            &PromptOptions {
                use_system_prompt: false,
                reasoning: false,
                technique: PromptTechnique::ZeroShot,
            },
        );
        assert_eq!(
            prompt,
            format!("{NO_THINK_PREFIX}Given the following database schema:\n\n{SCHEMA}\n\n\n\n")
        );
    }

    #[test]
    fn techniques_append_their_examples() {
        let one_shot = build_system_prompt(
            SCHEMA,
            &PromptOptions {
                technique: PromptTechnique::OneShot,
                ..PromptOptions::default()
            },
        );
        let few_shot = build_system_prompt(
            SCHEMA,
            &PromptOptions {
                technique: PromptTechnique::FewShot,
                ..PromptOptions::default()
            },
        );

        assert!(one_shot.ends_with(PromptTechnique::OneShot.examples()));
        assert_eq!(few_shot.matches("User Question:").count(), 3);
    }

    #[test]
    fn user_prompt_wraps_question() {
        assert_eq!(
            build_user_prompt("Which books?"),
            "User Question: Which books?\n\n"
        );
    }
}
