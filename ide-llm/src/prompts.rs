//! Fixed prompt templates for the editor's code assistance commands.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: String,
    pub prompt: String,
}

pub fn complete_code(code: &str, language: &str, context: Option<&str>) -> PromptTemplate {
    let context = context
        .filter(|c| !c.is_empty())
        .map(|c| format!("Context: {c}"))
        .unwrap_or_default();
    PromptTemplate {
        system: format!(
            "You are an expert {language} developer. {context}\n\
             Provide clean, well-commented code completions that follow best practices."
        ),
        prompt: code.to_string(),
    }
}

pub fn explain_code(code: &str, language: &str) -> PromptTemplate {
    PromptTemplate {
        system: format!(
            "You are an expert {language} developer.\n\
             Explain the provided code clearly and concisely, focusing on what it does and how it works."
        ),
        prompt: format!(
            "Please explain this {language} code:\n\n{}",
            fenced(code, language)
        ),
    }
}

pub fn suggest_improvements(code: &str, language: &str) -> PromptTemplate {
    PromptTemplate {
        system: format!(
            "You are an expert {language} developer and code reviewer.\n\
             Suggest specific improvements for code quality, performance, readability, and best practices."
        ),
        prompt: format!(
            "Please review and suggest improvements for this {language} code:\n\n{}",
            fenced(code, language)
        ),
    }
}

pub fn debug_code(code: &str, error: &str, language: &str) -> PromptTemplate {
    PromptTemplate {
        system: format!(
            "You are an expert {language} developer and debugger.\n\
             Help identify and fix the issue in the provided code."
        ),
        prompt: format!(
            "I'm getting this error in my {language} code:\nError: {error}\n\nCode:\n{}\n\n\
             Please help me understand and fix this issue.",
            fenced(code, language)
        ),
    }
}

fn fenced(code: &str, language: &str) -> String {
    format!("```{language}\n{code}\n```")
}
