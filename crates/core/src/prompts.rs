//! Prompt templates, selected by problem type.

const DSA_TEMPLATE: &str = include_str!("prompts/dsa.txt");
const APTITUDE_TEMPLATE: &str = include_str!("prompts/aptitude.txt");

const PROBLEM_PLACEHOLDER: &str = "{problem}";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemType {
    #[default]
    Dsa,
    Aptitude,
}

impl ProblemType {
    /// Case-insensitive; anything unrecognised is `Dsa`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("aptitude") {
            ProblemType::Aptitude
        } else {
            ProblemType::Dsa
        }
    }

    fn template(self) -> &'static str {
        match self {
            ProblemType::Dsa => DSA_TEMPLATE,
            ProblemType::Aptitude => APTITUDE_TEMPLATE,
        }
    }
}

/// Fills the template for `problem_type` with `corpus` and, for coding
/// problems, `language`.
///
/// The language goes in first so that placeholder-like text inside the
/// corpus is left verbatim.
pub fn build_prompt(problem_type: &str, language: &str, corpus: &str) -> String {
    let kind = ProblemType::parse(problem_type);
    let template = match kind {
        ProblemType::Dsa => kind.template().replace(LANGUAGE_PLACEHOLDER, language),
        ProblemType::Aptitude => kind.template().to_string(),
    };
    template.replacen(PROBLEM_PLACEHOLDER, corpus, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dsa_substitutes_language_everywhere() {
        let prompt = build_prompt("dsa", "c++", "X");
        assert!(prompt.contains("PROBLEM:\nX\n"));
        assert!(!prompt.contains(LANGUAGE_PLACEHOLDER));
        assert!(!prompt.contains(PROBLEM_PLACEHOLDER));
        assert_eq!(
            prompt.matches("c++").count(),
            DSA_TEMPLATE.matches(LANGUAGE_PLACEHOLDER).count()
        );
        assert!(DSA_TEMPLATE.matches(LANGUAGE_PLACEHOLDER).count() > 1);
    }

    #[test]
    fn aptitude_never_substitutes_language() {
        let prompt = build_prompt("Aptitude", "c++", "X");
        assert!(prompt.contains("PROBLEM:\nX\n"));
        assert!(!prompt.contains("c++"));
        assert_eq!(prompt, APTITUDE_TEMPLATE.replace(PROBLEM_PLACEHOLDER, "X"));
    }

    #[test]
    fn aptitude_asks_for_option_matching() {
        let prompt = build_prompt("aptitude", "python", "Which is larger? (a) 2 (b) 3");
        assert!(prompt.contains("**1. PROBLEM ANALYSIS & OPTIONS DETECTION:**"));
        assert!(prompt.contains("**3. OPTION MATCHING & VERIFICATION:**"));
        assert!(prompt.contains("DISCREPANCY DETECTED"));
        assert!(prompt.contains("**Recommended Choice:**"));
    }

    #[test]
    fn dsa_asks_for_data_structure_analysis() {
        let prompt = build_prompt("dsa", "java", "X");
        assert!(prompt.contains("**3. OPTIMIZED SOLUTION (java):**"));
        assert!(prompt.contains("```java"));
        assert!(prompt.contains("**6. DATA STRUCTURE DEEP DIVE ANALYSIS:**"));
        assert!(prompt.contains("**DATA STRUCTURE SUMMARY TABLE:**"));
    }

    #[test]
    fn problem_type_is_case_insensitive_with_dsa_fallback() {
        assert_eq!(ProblemType::parse("APTITUDE"), ProblemType::Aptitude);
        assert_eq!(ProblemType::parse("DSA"), ProblemType::Dsa);
        assert_eq!(ProblemType::parse("system design"), ProblemType::Dsa);
        assert_eq!(build_prompt("unknown", "java", "X"), build_prompt("dsa", "java", "X"));
    }

    #[test]
    fn corpus_is_inserted_verbatim() {
        let corpus = "\n--- Screenshot 1 ---\nprint {language} and {problem}\n";
        let prompt = build_prompt("dsa", "python", corpus);
        assert!(prompt.contains(corpus));
    }
}
