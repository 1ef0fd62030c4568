//! The three operator-selectable settings and the "active dimension"
//! pointer that decides which one the value hotkey advances.

pub const LANGUAGE_OPTIONS: &[&str] = &["python", "c++", "java", "mysql", "javascript", "reasoning"];
pub const PROBLEM_TYPE_OPTIONS: &[&str] = &["dsa", "aptitude"];
pub const PROVIDER_OPTIONS: &[&str] = &["gemini", "chatgpt"];

/// Which dimension the value hotkey currently acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Language,
    ProblemType,
    Provider,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Language, Dimension::ProblemType, Dimension::Provider];

    pub const fn next(self) -> Self {
        match self {
            Dimension::Language => Dimension::ProblemType,
            Dimension::ProblemType => Dimension::Provider,
            Dimension::Provider => Dimension::Language,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Dimension::Language => "Language",
            Dimension::ProblemType => "Type",
            Dimension::Provider => "AI",
        }
    }
}

/// A fixed option list and the index of the current choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDimension {
    options: Vec<String>,
    index: usize,
}

impl SelectionDimension {
    /// Creates a dimension; an out-of-range `initial` wraps into range.
    ///
    /// # Panics
    /// Panics if `options` is empty. Option lists are fixed at setup.
    pub fn new(options: &[&str], initial: usize) -> Self {
        assert!(!options.is_empty(), "selection dimension needs at least one option");
        Self {
            options: options.iter().map(|s| s.to_string()).collect(),
            index: initial % options.len(),
        }
    }

    pub fn current(&self) -> &str {
        &self.options[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.options.len();
    }

    /// Selects the option equal to `value` (case-insensitive). Returns
    /// whether it was found.
    pub fn select(&mut self, value: &str) -> bool {
        match self.options.iter().position(|o| o.eq_ignore_ascii_case(value)) {
            Some(idx) => {
                self.index = idx;
                true
            }
            None => false,
        }
    }
}

/// One row of the selection display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRow {
    pub dimension: Dimension,
    pub text: String,
    /// Exactly one row is highlighted: the active dimension.
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    language: SelectionDimension,
    problem_type: SelectionDimension,
    provider: SelectionDimension,
    active: Dimension,
}

impl Default for SelectionState {
    /// `c++`, `dsa`, `gemini`, with the language row active.
    fn default() -> Self {
        Self {
            language: SelectionDimension::new(LANGUAGE_OPTIONS, 1),
            problem_type: SelectionDimension::new(PROBLEM_TYPE_OPTIONS, 0),
            provider: SelectionDimension::new(PROVIDER_OPTIONS, 0),
            active: Dimension::Language,
        }
    }
}

impl SelectionState {
    pub fn active(&self) -> Dimension {
        self.active
    }

    pub fn advance_dimension(&mut self) {
        self.active = self.active.next();
    }

    pub fn advance_value(&mut self) {
        self.dimension_mut(self.active).advance();
    }

    pub fn dimension(&self, dimension: Dimension) -> &SelectionDimension {
        match dimension {
            Dimension::Language => &self.language,
            Dimension::ProblemType => &self.problem_type,
            Dimension::Provider => &self.provider,
        }
    }

    pub fn dimension_mut(&mut self, dimension: Dimension) -> &mut SelectionDimension {
        match dimension {
            Dimension::Language => &mut self.language,
            Dimension::ProblemType => &mut self.problem_type,
            Dimension::Provider => &mut self.provider,
        }
    }

    pub fn language(&self) -> &str {
        self.language.current()
    }

    pub fn problem_type(&self) -> &str {
        self.problem_type.current()
    }

    pub fn provider(&self) -> &str {
        self.provider.current()
    }

    pub fn rows(&self) -> Vec<SelectionRow> {
        Dimension::ALL
            .iter()
            .map(|&dimension| SelectionRow {
                dimension,
                text: format!("{}: {}", dimension.label(), self.dimension(dimension).current()),
                active: dimension == self.active,
            })
            .collect()
    }
}
