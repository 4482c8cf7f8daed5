use serde::{Deserialize, Serialize};

/// One labeled answer choice under a question.
///
/// Named `Choice` rather than `Option` to stay out of the prelude's way;
/// the serialized field set matches the quiz JSON schema exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<Choice>,
    /// One of the option labels, or empty while unresolved.
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// First page the question text appeared on. Internal to the image
    /// binder; never part of the JSON output.
    #[serde(skip)]
    pub page: u32,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>, page: u32) -> Self {
        Self {
            id,
            text: text.into(),
            options: Vec::new(),
            correct: String::new(),
            image: None,
            date: None,
            page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: u32,
    pub name: String,
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub source_file: String,
    pub sections: Vec<Section>,
}

impl QuizDocument {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            sections: Vec::new(),
        }
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}
