use crate::config::Config;
use crate::model::{Choice, Question, QuizDocument, Section};
use crate::pdf::PageContent;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Numbered lines above this value are only accepted as questions when they
/// contain a question mark; below it the number alone is enough. The
/// boundary comes straight from the source documents and is kept as-is.
pub const INLINE_NUMBER_CUTOFF: u32 = 10;

/// Section titles are uppercase Czech: letters from this alphabet plus
/// separators, digits and punctuation, with no lowercase anywhere.
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s+([A-ZÁČĎÉĚÍŇÓŘŠŤÚŮÝŽ][A-ZÁČĎÉĚÍŇÓŘŠŤÚŮÝŽ\s,0-9.]+)$").unwrap()
});
static NUMBERED_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").unwrap());
static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-D])\)\s*(.*)$").unwrap());
static OPTION_STOP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-D]\)").unwrap());
static NUMBER_STOP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());
static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static ANSWER_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)([A-D])").unwrap());

/// The tunable surface of the line classifier, split out of [`Config`] so
/// tests can build variants without a config file.
#[derive(Debug, Clone)]
pub struct ParseRules {
    pub skip_headers: Vec<String>,
    pub answer_marker: String,
    pub date_prefix: String,
    pub placeholder_section: String,
    pub inline_number_cutoff: u32,
    pub normalize_unicode: bool,
}

impl ParseRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            skip_headers: cfg.parser.skip_headers.clone(),
            answer_marker: cfg.parser.answer_marker.clone(),
            date_prefix: cfg.parser.date_prefix.clone(),
            placeholder_section: cfg.parser.placeholder_section.clone(),
            inline_number_cutoff: cfg.parser.inline_number_cutoff,
            normalize_unicode: cfg.parser.normalize_unicode,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineClass {
    /// Blank, bare page number, or fixed boilerplate header.
    Skip,
    SectionHeader { id: u32, name: String },
    AnswerKey,
    QuestionStart { id: u32, rest: String },
    OptionStart { label: String, rest: String },
    DateLine { date: String },
    Other,
}

/// Classify one trimmed line. Priority order matters: a section header and
/// an answer-key line both look like numbered lines, so they win first.
pub fn classify(rules: &ParseRules, line: &str) -> LineClass {
    if line.is_empty() || PAGE_NUMBER.is_match(line) {
        return LineClass::Skip;
    }
    if rules.skip_headers.iter().any(|h| h == line) {
        return LineClass::Skip;
    }
    if let Some(caps) = SECTION_HEADER.captures(line) {
        if let Ok(id) = caps[1].parse::<u32>() {
            return LineClass::SectionHeader {
                id,
                name: caps[2].trim().to_string(),
            };
        }
    }
    if line.contains(rules.answer_marker.as_str()) {
        return LineClass::AnswerKey;
    }
    if let Some(caps) = NUMBERED_LINE.captures(line) {
        if let Ok(id) = caps[1].parse::<u32>() {
            let accept =
                !is_all_uppercase(line) && (id <= rules.inline_number_cutoff || line.contains('?'));
            if accept {
                return LineClass::QuestionStart {
                    id,
                    rest: caps[2].to_string(),
                };
            }
        }
    }
    if let Some(caps) = OPTION_LINE.captures(line) {
        return LineClass::OptionStart {
            label: caps[1].to_string(),
            rest: caps[2].to_string(),
        };
    }
    if let Some(rest) = line.strip_prefix(rules.date_prefix.as_str()) {
        let date = rest.trim();
        if !date.is_empty() {
            return LineClass::DateLine {
                date: date.to_string(),
            };
        }
    }
    LineClass::Other
}

/// True when the line has at least one cased character and none of them is
/// lowercase. Numbered sub-items inside a section title block are all caps;
/// genuine questions never are.
fn is_all_uppercase(s: &str) -> bool {
    let mut has_cased = false;
    for ch in s.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Collapse whitespace runs and trim; NFC-normalize first when configured,
/// since extracted Czech text often arrives with decomposed diacritics.
pub fn clean_text(rules: &ParseRules, s: &str) -> String {
    let normalized;
    let s = if rules.normalize_unicode {
        normalized = s.nfc().collect::<String>();
        normalized.as_str()
    } else {
        s
    };
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull every `<digits><letter>` token out of an answer-key line. Later
/// tokens for the same question id win.
pub fn parse_answer_key(line: &str) -> HashMap<u32, String> {
    let mut answers = HashMap::new();
    for caps in ANSWER_TOKEN.captures_iter(line) {
        if let Ok(id) = caps[1].parse::<u32>() {
            answers.insert(id, caps[2].to_string());
        }
    }
    answers
}

/// Flatten per-page text into (line, page) pairs, preserving page order and
/// intra-page line order.
pub fn page_lines(pages: &[PageContent]) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    for page in pages {
        for line in page.text.lines() {
            out.push((line.to_string(), page.number));
        }
    }
    out
}

/// Parser state: the document under construction plus the open section, the
/// open question, and the answer letters pending for the current section.
/// All commits funnel through `finalize_question`/`finalize_section` so
/// every transition point behaves identically.
#[derive(Debug)]
pub struct ParseState {
    document: QuizDocument,
    section: Option<Section>,
    question: Option<Question>,
    answers: HashMap<u32, String>,
}

impl ParseState {
    pub fn new(source_file: &str) -> Self {
        Self {
            document: QuizDocument::new(source_file),
            section: None,
            question: None,
            answers: HashMap::new(),
        }
    }

    /// Commit the open question to the open section. A question without a
    /// single option is incomplete layout noise and is dropped.
    fn finalize_question(&mut self) {
        if let Some(q) = self.question.take() {
            if q.options.is_empty() {
                return;
            }
            if let Some(section) = self.section.as_mut() {
                section.questions.push(q);
            }
        }
    }

    /// Commit the open section: apply pending answer letters by question id,
    /// append the section unless it is empty, reset the answer map.
    fn finalize_section(&mut self) {
        self.finalize_question();
        if let Some(mut section) = self.section.take() {
            if !section.questions.is_empty() {
                for q in &mut section.questions {
                    if let Some(letter) = self.answers.get(&q.id) {
                        q.correct = letter.clone();
                    }
                }
                self.document.sections.push(section);
            }
        }
        self.answers.clear();
    }

    fn start_section(&mut self, id: u32, name: String) {
        self.finalize_section();
        self.section = Some(Section::new(id, name));
    }

    fn ensure_section(&mut self, placeholder: &str) {
        if self.section.is_none() {
            self.section = Some(Section::new(0, placeholder));
        }
    }

    fn absorb_answer_key(&mut self, line: &str) {
        self.finalize_question();
        self.answers.extend(parse_answer_key(line));
    }

    fn start_question(&mut self, id: u32, text: String, page: u32) {
        self.finalize_question();
        self.question = Some(Question::new(id, text, page));
    }

    fn has_open_question(&self) -> bool {
        self.question.is_some()
    }

    fn push_option(&mut self, label: String, text: String) {
        if let Some(q) = self.question.as_mut() {
            q.options.push(Choice::new(label, text));
        }
    }

    fn set_date(&mut self, date: String) {
        if let Some(q) = self.question.as_mut() {
            q.date = Some(date);
        }
    }

    fn finish(mut self) -> QuizDocument {
        self.finalize_section();
        self.document
    }
}

/// Single linear scan over the tagged line stream. Question and option
/// bodies are collected greedily across continuation lines; answer keys
/// apply retroactively when their section closes.
pub fn parse_lines(rules: &ParseRules, source_file: &str, lines: &[(String, u32)]) -> QuizDocument {
    let mut state = ParseState::new(source_file);
    let mut i = 0;

    while i < lines.len() {
        let (raw, page) = &lines[i];
        let line = raw.trim();

        match classify(rules, line) {
            LineClass::Skip | LineClass::Other => i += 1,
            LineClass::SectionHeader { id, name } => {
                state.start_section(id, name);
                i += 1;
            }
            LineClass::AnswerKey => {
                state.absorb_answer_key(line);
                i += 1;
            }
            LineClass::QuestionStart { id, rest } => {
                state.ensure_section(&rules.placeholder_section);
                let (text, next) = collect_block(rules, lines, i + 1, rest);
                state.start_question(id, clean_text(rules, &text), *page);
                i = next;
            }
            LineClass::OptionStart { label, rest } => {
                if state.has_open_question() {
                    let (text, next) = collect_block(rules, lines, i + 1, rest);
                    state.push_option(label, clean_text(rules, &text));
                    i = next;
                } else {
                    i += 1;
                }
            }
            LineClass::DateLine { date } => {
                if state.has_open_question() {
                    state.set_date(date);
                }
                i += 1;
            }
        }
    }

    state.finish()
}

/// Append continuation lines to a question or option body until something
/// else starts: an option marker, a date line, a fresh numbered line, an
/// answer key, or a blank.
fn collect_block(
    rules: &ParseRules,
    lines: &[(String, u32)],
    mut j: usize,
    seed: String,
) -> (String, usize) {
    let mut text = seed;
    while j < lines.len() {
        let next = lines[j].0.trim();
        if stops_block(rules, next) {
            break;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(next);
        j += 1;
    }
    (text, j)
}

fn stops_block(rules: &ParseRules, line: &str) -> bool {
    line.is_empty()
        || OPTION_STOP.is_match(line)
        || line.starts_with(rules.date_prefix.as_str())
        || NUMBER_STOP.is_match(line)
        || line.contains(rules.answer_marker.as_str())
}
