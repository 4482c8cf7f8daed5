use crate::config::Config;
use crate::model::QuizDocument;
use crate::util::sibling_images_dir;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    /// More orphaned images than the expected handful of cover pages and
    /// decorative headers.
    Warning,
    /// At least one referenced image is missing from disk.
    Failed,
}

#[derive(Debug, Serialize)]
pub struct QuestionImages {
    pub section: u32,
    pub question: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub option_labels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub json_file: String,
    pub images_dir: String,
    pub images_on_disk: usize,
    pub images_referenced: usize,
    pub orphaned: Vec<String>,
    pub missing: Vec<String>,
    pub questions_with_images: Vec<QuestionImages>,
    pub status: Status,
}

/// Set-difference check between the filenames the JSON references and the
/// files actually extracted. Missing files are always an error; a few
/// orphans are normal.
pub fn validate(
    cfg: &Config,
    json_path: &Path,
    images_dir: Option<&Path>,
) -> Result<ValidationReport> {
    let images_dir = images_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_images_dir(json_path));

    let raw = std::fs::read_to_string(json_path)
        .with_context(|| format!("reading {}", json_path.display()))?;
    let doc: QuizDocument =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", json_path.display()))?;

    let mut on_disk = BTreeSet::new();
    let entries = std::fs::read_dir(&images_dir)
        .with_context(|| format!("reading {}", images_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            on_disk.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }

    let referenced = referenced_images(&doc);

    let orphaned: Vec<String> = on_disk.difference(&referenced).cloned().collect();
    let missing: Vec<String> = referenced.difference(&on_disk).cloned().collect();

    let status = if !missing.is_empty() {
        Status::Failed
    } else if orphaned.len() > cfg.validation.expected_orphans {
        Status::Warning
    } else {
        Status::Ok
    };

    Ok(ValidationReport {
        json_file: json_path.display().to_string(),
        images_dir: images_dir.display().to_string(),
        images_on_disk: on_disk.len(),
        images_referenced: referenced.len(),
        orphaned,
        missing,
        questions_with_images: questions_with_images(&doc),
        status,
    })
}

/// Every image filename the document references, directory prefixes
/// stripped so the comparison is by bare filename.
pub fn referenced_images(doc: &QuizDocument) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for section in &doc.sections {
        for question in &section.questions {
            if let Some(img) = &question.image {
                out.insert(basename(img));
            }
            for opt in &question.options {
                if let Some(img) = &opt.image {
                    out.insert(basename(img));
                }
            }
        }
    }
    out
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn questions_with_images(doc: &QuizDocument) -> Vec<QuestionImages> {
    let mut out = Vec::new();
    for section in &doc.sections {
        for question in &section.questions {
            let option_labels: Vec<String> = question
                .options
                .iter()
                .filter(|o| o.image.is_some())
                .map(|o| o.label.clone())
                .collect();
            if question.image.is_some() || !option_labels.is_empty() {
                out.push(QuestionImages {
                    section: section.id,
                    question: question.id,
                    image: question.image.as_deref().map(basename),
                    option_labels,
                });
            }
        }
    }
    out
}
