use crate::{
    bind::{self, BindRules},
    config::Config,
    curate,
    parse::{self, ParseRules},
    pdf,
    util::{ensure_dir, now_rfc3339, sha256_file, sibling_images_dir},
};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct Pipeline {
    cfg: Config,
}

#[derive(Debug, Serialize)]
pub struct ExtractSummary {
    pub input: String,
    pub output: String,
    pub images_dir: String,
    pub sections: usize,
    pub questions: usize,
    pub images_extracted: usize,
    pub images_deleted: usize,
    pub images_assigned: usize,
    pub started: String,
    pub finished: String,
}

impl Pipeline {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Full extraction run: pages → curated images → parsed tree → bound
    /// images → JSON on disk. Every stage consumes the previous stage's
    /// complete output; nothing streams.
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<ExtractSummary> {
        let started = now_rfc3339();
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("json"));

        let source_file = input
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("input has no usable file name: {}", input.display()))?
            .to_string();

        let images_dir = sibling_images_dir(input);
        ensure_dir(&images_dir)?;

        info!("input={} sha256={}", input.display(), sha256_file(input)?);

        let extraction = pdf::extract_document(input, &images_dir)?;
        let images_extracted = extraction.images.len();
        info!(
            "extracted {} pages, {} images",
            extraction.pages.len(),
            images_extracted
        );

        let curated = curate::curate(&self.cfg, &images_dir, extraction.images)?;
        if curated.deleted > 0 {
            info!("deleted {} artifact images", curated.deleted);
        }

        let rules = ParseRules::from_config(&self.cfg);
        let lines = parse::page_lines(&extraction.pages);
        let mut doc = parse::parse_lines(&rules, &source_file, &lines);
        info!(
            "parsed {} sections, {} questions",
            doc.sections.len(),
            doc.question_count()
        );

        let bind_rules = BindRules::from_config(&self.cfg);
        let dir_name = images_dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("images")
            .to_string();
        bind::assign_images(&bind_rules, &mut doc, &curated.by_page, &dir_name);

        let images_assigned = count_assigned(&doc);

        let json = if self.cfg.output.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        std::fs::write(&output, json + "\n")
            .with_context(|| format!("writing {}", output.display()))?;
        info!("wrote {}", output.display());

        Ok(ExtractSummary {
            input: input.display().to_string(),
            output: output.display().to_string(),
            images_dir: images_dir.display().to_string(),
            sections: doc.sections.len(),
            questions: doc.question_count(),
            images_extracted,
            images_deleted: curated.deleted,
            images_assigned,
            started,
            finished: now_rfc3339(),
        })
    }
}

fn count_assigned(doc: &crate::model::QuizDocument) -> usize {
    doc.sections
        .iter()
        .flat_map(|s| &s.questions)
        .map(|q| {
            usize::from(q.image.is_some())
                + q.options.iter().filter(|o| o.image.is_some()).count()
        })
        .sum()
}
