use crate::config::Config;
use crate::model::QuizDocument;
use crate::pdf::PageImage;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Lookup tables driving image assignment, split out of [`Config`] so tests
/// can override the keyword list and the exclusion set per case.
#[derive(Debug, Clone)]
pub struct BindRules {
    pub keywords: Vec<String>,
    /// (section id, question id) pairs that hit a keyword without actually
    /// having a figure, e.g. text pointing back at a mountain named earlier.
    pub exclude: HashSet<(u32, u32)>,
    pub grid_options: usize,
    pub short_option_max_len: usize,
}

impl BindRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            keywords: cfg.binder.keywords.clone(),
            exclude: cfg
                .binder
                .exclude
                .iter()
                .map(|pair| (pair[0], pair[1]))
                .collect(),
            grid_options: cfg.binder.grid_options,
            short_option_max_len: cfg.binder.short_option_max_len,
        }
    }
}

/// One pass over the committed tree, after parsing. Candidates are the
/// curated images on the question's own page; the following page is only
/// consulted when the question text explicitly mentions an image, so
/// unrelated adjacent figures never bleed in.
///
/// A question with exactly `grid_options` short options and at least that
/// many candidates gets the images positionally, one per option; otherwise
/// the first candidate lands on the question itself.
pub fn assign_images(
    rules: &BindRules,
    doc: &mut QuizDocument,
    by_page: &BTreeMap<u32, Vec<PageImage>>,
    images_dir_name: &str,
) {
    for section in &mut doc.sections {
        for question in &mut section.questions {
            if rules.exclude.contains(&(section.id, question.id)) {
                continue;
            }

            let lowered = question.text.to_lowercase();
            let mentions_image = rules.keywords.iter().any(|kw| lowered.contains(kw.as_str()));

            let mut candidates = page_slice(by_page, question.page);
            if candidates.is_empty() && mentions_image {
                candidates = page_slice(by_page, question.page + 1);
            }
            if candidates.is_empty() {
                continue;
            }

            let short_options = question
                .options
                .iter()
                .all(|opt| opt.text.chars().count() < rules.short_option_max_len);

            if mentions_image
                && short_options
                && question.options.len() == rules.grid_options
                && candidates.len() >= rules.grid_options
            {
                for (idx, opt) in question.options.iter_mut().enumerate() {
                    if idx < candidates.len() {
                        opt.image =
                            Some(format!("{}/{}", images_dir_name, candidates[idx].filename));
                    }
                }
                debug!(
                    "section {} question {}: grid of {} option images",
                    section.id,
                    question.id,
                    question.options.len()
                );
            } else if mentions_image {
                question.image = Some(format!("{}/{}", images_dir_name, candidates[0].filename));
                debug!(
                    "section {} question {}: question image {}",
                    section.id, question.id, candidates[0].filename
                );
            }
        }
    }
}

fn page_slice(by_page: &BTreeMap<u32, Vec<PageImage>>, page: u32) -> &[PageImage] {
    by_page.get(&page).map(Vec::as_slice).unwrap_or(&[])
}
