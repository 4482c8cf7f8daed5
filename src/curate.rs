use crate::config::Config;
use crate::pdf::PageImage;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Curated {
    pub deleted: usize,
    pub by_page: BTreeMap<u32, Vec<PageImage>>,
}

/// Drop scan artifacts (files under the minimum byte size) and regroup the
/// survivors per page in reading order: top-edge y bucketed to the nearest
/// row band, then left edge x. Row-major order is what maps a 2x2 picture
/// grid onto options A through D.
pub fn curate(cfg: &Config, images_dir: &Path, images: Vec<PageImage>) -> Result<Curated> {
    let min_bytes = cfg.extraction.min_image_bytes;
    let mut deleted = 0usize;
    let mut kept = Vec::with_capacity(images.len());

    for img in images {
        let path = images_dir.join(&img.filename);
        let size = match std::fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!("missing extracted image {}: {err}", path.display());
                continue;
            }
        };
        if size < min_bytes {
            std::fs::remove_file(&path)
                .with_context(|| format!("deleting artifact {}", path.display()))?;
            debug!("deleted artifact {} ({size} bytes)", img.filename);
            deleted += 1;
        } else {
            kept.push(img);
        }
    }

    let mut by_page: BTreeMap<u32, Vec<PageImage>> = BTreeMap::new();
    for img in kept {
        by_page.entry(img.page).or_default().push(img);
    }

    let band = cfg.extraction.row_band;
    for page_images in by_page.values_mut() {
        page_images.sort_by(|a, b| {
            row_key(a.y, band)
                .partial_cmp(&row_key(b.y, band))
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });
    }

    Ok(Curated { deleted, by_page })
}

fn row_key(y: f64, band: f64) -> f64 {
    if band <= 0.0 {
        return y;
    }
    (y / band).round() * band
}
