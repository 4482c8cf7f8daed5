use obcanka::config::Config;
use obcanka::model::{Choice, Question, QuizDocument, Section};
use obcanka::validate::{Status, validate};
use std::fs;
use tempfile::TempDir;

fn doc_referencing(images: &[&str]) -> QuizDocument {
    let mut doc = QuizDocument::new("banka.pdf");
    let mut section = Section::new(1, "SEKCE");
    for (i, image) in images.iter().enumerate() {
        let mut q = Question::new(i as u32 + 1, "Co je na obrázku?", 0);
        q.options.push(Choice::new("A", "možnost"));
        q.image = Some(format!("banka_images/{image}"));
        section.questions.push(q);
    }
    doc.sections.push(section);
    doc
}

fn write_setup(dir: &TempDir, doc: &QuizDocument, disk_images: &[&str]) -> std::path::PathBuf {
    let json_path = dir.path().join("banka.json");
    fs::write(&json_path, serde_json::to_string_pretty(doc).unwrap()).unwrap();

    let images_dir = dir.path().join("banka_images");
    fs::create_dir(&images_dir).unwrap();
    for name in disk_images {
        fs::write(images_dir.join(name), b"image-bytes").unwrap();
    }
    json_path
}

#[test]
fn clean_run_reports_ok() {
    let dir = TempDir::new().unwrap();
    let doc = doc_referencing(&["page01_img01.png"]);
    let json_path = write_setup(&dir, &doc, &["page01_img01.png", "page01_img02.png"]);

    let report = validate(&Config::default(), &json_path, None).expect("validate");

    assert_eq!(report.status, Status::Ok);
    assert_eq!(report.images_referenced, 1);
    assert_eq!(report.images_on_disk, 2);
    assert_eq!(report.orphaned, vec!["page01_img02.png"]);
    assert!(report.missing.is_empty());
    assert_eq!(report.questions_with_images.len(), 1);
}

#[test]
fn missing_reference_is_failure() {
    let dir = TempDir::new().unwrap();
    let doc = doc_referencing(&["page01_img01.png", "page09_img01.png"]);
    let json_path = write_setup(&dir, &doc, &["page01_img01.png"]);

    let report = validate(&Config::default(), &json_path, None).expect("validate");

    assert_eq!(report.status, Status::Failed);
    assert_eq!(report.missing, vec!["page09_img01.png"]);
}

#[test]
fn excess_orphans_is_warning_only() {
    let dir = TempDir::new().unwrap();
    let doc = doc_referencing(&["page01_img01.png"]);
    let orphans: Vec<String> = (2..9).map(|i| format!("page01_img{i:02}.png")).collect();
    let mut disk: Vec<&str> = vec!["page01_img01.png"];
    disk.extend(orphans.iter().map(String::as_str));
    let json_path = write_setup(&dir, &doc, &disk);

    let report = validate(&Config::default(), &json_path, None).expect("validate");

    assert_eq!(report.status, Status::Warning);
    assert_eq!(report.orphaned.len(), 7);
    assert!(report.missing.is_empty());
}

#[test]
fn option_images_count_as_references() {
    let dir = TempDir::new().unwrap();
    let mut doc = QuizDocument::new("banka.pdf");
    let mut section = Section::new(1, "SEKCE");
    let mut q = Question::new(1, "Co je na obrázku?", 0);
    for (label, image) in [("A", "page02_img01.png"), ("B", "page02_img02.png")] {
        let mut opt = Choice::new(label, "možnost");
        opt.image = Some(format!("banka_images/{image}"));
        q.options.push(opt);
    }
    section.questions.push(q);
    doc.sections.push(section);

    let json_path = write_setup(&dir, &doc, &["page02_img01.png", "page02_img02.png"]);
    let report = validate(&Config::default(), &json_path, None).expect("validate");

    assert_eq!(report.status, Status::Ok);
    assert_eq!(report.images_referenced, 2);
    let labels = &report.questions_with_images[0].option_labels;
    assert_eq!(labels, &["A", "B"]);
}
