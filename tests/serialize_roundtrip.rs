use obcanka::model::{Choice, Question, QuizDocument, Section};

fn sample_doc() -> QuizDocument {
    let mut doc = QuizDocument::new("banka.pdf");

    let mut svatky = Section::new(1, "STÁTNÍ SVÁTKY");
    let mut q1 = Question::new(1, "Kdy se slaví Den české státnosti?", 0);
    q1.options.push(Choice::new("A", "28. září"));
    q1.options.push(Choice::new("B", "28. října"));
    q1.correct = "A".to_string();
    q1.date = Some("1. 1. 2025".to_string());
    svatky.questions.push(q1);

    let mut q2 = Question::new(2, "Která budova je na obrázku?", 0);
    let mut opt = Choice::new("A", "Národní divadlo");
    opt.image = Some("banka_images/page03_img01.png".to_string());
    q2.options.push(opt);
    q2.options.push(Choice::new("B", "Rudolfinum"));
    svatky.questions.push(q2);
    doc.sections.push(svatky);

    let mut hory = Section::new(2, "HORY");
    let mut q3 = Question::new(1, "Jak se jmenuje tato hora?", 0);
    q3.options.push(Choice::new("A", "Sněžka"));
    q3.image = Some("banka_images/page05_img01.png".to_string());
    hory.questions.push(q3);
    doc.sections.push(hory);

    doc
}

#[test]
fn roundtrip_is_identity() {
    let doc = sample_doc();
    let json = serde_json::to_string_pretty(&doc).expect("serialize");
    let back: QuizDocument = serde_json::from_str(&json).expect("reparse");
    assert_eq!(doc, back);
}

#[test]
fn absent_optionals_produce_no_keys() {
    let doc = sample_doc();
    let value = serde_json::to_value(&doc).expect("to_value");

    let q1 = &value["sections"][0]["questions"][0];
    assert!(q1.get("image").is_none(), "no image key when unset");
    assert_eq!(q1["date"], "1. 1. 2025");
    assert_eq!(q1["correct"], "A");

    let q2 = &value["sections"][0]["questions"][1];
    assert!(q2.get("date").is_none(), "no date key when unset");
    assert_eq!(q2["correct"], "", "correct is always present, even empty");
    assert_eq!(
        q2["options"][0]["image"],
        "banka_images/page03_img01.png"
    );
    assert!(q2["options"][1].get("image").is_none());

    let q3 = &value["sections"][1]["questions"][0];
    assert_eq!(q3["image"], "banka_images/page05_img01.png");
}

#[test]
fn page_is_internal_only() {
    let mut doc = sample_doc();
    doc.sections[0].questions[0].page = 7;

    let value = serde_json::to_value(&doc).expect("to_value");
    assert!(value["sections"][0]["questions"][0].get("page").is_none());

    let back: QuizDocument =
        serde_json::from_value(value).expect("reparse");
    assert_eq!(back.sections[0].questions[0].page, 0);
}

#[test]
fn top_level_schema_shape() {
    let value = serde_json::to_value(sample_doc()).expect("to_value");
    assert_eq!(value["source_file"], "banka.pdf");
    assert!(value["sections"].is_array());
    assert_eq!(value["sections"][0]["id"], 1);
    assert_eq!(value["sections"][0]["name"], "STÁTNÍ SVÁTKY");
}
