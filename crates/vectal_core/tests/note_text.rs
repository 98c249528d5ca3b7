use vectal_core::text::{strip_markdown, word_count};
use vectal_core::{extract_highlights, generate_preview, render_to_html};

#[test]
fn preview_of_long_text_is_capped() {
    let preview = generate_preview(&"A".repeat(300), "", 200);
    assert!(preview.chars().count() <= 203);
    assert!(preview.ends_with("..."));
}

#[test]
fn preview_strips_markdown() {
    let preview = generate_preview("# Heading\n\n**Bold** text with `code`", "", 200);
    assert!(!preview.contains('#'));
    assert!(!preview.contains("**"));
    assert!(!preview.contains('`'));
    assert_eq!(preview, "Heading Bold text with code");
}

#[test]
fn preview_with_query_shows_match_context() {
    let content = format!(
        "{} with the word Python somewhere in the middle {}",
        "lead ".repeat(20),
        "tail ".repeat(40)
    );
    let preview = generate_preview(&content, "python", 200);
    assert!(preview.contains("Python"));
    assert!(preview.starts_with("..."));
    assert!(preview.ends_with("..."));
}

#[test]
fn highlights_find_the_matching_sentence() {
    let highlights = extract_highlights("First. Second with Python. Third.", "Python", 3);
    assert_eq!(highlights, vec!["Second with Python"]);
}

#[test]
fn highlights_are_case_insensitive_and_limited() {
    let highlights = extract_highlights("This contains python in lowercase.", "Python", 3);
    assert_eq!(highlights, vec!["This contains python in lowercase."]);

    let limited = extract_highlights(
        "Python here. Python there. Python everywhere. Python again.",
        "Python",
        2,
    );
    assert_eq!(limited.len(), 2);
}

#[test]
fn highlights_use_raw_text_while_preview_uses_stripped_text() {
    let content = "Intro line. See the **Rust** [guide](https://rust-lang.org) today! Bye.";
    let highlights = extract_highlights(content, "rust", 3);
    assert_eq!(
        highlights,
        vec!["See the **Rust** [guide](https://rust-lang.org) today"]
    );

    let preview = generate_preview(content, "rust", 200);
    assert!(!preview.contains("**"));
    assert!(!preview.contains('['));
    assert!(preview.contains("Rust guidehttps://rust-lang.org"));
}

#[test]
fn strip_and_count_helpers() {
    assert_eq!(strip_markdown("  ## A  [b](c)\n\n*d*  "), "A bc d");
    assert_eq!(word_count("# A b\nc"), 4);
}

#[test]
fn render_produces_html_structure() {
    let html = render_to_html("# Heading\n\nParagraph text\n\n- Item 1\n- Item 2");
    assert!(html.contains("<h1>"));
    assert!(html.contains("Paragraph text"));
    assert!(html.contains("<li>"));
}
