use press_engine::derive_names;

#[test]
fn trailing_segment_becomes_source_and_output_names() {
    let names = derive_names("https://x/test.pdf");
    assert_eq!(names.source, "test.pdf");
    assert_eq!(names.output, "test_converted.pdf");
}

#[test]
fn query_and_fragment_are_not_part_of_the_name() {
    let names = derive_names("https://host/docs/paper.pdf?download=1#page=2");
    assert_eq!(names.source, "paper.pdf");
    assert_eq!(names.output, "paper_converted.pdf");
}

#[test]
fn extensionless_segments_still_derive_an_output_name() {
    let names = derive_names("https://host/archive");
    assert_eq!(names.source, "archive");
    assert_eq!(names.output, "archive_converted.pdf");
}

#[test]
fn a_bare_directory_url_falls_back_to_a_default_name() {
    let names = derive_names("https://host/downloads/");
    assert_eq!(names.source, "document.pdf");
    assert_eq!(names.output, "document_converted.pdf");
}

#[test]
fn the_stem_stops_at_the_first_pdf_suffix() {
    let names = derive_names("https://host/a.pdf.pdf");
    assert_eq!(names.source, "a.pdf.pdf");
    assert_eq!(names.output, "a_converted.pdf");
}
