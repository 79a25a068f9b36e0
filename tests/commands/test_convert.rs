//! Tests for the convert command

use archive_qa::commands::convert_run;
use archive_qa::graph::LocalGraph;

const HEADER: &str = "dc.title[es_ES]\tdc.contributor.author\tdc.date.issued\tdc.description[es_ES]\tdc.language.iso[es_ES]\tdc.publisher\tdc.subject[es_ES]";

#[test]
fn test_convert_latin1_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("datos.tab");
    let output = dir.path().join("dataset.ttl");

    // "Perú" and "Fotografía" written as Latin-1 bytes
    let mut bytes = format!("{HEADER}\n").into_bytes();
    bytes.extend_from_slice(b"Per\xfa antiguo\tCourret\t1906\t\tspa\t\tFotograf\xeda\n");
    bytes.extend_from_slice(b"Fila rota\t1906\n");
    std::fs::write(&input, bytes).unwrap();

    let stats = convert_run(&input, &output).unwrap();
    assert_eq!(stats.rows_read, 2);
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.skipped_rows, 1);

    let turtle = std::fs::read_to_string(&output).unwrap();
    assert!(turtle.contains("Perú antiguo"));
    assert!(turtle.contains("Per%C3%BA_antiguo"));

    let graph = LocalGraph::open_turtle(&output).unwrap();
    assert_eq!(graph.len(), 6);
}

#[test]
fn test_convert_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("vacio.tab");
    let output = dir.path().join("vacio.ttl");
    std::fs::write(&input, HEADER).unwrap();

    let stats = convert_run(&input, &output).unwrap();
    assert_eq!(stats.documents, 0);
    assert!(output.exists());
}
