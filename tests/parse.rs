use dashboard_ingest::{parse, Dataset};

fn keys(ds: &Dataset) -> Vec<Vec<String>> {
    ds.rows()
        .iter()
        .map(|r| r.keys().map(str::to_string).collect())
        .collect()
}

#[test]
fn every_row_carries_the_header_key_set() {
    let ds = parse("Aspek,n,mean,sd\nOrder,2381,15.96,3.48\nChange,2381,15.11,3.18\nEndurance,2381\n");
    assert_eq!(ds.len(), 3);
    for row_keys in keys(&ds) {
        assert_eq!(row_keys, ds.headers());
    }
}

#[test]
fn blank_lines_are_not_rows() {
    let ds = parse("a,b\n\n1,2\n");
    assert_eq!(ds.len(), 1);
    assert_eq!(ds.rows()[0].get("a"), Some("1"));
    assert_eq!(ds.rows()[0].get("b"), Some("2"));

    let ds = parse("\n\na,b\n   \n1,2\n\t\n3,4\n\n");
    assert_eq!(ds.len(), 2);
}

#[test]
fn wrapping_quotes_are_stripped() {
    let ds = parse("\"x\",\"y\"\n\"1\",\"2\"");
    assert_eq!(ds.headers(), &["x".to_string(), "y".to_string()]);
    assert_eq!(ds.rows()[0].get("x"), Some("1"));
    assert_eq!(ds.rows()[0].get("y"), Some("2"));
}

#[test]
fn short_rows_leave_trailing_cells_absent() {
    let ds = parse("a,b,c\n1,2");
    assert_eq!(ds.len(), 1);
    let row = &ds.rows()[0];
    assert_eq!(row.get("a"), Some("1"));
    assert_eq!(row.get("b"), Some("2"));
    assert_eq!(row.get("c"), None);
    assert_eq!(row.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
}

#[test]
fn long_rows_drop_extra_fields() {
    let ds = parse("a,b\n1,2,3,4");
    assert_eq!(ds.rows()[0].cells().len(), 2);
    assert_eq!(ds.rows()[0].get("b"), Some("2"));
}

#[test]
fn cells_are_trimmed_but_never_coerced() {
    let ds = parse("Aspek , Omega\n  Order ,  0.847000 \n");
    let row = &ds.rows()[0];
    assert_eq!(row.get("Aspek"), Some("Order"));
    assert_eq!(row.get("Omega"), Some("0.847000"));
}

#[test]
fn quoted_commas_are_a_known_limitation() {
    // the quoted field is split like any other
    let ds = parse("label,value\n\"Laki-laki, dewasa\",10\n");
    let row = &ds.rows()[0];
    assert_eq!(row.get("label"), Some("Laki-laki"));
    assert_eq!(row.get("value"), Some("dewasa"));
}

#[test]
fn row_iteration_preserves_column_order() {
    let ds = parse("Kategori,Frekuensi,Persentase.Freq\nPerempuan,1136,47.7\n");
    let pairs: Vec<_> = ds.rows()[0].iter().collect();
    assert_eq!(
        pairs,
        [
            ("Kategori", Some("Perempuan")),
            ("Frekuensi", Some("1136")),
            ("Persentase.Freq", Some("47.7")),
        ]
    );
}
