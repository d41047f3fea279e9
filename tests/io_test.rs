use rusqlite::Connection;
use tabrs::io::csv::read_csv_from_reader;
use tabrs::io::sql::read_sql_with;
use tabrs::io::{read_csv, read_json, write_csv, write_json};
use tabrs::{CellValue, DataTable, TabRSError};

#[test]
fn test_csv_import_classifies_cells() {
    let data = "\
name,age,score
alice,30,1.5
bob,,n/a
carol,41,2.25
";
    // 2行目のageは空白セルなので欠損値になる
    let table = read_csv_from_reader(data.as_bytes()).unwrap();
    assert_eq!(
        table.features(),
        vec!["name".to_string(), "age".to_string(), "score".to_string()]
    );
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.record(0).unwrap().get("age"),
        Some(&CellValue::Int64(30))
    );
    assert_eq!(
        table.record(0).unwrap().get("score"),
        Some(&CellValue::Float64(1.5))
    );
    assert_eq!(
        table.record(1).unwrap().get("age"),
        Some(&CellValue::Missing)
    );
    // 数値パターンに合わない値はテキスト
    assert!(table.record(1).unwrap().get("score").unwrap().is_text());
}

#[test]
fn test_csv_short_rows_are_padded() {
    let data = "a,b,c\n1,2\n";
    let table = read_csv_from_reader(data.as_bytes()).unwrap();
    assert_eq!(
        table.row(0),
        Some(
            &[
                CellValue::Int64(1),
                CellValue::Int64(2),
                CellValue::Missing
            ][..]
        )
    );
}

#[test]
fn test_csv_empty_header_is_fatal() {
    match read_csv_from_reader("".as_bytes()) {
        Err(TabRSError::Format(_)) => (),
        _ => panic!("Expected a Format error"),
    }
    match read_csv_from_reader("a,,c\n1,2,3\n".as_bytes()) {
        Err(TabRSError::Format(_)) => (),
        _ => panic!("Expected a Format error"),
    }
}

#[test]
fn test_csv_round_trip() {
    let table = DataTable::from_rows(
        vec!["name".to_string(), "score".to_string()],
        vec![
            vec![CellValue::Text("alice".to_string()), CellValue::Float64(1.5)],
            vec![CellValue::Text("bob".to_string()), CellValue::Missing],
        ],
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    write_csv(&table, &path).unwrap();

    let loaded = read_csv(&path).unwrap();
    assert_eq!(loaded.features(), table.features());
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.record(0).unwrap().get("score"),
        Some(&CellValue::Float64(1.5))
    );
    // 空セルとして書かれた欠損値は欠損値として戻る
    assert_eq!(
        loaded.record(1).unwrap().get("score"),
        Some(&CellValue::Missing)
    );
}

#[test]
fn test_json_round_trip() {
    let table = DataTable::from_rows(
        vec!["id".to_string(), "name".to_string()],
        vec![
            vec![CellValue::Int64(1), CellValue::Text("alice".to_string())],
            vec![CellValue::Int64(2), CellValue::Missing],
        ],
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.json");
    write_json(&table, &path).unwrap();

    let loaded = read_json(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.record(0).unwrap().get("id"),
        Some(&CellValue::Int64(1))
    );
    // nullは欠損値として戻る
    assert_eq!(
        loaded.record(1).unwrap().get("name"),
        Some(&CellValue::Missing)
    );
}

#[test]
fn test_read_sql_builds_table_from_query() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE retrofits (operation_cost REAL, area INTEGER, ber TEXT);
         INSERT INTO retrofits VALUES (1200.5, 140, 'B2');
         INSERT INTO retrofits VALUES (NULL, 90, 'C1');",
    )
    .unwrap();

    let table = read_sql_with(&conn, "SELECT operation_cost, area, ber FROM retrofits").unwrap();
    // クエリの列名が特徴量の並びになる
    assert_eq!(
        table.features(),
        vec![
            "operation_cost".to_string(),
            "area".to_string(),
            "ber".to_string()
        ]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.record(0).unwrap().get("operation_cost"),
        Some(&CellValue::Float64(1200.5))
    );
    // SQLのNULLは欠損値になる
    assert_eq!(
        table.record(1).unwrap().get("operation_cost"),
        Some(&CellValue::Missing)
    );
    assert_eq!(
        table.record(1).unwrap().get("ber"),
        Some(&CellValue::Text("C1".to_string()))
    );
}
