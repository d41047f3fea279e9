use tabrs::vis::{render_feature_bounds, render_feature_summary, render_table};
use tabrs::{CellValue, DataTable};

fn sample_table() -> DataTable {
    DataTable::from_rows(
        vec!["name".to_string(), "score".to_string()],
        vec![
            vec![CellValue::Text("alice".to_string()), CellValue::Int64(10)],
            vec![CellValue::Text("bob".to_string()), CellValue::Int64(20)],
        ],
    )
    .unwrap()
}

#[test]
fn test_render_table_lists_records_by_index() {
    let output = render_table(&sample_table());
    let lines: Vec<&str> = output.lines().collect();
    // ヘッダ + レコード数分の行
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("name"));
    assert!(lines[0].contains("score"));
    assert!(lines[1].starts_with('0'));
    assert!(lines[1].contains("alice"));
    assert!(lines[2].contains("20"));
}

#[test]
fn test_render_feature_bounds_lists_numeric_only() {
    let output = render_feature_bounds(&sample_table());
    // 境界が追跡されるのは数値特徴量だけ
    assert!(output.contains("score"));
    assert!(!output.contains("alice"));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_render_feature_summary_tags_kinds() {
    let output = render_feature_summary(&sample_table());
    assert!(output.contains("name: CAT"));
    assert!(output.contains("score: Numeric"));
}
