use std::cmp::Ordering;
use std::collections::HashSet;

use tabrs::{CellValue, DataTable, TabRSError};

fn table_of(feature: &str, values: &[i64]) -> DataTable {
    DataTable::from_rows(
        vec![feature.to_string()],
        values.iter().map(|&v| vec![CellValue::Int64(v)]).collect(),
    )
    .unwrap()
}

#[test]
fn test_join_merges_by_row_position() {
    // self = [[1],[2]] (a)、other = [[10],[20]] (b)
    // join後 self = [[1,10],[2,20]]、features == [a,b]
    let mut table = table_of("a", &[1, 2]);
    let other = table_of("b", &[10, 20]);
    table.join(&other).unwrap();

    assert_eq!(table.features(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(
        table.row(0),
        Some(&[CellValue::Int64(1), CellValue::Int64(10)][..])
    );
    assert_eq!(
        table.row(1),
        Some(&[CellValue::Int64(2), CellValue::Int64(20)][..])
    );
    // 結合後はフルスキャンで境界が再計算されている
    let bounds = table.feature_bounds("b").unwrap();
    assert_eq!(bounds.min, 10.0);
    assert_eq!(bounds.max, 20.0);
}

#[test]
fn test_join_row_count_mismatch_is_checked() {
    let mut table = table_of("a", &[1, 2, 3]);
    let other = table_of("b", &[10]);
    match table.join(&other) {
        Err(TabRSError::InconsistentRowCount {
            expected: 3,
            found: 1,
        }) => (),
        _ => panic!("Expected an InconsistentRowCount error"),
    }
}

#[test]
fn test_join_by_defaults_to_zero() {
    // キー一致しないレコードの相手側フィールドは欠損ではなくゼロ
    let table = DataTable::from_rows(
        vec!["k".to_string(), "x".to_string()],
        vec![
            vec![CellValue::Text("a".to_string()), CellValue::Int64(1)],
            vec![CellValue::Text("z".to_string()), CellValue::Int64(2)],
        ],
    )
    .unwrap();
    let other = DataTable::from_rows(
        vec!["k".to_string(), "y".to_string()],
        vec![vec![CellValue::Text("a".to_string()), CellValue::Int64(100)]],
    )
    .unwrap();

    let joined = table.join_by(&other, "k").unwrap();
    // 出力の特徴量は相手側が先
    assert_eq!(
        joined.features(),
        vec!["k".to_string(), "y".to_string(), "x".to_string()]
    );
    assert_eq!(joined.len(), 2);

    let matched = joined.record(0).unwrap();
    assert_eq!(matched.get("y"), Some(&CellValue::Int64(100)));
    assert_eq!(matched.get("x"), Some(&CellValue::Int64(1)));

    let unmatched = joined.record(1).unwrap();
    assert_eq!(unmatched.get("y"), Some(&CellValue::Int64(0)));
    assert_eq!(unmatched.get("x"), Some(&CellValue::Int64(2)));
    // 入力は変更されない
    assert_eq!(table.features().len(), 2);
}

#[test]
fn test_join_by_duplicate_keys_last_write_wins() {
    let table = DataTable::from_rows(
        vec!["k".to_string()],
        vec![vec![CellValue::Int64(7)]],
    )
    .unwrap();
    let other = DataTable::from_rows(
        vec!["k".to_string(), "v".to_string()],
        vec![
            vec![CellValue::Int64(7), CellValue::Int64(1)],
            vec![CellValue::Int64(7), CellValue::Int64(2)],
        ],
    )
    .unwrap();
    let joined = table.join_by(&other, "k").unwrap();
    assert_eq!(joined.record(0).unwrap().get("v"), Some(&CellValue::Int64(2)));
}

#[test]
fn test_join_by_unknown_key_is_an_error() {
    let table = table_of("a", &[1]);
    let other = table_of("b", &[2]);
    match table.join_by(&other, "nope") {
        Err(TabRSError::InvalidFeature(_)) => (),
        _ => panic!("Expected an InvalidFeature error"),
    }
}

#[test]
fn test_group_by_first_seen_order() {
    let table = DataTable::from_rows(
        vec!["color".to_string(), "n".to_string()],
        vec![
            vec![CellValue::Text("red".to_string()), CellValue::Int64(1)],
            vec![CellValue::Text("blue".to_string()), CellValue::Int64(2)],
            vec![CellValue::Text("red".to_string()), CellValue::Int64(3)],
        ],
    )
    .unwrap();
    let groups = table.group_by("color").unwrap();

    // グループの並びはキーの初出順であってソート順ではない
    let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["red", "blue"]);
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].1.len(), 1);
    assert_eq!(
        groups[0].1.record(1).unwrap().get("n"),
        Some(&CellValue::Int64(3))
    );
}

#[test]
fn test_group_by_function() {
    let table = table_of("n", &[1, 2, 3, 4]);
    let groups = table
        .group_by_function(|record| {
            let v = record.get("n").and_then(|v| v.as_f64()).unwrap_or(0.0);
            if (v as i64) % 2 == 0 {
                "even".to_string()
            } else {
                "odd".to_string()
            }
        })
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, "odd");
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].0, "even");
    assert_eq!(groups[1].1.len(), 2);
}

#[test]
fn test_partition_round_robin() {
    let table = table_of("n", &[0, 1, 2, 3, 4]);
    let parts = table.partition(2).unwrap();
    assert_eq!(parts.len(), 2);
    // レコードiはテーブル i mod 2 に入り、相対順序は保たれる
    assert_eq!(parts[0].len(), 3);
    assert_eq!(parts[1].len(), 2);
    assert_eq!(parts[0].row(1), Some(&[CellValue::Int64(2)][..]));
    assert_eq!(parts[1].row(1), Some(&[CellValue::Int64(3)][..]));
}

#[test]
fn test_partition_zero_is_an_error() {
    let table = table_of("n", &[1]);
    assert!(table.partition(0).is_err());
}

#[test]
fn test_split_is_deterministic() {
    let table = table_of("n", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let (first, second) = table.split(0.5).unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    // 先頭分割で元の順序を保つ
    assert_eq!(first.row(0), Some(&[CellValue::Int64(0)][..]));
    assert_eq!(second.row(0), Some(&[CellValue::Int64(5)][..]));

    // 同じテーブルへの繰り返し呼び出しは同じ結果になる
    let (first2, second2) = table.split(0.5).unwrap();
    assert_eq!(first.rows(), first2.rows());
    assert_eq!(second.rows(), second2.rows());
}

#[test]
fn test_sample_membership() {
    let table = table_of("n", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let sampled = table.sample(5.0).unwrap();
    assert_eq!(sampled.len(), 5);

    // 返ってくるのは元の集合のメンバーだけ（順序は問わない）
    let universe: HashSet<String> = table.rows().iter().map(|r| r[0].to_key()).collect();
    let mut seen = HashSet::new();
    for row in sampled.rows() {
        assert!(universe.contains(&row[0].to_key()));
        // 非復元抽出なので重複しない
        assert!(seen.insert(row[0].to_key()));
    }

    // 1以下は比率として解釈される
    let half = table.sample(0.5).unwrap();
    assert_eq!(half.len(), 5);
    // 件数はレコード数で頭打ち
    let all = table.sample(100.0).unwrap();
    assert_eq!(all.len(), 10);
}

#[test]
fn test_segregate_projects_features() {
    let mut table = DataTable::from_rows(
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        vec![vec![
            CellValue::Int64(1),
            CellValue::Int64(2),
            CellValue::Int64(3),
        ]],
    )
    .unwrap();
    let slice = table.segregate(&["b", "c"], false).unwrap();
    assert_eq!(slice.features(), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(
        slice.row(0),
        Some(&[CellValue::Int64(2), CellValue::Int64(3)][..])
    );
    assert_eq!(table.features().len(), 3);

    // divide付きなら元のテーブルから取り除かれる
    let slice = table.segregate(&["c"], true).unwrap();
    assert_eq!(slice.len(), 1);
    assert_eq!(table.features(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_distinct_and_count_key() {
    // 値 [a,a,b]: distinct → [a,b] 初出順、count_key → {a:2, b:1}
    let table = DataTable::from_rows(
        vec!["v".to_string()],
        vec![
            vec![CellValue::Text("a".to_string())],
            vec![CellValue::Text("a".to_string())],
            vec![CellValue::Text("b".to_string())],
        ],
    )
    .unwrap();

    let distinct = table.distinct("v").unwrap();
    assert_eq!(distinct.len(), 2);
    assert_eq!(distinct.row(0), Some(&[CellValue::Text("a".to_string())][..]));
    assert_eq!(distinct.row(1), Some(&[CellValue::Text("b".to_string())][..]));

    let counts = table.count_key("v").unwrap();
    assert_eq!(counts.features(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts.record(0).unwrap().get("a"), Some(&CellValue::Int64(2)));
    assert_eq!(counts.record(0).unwrap().get("b"), Some(&CellValue::Int64(1)));
}

#[test]
fn test_catify_one_hot_expansion() {
    let mut table = DataTable::from_rows(
        vec!["weather".to_string()],
        vec![
            vec![CellValue::Text("rain".to_string())],
            vec![CellValue::Text("sun".to_string())],
            vec![CellValue::Text("rain".to_string())],
        ],
    )
    .unwrap();
    table.catify("weather").unwrap();

    assert_eq!(
        table.features(),
        vec![
            "weather".to_string(),
            "rain".to_string(),
            "sun".to_string()
        ]
    );
    let first = table.record(0).unwrap();
    assert_eq!(first.get("rain"), Some(&CellValue::Int64(1)));
    assert_eq!(first.get("sun"), Some(&CellValue::Int64(0)));
    let second = table.record(1).unwrap();
    assert_eq!(second.get("rain"), Some(&CellValue::Int64(0)));
    assert_eq!(second.get("sun"), Some(&CellValue::Int64(1)));

    // 生成列の境界は[0,0]固定（既知の制限）
    let bounds = table.feature_bounds("rain").unwrap();
    assert_eq!(bounds.min, 0.0);
    assert_eq!(bounds.max, 0.0);
    // ラベルは記録される
    assert_eq!(
        table.cat_keys("weather"),
        Some(&["rain".to_string(), "sun".to_string()][..])
    );
}

#[test]
fn test_inject_features_constant_fill() {
    let mut table = table_of("x", &[1, 2]);
    table
        .inject_features(&[("flag".to_string(), CellValue::Int64(9))])
        .unwrap();
    assert_eq!(table.features(), vec!["x".to_string(), "flag".to_string()]);
    for i in 0..table.len() {
        assert_eq!(table.record(i).unwrap().get("flag"), Some(&CellValue::Int64(9)));
    }

    // 既存の特徴量は上書きされ、リストには重複追加されない
    table
        .inject_features(&[("flag".to_string(), CellValue::Int64(0))])
        .unwrap();
    assert_eq!(table.features().len(), 2);
    assert_eq!(table.record(0).unwrap().get("flag"), Some(&CellValue::Int64(0)));
}

#[test]
fn test_inject_feature_by_function() {
    let mut table = table_of("x", &[1, 2, 3]);
    table
        .inject_feature_by_function("x_plus_ten", |record| {
            match record.get("x") {
                Some(CellValue::Int64(v)) => CellValue::Int64(v + 10),
                _ => CellValue::Missing,
            }
        })
        .unwrap();
    let values: Vec<CellValue> = (0..table.len())
        .map(|i| table.record(i).unwrap().get("x_plus_ten").cloned().unwrap())
        .collect();
    assert_eq!(
        values,
        vec![
            CellValue::Int64(11),
            CellValue::Int64(12),
            CellValue::Int64(13)
        ]
    );
}

#[test]
fn test_inject_target_feature() {
    let mut table = table_of("x", &[3, 9, 6]);
    table.inject_target_feature("x").unwrap();
    assert!(table.has_feature("domain_lower_bound"));
    assert!(table.has_feature("domain_upper_bound"));
    for i in 0..table.len() {
        let record = table.record(i).unwrap();
        assert_eq!(
            record.get("domain_lower_bound"),
            Some(&CellValue::Float64(3.0))
        );
        assert_eq!(
            record.get("domain_upper_bound"),
            Some(&CellValue::Float64(9.0))
        );
    }
}

#[test]
fn test_inject_target_feature_requires_presence() {
    let mut table = table_of("x", &[1]);
    match table.inject_target_feature("absent") {
        Err(TabRSError::InvalidFeature(_)) => (),
        _ => panic!("Expected an InvalidFeature error"),
    }
}

#[test]
fn test_find_incomplete_records() {
    let table = DataTable::from_rows(
        vec!["a".to_string(), "b".to_string()],
        vec![
            vec![CellValue::Int64(1), CellValue::Int64(2)],
            vec![CellValue::Int64(3), CellValue::Missing],
            vec![CellValue::Missing, CellValue::Missing],
        ],
    )
    .unwrap();
    let incomplete = table.find_incomplete_records().unwrap();
    assert_eq!(incomplete.len(), 2);
    assert_eq!(
        incomplete.row(0),
        Some(&[CellValue::Int64(3), CellValue::Missing][..])
    );
}

#[test]
fn test_sort_by_recomputes_state() {
    let mut table = table_of("x", &[5, 1, 3]);
    table.sort_by(|a, b| {
        let left = a.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let right = b.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0);
        left.partial_cmp(&right).unwrap_or(Ordering::Equal)
    });
    let values: Vec<CellValue> = table.rows().iter().map(|r| r[0].clone()).collect();
    assert_eq!(
        values,
        vec![
            CellValue::Int64(1),
            CellValue::Int64(3),
            CellValue::Int64(5)
        ]
    );
    // 副作用として境界も再計算されている
    let bounds = table.feature_bounds("x").unwrap();
    assert_eq!(bounds.min, 1.0);
    assert_eq!(bounds.max, 5.0);
}
