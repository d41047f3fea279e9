//! 表示ブリッジのモジュール
//!
//! テーブルの読み取り専用アクセサ（特徴量の並び・境界マップ・
//! 特徴量優先グリッド）だけを消費する純粋な整形器です。
//! コア側は整形を一切行いません。

use crate::cell::CellValue;
use crate::table::DataTable;

/// テーブルをコンソール向けのテキスト表として整形する
///
/// 先頭列はレコード位置、以降は特徴量順の列です。
pub fn render_table(table: &DataTable) -> String {
    let grid = table.feature_grid();
    let row_count = table.len();

    // 各列の幅はヘッダと値の最長のもの
    let idx_width = row_count.to_string().len().max(3);
    let widths: Vec<usize> = grid
        .iter()
        .map(|(feature, column)| {
            column
                .iter()
                .map(|v| v.to_string().len())
                .max()
                .unwrap_or(0)
                .max(feature.len())
        })
        .collect();

    let mut output = String::new();
    output.push_str(&format!("{:<width$}", "idx", width = idx_width));
    for ((feature, _), width) in grid.iter().zip(widths.iter()) {
        output.push_str(&format!(" | {:<width$}", feature, width = width));
    }
    output.push('\n');

    for row in 0..row_count {
        output.push_str(&format!("{:<width$}", row, width = idx_width));
        for ((_, column), width) in grid.iter().zip(widths.iter()) {
            output.push_str(&format!(" | {:<width$}", column[row].to_string(), width = width));
        }
        output.push('\n');
    }
    output
}

/// 境界マップをテキスト表として整形する
pub fn render_feature_bounds(table: &DataTable) -> String {
    let bounds = table.bounds();
    let name_width = table
        .features()
        .iter()
        .map(|f| f.len())
        .max()
        .unwrap_or(0)
        .max("feature".len());

    let mut output = String::new();
    output.push_str(&format!(
        "{:<width$} | {:>12} | {:>12}\n",
        "feature",
        "min",
        "max",
        width = name_width
    ));
    for feature in table.features() {
        if let Some(b) = bounds.get(&feature) {
            output.push_str(&format!(
                "{:<width$} | {:>12} | {:>12}\n",
                feature,
                b.min,
                b.max,
                width = name_width
            ));
        }
    }
    output
}

/// 特徴量の一覧をNumeric/CATの区別付きで整形する
///
/// 3項目ごとに改行します。
pub fn render_feature_summary(table: &DataTable) -> String {
    let grid = table.feature_grid();
    let entries: Vec<String> = grid
        .iter()
        .map(|(feature, column)| {
            let kind = classify(table, feature, column);
            format!("{}: {}", feature, kind)
        })
        .collect();

    let entry_width = entries.iter().map(|e| e.len()).max().unwrap_or(0) + 2;
    let mut output = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            output.push('\n');
        } else if i > 0 {
            output.push_str(" | ");
        }
        output.push_str(&format!("{:<width$}", entry, width = entry_width));
    }
    output
}

// 境界が追跡されていればNumeric、それ以外は最初の非欠損値で判定する
fn classify(table: &DataTable, feature: &str, column: &[CellValue]) -> &'static str {
    if table.feature_bounds(feature).is_some() {
        return "Numeric";
    }
    match column.iter().find(|v| !v.is_missing()) {
        Some(v) if v.is_numeric() => "Numeric",
        _ => "CAT",
    }
}
