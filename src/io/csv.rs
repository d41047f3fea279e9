use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::table::DataTable;

/// CSVファイルからテーブルを読み込む
///
/// ヘッダ行が特徴量の並びを定義します。各セルはパターンに基づいて
/// 整数・浮動小数点・テキストに分類され、空白セルは欠損値になります。
/// ヘッダが空、または空の特徴量名を含む場合は致命的なエラーです。
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let file = File::open(path.as_ref()).map_err(Error::Io)?;
    read_csv_from_reader(file)
}

/// 任意のリーダーからCSVを読み込む
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<DataTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(Error::Csv)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(Error::Format(
            "CSVヘッダに特徴量名がありません".to_string(),
        ));
    }
    if headers.iter().any(|h| h.trim().is_empty()) {
        return Err(Error::Format(
            "CSVヘッダに空の特徴量名が含まれています".to_string(),
        ));
    }

    let mut table = DataTable::new(headers.clone())?;
    for result in rdr.records() {
        let record = result.map_err(Error::Csv)?;
        // 短い行は欠損値で埋め、余分なセルは無視する
        let row: Vec<CellValue> = (0..headers.len())
            .map(|i| match record.get(i) {
                Some(cell) => CellValue::parse(cell),
                None => CellValue::Missing,
            })
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

/// テーブルをCSVファイルに書き出す
///
/// 特徴量名のヘッダ行に続けて、生の位置ビューをそのまま
/// 1レコード1行で出力します。欠損値は空セルになります。
pub fn write_csv<P: AsRef<Path>>(table: &DataTable, path: P) -> Result<()> {
    let mut wtr = Writer::from_path(path.as_ref()).map_err(Error::Csv)?;
    wtr.write_record(table.features()).map_err(Error::Csv)?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .map_err(Error::Csv)?;
    }
    wtr.flush().map_err(Error::Io)?;
    Ok(())
}
