use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::table::DataTable;

/// SQLクエリの実行結果からテーブルを作成する（永続化ブリッジ）
///
/// クエリ結果の列名が特徴量の並びになり、SQLのNULLは欠損値に
/// 変換されます。コア側はこのアダプタ以外で問い合わせを発行しません。
///
/// # 例
///
/// ```no_run
/// use tabrs::io::read_sql;
///
/// let table = read_sql("SELECT name, age FROM users WHERE age > 30", "users.db").unwrap();
/// ```
pub fn read_sql<P: AsRef<Path>>(query: &str, db_path: P) -> Result<DataTable> {
    let conn = Connection::open(db_path.as_ref())
        .map_err(|e| Error::Sql(format!("データベースに接続できませんでした: {}", e)))?;
    read_sql_with(&conn, query)
}

/// 既存の接続の上でクエリを実行してテーブルを作成する
pub fn read_sql_with(conn: &Connection, query: &str) -> Result<DataTable> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| Error::Sql(format!("SQLクエリの準備に失敗しました: {}", e)))?;

    let features: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|&name| name.to_string())
        .collect();
    let column_count = features.len();
    let mut table = DataTable::new(features)?;

    let mut rows = stmt
        .query([])
        .map_err(|e| Error::Sql(format!("SQLクエリの実行に失敗しました: {}", e)))?;
    while let Some(row) = rows
        .next()
        .map_err(|e| Error::Sql(format!("SQLクエリの結果取得に失敗しました: {}", e)))?
    {
        let mut record = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            record.push(row_value(row, idx)?);
        }
        table.push_row(record)?;
    }
    Ok(table)
}

// 1カラムの値をセル値に変換する
fn row_value(row: &Row<'_>, idx: usize) -> Result<CellValue> {
    let value = row
        .get_ref(idx)
        .map_err(|e| Error::Sql(format!("列 {} の読み取りに失敗しました: {}", idx, e)))?;
    Ok(match value {
        ValueRef::Null => CellValue::Missing,
        ValueRef::Integer(v) => CellValue::Int64(v),
        ValueRef::Real(v) => CellValue::Float64(v),
        ValueRef::Text(v) => CellValue::Text(String::from_utf8_lossy(v).to_string()),
        // バイナリ列はテーブルの行形式に対応しない
        ValueRef::Blob(_) => CellValue::Missing,
    })
}
