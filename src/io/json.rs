use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::table::DataTable;

/// JSONファイル（レコードオブジェクトの配列）からテーブルを読み込む
///
/// 特徴量の並びは先頭オブジェクトのキー順（serde_jsonのデコード順）
/// から推論されます。nullと欠けたキーは欠損値になります。
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<DataTable> {
    let file = File::open(path.as_ref()).map_err(Error::Io)?;
    let root: Value = serde_json::from_reader(file).map_err(Error::Json)?;
    let array = root.as_array().ok_or_else(|| {
        Error::Format("JSONのルートはレコードの配列である必要があります".to_string())
    })?;
    let first = array.first().ok_or_else(|| {
        Error::EmptyData("特徴量を推論するレコードがありません".to_string())
    })?;
    let first_obj = first.as_object().ok_or_else(|| {
        Error::Format("JSONのレコードはオブジェクトである必要があります".to_string())
    })?;
    let features: Vec<String> = first_obj.keys().cloned().collect();

    let mut table = DataTable::new(features.clone())?;
    for item in array {
        let obj = item.as_object().ok_or_else(|| {
            Error::Format("JSONのレコードはオブジェクトである必要があります".to_string())
        })?;
        let record: HashMap<String, CellValue> = features
            .iter()
            .map(|f| (f.clone(), json_to_cell(obj.get(f))))
            .collect();
        table.push(record)?;
    }
    Ok(table)
}

/// テーブルをJSONファイル（レコードオブジェクトの配列）に書き出す
pub fn write_json<P: AsRef<Path>>(table: &DataTable, path: P) -> Result<()> {
    let features = table.features();
    let records: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| {
            let mut obj = Map::with_capacity(features.len());
            for (feature, value) in features.iter().zip(row.iter()) {
                obj.insert(feature.clone(), cell_to_json(value));
            }
            Value::Object(obj)
        })
        .collect();
    let file = File::create(path.as_ref()).map_err(Error::Io)?;
    serde_json::to_writer(file, &Value::Array(records)).map_err(Error::Json)?;
    Ok(())
}

fn json_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Missing,
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int64(i)
            } else {
                CellValue::Float64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(Value::Bool(b)) => CellValue::Int64(i64::from(*b)),
        // 入れ子の構造はテキストとして取り込む
        Some(other) => CellValue::Text(other.to_string()),
    }
}

fn cell_to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Int64(v) => Value::Number(Number::from(*v)),
        CellValue::Float64(v) => match Number::from_f64(*v) {
            Some(n) => Value::Number(n),
            // NaN/無限大はJSONの数値で表現できない
            None => Value::Null,
        },
        CellValue::Text(v) => Value::String(v.clone()),
        CellValue::Missing => Value::Null,
    }
}
