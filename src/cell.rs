use std::fmt::{self, Display};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    // 符号付き10進数（小数部は任意、指数表記は受け付けない）
    static ref NUMBER_REGEX: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
    // 空白のみのセル
    static ref BLANK_CELL_REGEX: Regex = Regex::new(r"^\s*$").unwrap();
}

/// セルの値を表現する型
///
/// 挿入時に型が確定するタグ付きバリアント。数値（整数・浮動小数点）、
/// テキスト、欠損値のいずれかを表します。一度挿入された値の型が
/// あとから推測し直されることはありません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// 整数値
    Int64(i64),
    /// 浮動小数点値
    Float64(f64),
    /// テキスト値
    Text(String),
    /// 欠損値
    Missing,
}

impl CellValue {
    /// 生の文字列セルを分類して値を作成
    ///
    /// 空白のみのセルは欠損値、小数点を含む数値はFloat64、
    /// 含まない数値はInt64、それ以外はTextになります。
    /// 指数表記は数値として認識しません。
    pub fn parse(raw: &str) -> CellValue {
        if BLANK_CELL_REGEX.is_match(raw) {
            return CellValue::Missing;
        }
        let trimmed = raw.trim();
        if NUMBER_REGEX.is_match(trimmed) {
            if trimmed.contains('.') {
                match trimmed.parse::<f64>() {
                    Ok(v) => return CellValue::Float64(v),
                    Err(_) => return CellValue::Text(raw.to_string()),
                }
            }
            match trimmed.parse::<i64>() {
                Ok(v) => return CellValue::Int64(v),
                // i64に収まらない桁数はテキストとして保持する
                Err(_) => return CellValue::Text(raw.to_string()),
            }
        }
        CellValue::Text(raw.to_string())
    }

    /// 欠損値かどうか
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// 数値かどうか
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int64(_) | CellValue::Float64(_))
    }

    /// テキストかどうか
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// 数値としての値を取得（数値でなければNone）
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int64(v) => Some(*v as f64),
            CellValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// インデックスや結合キーに使う正規化された文字列表現
    ///
    /// 欠損値は空文字列になります。
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int64(v) => write!(f, "{}", v),
            CellValue::Float64(v) => write!(f, "{}", v),
            CellValue::Text(v) => write!(f, "{}", v),
            CellValue::Missing => write!(f, ""),
        }
    }
}

// From実装：基本型からCellValueへの自動変換
impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int64(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float64(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

// Option<T>からの変換：Noneは欠損値になる
impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Missing,
        }
    }
}
