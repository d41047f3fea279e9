use thiserror::Error;

/// エラー型の定義
#[derive(Error, Debug)]
pub enum Error {
    #[error("特徴量が見つかりません: {0}")]
    InvalidFeature(String),

    #[error("特徴量セットが一致しません: {0}")]
    FeatureMismatch(String),

    #[error("特徴量名が重複しています: {0}")]
    DuplicateFeature(String),

    #[error("行数が一致しません: 期待値 {expected}, 実際 {found}")]
    InconsistentRowCount { expected: usize, found: usize },

    #[error("長さが一致しません: 期待値 {expected}, 実際 {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("欠損値が含まれています: {0}")]
    MissingValue(String),

    #[error("データがありません: {0}")]
    EmptyData(String),

    #[error("無効な値です: {0}")]
    InvalidValue(String),

    #[error("無効な操作です: {0}")]
    InvalidOperation(String),

    #[error("データ形式エラー: {0}")]
    Format(String),

    #[error("入出力エラー")]
    Io(#[source] std::io::Error),

    #[error("CSVエラー")]
    Csv(#[source] csv::Error),

    #[error("JSONエラー")]
    Json(#[source] serde_json::Error),

    #[error("SQLエラー: {0}")]
    Sql(String),
}

// TabRSErrorという名前でも参照できるようにする
pub type TabRSError = Error;

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

// 標準エラーからの変換（From実装）
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sql(err.to_string())
    }
}
