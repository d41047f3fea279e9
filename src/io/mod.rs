//! 入出力モジュール
//!
//! テーブルの行形式を消費・生成する薄い境界アダプタ群。
//! コア側はファイル形式や永続化機構について何も知りません。

pub mod csv;
pub mod json;
pub mod sql;

pub use self::csv::{read_csv, write_csv};
pub use self::json::{read_json, write_json};
pub use self::sql::read_sql;
