use std::collections::HashMap;

use crate::cell::CellValue;

/// pushが受け付ける入力形式
///
/// 位置揃えの1行、行の列（各内側の行を個別レコードとして展開）、
/// 特徴量名をキーにしたマッピングのいずれか。
#[derive(Debug, Clone)]
pub enum RecordInput {
    /// 特徴量順に並んだ1行
    Row(Vec<CellValue>),
    /// 複数行。各行が1レコードとして順に挿入される
    Rows(Vec<Vec<CellValue>>),
    /// 特徴量名→値のマッピング。欠けたキーは欠損値になる
    Keyed(HashMap<String, CellValue>),
}

impl From<Vec<CellValue>> for RecordInput {
    fn from(row: Vec<CellValue>) -> Self {
        RecordInput::Row(row)
    }
}

impl From<Vec<Vec<CellValue>>> for RecordInput {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        RecordInput::Rows(rows)
    }
}

impl From<HashMap<String, CellValue>> for RecordInput {
    fn from(record: HashMap<String, CellValue>) -> Self {
        RecordInput::Keyed(record)
    }
}

/// 1レコードへの読み取り専用ビュー
///
/// レコードの正準表現は特徴量順に並んだ値列ひとつだけで、
/// 位置ベースのアクセスも名前ベースのアクセスもこのビューから
/// 導出されます。二つの物理表現を同期させる必要はありません。
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    features: &'a [String],
    positions: &'a HashMap<String, usize>,
    values: &'a [CellValue],
}

impl<'a> RecordView<'a> {
    pub(crate) fn new(
        features: &'a [String],
        positions: &'a HashMap<String, usize>,
        values: &'a [CellValue],
    ) -> Self {
        RecordView {
            features,
            positions,
            values,
        }
    }

    /// レコードの長さ（= 特徴量数）
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// レコードが空かどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 位置ベースの値列
    pub fn values(&self) -> &'a [CellValue] {
        self.values
    }

    /// 特徴量の並び
    pub fn features(&self) -> &'a [String] {
        self.features
    }

    /// 位置から値を取得
    pub fn get_at(&self, pos: usize) -> Option<&'a CellValue> {
        self.values.get(pos)
    }

    /// 特徴量名から値を取得
    pub fn get(&self, feature: &str) -> Option<&'a CellValue> {
        self.positions
            .get(feature)
            .and_then(|&pos| self.values.get(pos))
    }

    /// キー付き表現としてのコピーを作成
    pub fn to_map(&self) -> HashMap<String, CellValue> {
        self.features
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect()
    }

    /// 特徴量順を保った (名前, 値) ペアの列を作成
    pub fn to_pairs(&self) -> Vec<(String, CellValue)> {
        self.features
            .iter()
            .zip(self.values.iter())
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect()
    }
}
