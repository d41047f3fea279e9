//! テーブル本体のモジュール
//!
//! レコードの正準ストア、増分境界統計、二次インデックス、
//! 正規化キャッシュ、および変換操作を提供します。

mod index;
mod normalize;
mod record;
mod transform;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::stats::{BoundsTracker, FeatureBounds};

use self::normalize::NormalizedCache;
pub use self::record::{RecordInput, RecordView};

/// 二重表現のインメモリ・テーブル
///
/// レコードは特徴量順に並んだ値列として一度だけ保持され、位置ビューと
/// キー付きビューはそこから導出されます。挿入のたびに境界統計と
/// 二次インデックスが同期更新され、正規化キャッシュは無効化されます。
///
/// 単一スレッドでの同期実行を前提とします。正規化キャッシュの
/// メモ化に内部可変性を使うため、この型はSyncになりません。
#[derive(Debug, Clone)]
pub struct DataTable {
    /// 特徴量の並び（順序に意味がある）
    features: Vec<String>,
    /// 特徴量名→列位置のマッピング
    positions: HashMap<String, usize>,
    /// レコードの正準ストア
    records: Vec<Vec<CellValue>>,
    /// 数値特徴量の境界統計
    bounds: BoundsTracker,
    /// 特徴量ごとの二次インデックス（正規化キー→レコード位置、後勝ち）
    indices: HashMap<String, HashMap<String, usize>>,
    /// 挿入のたびに境界を増分更新するか
    pub greedy_bounds: bool,
    /// 読み出し時に正規化ビューを返すか
    pub normalize: bool,
    /// 正規化値に掛けるスケール係数
    scale: f64,
    /// 正規化値を整数に切り詰めるか
    as_integer: bool,
    /// catifyが生成したラベルの記録
    cat_keys: HashMap<String, Vec<String>>,
    /// 変更世代。ミューテーションごとに進む
    generation: u64,
    /// 正規化ビューのメモ化キャッシュ
    norm_cache: RefCell<Option<NormalizedCache>>,
}

impl DataTable {
    /// 空のテーブルを作成
    ///
    /// 特徴量リストが空の場合はエラーになります。
    pub fn new(features: Vec<String>) -> Result<Self> {
        Self::with_config(features, 1.0, false)
    }

    /// スケール係数と整数化フラグを指定してテーブルを作成
    pub fn with_config(features: Vec<String>, scale: f64, as_integer: bool) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::EmptyData(
                "特徴量リストが空のテーブルは作成できません".to_string(),
            ));
        }
        let mut positions = HashMap::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            if positions.insert(feature.clone(), i).is_some() {
                return Err(Error::DuplicateFeature(feature.clone()));
            }
        }
        Ok(DataTable {
            features,
            positions,
            records: Vec::new(),
            bounds: BoundsTracker::new(),
            indices: HashMap::new(),
            greedy_bounds: true,
            normalize: false,
            scale,
            as_integer,
            cat_keys: HashMap::new(),
            generation: 0,
            norm_cache: RefCell::new(None),
        })
    }

    /// 位置揃えの行の列からテーブルを作成
    pub fn from_rows(features: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut table = Self::new(features)?;
        table.push(RecordInput::Rows(rows))?;
        Ok(table)
    }

    /// 順序付きのキー付きレコード列からテーブルを作成
    ///
    /// 特徴量の並びは先頭レコードのキー順から推論されます。
    pub fn from_records(records: Vec<Vec<(String, CellValue)>>) -> Result<Self> {
        let first = records.first().ok_or_else(|| {
            Error::EmptyData("特徴量を推論するレコードがありません".to_string())
        })?;
        let features: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
        let mut table = Self::new(features)?;
        for record in records {
            let keyed: HashMap<String, CellValue> = record.into_iter().collect();
            table.push(RecordInput::Keyed(keyed))?;
        }
        Ok(table)
    }

    /// レコード数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// テーブルが空かどうか
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 特徴量リストのコピーを返す
    ///
    /// 内部のリストそのものは返しません。呼び出し側が戻り値を
    /// 書き換えてもテーブルの状態は壊れません。
    pub fn features(&self) -> Vec<String> {
        self.features.clone()
    }

    /// 特徴量が存在するか
    pub fn has_feature(&self, feature: &str) -> bool {
        self.positions.contains_key(feature)
    }

    /// スケール係数
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 整数化フラグ
    pub fn as_integer(&self) -> bool {
        self.as_integer
    }

    /// 位置からレコードビューを取得
    pub fn record(&self, pos: usize) -> Option<RecordView<'_>> {
        self.records
            .get(pos)
            .map(|values| RecordView::new(&self.features, &self.positions, values))
    }

    /// 位置から生の行を取得
    pub fn row(&self, pos: usize) -> Option<&[CellValue]> {
        self.records.get(pos).map(|r| r.as_slice())
    }

    /// 生の行ストアへの読み取り専用アクセス
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.records
    }

    /// 全レコードのビューを順に返すイテレータ
    pub fn iter(&self) -> impl Iterator<Item = RecordView<'_>> {
        self.records
            .iter()
            .map(|values| RecordView::new(&self.features, &self.positions, values))
    }

    /// 現在の境界マップ（表示ブリッジ用の読み取り専用アクセサ）
    pub fn bounds(&self) -> &HashMap<String, FeatureBounds> {
        self.bounds.all()
    }

    /// 特徴量の境界を取得
    pub fn feature_bounds(&self, feature: &str) -> Option<FeatureBounds> {
        self.bounds.get(feature).copied()
    }

    /// catifyが生成したラベルの記録
    pub fn cat_keys(&self, feature: &str) -> Option<&[String]> {
        self.cat_keys.get(feature).map(|v| v.as_slice())
    }

    /// 特徴量優先のグリッド（特徴量ごとのレコード順の値列）
    ///
    /// 表示ブリッジが消費する形式。コアは整形を行いません。
    pub fn feature_grid(&self) -> Vec<(String, Vec<CellValue>)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let column: Vec<CellValue> =
                    self.records.iter().map(|r| r[i].clone()).collect();
                (feature.clone(), column)
            })
            .collect()
    }

    /// レコードを挿入する
    ///
    /// 位置揃えの行（長さは特徴量数と一致すること）、行の列（各行を
    /// 個別に展開）、またはキー付きマッピング（欠けたキーは欠損値）を
    /// 受け付けます。挿入と同時に境界統計（greedyモード時）と既存の
    /// 全インデックスが更新され、正規化キャッシュは無効化されます。
    pub fn push<R: Into<RecordInput>>(&mut self, input: R) -> Result<()> {
        match input.into() {
            RecordInput::Rows(rows) => {
                for row in rows {
                    self.push(RecordInput::Row(row))?;
                }
                Ok(())
            }
            RecordInput::Row(values) => {
                if values.len() != self.features.len() {
                    return Err(Error::LengthMismatch {
                        expected: self.features.len(),
                        actual: values.len(),
                    });
                }
                self.append_record(values);
                Ok(())
            }
            RecordInput::Keyed(mut record) => {
                let values: Vec<CellValue> = self
                    .features
                    .iter()
                    .map(|f| record.remove(f).unwrap_or(CellValue::Missing))
                    .collect();
                self.append_record(values);
                Ok(())
            }
        }
    }

    /// 位置揃えの1行を挿入する
    pub fn push_row(&mut self, values: Vec<CellValue>) -> Result<()> {
        self.push(RecordInput::Row(values))
    }

    // 形の揃った行を末尾に追加し、付随する状態を同期する
    fn append_record(&mut self, values: Vec<CellValue>) {
        if self.greedy_bounds {
            for (feature, value) in self.features.iter().zip(values.iter()) {
                self.bounds.observe(feature, value);
            }
        }
        // 既存インデックスを後勝ちで更新。欠損値は登録しない
        let pos = self.records.len();
        for (feature, index) in self.indices.iter_mut() {
            if let Some(&col) = self.positions.get(feature) {
                let value = &values[col];
                if !value.is_missing() {
                    index.insert(value.to_key(), pos);
                }
            }
        }
        self.records.push(values);
        self.touch();
    }

    /// 新しい特徴量を末尾に追加する
    ///
    /// すでに存在する名前なら何もしません。既存の全レコードには
    /// 欠損値が補われるため、両ビューの長さ不変条件は保たれます。
    pub fn push_feature(&mut self, feature: &str) {
        if self.positions.contains_key(feature) {
            return;
        }
        self.positions
            .insert(feature.to_string(), self.features.len());
        self.features.push(feature.to_string());
        for record in self.records.iter_mut() {
            record.push(CellValue::Missing);
        }
        self.touch();
    }

    /// 特徴量を削除する
    ///
    /// 特徴量リスト・全レコード・境界マップから取り除きます。
    /// 削除対象にインデックスが張られていた場合、そのインデックスも
    /// 破棄されます。存在しない名前は無視されます。
    /// コストは O(レコード数 × 特徴量数)。
    pub fn drop_features(&mut self, names: &[&str]) {
        for name in names {
            let pos = match self.positions.get(*name) {
                Some(&pos) => pos,
                None => continue,
            };
            self.features.remove(pos);
            for record in self.records.iter_mut() {
                record.remove(pos);
            }
            self.bounds.remove(name);
            if self.indices.remove(*name).is_some() {
                log::warn!("特徴量 '{}' の削除に伴いインデックスを破棄しました", name);
            }
            self.rebuild_positions();
        }
        self.touch();
    }

    /// 特徴量を改名する
    ///
    /// 位置は変わらず、元の位置が新しい名前を引き継ぎます。
    /// 境界マップと二次インデックスも新しい名前に移されます。
    pub fn swap_features(&mut self, pairs: &HashMap<String, String>) {
        for (existing, replacement) in pairs {
            let pos = match self.positions.get(existing) {
                Some(&pos) => pos,
                None => continue,
            };
            self.features[pos] = replacement.clone();
            self.bounds.rename(existing, replacement);
            if let Some(index) = self.indices.remove(existing) {
                log::info!(
                    "特徴量の改名 '{}' → '{}' に伴いインデックスを移動しました",
                    existing,
                    replacement
                );
                self.indices.insert(replacement.clone(), index);
            }
        }
        self.rebuild_positions();
        self.touch();
    }

    /// 別テーブルの全レコードをディープコピーとして取り込む
    ///
    /// このテーブルの全特徴量が相手に存在しない場合は
    /// FeatureMismatchエラーになります。相手側の余分な特徴量は
    /// 取り込まれません。
    pub fn merge(&mut self, other: &DataTable) -> Result<()> {
        for feature in &self.features {
            if !other.has_feature(feature) {
                return Err(Error::FeatureMismatch(format!(
                    "マージ相手に特徴量 '{}' がありません",
                    feature
                )));
            }
        }
        let features = self.features.clone();
        for record in other.iter() {
            let keyed: HashMap<String, CellValue> = features
                .iter()
                .map(|f| {
                    (
                        f.clone(),
                        record.get(f).cloned().unwrap_or(CellValue::Missing),
                    )
                })
                .collect();
            self.push(RecordInput::Keyed(keyed))?;
        }
        Ok(())
    }

    /// 全レコードを走査して境界統計をゼロから再計算する
    ///
    /// O(レコード数 × 特徴量数) のバッチパス。構築時とjoinの後に
    /// 使われます。greedyモードが有効なら通常は不要です。
    pub fn recompute_bounds(&mut self) {
        self.bounds.rebuild(&self.features, self.records.iter());
    }

    /// 正規表現に一致する特徴量名を返す
    pub fn filter_features(&self, pattern: &Regex) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| pattern.is_match(f))
            .cloned()
            .collect()
    }

    /// 1特徴量の値列を取り出す
    pub fn single_feature_values(&self, feature: &str) -> Result<Vec<CellValue>> {
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        Ok(self.records.iter().map(|r| r[pos].clone()).collect())
    }

    /// 1特徴量の値列を取り出し、必要ならテーブルからも取り除く
    pub fn retrieve_feature(&mut self, feature: &str, remove: bool) -> Result<Vec<CellValue>> {
        let output = self.single_feature_values(feature)?;
        if remove {
            self.drop_features(&[feature]);
        }
        Ok(output)
    }

    /// 各レコードに対して処理を実行する
    pub fn each<F>(&self, mut f: F)
    where
        F: FnMut(RecordView<'_>, usize),
    {
        for (i, values) in self.records.iter().enumerate() {
            f(RecordView::new(&self.features, &self.positions, values), i);
        }
    }

    /// 各レコードから値を導出した列を返す
    pub fn map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(RecordView<'_>) -> T,
    {
        self.records
            .iter()
            .map(|values| f(RecordView::new(&self.features, &self.positions, values)))
            .collect()
    }

    /// 各レコードをキー付き表現経由で書き換える
    ///
    /// クロージャが書き換えたマップの内容が正準ストアに書き戻されます。
    /// 境界統計とインデックスは再計算されません。値を書き換えた後に
    /// 必要であれば recompute_bounds や add_index を呼び直してください。
    pub fn apply<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut HashMap<String, CellValue>),
    {
        for i in 0..self.records.len() {
            let mut record =
                RecordView::new(&self.features, &self.positions, &self.records[i]).to_map();
            f(&mut record);
            let row = &mut self.records[i];
            for (j, feature) in self.features.iter().enumerate() {
                row[j] = record.remove(feature).unwrap_or(CellValue::Missing);
            }
        }
        self.touch();
    }

    /// 条件に合う最初のレコードをキー付きコピーで返す
    pub fn find<F>(&self, mut predicate: F) -> Option<HashMap<String, CellValue>>
    where
        F: FnMut(&RecordView<'_>) -> bool,
    {
        for values in &self.records {
            let view = RecordView::new(&self.features, &self.positions, values);
            if predicate(&view) {
                return Some(view.to_map());
            }
        }
        None
    }

    /// 条件が真のレコードからなる新しいテーブルを返す
    pub fn select<F>(&self, mut predicate: F) -> Result<DataTable>
    where
        F: FnMut(&RecordView<'_>) -> bool,
    {
        let mut output = DataTable::new(self.features())?;
        for values in &self.records {
            let view = RecordView::new(&self.features, &self.positions, values);
            if predicate(&view) {
                output.push_row(values.clone())?;
            }
        }
        Ok(output)
    }

    /// 条件が偽のレコードからなる新しいテーブルを返す
    ///
    /// selectの逆。どちらも意図されたペアなので統合しないこと。
    pub fn filter_by_function<F>(&self, mut predicate: F) -> Result<DataTable>
    where
        F: FnMut(&RecordView<'_>) -> bool,
    {
        let mut output = DataTable::new(self.features())?;
        for values in &self.records {
            let view = RecordView::new(&self.features, &self.positions, values);
            if !predicate(&view) {
                output.push_row(values.clone())?;
            }
        }
        Ok(output)
    }

    // 特徴量名→位置のマッピングを作り直す
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, feature) in self.features.iter().enumerate() {
            self.positions.insert(feature.clone(), i);
        }
    }

    // ミューテーションの発生を記録し、キャッシュを失効させる
    pub(crate) fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::vis::render_table(self))
    }
}
