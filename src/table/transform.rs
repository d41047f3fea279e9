//! テーブル変換操作のモジュール
//!
//! 結合・グループ化・分割・射影・ワンホット展開などの高水準操作。
//! すべてRowStoreのプリミティブの上に実装され、特記がない限り
//! 入力を変更せず独立したディープコピーを返します。

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::stats::FeatureBounds;
use crate::table::{DataTable, RecordInput, RecordView};

impl DataTable {
    /// 行位置揃えの結合（インプレース）
    ///
    /// 両テーブルのレコードが同数で同じ順序に並んでいることが前提で、
    /// 行数が異なる場合はInconsistentRowCountエラーになります。
    /// 相手の特徴量の値を同じ行位置にマージし、完了後に境界統計を
    /// フルスキャンで再計算します。
    pub fn join(&mut self, other: &DataTable) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::InconsistentRowCount {
                expected: self.len(),
                found: other.len(),
            });
        }
        let other_features = other.features();
        for feature in &other_features {
            self.push_feature(feature);
        }
        for (i, record) in other.records.iter().enumerate() {
            for (j, feature) in other_features.iter().enumerate() {
                if let Some(&pos) = self.positions.get(feature) {
                    self.records[i][pos] = record[j].clone();
                }
            }
        }
        self.recompute_bounds();
        self.rebuild_all_indices();
        self.touch();
        Ok(())
    }

    /// キー値で引き当てる左結合
    ///
    /// 相手テーブルをキー（正規化された文字列表現、重複は後勝ち）で
    /// 索引化し、自テーブルの各レコードに一致レコードのフィールドを
    /// マージした新しいテーブルを返します。一致しなかったフィールドと
    /// 自レコード側の欠損フィールドは数値ゼロで埋められます。
    /// このゼロ埋めの方針は意図されたものです。
    pub fn join_by(&self, other: &DataTable, key: &str) -> Result<DataTable> {
        if !self.has_feature(key) {
            return Err(Error::InvalidFeature(key.to_string()));
        }
        let other_key_pos = other
            .positions
            .get(key)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(key.to_string()))?;
        // 出力の特徴量は相手側のもの、続いて自側の未出現のもの
        let mut out_features = other.features();
        for feature in self.features() {
            if !out_features.contains(&feature) {
                out_features.push(feature);
            }
        }
        let mut output = DataTable::new(out_features.clone())?;

        let mut join_index: HashMap<String, usize> = HashMap::new();
        for (i, record) in other.records.iter().enumerate() {
            join_index.insert(record[other_key_pos].to_key(), i);
        }

        let other_features = other.features();
        for record in self.iter() {
            let key_value = record
                .get(key)
                .cloned()
                .unwrap_or(CellValue::Missing)
                .to_key();
            let mut merged: HashMap<String, CellValue> = HashMap::new();
            for feature in &out_features {
                let value = match record.get(feature) {
                    Some(v) if !v.is_missing() => v.clone(),
                    _ => CellValue::Int64(0),
                };
                merged.insert(feature.clone(), value);
            }
            if let Some(&matched) = join_index.get(&key_value) {
                for (j, feature) in other_features.iter().enumerate() {
                    merged.insert(feature.clone(), other.records[matched][j].clone());
                }
            }
            output.push(RecordInput::Keyed(merged))?;
        }
        Ok(output)
    }

    /// 特徴量の値でレコードをグループ化する
    ///
    /// キーは値の正規化された文字列表現で、グループの並びは
    /// キーの初出順です。
    pub fn group_by(&self, feature: &str) -> Result<Vec<(String, DataTable)>> {
        if !self.has_feature(feature) {
            return Err(Error::InvalidFeature(feature.to_string()));
        }
        self.group_by_function(|record| {
            record
                .get(feature)
                .cloned()
                .unwrap_or(CellValue::Missing)
                .to_key()
        })
    }

    /// 関数が返すキーでレコードをグループ化する
    pub fn group_by_function<F>(&self, mut key_fn: F) -> Result<Vec<(String, DataTable)>>
    where
        F: FnMut(&RecordView<'_>) -> String,
    {
        let mut outputs: Vec<(String, DataTable)> = Vec::new();
        for values in &self.records {
            let view = RecordView::new(&self.features, &self.positions, values);
            let key = key_fn(&view);
            let slot = match outputs.iter().position(|(k, _)| k == &key) {
                Some(slot) => slot,
                None => {
                    outputs.push((key, DataTable::new(self.features())?));
                    outputs.len() - 1
                }
            };
            outputs[slot].1.push_row(values.clone())?;
        }
        Ok(outputs)
    }

    /// レコードをラウンドロビンでn個のテーブルに振り分ける
    ///
    /// レコードiはテーブル i mod n に入り、各分割内の相対順序は
    /// 保たれます。
    pub fn partition(&self, count: usize) -> Result<Vec<DataTable>> {
        if count == 0 {
            return Err(Error::InvalidValue(
                "分割数は1以上である必要があります".to_string(),
            ));
        }
        let mut outputs = Vec::with_capacity(count);
        for _ in 0..count {
            let mut table = DataTable::new(self.features())?;
            table.normalize = self.normalize;
            outputs.push(table);
        }
        for (i, values) in self.records.iter().enumerate() {
            outputs[i % count].push_row(values.clone())?;
        }
        Ok(outputs)
    }

    /// 先頭からの決定的な分割
    ///
    /// 先頭の floor(ratio × レコード数) 件が最初のテーブル、残りが
    /// 二つ目のテーブルに入ります。シャッフルは行いません。
    pub fn split(&self, ratio: f64) -> Result<(DataTable, DataTable)> {
        let split_size = (self.len() as f64 * ratio) as usize;
        let mut first = DataTable::with_config(self.features(), self.scale(), self.as_integer())?;
        let mut second = DataTable::with_config(self.features(), self.scale(), self.as_integer())?;
        first.normalize = self.normalize;
        second.normalize = self.normalize;
        for (i, values) in self.records.iter().enumerate() {
            if i < split_size {
                first.push_row(values.clone())?;
            } else {
                second.push_row(values.clone())?;
            }
        }
        Ok((first, second))
    }

    /// 全シャッフルによる無作為抽出
    ///
    /// limitが1以下なら全体に対する比率、1より大きければ件数として
    /// 解釈されます。件数はレコード数で頭打ちになります。
    /// シードは固定されないため結果は呼び出しごとに変わります。
    pub fn sample(&self, limit: f64) -> Result<DataTable> {
        let count = if limit <= 1.0 {
            (self.len() as f64 * limit) as usize
        } else {
            (limit as usize).min(self.len())
        };
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::from_entropy();
        indices.shuffle(&mut rng);
        let mut output = DataTable::new(self.features())?;
        for &i in indices.iter().take(count) {
            output.push_row(self.records[i].clone())?;
        }
        Ok(output)
    }

    /// 特徴量名による垂直スライス（splitの縦方向版）
    ///
    /// 指定した特徴量だけを持つ新しいテーブルを返します。divideが
    /// 真なら、対象の特徴量をこのテーブルからも取り除きます。
    pub fn segregate(&mut self, split_features: &[&str], divide: bool) -> Result<DataTable> {
        for feature in split_features {
            if !self.has_feature(feature) {
                return Err(Error::InvalidFeature((*feature).to_string()));
            }
        }
        let names: Vec<String> = split_features.iter().map(|f| (*f).to_string()).collect();
        let mut output = DataTable::new(names.clone())?;
        output.normalize = self.normalize;
        for record in self.iter() {
            let keyed: HashMap<String, CellValue> = names
                .iter()
                .map(|f| {
                    (
                        f.clone(),
                        record.get(f).cloned().unwrap_or(CellValue::Missing),
                    )
                })
                .collect();
            output.push(RecordInput::Keyed(keyed))?;
        }
        if divide {
            self.drop_features(split_features);
        }
        Ok(output)
    }

    /// 特徴量の一意な値を初出順に並べた1列のテーブルを返す
    pub fn distinct(&self, feature: &str) -> Result<DataTable> {
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        let mut output = DataTable::new(vec![feature.to_string()])?;
        let mut seen: Vec<CellValue> = Vec::new();
        for record in &self.records {
            let value = &record[pos];
            if !seen.contains(value) {
                seen.push(value.clone());
                output.push_row(vec![value.clone()])?;
            }
        }
        Ok(output)
    }

    /// 特徴量の値ごとの出現回数を数える
    ///
    /// 一意な値（正規化された文字列表現）を特徴量、その出現回数を
    /// 値とする1レコードのテーブルを返します。値の並びは初出順です。
    pub fn count_key(&self, feature: &str) -> Result<DataTable> {
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for record in &self.records {
            let key = record[pos].to_key();
            if !counts.contains_key(&key) {
                order.push(key.clone());
            }
            *counts.entry(key).or_insert(0) += 1;
        }
        let mut output = DataTable::new(order.clone())?;
        let row: Vec<CellValue> = order
            .iter()
            .map(|key| CellValue::Int64(counts.get(key).copied().unwrap_or(0)))
            .collect();
        output.push_row(row)?;
        Ok(output)
    }

    /// カテゴリカル特徴量をワンホット展開する
    ///
    /// 一意な値（初出順、欠損は除く）ごとに0/1の特徴量を注入し、
    /// 生成した列の境界を[0,0]に固定します。生成列が境界追跡の
    /// 対象外になるのは既知の制限で、そのまま踏襲しています。
    /// 元の特徴量は残り、生成したラベルはcat_keysに記録されます。
    pub fn catify(&mut self, feature: &str) -> Result<()> {
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        let mut labels: Vec<String> = Vec::new();
        for record in &self.records {
            let value = &record[pos];
            if value.is_missing() {
                continue;
            }
            let label = value.to_key();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        self.cat_keys
            .insert(feature.to_string(), labels.clone());
        for label in &labels {
            self.inject_feature_by_function(label, |record| {
                let matched = record
                    .get(feature)
                    .map(|v| v.to_key() == *label)
                    .unwrap_or(false);
                CellValue::Int64(if matched { 1 } else { 0 })
            })?;
            self.bounds.set(label, FeatureBounds { min: 0.0, max: 0.0 });
        }
        Ok(())
    }

    /// 複数の特徴量を定数値で注入する
    ///
    /// 新しい特徴量名は特徴量リストの末尾に一度だけ追加され、
    /// 既存の名前なら全レコードの値が上書きされます。
    pub fn inject_features(&mut self, features: &[(String, CellValue)]) -> Result<()> {
        for (feature, value) in features {
            self.push_feature(feature);
            let pos = match self.positions.get(feature) {
                Some(&pos) => pos,
                None => continue,
            };
            for record in self.records.iter_mut() {
                record[pos] = value.clone();
            }
            if self.greedy_bounds {
                self.bounds.observe(feature, value);
            }
        }
        self.touch();
        Ok(())
    }

    /// レコードごとに計算した値で特徴量を注入する
    ///
    /// クロージャは各レコードの読み取り専用ビューを受け取り、
    /// その戻り値が対象の特徴量に書き込まれます。
    pub fn inject_feature_by_function<F>(&mut self, feature: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&RecordView<'_>) -> CellValue,
    {
        self.push_feature(feature);
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        for i in 0..self.records.len() {
            let value = {
                let view = RecordView::new(&self.features, &self.positions, &self.records[i]);
                f(&view)
            };
            if self.greedy_bounds {
                self.bounds.observe(feature, &value);
            }
            self.records[i][pos] = value;
        }
        self.touch();
        Ok(())
    }

    /// 対象特徴量の現在の大域min/maxを写した境界列を注入する
    ///
    /// domain_lower_bound / domain_upper_bound の2特徴量を全レコードに
    /// 追加します。対象が存在しない場合はInvalidFeature、数値境界が
    /// 追跡されていない場合はInvalidOperationエラーになります。
    pub fn inject_target_feature(&mut self, feature: &str) -> Result<()> {
        if !self.has_feature(feature) {
            return Err(Error::InvalidFeature(feature.to_string()));
        }
        let bounds = self.feature_bounds(feature).ok_or_else(|| {
            Error::InvalidOperation(format!(
                "特徴量 '{}' には数値境界が追跡されていません",
                feature
            ))
        })?;
        self.inject_features(&[
            (
                "domain_lower_bound".to_string(),
                CellValue::Float64(bounds.min),
            ),
            (
                "domain_upper_bound".to_string(),
                CellValue::Float64(bounds.max),
            ),
        ])
    }

    /// 欠損値を1つ以上含むレコードからなるテーブルを返す
    pub fn find_incomplete_records(&self) -> Result<DataTable> {
        let mut output = DataTable::new(self.features())?;
        for values in &self.records {
            if values.iter().any(|v| v.is_missing()) {
                output.push_row(values.clone())?;
            }
        }
        Ok(output)
    }

    /// 比較関数でインプレースに並べ替える
    ///
    /// 並べ替えはレコードの再挿入として行われるため、副作用として
    /// 境界統計と全インデックスがゼロから再構築されます。
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&RecordView<'_>, &RecordView<'_>) -> Ordering,
    {
        let mut rows = std::mem::take(&mut self.records);
        {
            let features = &self.features;
            let positions = &self.positions;
            rows.sort_by(|a, b| {
                compare(
                    &RecordView::new(features, positions, a),
                    &RecordView::new(features, positions, b),
                )
            });
        }
        self.records = rows;
        self.recompute_bounds();
        self.rebuild_all_indices();
        self.touch();
    }
}
