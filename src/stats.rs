//! 特徴量ごとの要約統計モジュール
//!
//! 数値特徴量の最小・最大（および平均）を追跡します。テキスト特徴量は
//! 境界追跡の対象外です。ある特徴量が追跡対象かどうかは、最初に観測された
//! 非欠損値の型で決まり、以後変わりません。

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::table::DataTable;

/// 特徴量ごとの最小・最大値
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureBounds {
    pub min: f64,
    pub max: f64,
}

/// バッチ集計で得られる最小・最大・平均値
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// 特徴量境界の増分トラッカー
///
/// 境界エントリは、その特徴量で最初に観測された非欠損値が数値だった
/// 場合にのみ存在します。最初の観測値がテキストだった特徴量は永続的に
/// スキップされます。欠損値は分類にも集計にも関与しません。
#[derive(Debug, Clone, Default)]
pub struct BoundsTracker {
    bounds: HashMap<String, FeatureBounds>,
    text_features: HashSet<String>,
}

impl BoundsTracker {
    /// 空のトラッカーを作成
    pub fn new() -> Self {
        BoundsTracker {
            bounds: HashMap::new(),
            text_features: HashSet::new(),
        }
    }

    /// 特徴量の境界を取得
    pub fn get(&self, feature: &str) -> Option<&FeatureBounds> {
        self.bounds.get(feature)
    }

    /// 全境界のマップを取得
    pub fn all(&self) -> &HashMap<String, FeatureBounds> {
        &self.bounds
    }

    /// 境界が追跡されている特徴量の数
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// 追跡対象が存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// 新しく観測された値で境界を増分更新する
    ///
    /// 挿入ごとに呼ばれるO(1)のパス。バッチ再計算を避けるための
    /// greedyモードの実体です。
    pub fn observe(&mut self, feature: &str, value: &CellValue) {
        if self.text_features.contains(feature) {
            return;
        }
        match value {
            CellValue::Missing => {}
            CellValue::Text(_) => {
                // 最初の観測値がテキストなら以後この特徴量は追跡しない
                if !self.bounds.contains_key(feature) {
                    self.text_features.insert(feature.to_string());
                }
            }
            _ => {
                let v = match value.as_f64() {
                    Some(v) => v,
                    None => return,
                };
                match self.bounds.get_mut(feature) {
                    Some(b) => {
                        if v < b.min {
                            b.min = v;
                        }
                        if v > b.max {
                            b.max = v;
                        }
                    }
                    None => {
                        self.bounds
                            .insert(feature.to_string(), FeatureBounds { min: v, max: v });
                    }
                }
            }
        }
    }

    /// 特徴量の境界を直接設定する（one-hot列の[0,0]固定などに使用）
    pub fn set(&mut self, feature: &str, bounds: FeatureBounds) {
        self.text_features.remove(feature);
        self.bounds.insert(feature.to_string(), bounds);
    }

    /// 特徴量のエントリを削除
    pub fn remove(&mut self, feature: &str) {
        self.bounds.remove(feature);
        self.text_features.remove(feature);
    }

    /// 特徴量を改名（境界の値は保持される）
    pub fn rename(&mut self, existing: &str, replacement: &str) {
        if let Some(b) = self.bounds.remove(existing) {
            self.bounds.insert(replacement.to_string(), b);
        }
        if self.text_features.remove(existing) {
            self.text_features.insert(replacement.to_string());
        }
    }

    /// 全レコードを走査して境界をゼロから再計算する
    ///
    /// O(レコード数 × 特徴量数)。構築時と構造的なマージ（join）後に
    /// 使われるバッチパスです。
    pub fn rebuild<'a, I>(&mut self, features: &[String], records: I)
    where
        I: Iterator<Item = &'a Vec<CellValue>>,
    {
        self.bounds.clear();
        self.text_features.clear();
        for record in records {
            for (i, feature) in features.iter().enumerate() {
                if let Some(value) = record.get(i) {
                    self.observe(feature, value);
                }
            }
        }
    }
}

/// テーブル全体の最小・最大・平均をバッチ集計する
///
/// テーブルのキー付きビュー（normalizeフラグが立っていれば正規化済みの
/// 値）を対象に、数値特徴量ごとのFeatureSummaryを返します。
/// 空のテーブルでは平均が定義できないため、EmptyDataエラーになります。
pub fn hash_feature_bounds(table: &DataTable) -> Result<HashMap<String, FeatureSummary>> {
    if table.len() == 0 {
        return Err(Error::EmptyData(
            "空のテーブルの要約統計は計算できません".to_string(),
        ));
    }

    let features = table.features();
    let records = table.keyed_data();
    let mut output: HashMap<String, FeatureSummary> = HashMap::new();

    for feature in &features {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut is_text = false;

        for record in &records {
            match record.get(feature) {
                Some(CellValue::Text(_)) => {
                    // 最初の非欠損値がテキストなら対象外
                    if count == 0 {
                        is_text = true;
                        break;
                    }
                }
                Some(value) => {
                    if let Some(v) = value.as_f64() {
                        if v < min {
                            min = v;
                        }
                        if v > max {
                            max = v;
                        }
                        sum += v;
                        count += 1;
                    }
                }
                None => {}
            }
        }

        if !is_text && count > 0 {
            output.insert(
                feature.clone(),
                FeatureSummary {
                    min,
                    max,
                    avg: sum / count as f64,
                },
            );
        }
    }

    Ok(output)
}
