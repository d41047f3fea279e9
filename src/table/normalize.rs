//! 正規化ビューのモジュール
//!
//! 境界統計に基づくmin-maxスケーリング済みビューを遅延計算し、
//! 次のミューテーションまでメモ化します。

use std::collections::HashMap;

use crate::cell::CellValue;
use crate::stats::FeatureBounds;
use crate::table::DataTable;

/// 世代番号付きのメモ化キャッシュ
#[derive(Debug, Clone)]
pub(crate) struct NormalizedCache {
    generation: u64,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// 位置ベースの表現を返す
    ///
    /// normalizeフラグが立っていれば正規化済みの値、そうでなければ
    /// 生の値のディープコピーを返します。
    pub fn positional_data(&self) -> Vec<Vec<CellValue>> {
        if self.normalize {
            self.normalized_rows()
        } else {
            self.rows().to_vec()
        }
    }

    /// キー付き表現を返す
    ///
    /// positional_dataと同じ値を特徴量名で引ける形にしたものです。
    pub fn keyed_data(&self) -> Vec<HashMap<String, CellValue>> {
        let features = self.features();
        self.positional_data()
            .into_iter()
            .map(|row| features.iter().cloned().zip(row).collect())
            .collect()
    }

    /// min-maxスケーリング済みの位置ビューを返す
    ///
    /// 数値特徴量ごとに `(value - min) / (max - min)` を適用し、
    /// スケール係数を掛けます。`max == min` の場合は0になります。
    /// テキスト値・欠損値・境界が追跡されていない特徴量の値は
    /// そのまま通過します。結果は次のミューテーションまでメモ化されます。
    pub fn normalized_rows(&self) -> Vec<Vec<CellValue>> {
        {
            let cache = self.norm_cache.borrow();
            if let Some(cached) = cache.as_ref() {
                if cached.generation == self.generation() {
                    return cached.rows.clone();
                }
            }
        }
        let rows = self.compute_normalized();
        *self.norm_cache.borrow_mut() = Some(NormalizedCache {
            generation: self.generation(),
            rows: rows.clone(),
        });
        rows
    }

    /// キー付きの正規化ビューを返す
    pub fn normalized_records(&self) -> Vec<HashMap<String, CellValue>> {
        let features = self.features();
        self.normalized_rows()
            .into_iter()
            .map(|row| features.iter().cloned().zip(row).collect())
            .collect()
    }

    fn compute_normalized(&self) -> Vec<Vec<CellValue>> {
        let features = self.features();
        let column_bounds: Vec<Option<FeatureBounds>> = features
            .iter()
            .map(|f| self.feature_bounds(f))
            .collect();
        self.rows()
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, value)| self.normalize_cell(value, column_bounds[i]))
                    .collect()
            })
            .collect()
    }

    // 1セルを正規化する。非数値はそのまま通す
    fn normalize_cell(&self, value: &CellValue, bounds: Option<FeatureBounds>) -> CellValue {
        let bounds = match bounds {
            Some(b) => b,
            None => return value.clone(),
        };
        let raw = match value.as_f64() {
            Some(v) => v,
            None => return value.clone(),
        };
        let range = bounds.max - bounds.min;
        let scaled = if range == 0.0 {
            // 退化した区間では0に落とす
            0.0
        } else {
            (raw - bounds.min) / range
        };
        let scaled = scaled * self.scale();
        if self.as_integer() {
            CellValue::Int64(scaled as i64)
        } else {
            CellValue::Float64(scaled)
        }
    }
}
