//! 二次インデックスのモジュール
//!
//! 特徴量ごとの値→レコード位置のルックアップを提供します。
//! 重複する値は後からスキャンされたレコードが勝ちます。

use std::collections::HashMap;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::table::{DataTable, RecordView};

impl DataTable {
    /// 特徴量にインデックスを張る
    ///
    /// 現在の全レコードを走査して値→レコード位置のマップを構築します。
    /// 重複値は後勝ちです。存在しない特徴量はInvalidFeature、
    /// 欠損値を含む特徴量はMissingValueエラーになります。
    pub fn add_index(&mut self, feature: &str) -> Result<()> {
        let pos = self
            .positions
            .get(feature)
            .copied()
            .ok_or_else(|| Error::InvalidFeature(feature.to_string()))?;
        let mut index: HashMap<String, usize> = HashMap::with_capacity(self.records.len());
        for (i, record) in self.records.iter().enumerate() {
            let value = &record[pos];
            if value.is_missing() {
                return Err(Error::MissingValue(format!(
                    "特徴量 '{}' のレコード {} が欠損しているためインデックスを張れません",
                    feature, i
                )));
            }
            index.insert(value.to_key(), i);
        }
        self.indices.insert(feature.to_string(), index);
        Ok(())
    }

    /// 特徴量にインデックスが張られているか
    pub fn has_index(&self, feature: &str) -> bool {
        self.indices.contains_key(feature)
    }

    /// インデックス経由でレコードをO(1)で引く
    ///
    /// インデックスが存在しない、または値が登録されていない場合は
    /// Noneを返します。
    pub fn find_by(&self, feature: &str, value: &CellValue) -> Option<RecordView<'_>> {
        self.indices
            .get(feature)
            .and_then(|index| index.get(&value.to_key()))
            .and_then(|&pos| self.record(pos))
    }

    /// 特徴量のインデックスを破棄する
    pub fn drop_index(&mut self, feature: &str) -> bool {
        self.indices.remove(feature).is_some()
    }

    // 既存の全インデックスを現在のレコード位置で作り直す。
    // 並べ替えなどでレコード位置が変わった後に呼ばれる。
    // 再構築では欠損値は黙ってスキップされる
    pub(crate) fn rebuild_all_indices(&mut self) {
        let features: Vec<String> = self.indices.keys().cloned().collect();
        for feature in features {
            let pos = match self.positions.get(&feature) {
                Some(&pos) => pos,
                None => {
                    self.indices.remove(&feature);
                    continue;
                }
            };
            let mut index: HashMap<String, usize> = HashMap::with_capacity(self.records.len());
            for (i, record) in self.records.iter().enumerate() {
                let value = &record[pos];
                if !value.is_missing() {
                    index.insert(value.to_key(), i);
                }
            }
            self.indices.insert(feature, index);
        }
    }
}
