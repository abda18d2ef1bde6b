use crate::core::Record;
use crate::utils::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 目前畫面上的搜尋／篩選輸入。空字串代表該條件未啟用。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub search: String,
    pub selections: BTreeMap<String, String>,
    pub weight: String,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn with_selection(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.selections.insert(column.into(), value.into());
        self
    }

    pub fn with_weight(mut self, bucket: impl Into<String>) -> Self {
        self.weight = bucket.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.weight.is_empty()
            && self.selections.values().all(String::is_empty)
    }
}

/// 體重分級，上界包含在內（單位跟著資料欄位走，通常是磅）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightBucket {
    Small,
    Medium,
    Large,
    XLarge,
}

impl WeightBucket {
    pub const ALL: [WeightBucket; 4] = [
        WeightBucket::Small,
        WeightBucket::Medium,
        WeightBucket::Large,
        WeightBucket::XLarge,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WeightBucket::Small => "Small",
            WeightBucket::Medium => "Medium",
            WeightBucket::Large => "Large",
            WeightBucket::XLarge => "X-Large",
        }
    }

    pub fn contains(self, weight: i64) -> bool {
        match self {
            WeightBucket::Small => weight <= 25,
            WeightBucket::Medium => weight > 25 && weight <= 50,
            WeightBucket::Large => weight > 50 && weight <= 75,
            WeightBucket::XLarge => weight > 75,
        }
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|b| b.label().to_string()).collect()
    }
}

impl fmt::Display for WeightBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeightBucket {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeightBucket::ALL
            .into_iter()
            .find(|b| b.label() == s)
            .ok_or_else(|| CatalogError::InvalidConfigValueError {
                field: "weight".to_string(),
                value: s.to_string(),
                reason: format!("Expected one of: {}", WeightBucket::labels().join(", ")),
            })
    }
}

/// 取開頭的整數部分，"45 lbs" -> 45；沒有數字就是 None。位數過多時飽和到 i64 上下限
pub fn parse_weight(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // 只剩全數字，parse 失敗只可能是溢位
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

/// 每個部署的篩選設定：哪些欄位參與搜尋、哪些是下拉選單、哪一欄是體重
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub search_columns: Vec<String>,
    #[serde(default)]
    pub categorical: Vec<String>,
    #[serde(default)]
    pub weight_column: Option<String>,
}

impl FilterSpec {
    /// 依原始順序回傳通過所有已啟用條件的資料
    pub fn apply<'a>(&self, records: &'a [Record], criteria: &Criteria) -> Vec<&'a Record> {
        let needle = criteria.search.to_lowercase();
        let bucket = if criteria.weight.is_empty() {
            None
        } else {
            Some(criteria.weight.parse::<WeightBucket>().ok())
        };

        records
            .iter()
            .filter(|record| {
                self.matches_search(record, &needle)
                    && Self::matches_selections(record, criteria)
                    && self.matches_weight(record, bucket)
            })
            .collect()
    }

    pub fn matches(&self, record: &Record, criteria: &Criteria) -> bool {
        let records = std::slice::from_ref(record);
        !self.apply(records, criteria).is_empty()
    }

    fn matches_search(&self, record: &Record, needle: &str) -> bool {
        needle.is_empty()
            || self
                .search_columns
                .iter()
                .any(|column| record.value(column).to_lowercase().contains(needle))
    }

    fn matches_selections(record: &Record, criteria: &Criteria) -> bool {
        criteria
            .selections
            .iter()
            .filter(|(_, selected)| !selected.is_empty())
            .all(|(column, selected)| record.value(column) == selected)
    }

    // Some(None) 代表選了未知的分級名稱，不會有任何資料符合
    fn matches_weight(&self, record: &Record, bucket: Option<Option<WeightBucket>>) -> bool {
        let Some(bucket) = bucket else {
            return true;
        };

        let weight = self
            .weight_column
            .as_deref()
            .and_then(|column| parse_weight(record.value(column)));

        match (bucket, weight) {
            (Some(bucket), Some(weight)) => bucket.contains(weight),
            _ => false,
        }
    }
}
