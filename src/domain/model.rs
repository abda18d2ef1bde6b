use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::CatalogError;

/// 一列資料：欄位名稱 -> 儲存格字串。欄位由表頭決定，沒有固定 schema。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.data.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.data.get(column).map(String::as_str)
    }

    /// 欄位不存在時回傳空字串
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn has_value(&self, column: &str) -> bool {
        !self.value(column).is_empty()
    }

    /// 依表頭順序輸出欄位，讓 JSON 匯出每次都一樣
    pub fn in_column_order<'a>(&'a self, columns: &'a [String]) -> OrderedRecord<'a> {
        OrderedRecord {
            record: self,
            columns,
        }
    }
}

pub struct OrderedRecord<'a> {
    record: &'a Record,
    columns: &'a [String],
}

impl Serialize for OrderedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column, self.record.value(column))?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 每個部署固定一種分隔符號，不做自動偵測
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Tab => write!(f, "tab"),
        }
    }
}

impl FromStr for Delimiter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comma" | "csv" | "," => Ok(Delimiter::Comma),
            "tab" | "tsv" => Ok(Delimiter::Tab),
            other => Err(CatalogError::InvalidConfigValueError {
                field: "feed.delimiter".to_string(),
                value: other.to_string(),
                reason: "Expected 'comma' or 'tab'".to_string(),
            }),
        }
    }
}

/// 解析結果：表頭順序 + 資料列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl ParsedFeed {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 下拉選單的一組選項（依首次出現順序、去重、排除空值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub column: String,
    pub values: Vec<String>,
}
