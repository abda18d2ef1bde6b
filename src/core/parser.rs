use crate::core::{Delimiter, ParsedFeed, Record};
use crate::utils::error::{CatalogError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// 解析後逐列套用的保留條件（例如只留 Available == "Yes"）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowFilter {
    ColumnEquals { column: String, value: String },
}

impl RowFilter {
    pub fn column_equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        RowFilter::ColumnEquals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn keeps(&self, record: &Record) -> bool {
        match self {
            RowFilter::ColumnEquals { column, value } => record.value(column) == value,
        }
    }
}

/// 第一行是表頭，其餘每個非空白行產生一筆 Record。
///
/// 不支援引號跳脫：欄位值裡的分隔符號一律視為欄位邊界。
/// 短列補空字串，多出來的欄位直接忽略，永遠不會失敗。
pub fn parse(text: &str, delimiter: Delimiter) -> ParsedFeed {
    parse_with_filter(text, delimiter, None)
}

pub fn parse_with_filter(text: &str, delimiter: Delimiter, filter: Option<&RowFilter>) -> ParsedFeed {
    let sep = delimiter.as_char();
    let mut lines = text.split('\n');

    let columns: Vec<String> = match lines.next() {
        Some(header) if !header.trim().is_empty() => {
            header.split(sep).map(|h| h.trim().to_string()).collect()
        }
        _ => return ParsedFeed::default(),
    };

    let mut records = Vec::new();
    let mut skipped_blank = 0usize;
    let mut excluded = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            skipped_blank += 1;
            continue;
        }

        let mut values = line.split(sep);
        let record: Record = columns
            .iter()
            .map(|column| {
                let value = values.next().map(str::trim).unwrap_or("");
                (column.clone(), value.to_string())
            })
            .collect();

        if let Some(filter) = filter {
            if !filter.keeps(&record) {
                excluded += 1;
                continue;
            }
        }

        records.push(record);
    }

    tracing::debug!(
        "Parsed {} records ({} columns, {} blank lines skipped, {} rows excluded)",
        records.len(),
        columns.len(),
        skipped_blank,
        excluded
    );

    ParsedFeed { columns, records }
}

/// 以同一個分隔符號重新輸出表頭與資料列（不加引號，與 parse 對稱）
pub fn encode(feed: &ParsedFeed, delimiter: Delimiter) -> Result<String> {
    encode_records(&feed.columns, feed.records.iter(), delimiter)
}

pub fn encode_records<'a, I>(columns: &[String], records: I, delimiter: Delimiter) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.value(c)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CatalogError::IoError(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| CatalogError::RenderError {
        message: format!("Encoded feed is not valid UTF-8: {}", e),
    })
}
