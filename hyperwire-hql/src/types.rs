//! Typed views over the HQL result records.

use std::fmt;
use std::sync::Arc;

use hyperwire_core::{Record, RecordType, Result, StructDescriptor, Value, WireError};

use crate::descriptors::{schema, FLAG_INSERT};

/// Kind of mutation a key describes.
///
/// Codes outside the assigned set are kept as [`KeyFlag::Other`] so that a
/// key decoded from a newer peer encodes back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyFlag {
    /// Deletes a whole row (code 0).
    DeleteRow,
    /// Deletes a column family (code 1).
    DeleteCf,
    /// Deletes every version of a cell (code 2).
    DeleteCell,
    /// Deletes one version of a cell (code 3).
    DeleteCellVersion,
    /// Inserts a value (code 255).
    #[default]
    Insert,
    /// An unassigned code.
    Other(i32),
}

impl KeyFlag {
    /// Converts a wire value. Unassigned codes become [`KeyFlag::Other`].
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::DeleteRow,
            1 => Self::DeleteCf,
            2 => Self::DeleteCell,
            3 => Self::DeleteCellVersion,
            FLAG_INSERT => Self::Insert,
            other => Self::Other(other),
        }
    }

    /// Returns the wire value of this flag.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::DeleteRow => 0,
            Self::DeleteCf => 1,
            Self::DeleteCell => 2,
            Self::DeleteCellVersion => 3,
            Self::Insert => FLAG_INSERT,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for KeyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DeleteRow => "DELETE_ROW",
            Self::DeleteCf => "DELETE_CF",
            Self::DeleteCell => "DELETE_CELL",
            Self::DeleteCellVersion => "DELETE_CELL_VERSION",
            Self::Insert => "INSERT",
            Self::Other(code) => return write!(f, "{}", code),
        };
        f.write_str(name)
    }
}

fn strings(values: &[Value], what: &str) -> Result<Vec<String>> {
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| WireError::Schema(format!("{} holds a {}", what, v.kind_name())))
        })
        .collect()
}

fn set_opt(record: &mut Record, name: &str, value: Option<Value>) -> Result<()> {
    match value {
        Some(v) => record.set(name, v),
        None => record.clear(name),
    }
}

/// Writes a typed view through its generic record.
fn display<T: RecordType>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let record = value.to_record().map_err(|_| fmt::Error)?;
    fmt::Display::fmt(&record, f)
}

/// Identifies one version of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Key {
    /// Row key.
    pub row: Option<String>,
    /// Column family name.
    pub column_family: Option<String>,
    /// Column qualifier within the family.
    pub column_qualifier: Option<String>,
    /// Cell timestamp in nanoseconds.
    pub timestamp: Option<i64>,
    /// Revision number assigned by the server.
    pub revision: Option<i64>,
    /// Mutation kind; absent on the wire means insert.
    pub flag: KeyFlag,
}

impl RecordType for Key {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        Ok(Arc::clone(&schema()?.key))
    }

    fn to_record(&self) -> Result<Record> {
        let mut record = Record::new(&Self::descriptor()?);
        set_opt(&mut record, "row", self.row.clone().map(Value::String))?;
        set_opt(&mut record, "column_family", self.column_family.clone().map(Value::String))?;
        set_opt(
            &mut record,
            "column_qualifier",
            self.column_qualifier.clone().map(Value::String),
        )?;
        set_opt(&mut record, "timestamp", self.timestamp.map(Value::I64))?;
        set_opt(&mut record, "revision", self.revision.map(Value::I64))?;
        record.set("flag", Value::I32(self.flag.as_i32()))?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let flag = record
            .get_i32("flag")?
            .map_or(KeyFlag::Insert, KeyFlag::from_i32);
        Ok(Self {
            row: record.get_string("row")?.map(str::to_string),
            column_family: record.get_string("column_family")?.map(str::to_string),
            column_qualifier: record.get_string("column_qualifier")?.map(str::to_string),
            timestamp: record.get_i64("timestamp")?,
            revision: record.get_i64("revision")?,
            flag,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f)
    }
}

/// A key and its value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// Address of the cell.
    pub key: Option<Key>,
    /// Raw cell contents.
    pub value: Option<Vec<u8>>,
}

impl RecordType for Cell {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        Ok(Arc::clone(&schema()?.cell))
    }

    fn to_record(&self) -> Result<Record> {
        let mut record = Record::new(&Self::descriptor()?);
        if let Some(key) = &self.key {
            record.set("key", key.to_record()?)?;
        }
        set_opt(&mut record, "value", self.value.clone().map(Value::Binary))?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            key: record.get_struct("key")?.map(Key::from_record).transpose()?,
            value: record.get_binary("value")?.map(<[u8]>::to_vec),
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f)
    }
}

/// Result of an HQL query with cells as structs.
///
/// `results` carries metadata query output, `cells` the rows of a buffered
/// query, `scanner` the id of an open scanner for unbuffered queries and
/// `mutator` the id of an unflushed mutator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HqlResult {
    /// Metadata query output lines.
    pub results: Option<Vec<String>>,
    /// Cells of a buffered query.
    pub cells: Option<Vec<Cell>>,
    /// Scanner id of an unbuffered query.
    pub scanner: Option<i64>,
    /// Mutator id of an unflushed insert.
    pub mutator: Option<i64>,
}

impl RecordType for HqlResult {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        Ok(Arc::clone(&schema()?.hql_result))
    }

    fn to_record(&self) -> Result<Record> {
        let mut record = Record::new(&Self::descriptor()?);
        set_opt(&mut record, "results", self.results.as_ref().map(Value::string_list))?;
        if let Some(cells) = &self.cells {
            let cells = cells
                .iter()
                .map(|c| c.to_record().map(Value::Struct))
                .collect::<Result<Vec<_>>>()?;
            record.set("cells", Value::List(cells))?;
        }
        set_opt(&mut record, "scanner", self.scanner.map(Value::I64))?;
        set_opt(&mut record, "mutator", self.mutator.map(Value::I64))?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let cells = match record.get_list("cells")? {
            None => None,
            Some(items) => Some(
                items
                    .iter()
                    .map(|v| match v.as_struct() {
                        Some(cell) => Cell::from_record(cell),
                        None => Err(WireError::Schema(format!(
                            "cells holds a {}",
                            v.kind_name()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(Self {
            results: record
                .get_list("results")?
                .map(|v| strings(v, "results"))
                .transpose()?,
            cells,
            scanner: record.get_i64("scanner")?,
            mutator: record.get_i64("mutator")?,
        })
    }
}

impl fmt::Display for HqlResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f)
    }
}

/// Fields of the two result forms that carry cells as string arrays.
struct ArrayFields {
    results: Option<Vec<String>>,
    cells: Option<Vec<Vec<String>>>,
    scanner: Option<i64>,
    mutator: Option<i64>,
}

impl ArrayFields {
    fn to_record(&self, descriptor: &Arc<StructDescriptor>) -> Result<Record> {
        let mut record = Record::new(descriptor);
        set_opt(&mut record, "results", self.results.as_ref().map(Value::string_list))?;
        set_opt(
            &mut record,
            "cells",
            self.cells
                .as_ref()
                .map(|rows| Value::List(rows.iter().map(Value::string_list).collect())),
        )?;
        set_opt(&mut record, "scanner", self.scanner.map(Value::I64))?;
        set_opt(&mut record, "mutator", self.mutator.map(Value::I64))?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let cells = match record.get_list("cells")? {
            None => None,
            Some(rows) => Some(
                rows.iter()
                    .map(|row| match row.as_list() {
                        Some(items) => strings(items, "cell"),
                        None => Err(WireError::Schema(format!(
                            "cells holds a {}",
                            row.kind_name()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(Self {
            results: record
                .get_list("results")?
                .map(|v| strings(v, "results"))
                .transpose()?,
            cells,
            scanner: record.get_i64("scanner")?,
            mutator: record.get_i64("mutator")?,
        })
    }
}

/// Result of an HQL query with each cell as
/// `[row, column_family, column_qualifier, value, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HqlResult2 {
    /// Metadata query output lines.
    pub results: Option<Vec<String>>,
    /// Cells of a buffered query, one string array each.
    pub cells: Option<Vec<Vec<String>>>,
    /// Scanner id of an unbuffered query.
    pub scanner: Option<i64>,
    /// Mutator id of an unflushed insert.
    pub mutator: Option<i64>,
}

impl RecordType for HqlResult2 {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        Ok(Arc::clone(&schema()?.hql_result2))
    }

    fn to_record(&self) -> Result<Record> {
        ArrayFields {
            results: self.results.clone(),
            cells: self.cells.clone(),
            scanner: self.scanner,
            mutator: self.mutator,
        }
        .to_record(&Self::descriptor()?)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let fields = ArrayFields::from_record(record)?;
        Ok(Self {
            results: fields.results,
            cells: fields.cells,
            scanner: fields.scanner,
            mutator: fields.mutator,
        })
    }
}

impl fmt::Display for HqlResult2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f)
    }
}

/// Same layout as [`HqlResult2`] under its own struct name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HqlResultAsArrays {
    /// Metadata query output lines.
    pub results: Option<Vec<String>>,
    /// Cells of a buffered query, one string array each.
    pub cells: Option<Vec<Vec<String>>>,
    /// Scanner id of an unbuffered query.
    pub scanner: Option<i64>,
    /// Mutator id of an unflushed insert.
    pub mutator: Option<i64>,
}

impl RecordType for HqlResultAsArrays {
    fn descriptor() -> Result<Arc<StructDescriptor>> {
        Ok(Arc::clone(&schema()?.hql_result_as_arrays))
    }

    fn to_record(&self) -> Result<Record> {
        ArrayFields {
            results: self.results.clone(),
            cells: self.cells.clone(),
            scanner: self.scanner,
            mutator: self.mutator,
        }
        .to_record(&Self::descriptor()?)
    }

    fn from_record(record: &Record) -> Result<Self> {
        let fields = ArrayFields::from_record(record)?;
        Ok(Self {
            results: fields.results,
            cells: fields.cells,
            scanner: fields.scanner,
            mutator: fields.mutator,
        })
    }
}

impl fmt::Display for HqlResultAsArrays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display(self, f)
    }
}

impl From<HqlResult2> for HqlResultAsArrays {
    fn from(r: HqlResult2) -> Self {
        Self {
            results: r.results,
            cells: r.cells,
            scanner: r.scanner,
            mutator: r.mutator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Key {
        Key {
            row: Some("row1".to_string()),
            column_family: Some("cf".to_string()),
            column_qualifier: Some("q".to_string()),
            timestamp: Some(1_300_000_000_000_000_000),
            revision: None,
            flag: KeyFlag::Insert,
        }
    }

    #[test]
    fn test_key_flag_codes() {
        for flag in [
            KeyFlag::DeleteRow,
            KeyFlag::DeleteCf,
            KeyFlag::DeleteCell,
            KeyFlag::DeleteCellVersion,
            KeyFlag::Insert,
        ] {
            assert_eq!(KeyFlag::from_i32(flag.as_i32()), flag);
        }
        assert_eq!(KeyFlag::Insert.as_i32(), 255);
        assert_eq!(KeyFlag::from_i32(4), KeyFlag::Other(4));
        assert_eq!(KeyFlag::Other(4).as_i32(), 4);
        assert_eq!(KeyFlag::Other(-1).to_string(), "-1");
        assert_eq!(KeyFlag::default(), KeyFlag::Insert);
        assert_eq!(KeyFlag::DeleteCellVersion.to_string(), "DELETE_CELL_VERSION");
    }

    #[test]
    fn test_key_record_conversion() {
        let record = key().to_record().unwrap();
        assert_eq!(record.get_string("row").unwrap(), Some("row1"));
        assert_eq!(record.get_i64("revision").unwrap(), None);
        assert_eq!(record.get_i32("flag").unwrap(), Some(255));
        assert_eq!(Key::from_record(&record).unwrap(), key());
    }

    #[test]
    fn test_key_absent_flag_is_insert() {
        let mut record = key().to_record().unwrap();
        record.clear("flag").unwrap();
        assert_eq!(Key::from_record(&record).unwrap().flag, KeyFlag::Insert);
    }

    #[test]
    fn test_key_unknown_flag_preserved() {
        let mut record = key().to_record().unwrap();
        record.set("flag", 7).unwrap();
        let decoded = Key::from_record(&record).unwrap();
        assert_eq!(decoded.flag, KeyFlag::Other(7));
        assert_eq!(decoded.to_record().unwrap().get_i32("flag").unwrap(), Some(7));
    }

    #[test]
    fn test_cell_display() {
        let cell = Cell {
            key: Some(Key {
                row: Some("r".to_string()),
                ..Key::default()
            }),
            value: Some(b"v1".to_vec()),
        };
        assert_eq!(cell.to_string(), r#"Cell(key=Key(row="r", flag=255), value=b"v1")"#);
    }

    #[test]
    fn test_hql_result_display() {
        let result = HqlResult {
            results: Some(vec!["a".to_string(), "b".to_string()]),
            cells: Some(Vec::new()),
            scanner: Some(42),
            mutator: None,
        };
        assert_eq!(
            result.to_string(),
            r#"HqlResult(results=["a", "b"], cells=[], scanner=42)"#
        );
    }

    #[test]
    fn test_array_forms_convert() {
        let two = HqlResult2 {
            cells: Some(vec![vec!["r".to_string(), "cf".to_string()]]),
            ..HqlResult2::default()
        };
        let arrays: HqlResultAsArrays = two.clone().into();
        assert_eq!(arrays.cells, two.cells);
        assert_eq!(arrays.to_record().unwrap().type_name(), "HqlResultAsArrays");
        assert_eq!(two.to_record().unwrap().type_name(), "HqlResult2");
    }
}
