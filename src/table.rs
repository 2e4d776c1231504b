use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::card::CardSize;
use crate::card_table::ColumnStats;
use crate::domain::CardError;

const NULL_VALUE: &str = "∅";
const NEWLINE_MARKER: &str = " ↵ ";

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
    WORKBOOK,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One source column with all values rendered as strings.
#[derive(Debug, Clone)]
pub struct Column {
    pub idx: usize,
    pub name: String,
    pub dtype: DataType,
    pub data: Vec<String>,
}

impl Column {
    pub fn as_string(&self) -> String {
        format!(
            "{} \"{}\", {}, # rows {}",
            self.idx,
            self.name,
            self.dtype,
            self.data.len(),
        )
    }

    pub fn size(&self) -> CardSize {
        CardSize::from_values(self.data.iter().map(String::as_str))
    }
}

/// An already parsed table: named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    #[instrument]
    pub fn load(path: PathBuf) -> Result<Self, CardError> {
        let file_info = Table::get_file_info(path)?;
        debug!(
            "Loading {:?} file of {} bytes",
            file_info.file_type, file_info.file_size
        );
        let start_time = Instant::now();

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();

        let table = match file_info.file_type {
            FileType::CSV => Table::from_lazy(name, Table::load_csv(&file_info.path)?)?,
            FileType::PARQUET => Table::from_lazy(name, Table::load_parquet(&file_info.path)?)?,
            FileType::ARROW => Table::from_lazy(name, Table::load_arrow(&file_info.path)?)?,
            FileType::WORKBOOK => Table::load_workbook(name, &file_info.path)?,
        };

        info!(
            "Loading {} columns x {} rows took {}ms ...",
            table.columns.len(),
            table.nrows(),
            start_time.elapsed().as_millis()
        );
        Ok(table)
    }

    /// Builds a table from in-memory columns. Missing cells of shorter
    /// columns are filled with the null marker.
    pub fn from_columns(name: impl Into<String>, columns: Vec<(String, Vec<String>)>) -> Self {
        let nrows = columns.iter().map(|(_, d)| d.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(idx, (name, mut data))| {
                data.resize(nrows, NULL_VALUE.to_string());
                Column {
                    idx,
                    name,
                    dtype: DataType::String,
                    data,
                }
            })
            .collect();
        Table {
            name: name.into(),
            columns,
        }
    }

    /// Converts every column to strings, each column on its own rayon task.
    pub fn from_dataframe(name: impl Into<String>, df: &DataFrame) -> Result<Self, CardError> {
        let c_: Result<Vec<Column>, _> = df
            .get_column_names()
            .par_iter()
            .enumerate()
            .map(|(idx, col_name)| Self::load_column(df, idx, col_name))
            .collect();
        let columns = c_?;
        for c in columns.iter() {
            debug!("Column: {}", c.as_string());
        }
        Ok(Table {
            name: name.into(),
            columns,
        })
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    pub fn column_stats(&self) -> Vec<ColumnStats> {
        self.columns
            .par_iter()
            .map(|c| ColumnStats::new(c.name.clone(), c.size()))
            .collect()
    }

    fn from_lazy(name: String, frame: LazyFrame) -> Result<Self, CardError> {
        let df = frame.collect()?;
        Table::from_dataframe(name, &df)
    }

    fn render_value(value: Option<&str>) -> String {
        match value {
            Some(s) => s.replace("\r\n", NEWLINE_MARKER).replace('\n', NEWLINE_MARKER),
            None => String::from(NULL_VALUE),
        }
    }

    fn load_column(df: &DataFrame, idx: usize, col_name: &str) -> Result<Column, PolarsError> {
        let original_dtype = df.column(col_name)?.dtype().clone();

        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let data = series.into_iter().map(Table::render_value).collect();

        Ok(Column {
            idx,
            name: col_name.to_string(),
            dtype: original_dtype,
            data,
        })
    }

    // The first row of the first sheet holds the column names.
    fn load_workbook(name: String, path: &Path) -> Result<Self, CardError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| CardError::LoadingFailed("workbook has no sheets".into()))??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .enumerate()
                .map(|(idx, cell)| match cell {
                    Data::Empty => format!("column_{}", idx + 1),
                    c => c.to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let mut data: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (cidx, values) in data.iter_mut().enumerate() {
                let value = match row.get(cidx) {
                    None | Some(Data::Empty) => String::from(NULL_VALUE),
                    Some(cell) => Table::render_value(Some(cell.to_string().as_str())),
                };
                values.push(value);
            }
        }

        Ok(Table::from_columns(
            name,
            headers.into_iter().zip(data).collect(),
        ))
    }

    fn detect_file_type(path: &Path) -> Result<FileType, CardError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            Some("XLSX") | Some("XLS") | Some("XLSM") | Some("XLSB") | Some("ODS") => {
                Ok(FileType::WORKBOOK)
            }
            _ => Err(CardError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, CardError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CardError::FileNotFound,
            ErrorKind::PermissionDenied => CardError::PermissionDenied,
            _ => CardError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(CardError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Table::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn detects_file_types_case_insensitive() {
        assert_eq!(
            Table::detect_file_type(Path::new("a.CSV")).unwrap(),
            FileType::CSV
        );
        assert_eq!(
            Table::detect_file_type(Path::new("a.pq")).unwrap(),
            FileType::PARQUET
        );
        assert_eq!(
            Table::detect_file_type(Path::new("a.feather")).unwrap(),
            FileType::ARROW
        );
        assert_eq!(
            Table::detect_file_type(Path::new("a.xlsx")).unwrap(),
            FileType::WORKBOOK
        );
        assert!(matches!(
            Table::detect_file_type(Path::new("a.txt")),
            Err(CardError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            Table::load(fixture("does_not_exist.csv")),
            Err(CardError::FileNotFound)
        ));
    }

    #[test]
    fn directory_is_not_a_file() {
        assert!(matches!(
            Table::load(fixture("")),
            Err(CardError::LoadingFailed(_))
        ));
    }

    #[test]
    fn loads_csv_fixture() {
        let table = Table::load(fixture("people.csv")).unwrap();
        assert_eq!(table.name, "people.csv");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "age", "city", "notes"]);
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.columns[1].data[0], "Ada");
        assert_eq!(table.columns[0].dtype, DataType::Int64);
        assert_eq!(table.columns[3].data[2], NULL_VALUE);
    }

    #[test]
    fn loads_workbook_fixture() {
        let table = Table::load(fixture("people.xlsx")).unwrap();
        assert_eq!(table.name, "people.xlsx");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "column_2", "age"]);
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.columns[0].data, ["Ada", "Grace"]);
        // The last row only fills its first cell
        assert_eq!(table.columns[1].data, ["x", NULL_VALUE]);
        assert_eq!(table.columns[2].data, ["36", NULL_VALUE]);
    }

    #[test]
    fn empty_workbook_sheet_has_no_columns() {
        let table = Table::load(fixture("empty.xlsx")).unwrap();
        assert!(table.columns.is_empty());
        assert!(table.column_stats().is_empty());
    }

    #[test]
    fn dataframe_columns_keep_order_and_render_nulls() {
        let df = polars::df!(
            "a" => [Some(1i64), None, Some(300)],
            "b" => ["x", "line\nbreak", "z"],
        )
        .unwrap();
        let table = Table::from_dataframe("frame", &df).unwrap();
        assert_eq!(table.columns[0].idx, 0);
        assert_eq!(table.columns[1].idx, 1);
        assert_eq!(table.columns[0].data, ["1", NULL_VALUE, "300"]);
        assert_eq!(table.columns[1].data[1], "line ↵ break");
    }

    #[test]
    fn column_stats_follow_column_order() {
        let table = Table::from_columns(
            "mem",
            vec![
                ("short".to_string(), vec!["a".to_string(), "abc".to_string()]),
                ("long".to_string(), vec!["abcdef".to_string()]),
            ],
        );
        let stats = table.column_stats();
        assert_eq!(stats[0], ColumnStats::new("short", CardSize { min: 1, avg: 2, max: 3 }));
        assert_eq!(stats[1].title, "long");
        assert_eq!(stats[1].size.max, 6);
        assert_eq!(table.columns[1].data[1], NULL_VALUE);
    }
}
