//! Structural summaries of CSV uploads
//!
//! Rather than forwarding raw table bytes to the agent, a CSV upload is
//! reduced to a compact description: column names, inferred types, row
//! counts, and basic numeric statistics.

/// Inferred type of a column, by scanning every non-empty value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    fn label(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        }
    }
}

/// Summarize CSV bytes into a human-readable structural description.
///
/// Returns `Err` with the parser's message when the content is not valid
/// CSV (ragged rows, broken quoting); the caller converts that into an
/// extraction-error string.
pub fn summarize_csv(bytes: &[u8]) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        rows.push(record.map_err(|e| e.to_string())?);
    }

    let mut summary = format!("Columns: {}, Rows: {}\n", headers.len(), rows.len());
    for (index, name) in headers.iter().enumerate() {
        let values: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter(|v| !v.trim().is_empty())
            .collect();

        let column_type = infer_type(&values);
        match column_type {
            ColumnType::Integer | ColumnType::Float => {
                let numbers: Vec<f64> = values
                    .iter()
                    .filter_map(|v| v.trim().parse::<f64>().ok())
                    .collect();
                let (min, max, mean) = stats(&numbers);
                summary.push_str(&format!(
                    "- {} ({}): {} non-empty, min {:.2}, max {:.2}, mean {:.2}\n",
                    name,
                    column_type.label(),
                    values.len(),
                    min,
                    max,
                    mean
                ));
            }
            ColumnType::Text => {
                summary.push_str(&format!(
                    "- {} (text): {} non-empty\n",
                    name,
                    values.len()
                ));
            }
        }
    }

    Ok(summary)
}

/// Infer a column type: all-integer beats all-float beats text.
/// Columns with no values at all are reported as text.
fn infer_type(values: &[&str]) -> ColumnType {
    if values.is_empty() {
        return ColumnType::Text;
    }
    if values.iter().all(|v| v.trim().parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if values.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
        return ColumnType::Float;
    }
    ColumnType::Text
}

fn stats(numbers: &[f64]) -> (f64, f64, f64) {
    if numbers.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
    (min, max, mean)
}
