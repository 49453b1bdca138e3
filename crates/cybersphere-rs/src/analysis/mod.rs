//! Descriptive statistics over tabular JSON: column summaries, a
//! mean + 2·stddev anomaly threshold, and first-vs-last trend signs.

use anyhow::bail;
use serde_json::{json, Map, Value};

/// A parsed column table: ordered (name, values) pairs of equal length.
struct Table {
    columns: Vec<(String, Vec<Value>)>,
    rows: usize,
}

fn to_table(data: &Value) -> anyhow::Result<Table> {
    let Some(object) = data.as_object() else {
        bail!("data must be an object of column arrays");
    };

    let mut columns = Vec::with_capacity(object.len());
    let mut rows = None;
    for (name, values) in object {
        let Some(values) = values.as_array() else {
            bail!("column {name} is not an array");
        };
        match rows {
            None => rows = Some(values.len()),
            Some(n) if n != values.len() => bail!("All arrays must be of the same length"),
            Some(_) => {}
        }
        columns.push((name.clone(), values.clone()));
    }

    Ok(Table {
        columns,
        rows: rows.unwrap_or(0),
    })
}

fn numeric_values(values: &[Value]) -> Option<Vec<f64>> {
    values.iter().map(Value::as_f64).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); undefined for fewer than two
/// observations.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolation quantile over a sorted copy of the values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

fn row_record(table: &Table, index: usize) -> Value {
    let mut record = Map::new();
    for (name, values) in &table.columns {
        record.insert(name.clone(), values[index].clone());
    }
    Value::Object(record)
}

/// Row/column counts plus a per-numeric-column describe summary.
pub fn process_data(data: &Value) -> anyhow::Result<Value> {
    let table = to_table(data)?;
    let columns: Vec<&String> = table.columns.iter().map(|(name, _)| name).collect();

    let mut summary = Map::new();
    for (name, values) in &table.columns {
        let Some(numeric) = numeric_values(values) else {
            continue;
        };
        if numeric.is_empty() {
            continue;
        }
        let mut sorted = numeric.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let std = match sample_std(&numeric) {
            Some(std) => json!(std),
            None => Value::Null,
        };
        summary.insert(
            name.clone(),
            json!({
                "count": numeric.len(),
                "mean": mean(&numeric),
                "std": std,
                "min": sorted[0],
                "25%": quantile(&sorted, 0.25),
                "50%": quantile(&sorted, 0.5),
                "75%": quantile(&sorted, 0.75),
                "max": sorted[sorted.len() - 1],
            }),
        );
    }

    Ok(json!({
        "rows": table.rows,
        "columns": columns,
        "summary": summary,
    }))
}

/// Values strictly above mean + 2·stddev are anomalous; the offending
/// full rows are echoed back per column.
pub fn detect_anomalies(data: &Value) -> anyhow::Result<Value> {
    let table = to_table(data)?;
    let mut anomalies = Vec::new();

    for (name, values) in &table.columns {
        let Some(numeric) = numeric_values(values) else {
            continue;
        };
        let Some(std) = sample_std(&numeric) else {
            continue;
        };
        let threshold = mean(&numeric) + 2.0 * std;

        let offending: Vec<Value> = numeric
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > threshold)
            .map(|(i, _)| row_record(&table, i))
            .collect();

        if !offending.is_empty() {
            anomalies.push(json!({
                "column": name,
                "anomalies": offending,
            }));
        }
    }

    Ok(json!({ "anomalies": anomalies }))
}

/// Trend sign from first vs last value only; columns with fewer than two
/// values carry no trend.
pub fn predict_trends(data: &Value) -> anyhow::Result<Value> {
    let table = to_table(data)?;
    let mut trends = Map::new();

    for (name, values) in &table.columns {
        let Some(numeric) = numeric_values(values) else {
            continue;
        };
        if numeric.len() < 2 {
            continue;
        }
        let first = numeric[0];
        let last = numeric[numeric.len() - 1];
        let trend = if last > first { "increasing" } else { "decreasing" };
        trends.insert(
            name.clone(),
            json!({
                "trend": trend,
                "change": last - first,
            }),
        );
    }

    Ok(json!({ "trends": trends }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        json!({
            "metric1": [1, 2, 3, 4, 5, 100],
            "metric2": [10, 20, 30, 40, 50, 60],
            "metric3": [55, 45, 35, 25, 15, 5],
        })
    }

    #[test]
    fn process_reports_rows_columns_and_numeric_summary() {
        let result = process_data(&sample()).expect("process should work");
        assert_eq!(result["rows"], 6);
        assert_eq!(
            result["columns"],
            json!(["metric1", "metric2", "metric3"])
        );
        assert_eq!(result["summary"]["metric2"]["count"], 6);
        assert_eq!(result["summary"]["metric2"]["mean"], 35.0);
        assert_eq!(result["summary"]["metric2"]["min"], 10.0);
        assert_eq!(result["summary"]["metric2"]["max"], 60.0);
        assert_eq!(result["summary"]["metric2"]["50%"], 35.0);
    }

    #[test]
    fn non_numeric_columns_are_listed_but_not_summarized() {
        let data = json!({
            "label": ["a", "b", "c"],
            "value": [1, 2, 3],
        });
        let result = process_data(&data).expect("process should work");
        assert_eq!(result["columns"], json!(["label", "value"]));
        assert!(result["summary"]["value"].is_object());
        assert!(result["summary"].get("label").is_none());
    }

    #[test]
    fn single_row_std_is_null() {
        let data = json!({ "value": [42] });
        let result = process_data(&data).expect("process should work");
        assert!(result["summary"]["value"]["std"].is_null());
        assert_eq!(result["summary"]["value"]["mean"], 42.0);
    }

    #[test]
    fn mismatched_column_lengths_are_a_fault() {
        let data = json!({
            "a": [1, 2, 3],
            "b": [1],
        });
        let err = process_data(&data).expect_err("mismatch should fail");
        assert!(err.to_string().contains("same length"));
    }

    #[test]
    fn outlier_row_is_detected_as_anomaly() {
        let result = detect_anomalies(&sample()).expect("detection should work");
        let anomalies = result["anomalies"].as_array().expect("array");
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0]["column"], "metric1");
        let rows = anomalies[0]["anomalies"].as_array().expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["metric1"], 100);
        assert_eq!(rows[0]["metric2"], 60);
    }

    #[test]
    fn uniform_data_has_no_anomalies() {
        let data = json!({ "steady": [5, 5, 5, 5, 5] });
        let result = detect_anomalies(&data).expect("detection should work");
        assert_eq!(result["anomalies"].as_array().expect("array").len(), 0);
    }

    #[test]
    fn trends_compare_first_and_last_values() {
        let result = predict_trends(&sample()).expect("trends should work");
        assert_eq!(result["trends"]["metric1"]["trend"], "increasing");
        assert_eq!(result["trends"]["metric1"]["change"], 99.0);
        assert_eq!(result["trends"]["metric3"]["trend"], "decreasing");
        assert_eq!(result["trends"]["metric3"]["change"], -50.0);
    }
}
