//! Shared JSON views of normalized batches for tool and resource output.

use serde_json::{json, Value};

use analysis_router::{legend, NormalizedBatch};

/// Summary of a batch with its legend, plus up to `limit` points in rank order.
/// `None` includes every point.
pub fn batch_view(batch: &NormalizedBatch, limit: Option<usize>) -> Value {
    let values: Vec<f64> = batch.points.iter().map(|p| p.value).collect();
    let points = match limit {
        Some(n) => batch.top(n),
        None => batch.ranked(),
    };

    json!({
        "endpointId": batch.endpoint_id,
        "targetVariable": batch.target_variable,
        "recordCount": batch.len(),
        "flaggedRecords": batch.flagged_records,
        "breaks": batch.breaks,
        "legend": legend(&batch.breaks, &values, batch.bucket_count),
        "points": points,
    })
}
