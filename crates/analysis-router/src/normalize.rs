//! Record normalization: raw endpoint records to ranked, classified data points.
//!
//! One generic algorithm parameterized by [`EndpointSignature`]. Records are
//! extracted independently in parallel, then breaks, ranks and categories are
//! computed once the whole batch is available.

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::quantile::{classify, compute_breaks, effective_bucket_count, DEFAULT_BUCKET_COUNT};
use crate::registry::EndpointSignature;
use crate::types::{
    GeographicDataPoint, NormalizedBatch, RawRecord, IDENTITY_MISSING, SCORE_EXTRACTION_FAILED,
    SCORE_SOURCE_FIELD,
};

/// Raw fields passed through as the point's geometry reference.
const GEOMETRY_FIELDS: &[&str] = &["coordinates", "geometry", "centroid"];

/// Converts raw records into [`GeographicDataPoint`]s.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    bucket_count: usize,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}

/// Per-record extraction result before batch-level rank/category assignment.
struct Extracted {
    area_id: String,
    area_name: String,
    value: f64,
    coordinates: Option<Value>,
    properties: Map<String, Value>,
}

impl RecordNormalizer {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            bucket_count: effective_bucket_count(bucket_count),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Normalize a single record outside of a batch.
    ///
    /// Rank comes from `rank_hint` (at least 1) and the category is 0, since
    /// buckets only exist relative to a full distribution.
    pub fn normalize(
        &self,
        record: &RawRecord,
        signature: &EndpointSignature,
        rank_hint: usize,
    ) -> GeographicDataPoint {
        let extracted = extract(record, signature, rank_hint.saturating_sub(1));
        build_point(extracted, signature, rank_hint.max(1), 0)
    }

    /// Normalize every record of an endpoint dataset.
    ///
    /// The output has exactly one point per input record, in input order.
    pub fn normalize_batch(
        &self,
        records: &[RawRecord],
        signature: &EndpointSignature,
    ) -> NormalizedBatch {
        // Fan out: records are independent.
        let extracted: Vec<Extracted> = records
            .par_iter()
            .enumerate()
            .map(|(i, record)| extract(record, signature, i))
            .collect();

        // Fan in: breaks, ranks and categories need the whole distribution.
        let values: Vec<f64> = extracted.iter().map(|e| e.value).collect();
        let breaks = compute_breaks(&values);
        let ranks = dense_ranks(&values);

        let flagged_records = extracted
            .iter()
            .filter(|e| e.properties.contains_key(SCORE_EXTRACTION_FAILED))
            .count();
        if flagged_records > 0 {
            tracing::warn!(
                "{} of {} records for '{}' had no readable score field (tried {:?}); defaulted to 0",
                flagged_records,
                records.len(),
                signature.endpoint_id,
                signature.score_field_candidates
            );
        }

        let points: Vec<GeographicDataPoint> = extracted
            .into_iter()
            .zip(ranks)
            .map(|(e, rank)| {
                let category = classify(e.value, &breaks, self.bucket_count);
                build_point(e, signature, rank, category)
            })
            .collect();

        debug_assert_eq!(points.len(), records.len());

        tracing::debug!(
            "Normalized {} records for '{}' (breaks {:?})",
            points.len(),
            signature.endpoint_id,
            breaks.0
        );

        NormalizedBatch {
            endpoint_id: signature.endpoint_id.clone(),
            target_variable: signature.target_variable_name.clone(),
            points,
            breaks,
            bucket_count: self.bucket_count,
            flagged_records,
        }
    }
}

/// 1-based ranks by value descending; equal values keep input order.
fn dense_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // `sort_by` is stable, so ties stay in input order.
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0; values.len()];
    for (position, idx) in order.into_iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

fn extract(record: &RawRecord, signature: &EndpointSignature, index: usize) -> Extracted {
    let geometry_field = GEOMETRY_FIELDS
        .iter()
        .copied()
        .find(|f| record.get(*f).is_some_and(|v| !v.is_null()));
    let coordinates = geometry_field.and_then(|f| record.get(f).cloned());

    let mut properties: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != geometry_field)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let score = signature
        .score_field_candidates
        .iter()
        .find_map(|field| record.get(field).and_then(numeric).map(|v| (field, v)));

    let value = match score {
        Some((field, v)) => {
            properties.insert(SCORE_SOURCE_FIELD.to_string(), Value::String(field.clone()));
            v
        }
        None => {
            tracing::debug!(
                "Record {} of '{}' has no score field; defaulting to 0",
                index,
                signature.endpoint_id
            );
            properties.insert(SCORE_EXTRACTION_FAILED.to_string(), Value::Bool(true));
            0.0
        }
    };

    let area_id = match first_text(record, &signature.id_field_candidates) {
        Some(id) => id,
        None => {
            properties.insert(IDENTITY_MISSING.to_string(), Value::Bool(true));
            format!("record-{index}")
        }
    };
    let area_name =
        first_text(record, &signature.name_field_candidates).unwrap_or_else(|| area_id.clone());

    Extracted {
        area_id,
        area_name,
        value,
        coordinates,
        properties,
    }
}

fn build_point(
    mut e: Extracted,
    signature: &EndpointSignature,
    rank: usize,
    category: usize,
) -> GeographicDataPoint {
    let target = signature.target_variable_name.clone();
    if let Some(n) = serde_json::Number::from_f64(e.value) {
        e.properties.insert(target.clone(), Value::Number(n));
    }

    GeographicDataPoint {
        area_id: e.area_id,
        area_name: e.area_name,
        value: e.value,
        target_variable: target,
        target_variable_score: e.value,
        rank,
        category,
        coordinates: e.coordinates,
        properties: e.properties,
    }
}

/// A finite number, or a string that parses to one.
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn first_text(record: &RawRecord, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|field| match record.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
