//! Telemetry query envelopes for the platform's generic metrics endpoint.
//!
//! The platform proxies these to its OLAP store and Prometheus; only the
//! query shape is built here. Times are rendered in the configured timezone.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};

/// Which day a [`TimeWindow`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Today,
    Yesterday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub kind: WindowKind,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TimeWindow {
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds().max(0)
    }

    /// `YYYY-MM-DDTHH:MM:SS/YYYY-MM-DDTHH:MM:SS` in local wall time.
    fn druid_interval(&self) -> String {
        const FMT: &str = "%Y-%m-%dT%H:%M:%S";
        format!("{}/{}", self.start.format(FMT), self.end.format(FMT))
    }
}

/// The two windows every dataset summary reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindows {
    /// Local midnight today up to now.
    pub today: TimeWindow,
    /// Local midnight yesterday up to 23:59:59 yesterday.
    pub yesterday: TimeWindow,
    pub now: DateTime<Tz>,
}

impl TimeWindows {
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        let now = now.with_timezone(&tz);
        let today = now.date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        Self {
            today: TimeWindow {
                kind: WindowKind::Today,
                start: local_midnight(tz, today),
                end: now,
            },
            yesterday: TimeWindow {
                kind: WindowKind::Yesterday,
                start: local_midnight(tz, yesterday),
                end: local_end_of_day(tz, yesterday),
            },
            now,
        }
    }
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    // A DST jump can skip local midnight; fall back to reading it as UTC.
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// 23:59:59 local wall time, so 23- and 25-hour days keep their true length.
fn local_end_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    date.and_hms_opt(23, 59, 59)
        .and_then(|naive| tz.from_local_datetime(&naive).latest())
        .unwrap_or_else(|| local_midnight(tz, date) + TimeDelta::seconds(86_399))
}

pub const PROCESSED_COUNT_ID: &str = "totalProcessedEventsCount";
pub const FAILED_COUNT_ID: &str = "failedEventsCountPerDataset";
pub const LAST_SYNCED_TIME_ID: &str = "lastSyncedTime";

/// Failure counters summed for the failed-events query, as `(job, counter)`.
const FAILURE_COUNTERS: [(&str, &str); 6] = [
    ("PipelinePreprocessorJob", "dedup_failed_count"),
    ("PipelinePreprocessorJob", "validator_failed_count"),
    ("ExtractorJob", "extractor_failed_count"),
    ("ExtractorJob", "extractor_duplicate_count"),
    ("TransformerJob", "transform_failed_count"),
    ("DruidRouterJob", "failed_event_count"),
];

/// One telemetry query against `data/metrics?id=<id>`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricQuery {
    ProcessedCount {
        dataset_id: String,
        window: TimeWindow,
    },
    FailedCount {
        dataset_id: String,
        window: TimeWindow,
    },
    LastSyncedTime {
        dataset_id: String,
        now: DateTime<Tz>,
    },
}

impl MetricQuery {
    /// The discriminating `id` query parameter.
    pub fn id(&self) -> &'static str {
        match self {
            MetricQuery::ProcessedCount { .. } => PROCESSED_COUNT_ID,
            MetricQuery::FailedCount { .. } => FAILED_COUNT_ID,
            MetricQuery::LastSyncedTime { .. } => LAST_SYNCED_TIME_ID,
        }
    }

    pub fn dataset_id(&self) -> &str {
        match self {
            MetricQuery::ProcessedCount { dataset_id, .. }
            | MetricQuery::FailedCount { dataset_id, .. }
            | MetricQuery::LastSyncedTime { dataset_id, .. } => dataset_id,
        }
    }

    pub fn window(&self) -> Option<WindowKind> {
        match self {
            MetricQuery::ProcessedCount { window, .. }
            | MetricQuery::FailedCount { window, .. } => Some(window.kind),
            MetricQuery::LastSyncedTime { .. } => None,
        }
    }

    /// The `{query: {...}}` request body.
    pub fn payload(&self) -> Value {
        match self {
            MetricQuery::ProcessedCount { dataset_id, window } => {
                processed_count_payload(dataset_id, window)
            }
            MetricQuery::FailedCount { dataset_id, window } => {
                failed_count_payload(dataset_id, window)
            }
            MetricQuery::LastSyncedTime { dataset_id, now } => {
                last_synced_time_payload(dataset_id, now)
            }
        }
    }
}

fn router_filter(dataset_id: &str) -> Vec<Value> {
    vec![
        json!({ "type": "selector", "dimension": "ctx_module", "value": "processing" }),
        json!({ "type": "selector", "dimension": "ctx_dataset", "value": dataset_id }),
        json!({ "type": "selector", "dimension": "ctx_pdata_pid", "value": "router" }),
    ]
}

fn processed_count_payload(dataset_id: &str, window: &TimeWindow) -> Value {
    let mut fields = router_filter(dataset_id);
    fields.push(json!({ "type": "selector", "dimension": "error_code", "value": null }));

    json!({
        "query": {
            "id": PROCESSED_COUNT_ID,
            "type": "api",
            "url": "/config/v2/data/metrics",
            "method": "POST",
            "body": {
                "context": { "dataSource": "system-events" },
                "query": {
                    "queryType": "timeseries",
                    "dataSource": "system-events",
                    "intervals": window.druid_interval(),
                    "granularity": { "type": "all", "timeZone": window.start.timezone().name() },
                    "filter": { "type": "and", "fields": fields },
                    "aggregations": [
                        { "type": "longSum", "name": "count", "fieldName": "count" }
                    ]
                }
            }
        }
    })
}

fn failed_count_payload(dataset_id: &str, window: &TimeWindow) -> Value {
    let range = window.duration_secs();
    let promql = FAILURE_COUNTERS
        .iter()
        .map(|(job, counter)| {
            let metric =
                format!("flink_taskmanager_job_task_operator_{job}_{dataset_id}_{counter}");
            format!("sum(sum_over_time({metric}[{range}s]))")
        })
        .collect::<Vec<_>>()
        .join(" + ");
    let at = window.end.timestamp();

    json!({
        "query": {
            "type": "api",
            "id": FAILED_COUNT_ID,
            "url": "/prom/api/v1/query",
            "method": "GET",
            "params": { "query": promql, "time": at },
            "time": at,
            "dataset": dataset_id,
            "master": false,
            "metadata": {}
        }
    })
}

fn last_synced_time_payload(dataset_id: &str, now: &DateTime<Tz>) -> Value {
    let tomorrow = *now + TimeDelta::days(1);
    let intervals = format!("2000-01-01/{}", tomorrow.format("%Y-%m-%dT00:00:00%:z"));

    json!({
        "query": {
            "id": LAST_SYNCED_TIME_ID,
            "type": "api",
            "url": "/config/v2/data/metrics",
            "method": "POST",
            "body": {
                "context": { "dataSource": "system-events" },
                "query": {
                    "queryType": "groupBy",
                    "dataSource": "system-events",
                    "intervals": intervals,
                    "granularity": { "type": "all", "timeZone": now.timezone().name() },
                    "filter": { "type": "and", "fields": router_filter(dataset_id) },
                    "aggregations": [
                        { "type": "longMax", "name": "last_synced_time", "fieldName": "__time" }
                    ]
                }
            }
        }
    })
}

/// Body of a metrics response: `{status, data: {result: [{value: [ts, "n"]}]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<MetricData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricData {
    #[serde(default)]
    pub result: Vec<MetricSample>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricSample {
    #[serde(default)]
    pub value: Vec<Value>,
}

impl MetricResponse {
    /// The numeric value of the first sample, if the query succeeded.
    pub fn value(&self) -> Option<f64> {
        if self.status.as_deref() != Some("success") {
            return None;
        }
        let sample = self.data.as_ref()?.result.first()?;
        let value = match sample.value.get(1)? {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn kolkata() -> Tz {
        "Asia/Kolkata".parse().unwrap()
    }

    fn noon_utc() -> DateTime<Utc> {
        // 2025-05-03 12:00:00 UTC == 17:30 IST
        Utc.with_ymd_and_hms(2025, 5, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_windows_today() {
        let w = TimeWindows::at(noon_utc(), kolkata());
        assert_eq!(w.today.kind, WindowKind::Today);
        assert_eq!(w.today.start.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-05-03 00:00:00");
        assert_eq!(w.today.end.hour(), 17);
        assert_eq!(w.today.end.minute(), 30);
    }

    #[test]
    fn test_windows_yesterday() {
        let w = TimeWindows::at(noon_utc(), kolkata());
        assert_eq!(
            w.yesterday.start.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2025-05-02 00:00:00"
        );
        assert_eq!(
            w.yesterday.end.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2025-05-02 23:59:59"
        );
        assert_eq!(w.yesterday.duration_secs(), 86_399);
    }

    #[test]
    fn test_yesterday_ends_at_local_wall_clock_across_spring_forward() {
        // 2024-03-10 is a 23-hour day in New York.
        let now = Utc.with_ymd_and_hms(2024, 3, 11, 16, 0, 0).unwrap();
        let w = TimeWindows::at(now, chrono_tz::America::New_York);
        assert_eq!(
            w.yesterday.end.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-03-10 23:59:59"
        );
        assert!(w.yesterday.end < w.today.start);
        assert_eq!(w.yesterday.duration_secs(), 23 * 3600 - 1);
        assert_eq!(
            w.yesterday.druid_interval(),
            "2024-03-10T00:00:00/2024-03-10T23:59:59"
        );
    }

    #[test]
    fn test_yesterday_ends_at_local_wall_clock_across_fall_back() {
        // 2024-11-03 is a 25-hour day in New York.
        let now = Utc.with_ymd_and_hms(2024, 11, 4, 16, 0, 0).unwrap();
        let w = TimeWindows::at(now, chrono_tz::America::New_York);
        assert_eq!(
            w.yesterday.end.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-11-03 23:59:59"
        );
        assert!(w.yesterday.end < w.today.start);
        assert_eq!(w.yesterday.duration_secs(), 25 * 3600 - 1);
    }

    #[test]
    fn test_windows_respect_timezone_date_boundary() {
        // 20:00 UTC on May 3 is already May 4 in Kolkata.
        let now = Utc.with_ymd_and_hms(2025, 5, 3, 20, 0, 0).unwrap();
        let w = TimeWindows::at(now, kolkata());
        assert_eq!(w.today.start.format("%Y-%m-%d").to_string(), "2025-05-04");
        assert_eq!(w.yesterday.start.format("%Y-%m-%d").to_string(), "2025-05-03");
    }

    #[test]
    fn test_processed_count_payload_shape() {
        let w = TimeWindows::at(noon_utc(), kolkata());
        let q = MetricQuery::ProcessedCount {
            dataset_id: "orders".into(),
            window: w.today,
        };
        assert_eq!(q.id(), "totalProcessedEventsCount");
        assert_eq!(q.window(), Some(WindowKind::Today));

        let body = q.payload();
        let inner = &body["query"]["body"]["query"];
        assert_eq!(body["query"]["id"], "totalProcessedEventsCount");
        assert_eq!(inner["queryType"], "timeseries");
        assert_eq!(inner["intervals"], "2025-05-03T00:00:00/2025-05-03T17:30:00");
        assert_eq!(inner["granularity"]["timeZone"], "Asia/Kolkata");
        let fields = inner["filter"]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1]["value"], "orders");
        assert!(fields[3]["value"].is_null());
    }

    #[test]
    fn test_failed_count_payload_shape() {
        let w = TimeWindows::at(noon_utc(), kolkata());
        let q = MetricQuery::FailedCount {
            dataset_id: "orders".into(),
            window: w.yesterday,
        };
        let body = q.payload();
        let promql = body["query"]["params"]["query"].as_str().unwrap();
        assert_eq!(promql.matches("sum_over_time").count(), 6);
        assert!(promql.contains(
            "flink_taskmanager_job_task_operator_ExtractorJob_orders_extractor_failed_count[86399s]"
        ));
        assert_eq!(body["query"]["time"], w.yesterday.end.timestamp());
        assert_eq!(body["query"]["dataset"], "orders");
        assert_eq!(body["query"]["master"], false);
    }

    #[test]
    fn test_last_synced_payload_interval() {
        let w = TimeWindows::at(noon_utc(), kolkata());
        let q = MetricQuery::LastSyncedTime {
            dataset_id: "orders".into(),
            now: w.now,
        };
        assert_eq!(q.window(), None);
        let body = q.payload();
        let inner = &body["query"]["body"]["query"];
        assert_eq!(inner["intervals"], "2000-01-01/2025-05-04T00:00:00+05:30");
        assert_eq!(inner["aggregations"][0]["fieldName"], "__time");
    }

    #[test]
    fn test_metric_response_value() {
        let resp: MetricResponse = serde_json::from_value(json!({
            "status": "success",
            "data": { "result": [ { "value": [1714723200, "42.7"] } ] }
        }))
        .unwrap();
        assert_eq!(resp.value(), Some(42.7));
    }

    #[test]
    fn test_metric_response_without_value() {
        let cases = [
            json!({ "status": "error", "data": { "result": [ { "value": [0, "1"] } ] } }),
            json!({ "status": "success", "data": { "result": [] } }),
            json!({ "status": "success" }),
            json!({ "status": "success", "data": { "result": [ { "value": [0] } ] } }),
            json!({ "status": "success", "data": { "result": [ { "value": [0, "abc"] } ] } }),
        ];
        for case in cases {
            let resp: MetricResponse = serde_json::from_value(case.clone()).unwrap();
            assert_eq!(resp.value(), None, "case: {case}");
        }
    }
}
