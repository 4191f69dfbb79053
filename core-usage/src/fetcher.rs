//! GraphQL usage quota fetcher.
//!
//! Posts the customer usage query with a bearer token and walks the response
//! down to the newest product's first usage quota. Like the token endpoint,
//! the GraphQL gateway reports failures in the body, so classification reads
//! the body and only logs the HTTP status. Every call leaves a
//! `last-usage-query.json` diagnostic snapshot.

use crate::error::{Result, UsageError};
use crate::summary::UsageSummary;
use bridge_traits::time::Clock;
use bridge_traits::{HttpClient, HttpRequest};
use chrono::{DateTime, NaiveDate, Utc};
use core_runtime::debug::{DebugRecord, DebugRecorder, RequestSnapshot};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Diagnostic snapshot slug for the usage query.
const SNAPSHOT_KIND: &str = "usage-query";

/// Customer filter the carrier's app uses for its own queries.
pub const CUSTOMER_FILTER: &str = "mdAppCustomers";

/// The usage quota query, newest non-terminated mobile product first.
pub const USAGE_QUERY: &str = "\
query Customer($acceptedCustomerFilter: String!) {
  me(acceptedCustomerFilter: $acceptedCustomerFilter) {
    customerProducts(
      sortBy: START_DATE
      sortOrder: DESCENDING
      includeTerminated: false
      categories: [MOBILE_CREDIT_SERVICES]
    ) {
      costUsageBalance {
        usageQuotas {
          ...customerUsageQuotas
        }
      }
    }
  }
}
fragment customerUsageQuotas on CostUsageBalanceUsageQuota {
  validFor {
    endDate
  }
  initialAmount
  usedAmount
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<UsageData>,
    errors: Option<Vec<GraphQlError>>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    me: Option<Me>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Me {
    customer_products: Vec<CustomerProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerProduct {
    cost_usage_balance: Option<CostUsageBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CostUsageBalance {
    usage_quotas: Vec<UsageQuota>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageQuota {
    valid_for: Option<ValidFor>,
    initial_amount: i64,
    used_amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidFor {
    end_date: Option<String>,
}

/// Client for the carrier's GraphQL usage endpoint.
#[derive(Clone)]
pub struct UsageFetcher {
    graphql_url: String,
    http: Arc<dyn HttpClient>,
    recorder: DebugRecorder,
    clock: Arc<dyn Clock>,
}

impl UsageFetcher {
    pub fn new(
        graphql_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        recorder: DebugRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            graphql_url: graphql_url.into(),
            http,
            recorder,
            clock,
        }
    }

    /// Fetch the current quota and convert it to display values.
    #[instrument(skip_all)]
    pub async fn fetch(&self, access_token: &str) -> Result<UsageSummary> {
        let payload = serde_json::json!({
            "query": USAGE_QUERY,
            "variables": { "acceptedCustomerFilter": CUSTOMER_FILTER },
        });

        let request = HttpRequest::post(&self.graphql_url)
            .json(&payload)
            .map_err(|e| UsageError::Transport {
                reason: e.to_string(),
            })?
            .bearer_token(access_token);

        let mut record = DebugRecord {
            request: RequestSnapshot {
                method: "POST".to_string(),
                url: self.graphql_url.clone(),
                body: Some(payload.to_string()),
            },
            response: None,
            error: None,
        };

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                record.error = Some(err.to_string());
                self.recorder.record(SNAPSHOT_KIND, &record).await;
                return Err(UsageError::Transport {
                    reason: err.to_string(),
                });
            }
        };

        debug!(status = response.status, "Usage endpoint answered");
        if !response.is_success() {
            warn!(status = response.status, "Non-success status from usage endpoint");
        }

        let value = match response.json::<serde_json::Value>() {
            Ok(value) => value,
            Err(err) => {
                record.error = Some(format!("Body was not JSON: {}", err));
                self.recorder.record(SNAPSHOT_KIND, &record).await;
                return Err(UsageError::Transport {
                    reason: format!("Body was not JSON: {}", err),
                });
            }
        };
        record.response = Some(value.clone());
        self.recorder.record(SNAPSHOT_KIND, &record).await;

        let parsed: GraphQlResponse =
            serde_json::from_value(value).map_err(|e| UsageError::Transport {
                reason: format!("Unexpected response shape: {}", e),
            })?;
        self.convert(parsed)
    }

    fn convert(&self, response: GraphQlResponse) -> Result<UsageSummary> {
        if let Some(description) = response.error_description {
            return Err(UsageError::Provider(description));
        }
        if let Some(errors) = response.errors {
            if let Some(first) = errors.first() {
                return Err(UsageError::Provider(first.message.clone()));
            }
        }

        let quota = response
            .data
            .and_then(|data| data.me)
            .and_then(|me| me.customer_products.into_iter().next())
            .and_then(|product| product.cost_usage_balance)
            .and_then(|balance| balance.usage_quotas.into_iter().next())
            .ok_or(UsageError::MissingQuota)?;

        let period_end = quota
            .valid_for
            .and_then(|valid| valid.end_date)
            .and_then(|raw| parse_end_date(&raw));

        UsageSummary::from_quota(
            quota.used_amount,
            quota.initial_amount,
            period_end,
            self.clock.now(),
        )
    }
}

/// Parse the quota's end date, which arrives either as a full timestamp or a
/// bare date. A bare date means the start of that day.
fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    warn!(%raw, "Unparseable quota end date");
    None
}
