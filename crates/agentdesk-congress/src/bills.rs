use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::CongressClient;
use crate::error::CongressError;

/// Congress assumed when a query names a bill without one
pub const DEFAULT_CONGRESS: u32 = 118;

const BILL_PATTERN: &str = r"(?:H\.R\.|S\.)\s*(\d+)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillType {
    House,
    Senate,
}

impl BillType {
    /// Bill type segment used in Congress.gov URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::House => "hr",
            BillType::Senate => "s",
        }
    }
}

/// A bill named in free text, e.g. "H.R. 1234"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillReference {
    pub bill_type: BillType,
    pub number: u32,
    pub congress: u32,
}

/// First `H.R. <n>` or `S. <n>` reference in `query`, case-insensitive
pub fn extract_bill_reference(query: &str) -> Option<BillReference> {
    let pattern = RegexBuilder::new(BILL_PATTERN)
        .case_insensitive(true)
        .build()
        .ok()?;
    let captures = pattern.captures(query)?;
    let matched = captures.get(0)?.as_str();
    let number = captures.get(1)?.as_str().parse().ok()?;

    let bill_type = if matched.to_ascii_uppercase().starts_with("H.R.") {
        BillType::House
    } else {
        BillType::Senate
    };

    Some(BillReference {
        bill_type,
        number,
        congress: DEFAULT_CONGRESS,
    })
}

/// The fields of a Congress.gov bill record the analysis uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillDetails {
    pub title: String,
    pub summary: String,
    pub latest_action: String,
    pub introduced_date: String,
    pub sponsors: Vec<Value>,
    pub committees: Value,
    pub amendments: Value,
    pub related_bills: Value,
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Bill record out of a response; the API wraps it in `{"bill": {...}}`
fn bill_record(data: &Value) -> &Value {
    data.get("bill").filter(|b| b.is_object()).unwrap_or(data)
}

impl BillDetails {
    pub fn from_api(data: &Value) -> Self {
        let bill = bill_record(data);
        let list = |key: &str| bill.get(key).cloned().unwrap_or_else(|| Value::Array(Vec::new()));

        Self {
            title: value_text(bill.get("title")),
            summary: value_text(bill.get("summary")),
            latest_action: value_text(bill.get("latestAction").and_then(|a| a.get("text"))),
            introduced_date: value_text(bill.get("introducedDate")),
            sponsors: bill
                .get("sponsors")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            committees: list("committees"),
            amendments: list("amendments"),
            related_bills: list("relatedBills"),
        }
    }

    pub fn has_amendments(&self) -> bool {
        match &self.amendments {
            Value::Array(items) => !items.is_empty(),
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    /// The query enriched with the bill's details
    pub fn enrich_query(&self, query: &str) -> String {
        format!(
            "Query: {}\n\nBill Details:\nTitle: {}\nSummary: {}\nLatest Action: {}\nIntroduced: {}",
            query, self.title, self.summary, self.latest_action, self.introduced_date
        )
    }
}

/// Look up the bill a query names; any failure is logged and yields `None`
pub async fn get_bill_details(client: &CongressClient, query: &str) -> Option<BillDetails> {
    let reference = extract_bill_reference(query)?;
    match client
        .get_bill(reference.congress, reference.bill_type.as_str(), reference.number)
        .await
    {
        Ok(data) => Some(BillDetails::from_api(&data)),
        Err(e) => {
            log::error!("Error fetching bill details: {}", e);
            None
        }
    }
}

/// What a bill amends: the amended bill if the API can return it, otherwise
/// the U.S. Code sections it touches
pub async fn amendment_context(client: &CongressClient, bill_data: &Value) -> String {
    match try_amendment_context(client, bill_data).await {
        Ok(context) => context,
        Err(e) => {
            log::error!("Error getting amendment context: {}", e);
            "Error retrieving amendment context".to_string()
        }
    }
}

async fn try_amendment_context(client: &CongressClient, bill_data: &Value) -> Result<String, CongressError> {
    if let Some(amended) = bill_data.get("amendedBill") {
        let congress = amended.get("congress").and_then(as_number);
        let bill_type = amended.get("type").and_then(Value::as_str);
        let number = amended.get("number").and_then(as_number);

        if let (Some(congress), Some(bill_type), Some(number)) = (congress, bill_type, number) {
            match client.get_bill(congress, bill_type, number).await {
                Ok(original) => {
                    let original = bill_record(&original);
                    let summary = match original.get("summary") {
                        Some(Value::Null) | None => "No summary available".to_string(),
                        summary => value_text(summary),
                    };
                    return Ok(format!(
                        "Original Bill Context:\nTitle: {}\nStatus: {}\nSummary: {}",
                        value_text(original.get("title")),
                        value_text(original.get("latestAction").and_then(|a| a.get("text"))),
                        summary
                    ));
                }
                Err(CongressError::Api { status, .. }) => {
                    log::debug!("amended bill lookup returned {}", status);
                }
                Err(e) => return Err(e),
            }
        }
    }

    if let Some(amendments) = bill_data.get("amendments").and_then(Value::as_array) {
        let sections: Vec<String> = amendments
            .iter()
            .filter(|a| a.get("type").and_then(Value::as_str) == Some("USC"))
            .map(|a| {
                format!(
                    "Title {} Section {}",
                    value_text(a.get("title")),
                    value_text(a.get("section"))
                )
            })
            .collect();
        if !sections.is_empty() {
            return Ok(format!("This bill amends U.S. Code: {}", sections.join(", ")));
        }
    }

    Ok("No amendment context found".to_string())
}

/// Numbers arrive both as JSON numbers and as strings
fn as_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
