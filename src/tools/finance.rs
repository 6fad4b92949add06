//! Finance lookup tools
//!
//! Customer details, balances and invoices read from JSON files in the
//! configured data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::core::{ConferError, Result, ToolDefinition};
use crate::tools::registry::ToolFunction;

/// Which record set a lookup reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Details,
    Balance,
    Invoices,
}

impl Lookup {
    fn file_name(self) -> &'static str {
        match self {
            Lookup::Details => "customer_details.json",
            Lookup::Balance => "balances.json",
            Lookup::Invoices => "invoices.json",
        }
    }

    fn collection(self) -> &'static str {
        match self {
            Lookup::Details => "customer_details",
            Lookup::Balance => "balances",
            Lookup::Invoices => "invoices",
        }
    }

    fn tool_name(self) -> &'static str {
        match self {
            Lookup::Details => "fetch_customer_details",
            Lookup::Balance => "fetch_customer_balance",
            Lookup::Invoices => "fetch_invoices",
        }
    }
}

/// A lookup against one finance data file
pub struct FinanceTool {
    data_dir: PathBuf,
    lookup: Lookup,
}

impl FinanceTool {
    pub fn new(data_dir: impl Into<PathBuf>, lookup: Lookup) -> Self {
        Self {
            data_dir: data_dir.into(),
            lookup,
        }
    }

    pub fn definition(lookup: Lookup) -> ToolDefinition {
        let (description, arg) = match lookup {
            Lookup::Details => (
                "Fetch customer details with the given customer id.",
                "The customer id to retrieve details",
            ),
            Lookup::Balance => (
                "Fetch customer balance with the given customer id.",
                "The customer id to retrieve customer balance",
            ),
            Lookup::Invoices => (
                "Fetch customer invoices with the given customer id.",
                "The customer id to retrieve customer invoices",
            ),
        };
        ToolDefinition::function(
            lookup.tool_name(),
            description,
            json!({
                "type": "object",
                "properties": {
                    "customer_id": {"type": "string", "description": arg}
                },
                "required": ["customer_id"]
            }),
        )
    }

    async fn records(&self) -> Result<Vec<Value>> {
        let path = self.data_dir.join(self.lookup.file_name());
        let mut data = load_json(&path).await?;
        match data.get_mut(self.lookup.collection()).map(Value::take) {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(ConferError::Other(format!(
                "{} has no '{}' array",
                path.display(),
                self.lookup.collection()
            ))),
        }
    }
}

async fn load_json(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConferError::with_context(format!("Failed to read {}", path.display()), e))?;
    Ok(serde_json::from_str(&content)?)
}

fn belongs_to(record: &Value, customer_id: &str) -> bool {
    record.get("customer_id").and_then(Value::as_str) == Some(customer_id)
}

#[async_trait]
impl ToolFunction for FinanceTool {
    async fn invoke(&self, args: &Map<String, Value>) -> Result<Value> {
        let customer_id = args
            .get("customer_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ConferError::Other("customer_id must be a string".into()))?;

        let records = self.records().await?;

        let value = match self.lookup {
            Lookup::Invoices => Value::Array(
                records
                    .into_iter()
                    .filter(|r| belongs_to(r, customer_id))
                    .collect(),
            ),
            Lookup::Details => records
                .into_iter()
                .find(|r| belongs_to(r, customer_id))
                .unwrap_or_else(|| {
                    json!({"error": format!("No details found for customer '{}'", customer_id)})
                }),
            Lookup::Balance => records
                .into_iter()
                .find(|r| belongs_to(r, customer_id))
                .unwrap_or_else(|| {
                    json!({"error": format!("No balance found for customer '{}'", customer_id)})
                }),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("customer_details.json"),
            json!({"customer_details": [
                {"customer_id": "CUST001", "name": "Acme", "phone": "+15550100", "active": true}
            ]})
            .to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("balances.json"),
            json!({"balances": [{"customer_id": "CUST001", "balance": 1250.0}]}).to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("invoices.json"),
            json!({"invoices": [
                {"customer_id": "CUST001", "invoice_id": "INV001"},
                {"customer_id": "CUST002", "invoice_id": "INV002"},
                {"customer_id": "CUST001", "invoice_id": "INV003"}
            ]})
            .to_string(),
        )
        .unwrap();
        dir
    }

    fn args(id: &str) -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("customer_id".into(), json!(id));
        args
    }

    #[tokio::test]
    async fn test_details_and_missing_customer() {
        let dir = data_dir();
        let tool = FinanceTool::new(dir.path(), Lookup::Details);

        let found = tool.invoke(&args("CUST001")).await.unwrap();
        assert_eq!(found["name"], "Acme");

        let missing = tool.invoke(&args("CUST404")).await.unwrap();
        assert_eq!(missing["error"], "No details found for customer 'CUST404'");
    }

    #[tokio::test]
    async fn test_invoices_filtered_by_customer() {
        let dir = data_dir();
        let tool = FinanceTool::new(dir.path(), Lookup::Invoices);

        let invoices = tool.invoke(&args("CUST001")).await.unwrap();
        let ids: Vec<&str> = invoices
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["invoice_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["INV001", "INV003"]);
    }

    #[tokio::test]
    async fn test_missing_data_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FinanceTool::new(dir.path(), Lookup::Balance);
        assert!(tool.invoke(&args("CUST001")).await.is_err());
    }
}
