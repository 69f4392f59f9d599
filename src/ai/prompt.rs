//! The analysis request sent to the model: the instructions, the expense data and the schema the
//! answer must follow.

use crate::error::Res;
use crate::model::Expense;
use anyhow::Context;
use serde_json::{json, Value};

const INSTRUCTIONS: &str = "\
Analyze the following Indonesian expense data. All amounts are in Rupiah (IDR).
The data comes from a spreadsheet with these columns:
- Column A: Tanggal (Date)
- Column B: Jumlah (Amount)
- Column C: Kategori (Category)
- Column D: Pembayaran (Payment Method)

Write, in English, a detailed summary of the spending, recommendations for saving money and any \
anomalies you find. Pay attention to patterns across categories and payment methods, for example \
one payment method used excessively for small purchases.";

/// Builds the prompt for `expenses`, ending with the expenses themselves as JSON.
pub(crate) fn analysis_prompt(expenses: &[Expense]) -> Res<String> {
    let data = serde_json::to_string(expenses).context("Unable to serialize the expenses")?;
    Ok(format!("{INSTRUCTIONS}\n\nData: {data}"))
}

/// The response schema: an object with a summary and two lists of strings, all required.
pub(crate) fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A high-level summary of the spending patterns in IDR context."
            },
            "recommendations": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Specific advice to save money in IDR."
            },
            "anomalies": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Any unusual or high-spending items identified."
            }
        },
        "required": ["summary", "recommendations", "anomalies"]
    })
}
