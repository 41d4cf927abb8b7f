//! Extraction instruction and response schema sent with every document.
//!
//! The classification rules below are executed by the external model; this
//! crate only transports them.

use serde_json::{json, Value};

pub const EXTRACTION_PROMPT: &str = "\
You are reading a bank account statement. Return ONLY a JSON object with this exact shape:
{\"clientName\": string, \"entries\": [{\"description\": string, \"amount\": number, \"date\": \"YYYY-MM-DD\"}]}

Rules:
1. Include only money RECEIVED from third parties: deposits, incoming transfers (PIX, TED, DOC), salary, refunds from others.
2. Exclude every outgoing transaction: payments, withdrawals, purchases, card charges, fees, outgoing transfers.
3. Exclude incoming amounts that are redemptions of the account holder's own investments \
(descriptions such as \"RESGATE\", \"RESGATE APLICACAO\", \"RESG CDB\", \"investment redemption\").
4. Exclude transfers sent by the account holder to themselves: descriptions such as \
\"MESMA TITULARIDADE\" or \"same ownership transfer\", or any transfer whose sender name matches clientName.
5. amount must be a plain decimal number with a dot as decimal separator and no currency symbol or \
thousands separator (\"R$ 1.234,56\" becomes 1234.56).
6. date must be formatted as YYYY-MM-DD.
7. clientName is the account holder's name as printed on the statement.
8. If no transaction qualifies, return \"entries\": [] and still fill clientName.
9. If the account holder's name cannot be determined, return \"clientName\": \"\". Never omit the field.
";

/// JSON schema for structured output
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "clientName": { "type": "STRING" },
            "entries": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "amount": { "type": "NUMBER" },
                        "date": { "type": "STRING" }
                    },
                    "required": ["description", "amount", "date"]
                }
            }
        },
        "required": ["clientName", "entries"]
    })
}
