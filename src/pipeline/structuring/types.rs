use serde::{Deserialize, Serialize};

/// Fallback for any basic-detail field the text does not reveal.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Structured lease record, the sole artifact handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredLeaseRecord {
    pub file_name: String,
    /// `dd/mm/YYYY`, display only.
    pub generated_date: String,
    /// 0-100.
    pub confidence: u8,
    pub executive_summary: String,
    pub basic_details: BasicDetails,
    pub sections: Vec<Section>,
    pub financial_terms: FinancialTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDetails {
    pub property: String,
    pub property_type: String,
    pub location: String,
    pub lease_term: String,
    pub parties: Parties,
    pub title_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parties {
    pub lessor: String,
    pub lessee: String,
    pub company: String,
}

/// Topical excerpt of the lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub icon: String,
    /// Never empty.
    pub content: String,
    /// Never empty; a single placeholder when nothing was cited.
    pub clause_references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTerms {
    pub ground_rent: String,
    pub deposit: String,
    pub service_charge: String,
}
