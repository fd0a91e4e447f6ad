//! Congress.gov data for agentdesk: the REST client, local data files and
//! their freshness, bill references, constitutional source scraping and the
//! vector tables built from all of it.

pub mod bills;
pub mod client;
pub mod constitution;
pub mod data;
pub mod database;
pub mod error;
pub mod knowledge;
pub mod topics;

pub use bills::{amendment_context, extract_bill_reference, get_bill_details, BillDetails, BillReference, BillType, DEFAULT_CONGRESS};
pub use client::{CongressClient, Endpoint, CONGRESS_API_URL};
pub use constitution::{ConstitutionalReader, CONSTITUTIONAL_URLS};
pub use data::{check_data_freshness, is_fresh, verify_json_data, DataFileStatus, JsonFileSummary, EXPECTED_DATA_FILES};
pub use database::{check_knowledge_bases, reset_database, KnowledgeReport, TableDrop, TableState, TableStatus, CONGRESS_TABLES};
pub use error::{CongressError, CongressResult};
pub use knowledge::CongressKnowledge;
pub use topics::topic_query;
