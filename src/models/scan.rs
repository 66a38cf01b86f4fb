//! Diesel models for the scan history.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::scan::{NewScanRecord as DomainNewScanRecord, ScanRecord as DomainScanRecord};
use crate::domain::types::{ScanId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::scan_records)]
pub struct ScanRecord {
    pub id: i32,
    pub tool: String,
    pub analysis_type: String,
    pub subject: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::scan_records)]
pub struct NewScanRecord<'a> {
    pub tool: &'static str,
    pub analysis_type: &'a str,
    pub subject: &'a str,
    pub success: bool,
    pub error: Option<&'a str>,
    pub duration_ms: i64,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ScanRecord> for DomainScanRecord {
    type Error = TypeConstraintError;

    fn try_from(record: ScanRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ScanId::new(record.id)?,
            tool: record.tool.parse()?,
            analysis_type: record.analysis_type,
            subject: record.subject,
            success: record.success,
            error: record.error,
            duration_ms: record.duration_ms,
            created_at: record.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewScanRecord> for NewScanRecord<'a> {
    fn from(record: &'a DomainNewScanRecord) -> Self {
        Self {
            tool: record.tool.as_str(),
            analysis_type: record.analysis_type.as_str(),
            subject: record.subject.as_str(),
            success: record.success,
            error: record.error.as_deref(),
            duration_ms: record.duration_ms,
            created_at: record.created_at,
        }
    }
}
