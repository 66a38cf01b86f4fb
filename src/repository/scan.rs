//! Repository implementation for the scan history.

use diesel::prelude::*;

use crate::domain::scan::{NewScanRecord, ScanRecord};
use crate::models::scan::{NewScanRecord as DbNewScanRecord, ScanRecord as DbScanRecord};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ScanListQuery, ScanReader, ScanWriter};

impl ScanReader for DieselRepository {
    fn list_scans(&self, query: ScanListQuery) -> RepositoryResult<(usize, Vec<ScanRecord>)> {
        use crate::schema::scan_records;

        let mut conn = self.conn()?;

        let filtered = || {
            let mut items = scan_records::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(tool) = query.tool {
                items = items.filter(scan_records::tool.eq(tool.as_str()));
            }
            items
        };

        let total = filtered().count().get_result::<i64>(&mut conn)? as usize;

        let mut items =
            filtered().order((scan_records::created_at.desc(), scan_records::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let records = items
            .load::<DbScanRecord>(&mut conn)?
            .into_iter()
            .map(|record| ScanRecord::try_from(record).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, records))
    }
}

impl ScanWriter for DieselRepository {
    fn record_scan(&self, record: &NewScanRecord) -> RepositoryResult<ScanRecord> {
        use crate::schema::scan_records;

        let mut conn = self.conn()?;
        let stored = diesel::insert_into(scan_records::table)
            .values(DbNewScanRecord::from(record))
            .get_result::<DbScanRecord>(&mut conn)?;

        Ok(ScanRecord::try_from(stored)?)
    }
}
