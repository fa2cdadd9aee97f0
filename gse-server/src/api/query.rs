//! 通用查询参数

use chrono::NaiveDate;
use serde::Deserialize;

use crate::analytics::{DateRange, period};
use crate::utils::AppResult;

/// `?period=&startDate=&endDate=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl PeriodQuery {
    pub fn resolve(&self, today: NaiveDate) -> AppResult<DateRange> {
        period::resolve(
            self.period.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today,
        )
    }
}

