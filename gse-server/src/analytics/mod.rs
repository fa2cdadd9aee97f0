//! Analytics
//!
//! 纯函数聚合：调用方先按区间加载行，再在内存中计算。
//! 所有函数显式接收 `today`，便于测试。

pub mod attendance;
pub mod calendar;
pub mod dashboard;
pub mod demographics;
pub mod period;
pub mod requests;
pub mod teacher;

pub use calendar::WorkCalendar;
pub use period::{DateRange, Period};

use shared::error::AppResult;
use sqlx::SqlitePool;

use crate::db::repository::{holiday, settings};

/// 保留一位小数
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// round1(num / den × 100)，分母为 0 时返回 0
pub fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        return 0.0;
    }
    round1(num as f64 / den as f64 * 100.0)
}

/// 当前设置 + 有效节假日
pub async fn load_calendar(pool: &SqlitePool) -> AppResult<WorkCalendar> {
    let settings = settings::get(pool).await?;
    let holidays = holiday::find_active(pool).await?;
    Ok(WorkCalendar::new(&settings, &holidays))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(0, 7), 0.0);
    }
}
