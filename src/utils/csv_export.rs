use crate::error::AppResult;
use chrono::NaiveDateTime;

/// 写出带表头的 CSV（表头始终存在，即使没有数据行）
pub fn write_csv<I>(headers: &[&str], rows: I) -> AppResult<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::error::AppError::InternalError(format!("CSV flush failed: {e}")))
}

/// 导出文件名: <entity>_export_<YYYYmmdd_HHMMSS>.csv
pub fn export_filename(entity: &str, now: NaiveDateTime) -> String {
    format!("{}_export_{}.csv", entity, now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_write_csv_header_only() {
        let bytes = write_csv(&["ID", "Name"], Vec::<Vec<String>>::new()).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "ID,Name\n");
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let rows = vec![vec!["1".to_string(), "Gym Access,Locker Room".to_string()]];
        let bytes = write_csv(&["ID", "Features"], rows).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "ID,Features\n1,\"Gym Access,Locker Room\"\n"
        );
    }

    #[test]
    fn test_export_filename() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            export_filename("members", now),
            "members_export_20250309_140507.csv"
        );
    }
}
