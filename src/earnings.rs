use crate::time_entry::{Project, TimeEntry};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// タイムエントリー1件の売上を計算する。
///
/// エントリーとプロジェクトの両方が課金対象で、時給が正の場合のみ
/// `時間 * 時給`を返す。それ以外は0を返す。丸めは行わない。
///
/// # Arguments
///
/// * `entry` - 対象のタイムエントリー
/// * `projects` - プロジェクト一覧
pub fn earnings(entry: &TimeEntry, projects: &[Project]) -> f64 {
    if !entry.billable {
        return 0.0;
    }
    let Some(project_id) = entry.project_id.as_deref() else {
        return 0.0;
    };
    let Some(project) = projects.iter().find(|project| project.id == project_id) else {
        return 0.0;
    };
    if !project.is_billable || project.hourly_rate.is_nan() || project.hourly_rate <= 0.0 {
        return 0.0;
    }

    let value = entry.duration_millis() as f64 / MILLIS_PER_HOUR * project.hourly_rate;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 複数エントリーの売上合計を返す。
pub fn total_earnings<'a, I>(entries: I, projects: &[Project]) -> f64
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    entries
        .into_iter()
        .map(|entry| earnings(entry, projects))
        .fold(0.0, |total, value| total + value)
}
