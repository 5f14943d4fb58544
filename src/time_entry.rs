use serde::{Deserialize, Serialize};

/// 記録された1件のタイムエントリー。
///
/// 時刻はすべてUnixエポックからのミリ秒。作成後に変更されることはない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    pub billable: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub is_manual: Option<bool>,
}

impl TimeEntry {
    /// エントリーの長さをミリ秒で返す。
    ///
    /// `end_time < start_time`となる不正なエントリーは0として扱う。
    pub fn duration_millis(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time).max(0)
    }
}

/// プロジェクト。課金設定を持つ。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub is_billable: bool,
    #[serde(default)]
    pub hourly_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
}

/// タスク。集計では利用しない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_id: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::TimeEntry;

    /// エントリーの長さを計算できることを確認する。
    #[rstest]
    #[case::one_hour(0, 3_600_000, 3_600_000)]
    #[case::zero(1000, 1000, 0)]
    #[case::reversed(5000, 1000, 0)]
    fn test_duration_millis(#[case] start: i64, #[case] end: i64, #[case] expected: i64) {
        let entry = TimeEntry {
            id: "e1".to_string(),
            description: String::new(),
            start_time: start,
            end_time: end,
            project_id: None,
            task_id: None,
            billable: false,
            user_id: "u1".to_string(),
            is_manual: None,
        };

        assert_eq!(entry.duration_millis(), expected);
    }

    /// 元アプリと同じcamelCaseのJSONを読み込めることを確認する。
    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "id": "e1",
            "description": "writing",
            "startTime": 1000,
            "endTime": 2000,
            "projectId": "p1",
            "billable": true,
            "userId": "u1",
            "isManual": true
        }"#;

        let entry: TimeEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.project_id.as_deref(), Some("p1"));
        assert_eq!(entry.task_id, None);
        assert_eq!(entry.is_manual, Some(true));
        assert_eq!(entry.duration_millis(), 1000);
    }
}
