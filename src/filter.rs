use std::str::FromStr;

use anyhow::anyhow;

use crate::period::DateRange;
use crate::time_entry::{Project, TimeEntry};

/// 課金対象かどうかによる絞り込み。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BillableStatus {
    #[default]
    All,
    Billable,
    NonBillable,
}

impl BillableStatus {
    fn matches(self, entry: &TimeEntry) -> bool {
        match self {
            BillableStatus::All => true,
            BillableStatus::Billable => entry.billable,
            BillableStatus::NonBillable => !entry.billable,
        }
    }
}

impl FromStr for BillableStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(BillableStatus::All),
            "billable" => Ok(BillableStatus::Billable),
            "non-billable" | "nonbillable" => Ok(BillableStatus::NonBillable),
            _ => Err(anyhow!("Unknown billable status: {}", s)),
        }
    }
}

/// 詳細レポート用のエントリーの絞り込み条件。
///
/// `None`の条件は絞り込みに使わない。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryFilter {
    pub range: Option<DateRange>,
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub billable: BillableStatus,
}

impl EntryFilter {
    /// 全ての条件を満たすエントリーを返す。
    ///
    /// クライアントはエントリーのプロジェクトを経由して判定するため、
    /// プロジェクトが見つからないエントリーはクライアント指定時に除外される。
    pub fn apply(&self, entries: &[TimeEntry], projects: &[Project]) -> Vec<TimeEntry> {
        entries
            .iter()
            .filter(|entry| self.matches(entry, projects))
            .cloned()
            .collect()
    }

    fn matches(&self, entry: &TimeEntry, projects: &[Project]) -> bool {
        if let Some(range) = &self.range {
            if !range.contains(entry.start_time) {
                return false;
            }
        }
        if let Some(client_id) = self.client_id.as_deref() {
            let entry_client = entry.project_id.as_deref().and_then(|project_id| {
                projects
                    .iter()
                    .find(|project| project.id == project_id)
                    .map(|project| project.client_id.as_str())
            });
            if entry_client != Some(client_id) {
                return false;
            }
        }
        if let Some(project_id) = self.project_id.as_deref() {
            if entry.project_id.as_deref() != Some(project_id) {
                return false;
            }
        }
        self.billable.matches(entry)
    }
}
