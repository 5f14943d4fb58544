//! タイムエントリーから売上・生産性・プロジェクトごとの集計を計算する。
//!
//! 集計関数は全て純粋関数で、呼び出しごとにエントリー・プロジェクト・クライアントの
//! スナップショットと現在日時を受け取る。

pub mod bucket;
pub mod calendar_command;
pub mod compare_command;
pub mod console;
pub mod dashboard_command;
pub mod datetime;
pub mod detailed_command;
pub mod earnings;
pub mod filter;
pub mod logging;
pub mod period;
pub mod productivity;
pub mod series;
pub mod store;
pub mod summary;
pub mod summary_command;
pub mod time_entry;
