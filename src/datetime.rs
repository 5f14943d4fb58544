use chrono::{DateTime, Local};

#[cfg(not(test))]
/// 現在のローカル時間を取得する。
pub fn now() -> DateTime<Local> {
    Local::now()
}


#[cfg(test)]
pub use mock_datetime::now;
