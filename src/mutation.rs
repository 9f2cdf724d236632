use crate::models::{Command, Operation};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

const DATE_MENTION: &str = "‣";

/// Clock settings used when stamping dates. The offset is applied as a fixed
/// shift; no timezone database rules are consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub now: DateTime<Utc>,
    pub utc_offset_hours: i32,
    pub time_zone: String,
}

impl Stamp {
    pub fn new(now: DateTime<Utc>, utc_offset_hours: i32, time_zone: impl Into<String>) -> Self {
        Self {
            now,
            utc_offset_hours,
            time_zone: time_zone.into(),
        }
    }

    fn shifted(&self) -> DateTime<Utc> {
        self.now + Duration::hours(i64::from(self.utc_offset_hours))
    }

    /// `YYYY-MM-DD` of the shifted clock.
    pub fn local_date(&self) -> String {
        self.shifted().format("%Y-%m-%d").to_string()
    }

    /// `HH:MM` of the shifted clock.
    pub fn local_time(&self) -> String {
        self.shifted().format("%H:%M").to_string()
    }

    pub fn millis(&self) -> i64 {
        self.now.timestamp_millis()
    }

    /// Inline datetime mention rendered by the store as a relative date.
    pub fn now_token(&self) -> Value {
        json!([
            DATE_MENTION,
            [[
                "d",
                {
                    "type": "datetime",
                    "time_zone": self.time_zone,
                    "start_date": self.local_date(),
                    "start_time": self.local_time(),
                    "date_format": "relative"
                }
            ]]
        ])
    }

    pub fn date_value(&self) -> Value {
        json!([[DATE_MENTION, [["d", { "type": "date", "start_date": self.local_date() }]]]])
    }
}

/// Ordered operations submitted as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// True when every operation overwrites an existing property, so applying
    /// the transaction twice leaves the store unchanged.
    pub fn is_retry_safe(&self) -> bool {
        !self.operations.is_empty()
            && self.operations.iter().all(|op| {
                !op.path.is_empty() && matches!(op.command, Command::Set | Command::Update)
            })
    }

    pub fn set(mut self, id: &str, path: &[&str], args: Value) -> Self {
        self.operations.push(Operation::on_block(id, path, Command::Set, args));
        self
    }

    /// Appends `child_id` to the parent's content list and stamps the
    /// parent's last edited time right after it.
    pub fn append_child(mut self, parent_id: &str, child_id: &str, stamp: &Stamp) -> Self {
        self.operations.push(Operation::on_block(
            parent_id,
            &["content"],
            Command::ListAfter,
            json!({ "id": child_id }),
        ));
        self.operations.push(Operation::on_block(
            parent_id,
            &["last_edited_time"],
            Command::Set,
            json!(stamp.millis()),
        ));
        self
    }
}

fn page_record(page_id: &str, title: &str, parent_collection_id: &str, stamp: &Stamp) -> Value {
    json!({
        "id": page_id,
        "version": 1,
        "type": "page",
        "alive": true,
        "properties": { "title": [[title]] },
        "parent_id": parent_collection_id,
        "parent_table": "collection",
        "created_time": stamp.millis()
    })
}

fn memo_record(block_id: &str, block_type: &str, parent_id: &str, content: &str, stamp: &Stamp) -> Value {
    json!({
        "id": block_id,
        "type": block_type,
        "alive": true,
        "properties": { "title": [stamp.now_token(), [format!(" {}", content)]] },
        "parent_id": parent_id,
        "parent_table": "block",
        "created_time": stamp.millis()
    })
}

pub fn create_page(page_id: &str, title: &str, parent_collection_id: &str, stamp: &Stamp) -> Transaction {
    Transaction::new().set(page_id, &[], page_record(page_id, title, parent_collection_id, stamp))
}

pub fn create_page_with_block(
    page_id: &str,
    block_id: &str,
    title: &str,
    content: &str,
    parent_collection_id: &str,
    stamp: &Stamp,
) -> Transaction {
    create_page(page_id, title, parent_collection_id, stamp)
        .set(block_id, &[], memo_record(block_id, "text", page_id, content, stamp))
        .append_child(page_id, block_id, stamp)
}

pub fn append_memo(block_id: &str, parent_id: &str, content: &str, block_type: &str, stamp: &Stamp) -> Transaction {
    Transaction::new()
        .set(block_id, &[], memo_record(block_id, block_type, parent_id, content, stamp))
        .append_child(parent_id, block_id, stamp)
}

pub fn stamp_date(page_id: &str, property_code: &str, stamp: &Stamp) -> Transaction {
    Transaction::new().set(page_id, &["properties", property_code], stamp.date_value())
}

#[cfg(test)]
mod tests {
    use super::{append_memo, create_page, create_page_with_block, stamp_date, Stamp, Transaction};
    use crate::models::{Command, Operation};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn stamp_at(hour: u32, minute: u32) -> Stamp {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, hour, minute, 0).single().expect("valid time");
        Stamp::new(now, 9, "Asia/Seoul")
    }

    fn assert_child_then_touch(ops: &[Operation], parent_id: &str, child_id: &str) {
        let index = ops
            .iter()
            .position(|op| op.command == Command::ListAfter)
            .expect("listAfter present");
        let list_after = &ops[index];
        let touch = ops.get(index + 1).expect("touch follows listAfter");
        assert_eq!(list_after.id, parent_id);
        assert_eq!(list_after.path, vec!["content"]);
        assert_eq!(list_after.args, json!({ "id": child_id }));
        assert_eq!(touch.id, parent_id);
        assert_eq!(touch.command, Command::Set);
        assert_eq!(touch.path, vec!["last_edited_time"]);
    }

    #[test]
    fn offset_rolls_date_forward() {
        let stamp = stamp_at(15, 30);
        assert_eq!(stamp.local_date(), "2024-03-10");
        assert_eq!(stamp.local_time(), "00:30");

        let morning = stamp_at(0, 5);
        assert_eq!(morning.local_date(), "2024-03-09");
        assert_eq!(morning.local_time(), "09:05");
    }

    #[test]
    fn now_token_carries_date_time_and_zone() {
        let token = stamp_at(3, 7).now_token();
        assert_eq!(token[0], "‣");
        let mention = &token[1][0][1];
        assert_eq!(mention["type"], "datetime");
        assert_eq!(mention["start_date"], "2024-03-09");
        assert_eq!(mention["start_time"], "12:07");
        assert_eq!(mention["time_zone"], "Asia/Seoul");
        assert_eq!(mention["date_format"], "relative");
    }

    #[test]
    fn create_page_is_a_single_set() {
        let stamp = stamp_at(1, 0);
        let tx = create_page("page-1", "2024-03-09", "collection-1", &stamp);
        assert_eq!(tx.len(), 1);
        let op = &tx.operations()[0];
        assert!(op.creates_record());
        assert_eq!(op.args["type"], "page");
        assert_eq!(op.args["properties"]["title"], json!([["2024-03-09"]]));
        assert_eq!(op.args["parent_id"], "collection-1");
        assert_eq!(op.args["parent_table"], "collection");
        assert_eq!(op.args["created_time"], json!(stamp.millis()));
    }

    #[test]
    fn page_with_block_appends_and_touches_the_page() {
        let stamp = stamp_at(1, 0);
        let tx = create_page_with_block("page-1", "block-1", "Essay", "first line", "drafts", &stamp);
        let ops = tx.operations();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].id, "page-1");
        assert_eq!(ops[1].id, "block-1");
        assert_eq!(ops[1].args["type"], "text");
        assert_eq!(ops[1].args["parent_id"], "page-1");
        assert_eq!(ops[1].args["properties"]["title"][1], json!([" first line"]));
        assert_child_then_touch(ops, "page-1", "block-1");
    }

    #[test]
    fn memo_is_set_then_append_then_touch() {
        let stamp = stamp_at(22, 45);
        let tx = append_memo("block-9", "bucket", "buy milk", "bulleted_list", &stamp);
        let ops = tx.operations();
        let commands = ops.iter().map(|op| op.command).collect::<Vec<_>>();
        assert_eq!(commands, vec![Command::Set, Command::ListAfter, Command::Set]);
        assert_eq!(ops[0].args["type"], "bulleted_list");
        assert_eq!(ops[0].args["properties"]["title"][0][1][0][1]["start_time"], "07:45");
        assert_child_then_touch(ops, "bucket", "block-9");
        assert!(!tx.is_retry_safe());
    }

    #[test]
    fn date_stamp_targets_schema_code() {
        let tx = stamp_date("page-1", "fz`,", &stamp_at(16, 0));
        let ops = tx.operations();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, vec!["properties", "fz`,"]);
        assert_eq!(
            ops[0].args,
            json!([["‣", [["d", { "type": "date", "start_date": "2024-03-10" }]]]])
        );
        assert!(tx.is_retry_safe());
    }

    #[test]
    fn empty_and_creating_transactions_are_not_retry_safe() {
        assert!(!Transaction::new().is_retry_safe());
        let tx = Transaction::new().set("p", &[], json!({ "type": "text" }));
        assert!(!tx.is_retry_safe());
        let mixed = stamp_date("p", "fz`,", &stamp_at(1, 0)).set("b", &[], json!({ "type": "text" }));
        assert!(!mixed.is_retry_safe());
    }
}
