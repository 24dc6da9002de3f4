//! Outbound ACH file representation, laid out after the NACHA record types
//! (file header, batch header, entry detail, batch control, file control).
//! Fields are rendered as fixed-width, zero- or space-padded strings.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::{cents_field, zero_pad};
use crate::domain::{AchDirection, AchTransfer, Error, LedgerStore, User};

const ENTRY_HASH_MODULUS: u64 = 10_000_000_000;
const RECORDS_PER_BLOCK: usize = 10;
const INDIVIDUAL_NAME_WIDTH: usize = 22;

/// Identity of the originating bank stamped into every outbound file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Originator {
    pub immediate_destination: String,
    pub immediate_origin: String,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
    pub company_name: String,
    pub company_id: String,
    pub standard_entry_class_code: String,
    pub company_entry_description: String,
    pub originating_dfi_id: String,
}

impl Default for Originator {
    fn default() -> Self {
        Self {
            immediate_destination: "123456789".to_string(),
            immediate_origin: "987654321".to_string(),
            immediate_destination_name: "RECEIVING BANK".to_string(),
            immediate_origin_name: "NEXTGEN BANK".to_string(),
            company_name: "NEXTGEN BANK".to_string(),
            company_id: "1234567890".to_string(),
            standard_entry_class_code: "PPD".to_string(),
            company_entry_description: "PAYMENT".to_string(),
            originating_dfi_id: "12345678".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHeader {
    pub immediate_destination: String,
    pub immediate_origin: String,
    pub file_creation_date: String,
    pub file_creation_time: String,
    pub file_id_modifier: String,
    pub record_size: String,
    pub blocking_factor: String,
    pub format_code: String,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHeader {
    pub service_class_code: String,
    pub company_name: String,
    pub company_discretionary_data: String,
    pub company_id: String,
    pub standard_entry_class_code: String,
    pub company_entry_description: String,
    pub company_descriptive_date: String,
    pub effective_entry_date: String,
    pub originator_status_code: String,
    pub originating_dfi_id: String,
    pub batch_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetail {
    pub transaction_code: String,
    pub receiving_dfi_id: String,
    pub check_digit: String,
    pub dfi_account_number: String,
    pub amount: String,
    pub individual_id_number: String,
    pub individual_name: String,
    pub discretionary_data: String,
    pub addenda_record_indicator: String,
    pub trace_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchControl {
    pub service_class_code: String,
    pub entry_addenda_count: String,
    pub entry_hash: String,
    pub total_debit: String,
    pub total_credit: String,
    pub company_id: String,
    pub message_authentication_code: String,
    pub reserved: String,
    pub originating_dfi_id: String,
    pub batch_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_header: BatchHeader,
    pub entries: Vec<EntryDetail>,
    pub batch_control: BatchControl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileControl {
    pub batch_count: String,
    pub block_count: String,
    pub entry_addenda_count: String,
    pub entry_hash: String,
    pub total_debit: String,
    pub total_credit: String,
    pub reserved: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchFile {
    pub file_header: FileHeader,
    pub batches: Vec<Batch>,
    pub file_control: FileControl,
}

/// Credits to the receiver are "22", debits "27" (checking account codes).
pub fn transaction_code(direction: AchDirection) -> &'static str {
    match direction {
        AchDirection::Incoming => "22",
        AchDirection::Outgoing => "27",
    }
}

/// Cuts or space-pads `text` to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let cut: String = text.chars().take(width).collect();
    format!("{:<width$}", cut, width = width)
}

fn routing_part(routing: &str, start: usize, len: usize) -> String {
    routing.chars().skip(start).take(len).collect()
}

/// Sum of the receiving DFI ids, kept to its last ten digits.
pub fn entry_hash(entries: &[EntryDetail]) -> Result<String, Error> {
    let mut hash: u64 = 0;
    for entry in entries {
        let dfi: u64 = entry
            .receiving_dfi_id
            .parse()
            .map_err(|_| Error::Routing(entry.receiving_dfi_id.clone()))?;
        hash = (hash + dfi) % ENTRY_HASH_MODULUS;
    }
    Ok(zero_pad(hash, 10))
}

fn direction_total(transfers: &[AchTransfer], direction: AchDirection) -> Decimal {
    transfers
        .iter()
        .filter(|t| t.direction == direction)
        .map(|t| t.amount.abs())
        .sum()
}

pub fn entry_detail(transfer: &AchTransfer, user: &User) -> Result<EntryDetail, Error> {
    Ok(EntryDetail {
        transaction_code: transaction_code(transfer.direction).to_string(),
        receiving_dfi_id: routing_part(&transfer.routing_number, 0, 8),
        check_digit: routing_part(&transfer.routing_number, 8, 1),
        dfi_account_number: transfer.account_number.clone(),
        amount: cents_field(transfer.amount, 10)?,
        individual_id_number: zero_pad(transfer.user_id, 15),
        individual_name: fit(&user.ach_name(), INDIVIDUAL_NAME_WIDTH),
        discretionary_data: String::new(),
        addenda_record_indicator: "0".to_string(),
        trace_number: transfer.trace_number.clone(),
    })
}

/// Wraps already-rendered entries in header, batch and control records. Pure.
pub fn assemble(
    originator: &Originator,
    transfers: &[AchTransfer],
    entries: Vec<EntryDetail>,
    created_at: DateTime<Utc>,
) -> Result<AchFile, Error> {
    let date = created_at.format("%Y%m%d").to_string();

    let file_header = FileHeader {
        immediate_destination: originator.immediate_destination.clone(),
        immediate_origin: originator.immediate_origin.clone(),
        file_creation_date: date.clone(),
        file_creation_time: created_at.format("%H%M%S").to_string(),
        file_id_modifier: "A".to_string(),
        record_size: "094".to_string(),
        blocking_factor: "10".to_string(),
        format_code: "1".to_string(),
        immediate_destination_name: originator.immediate_destination_name.clone(),
        immediate_origin_name: originator.immediate_origin_name.clone(),
    };

    let batch_header = BatchHeader {
        service_class_code: "200".to_string(),
        company_name: originator.company_name.clone(),
        company_discretionary_data: String::new(),
        company_id: originator.company_id.clone(),
        standard_entry_class_code: originator.standard_entry_class_code.clone(),
        company_entry_description: originator.company_entry_description.clone(),
        company_descriptive_date: date.clone(),
        effective_entry_date: date,
        originator_status_code: "1".to_string(),
        originating_dfi_id: originator.originating_dfi_id.clone(),
        batch_number: "1".to_string(),
    };

    let batch_control = BatchControl {
        service_class_code: "200".to_string(),
        entry_addenda_count: zero_pad(entries.len(), 6),
        entry_hash: entry_hash(&entries)?,
        total_debit: cents_field(direction_total(transfers, AchDirection::Outgoing), 12)?,
        total_credit: cents_field(direction_total(transfers, AchDirection::Incoming), 12)?,
        company_id: batch_header.company_id.clone(),
        message_authentication_code: String::new(),
        reserved: String::new(),
        originating_dfi_id: batch_header.originating_dfi_id.clone(),
        batch_number: batch_header.batch_number.clone(),
    };

    // file header + batch header + entries + batch control + file control
    let records = 2 + entries.len() + 2;
    let file_control = FileControl {
        batch_count: zero_pad(1, 6),
        block_count: zero_pad(records.div_ceil(RECORDS_PER_BLOCK), 6),
        entry_addenda_count: zero_pad(entries.len(), 8),
        entry_hash: batch_control.entry_hash.clone(),
        total_debit: batch_control.total_debit.clone(),
        total_credit: batch_control.total_credit.clone(),
        reserved: " ".repeat(39),
    };

    Ok(AchFile {
        file_header,
        batches: vec![Batch {
            batch_header,
            entries,
            batch_control,
        }],
        file_control,
    })
}

/// Builds the outbound file for `transfers`, looking up each owner for the
/// individual name. Reads only; the ledger is not touched.
pub async fn build_outbound_file<S: LedgerStore>(
    store: &S,
    originator: &Originator,
    transfers: &[AchTransfer],
    created_at: DateTime<Utc>,
) -> Result<AchFile, Error> {
    let entries = try_join_all(transfers.iter().map(|transfer| async move {
        let user = store
            .get_user(transfer.user_id)
            .await?
            .ok_or_else(|| Error::not_found("User", transfer.user_id))?;
        entry_detail(transfer, &user)
    }))
    .await?;

    assemble(originator, transfers, entries, created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AchAccountType, AchStatus};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn user() -> User {
        User {
            id: 7,
            username: "jdoe".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            role: "user".to_string(),
            created_at: Utc::now(),
        }
    }

    fn transfer(id: u32, routing: &str, amount: Decimal, direction: AchDirection) -> AchTransfer {
        AchTransfer {
            id,
            user_id: 7,
            account_id: 1,
            amount,
            routing_number: routing.to_string(),
            account_number: "000123456".to_string(),
            account_type: AchAccountType::Checking,
            description: None,
            direction,
            status: AchStatus::Pending,
            trace_number: format!("ACH000000{:07}", id),
            batch_id: format!("BATCH000000{:06}", id),
            date: Utc::now(),
        }
    }

    #[test]
    fn entry_fields_follow_fixed_widths() {
        let t = transfer(1, "021000021", dec!(125.5), AchDirection::Incoming);
        let entry = entry_detail(&t, &user()).unwrap();

        assert_eq!(entry.transaction_code, "22");
        assert_eq!(entry.receiving_dfi_id, "02100002");
        assert_eq!(entry.check_digit, "1");
        assert_eq!(entry.amount, "0000012550");
        assert_eq!(entry.individual_id_number, "000000000000007");
        assert_eq!(entry.individual_name, format!("{:<22}", "Doe, John"));
        assert_eq!(entry.individual_name.len(), 22);
        assert_eq!(entry.addenda_record_indicator, "0");
    }

    #[test]
    fn long_names_are_truncated() {
        let mut u = user();
        u.last_name = "Montgomery-Worthington".to_string();
        let t = transfer(1, "021000021", dec!(1), AchDirection::Outgoing);
        let entry = entry_detail(&t, &u).unwrap();
        assert_eq!(entry.individual_name, "Montgomery-Worthington");
        assert_eq!(entry.transaction_code, "27");
    }

    #[test]
    fn controls_total_by_direction_and_hash_routing() {
        let transfers = vec![
            transfer(1, "021000021", dec!(100.00), AchDirection::Incoming),
            transfer(2, "011000015", dec!(-40.25), AchDirection::Outgoing),
            transfer(3, "091000019", dec!(10), AchDirection::Outgoing),
        ];
        let entries: Vec<EntryDetail> = transfers
            .iter()
            .map(|t| entry_detail(t, &user()).unwrap())
            .collect();
        let created = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let file = assemble(&Originator::default(), &transfers, entries, created).unwrap();
        let control = &file.batches[0].batch_control;

        assert_eq!(control.entry_addenda_count, "000003");
        // 02100002 + 01100001 + 09100001
        assert_eq!(control.entry_hash, "0012300004");
        assert_eq!(control.total_debit, "000000005025");
        assert_eq!(control.total_credit, "000000010000");

        assert_eq!(file.file_header.file_creation_date, "20240309");
        assert_eq!(file.file_header.file_creation_time, "140507");
        assert_eq!(file.batches[0].batch_header.effective_entry_date, "20240309");
        assert_eq!(file.file_control.batch_count, "000001");
        assert_eq!(file.file_control.block_count, "000001");
        assert_eq!(file.file_control.entry_addenda_count, "00000003");
        assert_eq!(file.file_control.reserved.len(), 39);
    }

    #[test]
    fn block_count_rounds_up_per_ten_records() {
        let transfers: Vec<AchTransfer> = (1..=7)
            .map(|i| transfer(i, "021000021", dec!(1), AchDirection::Incoming))
            .collect();
        let entries = transfers
            .iter()
            .map(|t| entry_detail(t, &user()).unwrap())
            .collect();
        let file = assemble(&Originator::default(), &transfers, entries, Utc::now()).unwrap();
        // 4 framing records + 7 entries = 11 records
        assert_eq!(file.file_control.block_count, "000002");
    }

    #[test]
    fn entry_hash_keeps_last_ten_digits() {
        let entries: Vec<EntryDetail> = (1..=200)
            .map(|i| {
                entry_detail(
                    &transfer(i, "999999999", dec!(1), AchDirection::Incoming),
                    &user(),
                )
                .unwrap()
            })
            .collect();
        // 200 * 99999999 = 19999999800
        assert_eq!(entry_hash(&entries).unwrap(), "9999999800");
    }

    #[test]
    fn non_numeric_routing_is_rejected() {
        let t = transfer(1, "ABCDEFGHI", dec!(1), AchDirection::Incoming);
        let entry = entry_detail(&t, &user()).unwrap();
        assert!(matches!(entry_hash(&[entry]), Err(Error::Routing(_))));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let t = transfer(1, "021000021", dec!(1), AchDirection::Incoming);
        let entries = vec![entry_detail(&t, &user()).unwrap()];
        let file = assemble(&Originator::default(), &[t], entries, Utc::now()).unwrap();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["fileHeader"]["immediateOriginName"], "NEXTGEN BANK");
        assert_eq!(json["batches"][0]["entries"][0]["transactionCode"], "22");
        assert_eq!(json["fileControl"]["batchCount"], "000001");
    }
}
