use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Day-first date format used for input, previews and the record sheet.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::ValidationError(
                "Amount must be a whole non-negative number".to_string(),
            ));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| AppError::ValidationError("Amount is too large".to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckDate(NaiveDate);

impl CheckDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parses a `dd.mm.yyyy` date.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| AppError::ValidationError("Date must look like DD.MM.YYYY".to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CheckDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for RecordId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| AppError::ValidationError(format!("Invalid record id: {}", e)))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum CheckStatus {
    Pending,
    Accepted,
    Rejected,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pending => "Pending",
            CheckStatus::Accepted => "Accepted",
            CheckStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckStatus::Pending)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl Verdict {
    pub fn status(&self) -> CheckStatus {
        match self {
            Verdict::Accept => CheckStatus::Accepted,
            Verdict::Reject => CheckStatus::Rejected,
        }
    }
}

/// Every field is always present; which ones are filled in follows from the
/// session's step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftRecord {
    pub recipient: String,
    pub date: CheckDate,
    pub amount_primary: Amount,
    pub amount_secondary: Amount,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub id: RecordId,
    pub draft: DraftRecord,
    pub status: CheckStatus,
}

impl CheckRecord {
    pub fn dispatch(draft: DraftRecord) -> Self {
        Self {
            id: RecordId::generate(),
            draft,
            status: CheckStatus::Pending,
        }
    }

    /// Status never moves backwards.
    pub fn decide(&mut self, verdict: Verdict) -> Result<(), AppError> {
        if self.status.is_terminal() {
            return Err(AppError::ValidationError(format!(
                "Check {} is already {}",
                self.id, self.status
            )));
        }
        self.status = verdict.status();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DraftRecord {
        DraftRecord {
            recipient: "alice".to_string(),
            date: CheckDate::parse("05.01.2024").unwrap(),
            amount_primary: Amount::new(100),
            amount_secondary: Amount::new(50),
            full_name: "Alice Smith".to_string(),
        }
    }

    #[test]
    fn test_amount_validation() {
        assert_eq!("100".parse::<Amount>().unwrap(), Amount::new(100));
        assert_eq!(" 0 ".parse::<Amount>().unwrap(), Amount::new(0));
        assert!(matches!(
            "-5".parse::<Amount>(),
            Err(AppError::ValidationError(_))
        ));
        assert!("1.5".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert!("+3".parse::<Amount>().is_err());
        assert!("99999999999999999999999".parse::<Amount>().is_err());
    }

    #[test]
    fn test_date_is_day_first() {
        let date = CheckDate::parse("05.01.2024").unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(date.to_string(), "05.01.2024");

        assert!(CheckDate::parse("05.13.2024").is_err());
        assert!(CheckDate::parse("2024-01-05").is_err());
        assert!(CheckDate::parse("31.02.2024").is_err());
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = CheckRecord::dispatch(draft());
        let b = CheckRecord::dispatch(draft());
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, CheckStatus::Pending);
    }

    #[test]
    fn test_record_id_round_trips_through_text() {
        let id = RecordId::generate();
        assert_eq!(id.to_string().parse::<RecordId>().unwrap(), id);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_status_is_monotonic() {
        let mut record = CheckRecord::dispatch(draft());
        record.decide(Verdict::Accept).unwrap();
        assert_eq!(record.status, CheckStatus::Accepted);

        assert!(record.decide(Verdict::Reject).is_err());
        assert_eq!(record.status, CheckStatus::Accepted);
    }
}
