//! Non-destructive visibility filter over loaded records.
//!
//! A record is hidden only when a limit is set, the record carries the field
//! that limit compares, and the field violates it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::amount::parse_amount;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterInputError {
    #[error("invalid deadline date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid amount ceiling {0:?}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterLimits {
    /// Records whose deadline is earlier than this date are hidden.
    pub deadline_ceiling: Option<NaiveDate>,
    /// Records whose amount is greater than this value are hidden.
    pub amount_ceiling: Option<f64>,
}

impl FilterLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline limit from `YYYY-MM-DD` input. Blank input clears it.
    ///
    /// On error the current limit is left untouched.
    pub fn set_deadline_from_input(&mut self, raw: &str) -> Result<(), FilterInputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.deadline_ceiling = None;
            return Ok(());
        }
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| FilterInputError::InvalidDate(trimmed.to_string()))?;
        self.deadline_ceiling = Some(date);
        Ok(())
    }

    /// Sets the amount limit from free-form input. Blank input clears it.
    ///
    /// On error the current limit is left untouched.
    pub fn set_amount_from_input(&mut self, raw: &str) -> Result<(), FilterInputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.amount_ceiling = None;
            return Ok(());
        }
        let amount = parse_amount(trimmed)
            .ok_or_else(|| FilterInputError::InvalidAmount(trimmed.to_string()))?;
        self.amount_ceiling = Some(amount);
        Ok(())
    }

    pub fn clear_deadline(&mut self) {
        self.deadline_ceiling = None;
    }

    pub fn clear_amount(&mut self) {
        self.amount_ceiling = None;
    }

    pub fn is_empty(&self) -> bool {
        self.deadline_ceiling.is_none() && self.amount_ceiling.is_none()
    }
}

pub fn is_visible(record: &Record, limits: &FilterLimits) -> bool {
    if let (Some(ceiling), Some(deadline)) = (limits.deadline_ceiling, record.deadline) {
        if deadline < ceiling {
            return false;
        }
    }
    if let (Some(ceiling), Some(amount)) = (limits.amount_ceiling, record.amount) {
        if amount > ceiling {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub record: Record,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityCount {
    pub visible: usize,
    pub total: usize,
}

/// Records loaded per group, in load order, each with its transient visibility.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordBoard {
    groups: Vec<(String, Vec<LoadedRecord>)>,
}

impl RecordBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the records of `group` and evaluates them against `limits`.
    pub fn load_group(
        &mut self,
        group: &str,
        records: Vec<Record>,
        limits: &FilterLimits,
    ) -> VisibilityCount {
        let loaded = records
            .into_iter()
            .map(|record| {
                let visible = is_visible(&record, limits);
                LoadedRecord { record, visible }
            })
            .collect();
        match self.groups.iter_mut().find(|(name, _)| name == group) {
            Some((_, slot)) => *slot = loaded,
            None => self.groups.push((group.to_string(), loaded)),
        }
        self.count()
    }

    /// Re-evaluates every record. Calling this repeatedly with the same limits is a no-op.
    pub fn apply(&mut self, limits: &FilterLimits) -> VisibilityCount {
        for (_, records) in &mut self.groups {
            for loaded in records.iter_mut() {
                loaded.visible = is_visible(&loaded.record, limits);
            }
        }
        self.count()
    }

    pub fn count(&self) -> VisibilityCount {
        let mut count = VisibilityCount::default();
        for loaded in self.groups.iter().flat_map(|(_, records)| records) {
            count.total += 1;
            if loaded.visible {
                count.visible += 1;
            }
        }
        count
    }

    pub fn all(&self) -> impl Iterator<Item = &LoadedRecord> {
        self.groups.iter().flat_map(|(_, records)| records.iter())
    }

    pub fn visible(&self) -> impl Iterator<Item = &Record> {
        self.all()
            .filter(|loaded| loaded.visible)
            .map(|loaded| &loaded.record)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }
}
